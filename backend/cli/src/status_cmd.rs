//! CLI Status Command
//!
//! Checks `GET /` on a locally running gateway.

use anyhow::Result;

pub async fn run(port: u16) -> Result<()> {
    let url = format!("http://localhost:{port}/");
    println!("Gateway status: checking {url}");

    match reqwest::get(&url).await {
        Ok(resp) => {
            let status = resp.status();
            let body = resp.text().await?;
            println!("  {status} {body}");
        }
        Err(_) => {
            println!("Gateway is not running on port {port}");
        }
    }

    Ok(())
}
