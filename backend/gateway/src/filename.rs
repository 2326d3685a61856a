//! Server-side filename generation for uploads.
//!
//! Names are 16 random bytes, hex encoded, followed by the final extension of
//! the client's original filename. Uniqueness is probabilistic only.

use crate::error::GatewayError;

/// Random bytes per generated name.
pub const NAME_ENTROPY_BYTES: usize = 16;

/// Generate a storage filename for an upload whose client-side name is `original`.
pub fn generate_filename(original: &str) -> Result<String, GatewayError> {
    let mut bytes = [0u8; NAME_ENTROPY_BYTES];
    getrandom::fill(&mut bytes).map_err(GatewayError::RandomnessFailure)?;
    Ok(format!("{}{}", hex::encode(bytes), extension_of(original)))
}

/// Final extension of the base name, including the dot.
///
/// `"a.b.tar.gz"` yields `".gz"` and `"..x"` yields `".x"`. Names without a
/// dot, dot-files such as `".bashrc"`, and `".."` yield `""`.
pub fn extension_of(name: &str) -> &str {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    match base.rfind('.') {
        // a dot with nothing before it starts a dot-file name
        Some(0) | None => "",
        Some(_) if base == ".." => "",
        Some(idx) => &base[idx..],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn keeps_only_final_extension() {
        assert_eq!(extension_of("a.b.tar.gz"), ".gz");
        assert_eq!(extension_of("photo.png"), ".png");
    }

    #[test]
    fn no_extension_cases() {
        assert_eq!(extension_of("README"), "");
        assert_eq!(extension_of(".bashrc"), "");
        assert_eq!(extension_of(""), "");
        assert_eq!(extension_of(".."), "");
    }

    #[test]
    fn extension_edge_cases() {
        assert_eq!(extension_of("trailing."), ".");
        assert_eq!(extension_of(".config.json"), ".json");
        assert_eq!(extension_of("dir.d/file"), "");
        assert_eq!(extension_of("C:\\Users\\me\\scan.pdf"), ".pdf");
    }

    #[test]
    fn leading_dots_before_an_extension() {
        assert_eq!(extension_of("..x"), ".x");
        assert_eq!(extension_of("...png"), ".png");
        assert_eq!(extension_of("..."), ".");
        assert_eq!(extension_of("."), "");
    }

    #[test]
    fn generated_name_shape() {
        let name = generate_filename("photo.png").unwrap();
        let stem = name.strip_suffix(".png").unwrap();
        assert_eq!(stem.len(), NAME_ENTROPY_BYTES * 2);
        assert!(stem.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn ten_thousand_names_do_not_collide() {
        let names: HashSet<String> = (0..10_000)
            .map(|_| generate_filename("x.bin").unwrap())
            .collect();
        assert_eq!(names.len(), 10_000);
    }
}
