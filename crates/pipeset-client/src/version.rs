//! Client version and version parsing.

use pipeset_core::{Error, Result};
use semver::Version;

/// Version this client reports and checks servers against.
pub const CLIENT_VERSION: &str = "4.2.5";

/// Parse a version with at least `major.minor.patch` components. Anything
/// after the third component is ignored, so `4.2.5.1` is `4.2.5`.
pub fn parse(version: &str) -> Result<Version> {
    let parts: Vec<&str> = version.split('.').collect();
    if parts.len() < 3 {
        return Err(Error::VersionParse {
            version: version.to_string(),
            message: "expected major.minor.patch".to_string(),
        });
    }

    Version::parse(&parts[..3].join(".")).map_err(|e| Error::VersionParse {
        version: version.to_string(),
        message: e.to_string(),
    })
}

/// Parse a version that may omit trailing components, e.g. worker versions
/// such as `2.1`. Missing components are zero.
pub fn parse_lenient(version: &str) -> Result<Version> {
    let padded = match version.split('.').count() {
        1 => format!("{}.0.0", version),
        2 => format!("{}.0", version),
        _ => return parse(version),
    };

    Version::parse(&padded).map_err(|e| Error::VersionParse {
        version: version.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let v = parse("4.2.5").unwrap();
        assert_eq!((v.major, v.minor, v.patch), (4, 2, 5));
        assert!(parse("4.2").is_err());
    }

    #[test]
    fn test_parse_ignores_extra_components() {
        let v = parse("4.2.5.1").unwrap();
        assert_eq!((v.major, v.minor, v.patch), (4, 2, 5));
        assert!(parse("4.x.5.1").is_err());
    }

    #[test]
    fn test_parse_lenient() {
        let v = parse_lenient("2.1").unwrap();
        assert_eq!((v.major, v.minor, v.patch), (2, 1, 0));
        assert_eq!(parse_lenient("3").unwrap().major, 3);
        assert_eq!(parse_lenient("1.2.3").unwrap().patch, 3);
        assert_eq!(parse_lenient("1.2.3.4").unwrap().patch, 3);
    }

    #[test]
    fn test_parse_garbage() {
        let err = parse_lenient("latest").unwrap_err();
        assert_eq!(
            err.to_string().split(':').next(),
            Some("invalid version 'latest'")
        );
    }
}
