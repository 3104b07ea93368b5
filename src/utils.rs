//! Small header/path parsing helpers shared by the protocol handlers.

use crate::error::ProtocolError;
use crate::TUS_VERSION;

/// Validate the mandatory `Tus-Resumable` header.
pub fn check_tus_version(v: Option<&str>) -> Result<(), ProtocolError> {
    let v = v.ok_or(ProtocolError::MissingTusResumable)?;
    if v != TUS_VERSION {
        return Err(ProtocolError::UnsupportedTusVersion(v.to_string()));
    }
    Ok(())
}

/// Parse a header expected to hold a non-negative integer (`Upload-Length`,
/// `Upload-Offset`, `Content-Length`).
pub fn parse_u64(v: Option<&str>, name: &'static str) -> Result<u64, ProtocolError> {
    let s = v.ok_or(ProtocolError::MissingHeader(name))?;
    s.parse::<u64>().map_err(|_| ProtocolError::InvalidInt(name))
}

/// Strip a leading `/` and any trailing `/`s from a configured URL prefix,
/// so it can be joined with `/` unambiguously.
pub fn normalize_prefix(p: &str) -> String {
    p.trim_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_tus_version_valid() {
        assert!(check_tus_version(Some("1.0.0")).is_ok());
    }

    #[test]
    fn check_tus_version_missing() {
        assert!(matches!(
            check_tus_version(None).unwrap_err(),
            ProtocolError::MissingTusResumable
        ));
    }

    #[test]
    fn check_tus_version_unsupported() {
        match check_tus_version(Some("2.0.0")).unwrap_err() {
            ProtocolError::UnsupportedTusVersion(v) => assert_eq!(v, "2.0.0"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_u64_valid() {
        assert_eq!(parse_u64(Some("0"), "test").unwrap(), 0);
        assert_eq!(parse_u64(Some("123"), "test").unwrap(), 123);
        assert_eq!(parse_u64(Some("18446744073709551615"), "test").unwrap(), u64::MAX);
    }

    #[test]
    fn parse_u64_missing() {
        match parse_u64(None, "Upload-Length").unwrap_err() {
            ProtocolError::MissingHeader(name) => assert_eq!(name, "Upload-Length"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_u64_invalid() {
        assert!(parse_u64(Some("abc"), "test").is_err());
        assert!(parse_u64(Some("-1"), "test").is_err());
        assert!(parse_u64(Some("1.5"), "test").is_err());
        assert!(parse_u64(Some(""), "test").is_err());
        assert!(parse_u64(Some("18446744073709551616"), "test").is_err());
    }

    #[test]
    fn normalize_prefix_strips_slashes() {
        assert_eq!(normalize_prefix("/files"), "files");
        assert_eq!(normalize_prefix("files/"), "files");
        assert_eq!(normalize_prefix("/files/"), "files");
        assert_eq!(normalize_prefix("files"), "files");
        assert_eq!(normalize_prefix(""), "");
    }
}
