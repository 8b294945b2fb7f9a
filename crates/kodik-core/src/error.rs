//! Error types for the Kodik extraction pipeline
//!
//! Provides a comprehensive error enum with human-readable messages
//! covering every pipeline stage, from session extraction to segment
//! persistence.

use thiserror::Error;

/// Error type for all Kodik pipeline operations
///
/// Content states that are legitimately empty (no playable sources for an
/// episode) are not errors; every variant here is a genuine failure of a
/// pipeline stage.
#[derive(Error, Debug)]
pub enum KodikError {
    /// HTTP transport failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("unexpected status {status} from {url}")]
    Fetch { url: String, status: u16 },

    /// Expected embedded player data was absent or malformed
    #[error("session extraction failed: {0}")]
    SessionExtraction(String),

    /// Expected catalog markup or payload structure was absent or malformed
    #[error("catalog parsing failed: {0}")]
    Catalog(String),

    /// Obfuscated asset URL could not be decoded
    #[error("url decoding failed: {0}")]
    Decode(String),

    /// Manifest metadata line was malformed
    #[error("manifest parsing failed: {0}")]
    ManifestParse(String),

    /// One or more segments failed to download
    #[error("{failed} of {total} segments failed to download")]
    Segment { failed: usize, total: usize },

    /// Invalid or unresolvable URL
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Filesystem operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Kodik pipeline operations
pub type Result<T> = std::result::Result<T, KodikError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_fetch() {
        let error = KodikError::Fetch {
            url: "https://kodik.cc/serial/1/a/720p".to_string(),
            status: 403,
        };
        assert_eq!(
            error.to_string(),
            "unexpected status 403 from https://kodik.cc/serial/1/a/720p"
        );
    }

    #[test]
    fn test_error_display_session_extraction() {
        let error = KodikError::SessionExtraction("urlParams not found".to_string());
        assert_eq!(
            error.to_string(),
            "session extraction failed: urlParams not found"
        );
    }

    #[test]
    fn test_error_display_catalog() {
        let error = KodikError::Catalog("no seasons".to_string());
        assert_eq!(error.to_string(), "catalog parsing failed: no seasons");
    }

    #[test]
    fn test_error_display_decode() {
        let error = KodikError::Decode("invalid base64 payload".to_string());
        assert_eq!(
            error.to_string(),
            "url decoding failed: invalid base64 payload"
        );
    }

    #[test]
    fn test_error_display_manifest_parse() {
        let error = KodikError::ManifestParse("metadata line without separator".to_string());
        assert_eq!(
            error.to_string(),
            "manifest parsing failed: metadata line without separator"
        );
    }

    #[test]
    fn test_error_display_segment() {
        let error = KodikError::Segment {
            failed: 2,
            total: 40,
        };
        assert_eq!(error.to_string(), "2 of 40 segments failed to download");
    }

    #[test]
    fn test_error_display_invalid_url() {
        let error = KodikError::InvalidUrl("not-a-url".to_string());
        assert_eq!(error.to_string(), "invalid URL: not-a-url");
    }
}
