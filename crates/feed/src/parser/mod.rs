//! Feed decoding and canonical normalization.
//!
//! Two stages, deliberately separate:
//!
//! 1. `decode` turns raw feed bytes (one of two wire formats) into a
//!    generic `serde_json::Value` tree.
//! 2. `normalize` walks that tree through data-driven extraction rules
//!    and produces canonical [`Property`](crate::model::Property) records.
//!
//! The upstream publisher has shipped several container shapes and key
//! spellings over time; everything shape-specific lives in the ordered
//! path lists in `rules`, so tolerating a new revision means adding a
//! string, not code.

mod decode;
mod normalize;
mod paths;
mod rules;

pub use decode::decode;
pub use normalize::{NormalizeError, normalize, normalize_record};

/// Supported wire encodings, inferred from the feed file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Xml,
    Json,
}

impl FeedFormat {
    /// Infer the format from a file name extension.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::UnknownFormat` for anything that is not
    /// `.xml` or `.json`.
    pub fn from_name(name: &str) -> Result<Self, ParseError> {
        let extension = name.rsplit('.').next().map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("xml") => Ok(Self::Xml),
            Some("json") => Ok(Self::Json),
            _ => Err(ParseError::UnknownFormat(name.to_owned())),
        }
    }
}

/// Batch-level parse failures. These abort a refresh cycle, unlike
/// per-record normalization failures which only drop the record.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("cannot infer feed format from name: {0}")]
    UnknownFormat(String),

    #[error("malformed XML: {0}")]
    Xml(String),

    #[error("malformed JSON: {0}")]
    Json(String),

    #[error("no recognizable property container in feed")]
    NoContainer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_name() {
        assert_eq!(FeedFormat::from_name("listings-0115.xml").unwrap(), FeedFormat::Xml);
        assert_eq!(FeedFormat::from_name("listings-0115.JSON").unwrap(), FeedFormat::Json);
    }

    #[test]
    fn test_format_from_name_unknown() {
        assert!(FeedFormat::from_name("listings.csv").is_err());
        assert!(FeedFormat::from_name("listings").is_err());
    }
}
