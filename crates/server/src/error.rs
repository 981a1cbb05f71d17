//! Refresh-cycle error aggregation.

use listafeed_core::CacheError;
use listafeed_feed::{ParseError, TransportError};

/// Everything that can abort one refresh cycle.
///
/// `Clone` so a coalesced refresh can hand the same failure to every
/// waiting caller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RefreshError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_passes_through() {
        let err = RefreshError::from(TransportError::NoFeedsAvailable);
        assert_eq!(err.to_string(), "no feeds available");

        let err = RefreshError::from(ParseError::NoContainer);
        assert!(err.to_string().contains("container"));
    }
}
