//! Unified error handling for the clustering engine.
//!
//! Every fallible operation in the crate returns [`Result`]. Conditions that
//! are normal negative outcomes (cache misses, degenerate clusters,
//! insufficient votes) are expressed as `Option` or fallback values instead.

use thiserror::Error;

/// Errors produced by the engine, the store and the credential verifier.
#[derive(Debug, Error)]
pub enum HotspotError {
    /// Alpha-shape boundary edges could not be stitched into closed rings.
    #[error(
        "malformed hull: open ring of {ring_len} points found no matching edge ({remaining_edges} edges left)"
    )]
    MalformedHull {
        ring_len: usize,
        remaining_edges: usize,
    },

    /// The Delaunay backend rejected a projected coordinate.
    #[error("triangulation failed: {0}")]
    Triangulation(String),

    /// A configuration value is out of its accepted range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A requested entity does not exist (or is no longer live).
    #[error("{entity} not found")]
    NotFound { entity: String },

    /// A request was well-formed but not acceptable.
    #[error("bad parameters: {0}")]
    BadParameters(String),

    /// Credentials were missing or did not verify.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, HotspotError>;

/// Conversions from `Option` into the crate's error taxonomy.
pub trait OptionExt<T> {
    /// Turn `None` into [`HotspotError::NotFound`] for the named entity.
    fn ok_or_not_found(self, entity: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, entity: &str) -> Result<T> {
        self.ok_or_else(|| HotspotError::NotFound {
            entity: entity.to_string(),
        })
    }
}
