use thiserror::Error;

use crate::boundaries::Crs;

/// A timestamp that did not match the permit export layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unparseable timestamp {text:?} in {field}")]
pub struct ParseError {
    pub field: &'static str,
    pub text: String,
}

/// A ZIP token that could not become a numeric identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedKey {
    #[error("empty zip code field")]
    Empty,
    #[error("empty zip code between delimiters in {0:?}")]
    EmptyToken(String),
    #[error("non-numeric zip code {0:?}")]
    NotNumeric(String),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    MalformedKey(#[from] MalformedKey),

    /// Both sides of a join have to share a reference system.
    #[error("join expects boundaries in {expected}, found {found}")]
    JoinMismatch { expected: Crs, found: Crs },

    #[error("unknown borough {0:?}")]
    UnknownBorough(String),

    #[error("unparseable income {0:?}")]
    Income(String),

    #[error("feature {index} in boundary file: {reason}")]
    Boundary { index: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    GeoJson(#[from] geojson::Error),

    #[error(transparent)]
    ProjCreate(#[from] proj::ProjCreateError),

    #[error(transparent)]
    Proj(#[from] proj::ProjError),
}

pub type Result<T> = std::result::Result<T, ReportError>;
