//! Wire-facing domain types.
//!
//! # Design
//! The request payload structs exist so JSON bodies go through serde rather
//! than string interpolation: a hash or uuid containing `"`, `\` or
//! non-ASCII text must still produce a well-formed body. Field names match
//! the service contract exactly.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ApiError;

/// Which index a hash search runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Capa,
    Exif,
}

impl SearchKind {
    /// Endpoint path for this search kind.
    pub(crate) fn search_path(self) -> &'static str {
        match self {
            SearchKind::Capa => "/api/traceix/v1/capa/search",
            SearchKind::Exif => "/api/traceix/v1/exif/search",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SearchKind::Capa => "capa",
            SearchKind::Exif => "exif",
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchKind {
    type Err = ApiError;

    /// Accepts exactly `"capa"` and `"exif"`; anything else fails with
    /// [`ApiError::InvalidSearchKind`] without any network involvement.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "capa" => Ok(SearchKind::Capa),
            "exif" => Ok(SearchKind::Exif),
            other => Err(ApiError::InvalidSearchKind {
                kind: other.to_string(),
            }),
        }
    }
}

/// Body for `check_status`.
#[derive(Debug, Serialize)]
pub(crate) struct StatusQuery<'a> {
    pub uuid: &'a str,
}

/// Body for `hash_search`.
#[derive(Debug, Serialize)]
pub(crate) struct HashQuery<'a> {
    pub sha256: &'a str,
}

/// Body for `get_public_ipfs_dataset`.
#[derive(Debug, Serialize)]
pub(crate) struct CidQuery<'a> {
    pub cid: &'a str,
}

/// Body for `search_ipfs_dataset_by_hash`.
#[derive(Debug, Serialize)]
pub(crate) struct DatasetHashQuery<'a> {
    pub sha_hash: &'a str,
}

/// The three raw bodies produced by `TraceixClient::full_upload`, one per
/// analysis. Populated only when every step succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullUpload {
    pub ai: String,
    pub capa: String,
    pub exif: String,
}
