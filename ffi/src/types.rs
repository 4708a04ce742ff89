//! C-compatible types for the FFI boundary.
//!
//! # Design
//! The SDK handle stays opaque: C callers only ever hold a pointer to it.
//! Status codes and search kinds are `#[repr(C)]` enums with frozen
//! discriminants so existing C callers can keep their switch statements.
//! Conversion helpers live here to keep `lib.rs` focused on the
//! `extern "C"` surface.

use traceix_core::{ApiError, SearchKind, TraceixClient};

/// Opaque handle wrapping a configured client. Created by
/// `traceix_sdk_new`, released by `traceix_sdk_free`.
pub struct TraceixSdk {
    pub(crate) inner: TraceixClient,
}

/// Status code returned by every SDK entry point.
///
/// Discriminants are part of the ABI and must not be reordered.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceixStatus {
    Ok = 0,
    NoApiKey = 1,
    InvalidSearchKind = 2,
    NoUuid = 3,
    TransportError = 4,
    InternalError = 5,
}

impl From<&ApiError> for TraceixStatus {
    fn from(error: &ApiError) -> Self {
        match error {
            ApiError::MissingApiKey => TraceixStatus::NoApiKey,
            ApiError::InvalidSearchKind { .. } => TraceixStatus::InvalidSearchKind,
            ApiError::MissingUuid => TraceixStatus::NoUuid,
            ApiError::Transport { .. } => TraceixStatus::TransportError,
            ApiError::Internal { .. } => TraceixStatus::InternalError,
        }
    }
}

/// Search kinds understood by `traceix_hash_search`.
///
/// Exported for C callers; the function itself takes a raw `u32` so values
/// outside this enum fail with `InvalidSearchKind` instead of being
/// undefined behavior.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceixSearchKind {
    Capa = 0,
    Exif = 1,
}

pub(crate) fn search_kind_from_raw(kind: u32) -> Result<SearchKind, ApiError> {
    match kind {
        0 => Ok(SearchKind::Capa),
        1 => Ok(SearchKind::Exif),
        other => Err(ApiError::InvalidSearchKind {
            kind: other.to_string(),
        }),
    }
}
