//! Request values and response-body plumbing shared by every operation.
//!
//! # Design
//! `HttpRequest` describes a call as plain data, so request construction can
//! be tested without touching the network. Response bodies arrive through
//! the [`ResponseSink`] trait in transport-sized chunks; [`ResponseBuffer`]
//! is the sink the client uses, accumulating bytes until the transfer ends.
//! [`drain_into`] is the only loop between the two and works on any
//! `io::Read`, so the accumulation path is exercised with synthetic readers
//! in the tests below.
//!
//! All fields use owned types (`String`, `Vec`, `PathBuf`) so values can
//! cross FFI boundaries without lifetime concerns.

use std::io::{self, Read};
use std::path::PathBuf;

use crate::error::ApiError;

/// Body attached to an outgoing request. Every Traceix endpoint is a POST,
/// so the body kind is the only shape that varies between operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Empty,
    Json(String),
    File { field: String, path: PathBuf },
}

/// An HTTP POST described as plain data.
///
/// Built by the `TraceixClient::build_*` methods and executed by its
/// `perform` step.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

/// Receives response-body chunks as the transport delivers them.
///
/// Returning `false` refuses the chunk and aborts the transfer; the running
/// operation then fails with [`ApiError::Transport`]. Each byte of the body
/// is offered exactly once, in order.
pub trait ResponseSink {
    fn accept(&mut self, chunk: &[u8]) -> bool;
}

/// Growable byte buffer accumulating one response body.
///
/// Growth is fallible: if the allocator refuses the extra capacity the chunk
/// is refused instead of aborting the process, and the transfer fails with a
/// transport error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseBuffer {
    data: Vec<u8>,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl ResponseSink for ResponseBuffer {
    fn accept(&mut self, chunk: &[u8]) -> bool {
        if self.data.try_reserve(chunk.len()).is_err() {
            return false;
        }
        self.data.extend_from_slice(chunk);
        true
    }
}

pub(crate) const CHUNK_SIZE: usize = 8 * 1024;

/// Copy a response body from `reader` into `sink`, at most [`CHUNK_SIZE`]
/// bytes at a time, until EOF or until the sink refuses a chunk.
pub(crate) fn drain_into<R: Read>(
    reader: &mut R,
    sink: &mut dyn ResponseSink,
) -> Result<(), ApiError> {
    let mut chunk = [0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(ApiError::Transport {
                    message: format!("failed to read response body: {e}"),
                })
            }
        };
        if !sink.accept(&chunk[..n]) {
            return Err(ApiError::Transport {
                message: "response sink refused data, transfer aborted".to_string(),
            });
        }
    }
}
