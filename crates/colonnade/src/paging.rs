//! Forward-only paging cursor protocol.
//!
//! The target store cannot compute total counts or arbitrary offsets
//! cheaply, so this protocol exposes only forward continuation: no page
//! numbers, no total pages, no backward traversal.

use crate::{query::plan::PlanSignature, serialize};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

const PAGING_STATE_VERSION_V1: u8 = 1;
pub const MAX_PAGING_STATE_BYTES: usize = 8 * 1024;

///
/// PagingStateError
///
/// Continuation-token failures. Surfaced to the caller, never retried and
/// never silently ignored.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum PagingStateError {
    #[error("failed to encode paging state: {reason}")]
    Encode { reason: String },

    #[error("failed to decode paging state: {reason}")]
    Decode { reason: String },

    #[error("unsupported paging state version: {version}")]
    UnsupportedVersion { version: u8 },

    #[error("paging state belongs to a different query shape (expected {expected}, got {actual})")]
    ForeignToken { expected: String, actual: String },

    #[error("paging state exceeds {max} bytes")]
    OverSize { max: usize },
}

///
/// PagingStateWire
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
struct PagingStateWire {
    version: u8,
    signature: [u8; 32],
    resume: Vec<u8>,
}

///
/// PagingState
///
/// Opaque forward-only continuation token. Only store-produced tokens are
/// valid inputs; equality or inspection by clients is out of contract. The
/// wrapped payload is bound to one plan signature so tokens from a different
/// query shape fail closed.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PagingState {
    bytes: Vec<u8>,
}

impl PagingState {
    /// Wrap a store-private resume payload under the plan's signature.
    pub(crate) fn seal(
        signature: PlanSignature,
        resume: Vec<u8>,
    ) -> Result<Self, PagingStateError> {
        let wire = PagingStateWire {
            version: PAGING_STATE_VERSION_V1,
            signature: signature.into_bytes(),
            resume,
        };

        serialize::serialize(&wire)
            .map(|bytes| Self { bytes })
            .map_err(|err| PagingStateError::Encode {
                reason: err.to_string(),
            })
    }

    /// Recover the resume payload, verifying that the token belongs to the
    /// given plan shape.
    pub(crate) fn unseal(&self, expected: PlanSignature) -> Result<Vec<u8>, PagingStateError> {
        if self.bytes.len() > MAX_PAGING_STATE_BYTES {
            return Err(PagingStateError::OverSize {
                max: MAX_PAGING_STATE_BYTES,
            });
        }

        let wire: PagingStateWire =
            serialize::deserialize_bounded(&self.bytes, MAX_PAGING_STATE_BYTES).map_err(|err| {
                PagingStateError::Decode {
                    reason: err.to_string(),
                }
            })?;

        if wire.version != PAGING_STATE_VERSION_V1 {
            return Err(PagingStateError::UnsupportedVersion {
                version: wire.version,
            });
        }

        let actual = PlanSignature::from_bytes(wire.signature);
        if actual != expected {
            return Err(PagingStateError::ForeignToken {
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }

        Ok(wire.resume)
    }

    /// Raw token bytes for transport; clients must treat them as opaque.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Rehydrate a token previously obtained from [`Self::as_bytes`].
    /// Integrity is verified on use, not here.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    #[cfg(test)]
    pub(crate) fn seal_with_version_for_test(
        version: u8,
        signature: PlanSignature,
        resume: Vec<u8>,
    ) -> Self {
        let wire = PagingStateWire {
            version,
            signature: signature.into_bytes(),
            resume,
        };

        Self {
            bytes: serialize::serialize(&wire).expect("wire encode"),
        }
    }
}

///
/// PageState
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum PageState {
    /// First page; carries no token.
    Initial,
    /// Resume after the last row of a previous page.
    Resume(PagingState),
    /// Terminal: the previous slice reported no further rows.
    Exhausted,
}

///
/// PageRequest
///
/// One forward page request. Built either as the first page or from a
/// previous slice via [`Slice::next_request`].
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PageRequest {
    size: u32,
    state: PageState,
}

impl PageRequest {
    /// First page of `size` rows.
    #[must_use]
    pub fn first(size: u32) -> Self {
        Self {
            size: size.max(1),
            state: PageState::Initial,
        }
    }

    /// Resume after a store-produced token.
    #[must_use]
    pub fn resume(size: u32, state: PagingState) -> Self {
        Self {
            size: size.max(1),
            state: PageState::Resume(state),
        }
    }

    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self.state, PageState::Exhausted)
    }

    pub(crate) const fn state(&self) -> &PageState {
        &self.state
    }

    pub(crate) const fn exhausted(size: u32) -> Self {
        Self {
            size,
            state: PageState::Exhausted,
        }
    }
}

///
/// Slice
///
/// One forward page of results plus whether more exist. Slices never report
/// total size or total pages; `has_next` derives from token presence.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Slice<T> {
    content: Vec<T>,
    paging_state: Option<PagingState>,
}

impl<T> Slice<T> {
    pub(crate) const fn new(content: Vec<T>, paging_state: Option<PagingState>) -> Self {
        Self {
            content,
            paging_state,
        }
    }

    pub(crate) const fn empty() -> Self {
        Self {
            content: Vec::new(),
            paging_state: None,
        }
    }

    #[must_use]
    pub fn content(&self) -> &[T] {
        &self.content
    }

    #[must_use]
    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.paging_state.is_some()
    }

    #[must_use]
    pub const fn paging_state(&self) -> Option<&PagingState> {
        self.paging_state.as_ref()
    }

    /// Request for the page after this one. A terminal slice yields an
    /// exhausted request whose invocation returns an empty slice rather than
    /// an error.
    #[must_use]
    pub fn next_request(&self, size: u32) -> PageRequest {
        match &self.paging_state {
            Some(state) => PageRequest::resume(size, state.clone()),
            None => PageRequest::exhausted(size.max(1)),
        }
    }
}

///
/// TESTS
///
