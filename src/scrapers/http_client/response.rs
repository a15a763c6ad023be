//! Fetch outcome types.

use thiserror::Error;

/// Result of a single GET, consumed immediately by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 2xx response with its body.
    Success { body: Vec<u8>, status: u16 },
    /// Non-2xx status or transport-level failure.
    Failure(FetchFailure),
}

/// Why a fetch did not produce a usable body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
}

impl FetchOutcome {
    /// Body bytes, or the failure.
    pub fn into_bytes(self) -> Result<Vec<u8>, FetchFailure> {
        match self {
            Self::Success { body, .. } => Ok(body),
            Self::Failure(failure) => Err(failure),
        }
    }

    /// Body decoded as text (lossy UTF-8), or the failure.
    pub fn into_text(self) -> Result<String, FetchFailure> {
        self.into_bytes()
            .map(|body| String::from_utf8_lossy(&body).into_owned())
    }
}
