//! Formula recognition clients.
//!
//! Deliberately a dumb adapter: one POST, one parse, no retry and no timeout
//! policy beyond the HTTP client's defaults. Failures carry a human-readable
//! message for the UI; resilience is not this layer's job.

pub mod simpletex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use simpletex::SimpletexClient;

/// A successful transcription.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub latex: String,
    /// Service-reported confidence in 0..1.
    pub confidence: f64,
    /// Service-assigned id, unique per submission. Resubmitting the same id
    /// later overwrites the stored history row.
    pub request_id: String,
}

#[derive(Debug, Error)]
pub enum OcrError {
    /// Application-level failure flag in the response. Displays as the bare
    /// service message so it can be surfaced verbatim.
    #[error("{0}")]
    Service(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Anything that can turn a PNG into LaTeX.
pub trait Recognizer {
    fn recognize(
        &self,
        png: &[u8],
    ) -> impl Future<Output = Result<Recognition, OcrError>> + Send;
}

/// Which recognition service to talk to. Selected from settings when the
/// client is built; SimpleTex is the only implementation today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Simpletex,
}

/// Concrete client for a [`Provider`], so callers hold one type regardless
/// of which service the settings name.
pub enum OcrClient {
    Simpletex(SimpletexClient),
}

impl OcrClient {
    pub fn new(provider: Provider, http: reqwest::Client, endpoint: &str, token: &str) -> Self {
        match provider {
            Provider::Simpletex => Self::Simpletex(SimpletexClient::new(http, endpoint, token)),
        }
    }
}

impl Recognizer for OcrClient {
    async fn recognize(&self, png: &[u8]) -> Result<Recognition, OcrError> {
        match self {
            Self::Simpletex(client) => client.recognize(png).await,
        }
    }
}
