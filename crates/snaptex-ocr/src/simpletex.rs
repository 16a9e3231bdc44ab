//! SimpleTex LaTeX-OCR client.
//!
//! Wire contract: multipart POST of a PNG under the `file` part with a
//! `token` authorization header. Responses are a JSON envelope —
//! `{"status": true, "res": {"latex": ..., "conf": ...}, "request_id": ...}`
//! on success, `{"status": false, "message": ...}` on failure.

use serde::Deserialize;
use tracing::debug;

use crate::{OcrError, Recognition};

pub struct SimpletexClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    status: bool,
    #[serde(default)]
    res: Option<ResBody>,
    #[serde(default)]
    request_id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResBody {
    #[serde(default)]
    latex: String,
    #[serde(default)]
    conf: f64,
}

impl SimpletexClient {
    pub fn new(http: reqwest::Client, endpoint: &str, token: &str) -> Self {
        Self {
            http,
            endpoint: endpoint.to_string(),
            token: token.to_string(),
        }
    }

    pub async fn recognize(&self, png: &[u8]) -> Result<Recognition, OcrError> {
        let part = reqwest::multipart::Part::bytes(png.to_vec())
            .file_name("formula.png")
            .mime_str("image/png")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        debug!("posting {} byte image to {}", png.len(), self.endpoint);
        let raw = self
            .http
            .post(&self.endpoint)
            .header("token", &self.token)
            .multipart(form)
            .send()
            .await?
            .text()
            .await?;

        parse_envelope(&raw)
    }
}

/// Map the response envelope to a [`Recognition`], split out from the HTTP
/// path so the contract is testable without a server.
fn parse_envelope(raw: &str) -> Result<Recognition, OcrError> {
    let envelope: Envelope = serde_json::from_str(raw)?;

    if !envelope.status {
        let message = envelope
            .message
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(OcrError::Service(message));
    }

    let res = envelope.res.unwrap_or(ResBody {
        latex: String::new(),
        conf: 0.0,
    });

    Ok(Recognition {
        latex: res.latex,
        confidence: res.conf,
        request_id: envelope.request_id.unwrap_or_default(),
    })
}
