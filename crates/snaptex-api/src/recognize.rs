//! The capture → OCR → history pipeline behind `POST /api/recognize`.

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use base64::Engine;
use tracing::{info, warn};

use snaptex_ocr::{OcrClient, Recognizer};
use snaptex_types::api::{RecognizeRequest, RecognizeResponse};

use crate::{invalid, ApiError, AppState};

/// Recognize a submitted PNG, arriving either as a multipart `file` upload
/// or as a JSON base64 body from the drawing canvas. OCR failure is a render
/// state for the UI, so it comes back as `{status:false, message}` with a
/// 200, never an HTTP error; only an unusable request body is rejected
/// outright.
pub async fn recognize(
    State(state): State<AppState>,
    req: Request,
) -> Result<Json<RecognizeResponse>, ApiError> {
    let (png, image_b64) = extract_image(req).await?;
    if png.is_empty() {
        return Err(invalid("image", "image must not be empty"));
    }

    let settings = state.settings.get();
    if settings.token.is_empty() {
        return Ok(Json(RecognizeResponse::failure(
            "no API token configured — set one in settings",
        )));
    }

    let client = OcrClient::new(
        settings.provider,
        state.http.clone(),
        &settings.api_url,
        &settings.token,
    );

    let recognition = match client.recognize(&png).await {
        Ok(r) => r,
        Err(e) => {
            warn!("recognition failed: {e}");
            return Ok(Json(RecognizeResponse::failure(e.to_string())));
        }
    };

    let user = state.users.current_user();
    let record_id = match state.db.add_or_update_record(
        &image_b64,
        &recognition.latex,
        recognition.confidence,
        &recognition.request_id,
        &user.id,
    ) {
        Ok(id) => id,
        Err(e) => {
            warn!("failed to store recognition: {e:#}");
            return Ok(Json(RecognizeResponse::failure(
                "recognized, but saving to history failed",
            )));
        }
    };

    info!(
        "recognized request {} for {} (confidence {:.2})",
        recognition.request_id, user.id, recognition.confidence
    );

    Ok(Json(RecognizeResponse {
        status: true,
        record_id: Some(record_id),
        latex: Some(recognition.latex),
        confidence: Some(recognition.confidence),
        request_id: Some(recognition.request_id),
        message: None,
    }))
}

/// Pull the image bytes (and their base64 form, which is what history
/// stores) out of either accepted body shape.
async fn extract_image(req: Request) -> Result<(Vec<u8>, String), ApiError> {
    let is_multipart = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    if is_multipart {
        let mut multipart = Multipart::from_request(req, &())
            .await
            .map_err(|_| invalid("file", "malformed multipart body"))?;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|_| invalid("file", "malformed multipart body"))?
        {
            if field.name() == Some("file") {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| invalid("file", "unreadable file part"))?;
                let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
                return Ok((bytes.to_vec(), encoded));
            }
        }
        Err(invalid("file", "missing file part"))
    } else {
        let Json(body) = Json::<RecognizeRequest>::from_request(req, &())
            .await
            .map_err(|_| invalid("image", "expected JSON body with a base64 image"))?;
        let png = base64::engine::general_purpose::STANDARD
            .decode(&body.image)
            .map_err(|_| invalid("image", "image must be base64-encoded PNG"))?;
        Ok((png, body.image))
    }
}
