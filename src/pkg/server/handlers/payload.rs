use axum::{
    Form,
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use serde_json::{Map, Value};

use crate::{
    pkg::internal::{jobs::JobFields, posters::PosterUpload},
    prelude::{AppError, FieldErrors, Result},
};

/// Job fields plus an optional poster, read from a JSON body, a urlencoded
/// form or a `multipart/form-data` form.
#[derive(Debug, Default)]
pub struct JobPayload {
    pub fields: JobFields,
    pub poster: Option<PosterUpload>,
}

impl JobPayload {
    pub async fn extract(request: Request) -> Result<Self> {
        let content_type = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(request, &())
                .await
                .map_err(|e| AppError::invalid_body(e.body_text()))?;
            Self::from_multipart(multipart).await
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(values) = Form::<Map<String, Value>>::from_request(request, &())
                .await
                .map_err(|e| AppError::invalid_body(e.body_text()))?;
            Ok(JobPayload {
                fields: JobFields::from_map(values),
                poster: None,
            })
        } else {
            let body = Bytes::from_request(request, &())
                .await
                .map_err(|e| AppError::invalid_body(e.body_text()))?;
            Self::from_json(&body)
        }
    }

    fn from_json(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(JobPayload::default());
        }
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| AppError::invalid_body(format!("Malformed JSON body: {}", e)))?;
        let Value::Object(values) = value else {
            return Err(AppError::invalid_body("The request body must be a JSON object."));
        };
        Ok(JobPayload {
            fields: JobFields::from_map(values),
            poster: None,
        })
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self> {
        let mut values = Map::new();
        let mut poster = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::invalid_body(e.body_text()))?
        {
            let name = field.name().unwrap_or("").to_string();
            if name == "poster" {
                let file_name = field
                    .file_name()
                    .filter(|n| !n.is_empty())
                    .map(str::to_string);
                let data = field.bytes().await.map_err(|_| {
                    AppError::Validation(FieldErrors::single("poster", "The poster failed to upload."))
                })?;
                // browsers send an empty, unnamed part for an untouched file input
                if file_name.is_some() || !data.is_empty() {
                    poster = Some(PosterUpload::new(data, file_name));
                }
            } else if JobFields::accepts(&name) {
                let text = field.text().await.map_err(|e| {
                    AppError::Validation(FieldErrors::single(&name, e.body_text()))
                })?;
                values.insert(name, Value::String(text));
            } else {
                let _ = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::invalid_body(e.body_text()))?;
            }
        }
        Ok(JobPayload {
            fields: JobFields::from_map(values),
            poster,
        })
    }
}
