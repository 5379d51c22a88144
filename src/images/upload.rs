use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;
use tracing::info;

use super::services::is_image;
use crate::error::AppError;

/// The `file` part of a multipart upload plus any plain text fields sent with it.
#[derive(Debug)]
pub struct ImageUpload {
    pub body: Bytes,
    pub filename: Option<String>,
    pub content_type: String,
    pub fields: HashMap<String, String>,
}

impl ImageUpload {
    pub async fn from_multipart(mut mp: Multipart) -> Result<Self, AppError> {
        let mut image = None;
        let mut fields = HashMap::new();

        while let Some(field) = mp
            .next_field()
            .await
            .map_err(|e| AppError::bad_request(format!("invalid multipart body: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                let filename = field.file_name().map(str::to_string);
                let content_type = field.content_type().unwrap_or_default().to_string();
                if !is_image(&content_type) {
                    return Err(AppError::bad_request("File is not an image"));
                }
                let body = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::bad_request(format!("failed to read upload: {e}")))?;
                image = Some((body, filename, content_type));
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::bad_request(format!("failed to read field {name}: {e}")))?;
                fields.insert(name, value);
            }
        }

        let (body, filename, content_type) =
            image.ok_or_else(|| AppError::bad_request("file is required"))?;
        info!(filename = ?filename, %content_type, bytes = body.len(), "received image");
        Ok(Self {
            body,
            filename,
            content_type,
            fields,
        })
    }
}
