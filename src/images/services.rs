use std::path::Path;

use anyhow::Context;
use base64ct::{Base64, Encoding};
use bytes::Bytes;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// An uploaded image written to a temp file. The file is removed when this is dropped.
#[derive(Debug)]
pub struct StagedImage {
    file: NamedTempFile,
    pub content_type: String,
}

impl StagedImage {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Base64 form of an image, ready to be embedded in a model request.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub base64: String,
    pub content_type: String,
}

impl EncodedImage {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.content_type, self.base64)
    }
}

pub async fn stage_upload(
    body: Bytes,
    filename: Option<&str>,
    content_type: &str,
) -> anyhow::Result<StagedImage> {
    let suffix = filename
        .and_then(|f| Path::new(f).extension())
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .or_else(|| ext_from_mime(content_type).map(|e| format!(".{e}")))
        .unwrap_or_default();

    let file = tokio::task::spawn_blocking(move || -> anyhow::Result<NamedTempFile> {
        use std::io::Write;
        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&suffix)
            .tempfile()
            .context("create temp file")?;
        file.write_all(&body).context("write temp file")?;
        file.flush().context("flush temp file")?;
        Ok(file)
    })
    .await
    .context("staging task panicked")??;

    info!(path = %file.path().display(), "image staged");
    Ok(StagedImage {
        file,
        content_type: content_type.to_string(),
    })
}

pub async fn encode_image(staged: &StagedImage) -> anyhow::Result<EncodedImage> {
    let raw = tokio::fs::read(staged.path())
        .await
        .with_context(|| format!("read image {}", staged.path().display()))?;
    let base64 = Base64::encode_string(&raw);
    debug!(bytes = raw.len(), encoded = base64.len(), "image encoded");
    Ok(EncodedImage {
        base64,
        content_type: staged.content_type.clone(),
    })
}

pub fn is_image(content_type: &str) -> bool {
    content_type.starts_with("image/")
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}
