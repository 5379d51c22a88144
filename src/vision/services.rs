use tracing::{info, instrument};

use super::parsing::{extract_macros, parse_ingredients, preview, MacroAnalysis};
use super::prompts::{macros_prompt, INGREDIENTS_PROMPT};
use crate::error::AppError;
use crate::images::{encode_image, stage_upload, EncodedImage, ImageUpload};
use crate::llm::{ChatMessage, CompletionRequest, ContentPart, ImageUrl};
use crate::state::AppState;

async fn ask_about_image(st: &AppState, prompt: String, image: &EncodedImage) -> Result<String, AppError> {
    let request = CompletionRequest::new(
        st.config.llm.vision_model.clone(),
        vec![ChatMessage::user_parts(vec![
            ContentPart::Text { text: prompt },
            ContentPart::ImageUrl {
                image_url: ImageUrl { url: image.data_url() },
            },
        ])],
    );
    let completion = st.llm.complete(&request).await?;
    let text = completion
        .content
        .ok_or_else(|| AppError::malformed("llm", "vision response has no text"))?;
    info!(response = %preview(&text), "vision response received");
    Ok(text)
}

async fn prepare(upload: ImageUpload) -> Result<EncodedImage, AppError> {
    let staged = stage_upload(upload.body, upload.filename.as_deref(), &upload.content_type).await?;
    let encoded = encode_image(&staged).await?;
    Ok(encoded)
}

#[instrument(skip_all)]
pub async fn identify_ingredients(st: &AppState, upload: ImageUpload) -> Result<Vec<String>, AppError> {
    let image = prepare(upload).await?;
    let text = ask_about_image(st, INGREDIENTS_PROMPT.to_string(), &image).await?;
    let ingredients = parse_ingredients(&text);
    if ingredients.is_empty() {
        return Err(AppError::malformed("llm", "no ingredients identified in model output"));
    }
    info!(?ingredients, "identified ingredients");
    Ok(ingredients)
}

#[instrument(skip_all, fields(food_name = ?food_name))]
pub async fn analyze_macros(
    st: &AppState,
    upload: ImageUpload,
    food_name: Option<&str>,
) -> Result<MacroAnalysis, AppError> {
    let image = prepare(upload).await?;
    let text = ask_about_image(st, macros_prompt(food_name), &image).await?;
    Ok(extract_macros(&text))
}
