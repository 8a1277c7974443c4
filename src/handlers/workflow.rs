use std::path::Path;

use anyhow::{anyhow, Result};
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use serde::Serialize;
use tracing::{error, info};

use crate::llm::media::{download_media, ReferenceImage};
use crate::prompt::{build_photography_prompt, build_writer_brief, InputPrompt};
use crate::state::AppState;
use crate::uploads;

/// Uploaded reference images can be phone photos; keep the ceiling generous.
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

const PLACEHOLDER_IMAGE_URL: &str =
    "https://via.placeholder.com/400x400/000000/FFFFFF?text=Product+Image";

#[derive(Debug, Serialize)]
pub struct WorkflowResponse {
    pub success: bool,
    pub message: String,
    pub caption: Option<String>,
    pub image: Option<String>,
}

struct UploadedFile {
    file_name: String,
    bytes: Vec<u8>,
}

pub async fn start_workflow(
    State(state): State<AppState>,
    request: Request,
) -> Json<WorkflowResponse> {
    let (input, uploaded) = match parse_request(request).await {
        Ok(parsed) => parsed,
        Err(err) => return Json(failure_response(&err)),
    };

    match run_workflow(&state, input, uploaded).await {
        Ok((caption, image)) => Json(WorkflowResponse {
            success: true,
            message: "Content generated successfully!".to_string(),
            caption: Some(caption),
            image,
        }),
        Err(err) => {
            error!("Workflow error: {err}");
            Json(failure_response(&err))
        }
    }
}

fn failure_response(err: &anyhow::Error) -> WorkflowResponse {
    WorkflowResponse {
        success: false,
        message: format!("Failed to generate content: {err}"),
        caption: None,
        image: None,
    }
}

async fn parse_request(request: Request) -> Result<(InputPrompt, Vec<UploadedFile>)> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|err| anyhow!("invalid multipart request: {err}"))?;
        parse_multipart(multipart).await
    } else {
        let bytes = axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES)
            .await
            .map_err(|err| anyhow!("failed to read request body: {err}"))?;
        let input = serde_json::from_slice::<InputPrompt>(&bytes)
            .map_err(|err| anyhow!("invalid JSON body: {err}"))?;
        Ok((input, Vec::new()))
    }
}

async fn parse_multipart(mut multipart: Multipart) -> Result<(InputPrompt, Vec<UploadedFile>)> {
    let mut input = InputPrompt::default();
    let mut uploaded = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| anyhow!("failed to read multipart field: {err}"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "product_images" {
            let file_name = field
                .file_name()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| format!("upload-{}.bin", uploaded.len() + 1));
            let bytes = field
                .bytes()
                .await
                .map_err(|err| anyhow!("failed to read uploaded file: {err}"))?;
            if bytes.is_empty() {
                continue;
            }
            uploaded.push(UploadedFile {
                file_name,
                bytes: bytes.to_vec(),
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|err| anyhow!("failed to read form field {name}: {err}"))?;
            set_field(&mut input, &name, value);
        }
    }

    Ok((input, uploaded))
}

fn set_field(input: &mut InputPrompt, name: &str, value: String) {
    match name {
        "product_name" => input.product_name = clean_text(value),
        "product_description" => input.product_description = clean_text(value),
        "product_main_features" => input.product_main_features = clean_text(value),
        "product_benefits" => input.product_benefits = clean_text(value),
        "product_use_cases" => input.product_use_cases = clean_text(value),
        "product_pricing" => input.product_pricing = clean_text(value),
        "product_pricing_details" => input.product_pricing_details = clean_text(value),
        "product_pricing_features" => input.product_pricing_features = clean_text(value),
        "product_pricing_benefits" => input.product_pricing_benefits = clean_text(value),
        "product_target_audience" => input.product_target_audience = clean_text(value),
        "background_scene" => input.background_scene = clean_text(value),
        "composition_style" => input.composition_style = clean_text(value),
        "lighting_preferences" => input.lighting_preferences = clean_text(value),
        "mood" => input.mood = clean_text(value),
        "camera_setup" => input.camera_setup = clean_text(value),
        "color_palette" => input.color_palette = clean_text(value),
        "additional_modifiers" => input.additional_modifiers = clean_text(value),
        "style_presets" => input.style_presets = parse_preset_list(&value),
        "format_presets" => input.format_presets = parse_preset_list(&value),
        "shot_presets" => input.shot_presets = parse_preset_list(&value),
        "lighting_presets" => input.lighting_presets = parse_preset_list(&value),
        "camera_angle_presets" => input.camera_angle_presets = parse_preset_list(&value),
        "lens_presets" => input.lens_presets = parse_preset_list(&value),
        "environment_presets" => input.environment_presets = parse_preset_list(&value),
        "color_grade_presets" => input.color_grade_presets = parse_preset_list(&value),
        "post_processing_presets" => input.post_processing_presets = parse_preset_list(&value),
        _ => {}
    }
}

fn clean_text(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Preset fields arrive either as JSON-encoded arrays (the web client) or as
/// bare comma-separated strings.
fn parse_preset_list(raw: &str) -> Option<Vec<String>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let items: Vec<String> = match serde_json::from_str::<Vec<String>>(trimmed) {
        Ok(parsed) => parsed,
        Err(_) => trimmed.split(',').map(|piece| piece.to_string()).collect(),
    };

    let items: Vec<String> = items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();

    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

async fn run_workflow(
    state: &AppState,
    mut input: InputPrompt,
    uploaded: Vec<UploadedFile>,
) -> Result<(String, Option<String>)> {
    let mut references = Vec::new();
    for file in uploaded {
        let stored =
            uploads::persist_upload(&state.config.upload_dir, &file.file_name, &file.bytes).await?;
        input.product_images.push(stored);
        references.push(ReferenceImage::new(file.bytes));
    }

    let caption_client = state.caption.as_ref().ok_or_else(|| {
        anyhow!("caption backend is not configured; check the provider credentials")
    })?;

    info!(
        "Starting workflow for product: {}",
        input.product_name.as_deref().unwrap_or("(unnamed)")
    );

    let brief = build_writer_brief(&input);
    let caption = caption_client.generate_caption(&brief).await?;

    let image = match state.photographer.as_ref() {
        Some(photographer) => {
            let prompt = build_photography_prompt(&input)?;
            if references.is_empty() {
                references =
                    resolve_reference_images(&state.config.upload_dir, &input.product_images)
                        .await?;
            }
            let images = photographer.generate(&prompt, &references).await?;
            let stored = uploads::store_generated(&state.config.generated_dir, &images[0]).await?;
            info!(
                "Generated {} candidate image(s); serving {stored}",
                images.len()
            );
            Some(format!("/generated/{stored}"))
        }
        None => Some(PLACEHOLDER_IMAGE_URL.to_string()),
    };

    Ok((caption, image))
}

async fn resolve_reference_images(
    upload_dir: &Path,
    entries: &[String],
) -> Result<Vec<ReferenceImage>> {
    let mut references = Vec::new();
    for entry in entries {
        let bytes = if entry.starts_with("http://") || entry.starts_with("https://") {
            download_media(entry)
                .await
                .ok_or_else(|| anyhow!("failed to download reference image: {entry}"))?
        } else {
            uploads::read_reference(upload_dir, entry).await?
        };
        references.push(ReferenceImage::new(bytes));
    }
    Ok(references)
}
