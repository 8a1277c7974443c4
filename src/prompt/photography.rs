use crate::error::{Result, WorkflowError};

use super::input::InputPrompt;

const DEFAULT_SCENE: &str = "a clean, contemporary setting";
const CLOSING_INSTRUCTION: &str = "Use the provided reference imagery only to preserve authentic form, materials, and branding without revealing the originals.";

/// Collapses internal whitespace and trims the ends; absent or
/// whitespace-only input becomes the empty string.
pub(crate) fn sanitize(text: Option<&str>) -> String {
    match text {
        Some(value) => value.split_whitespace().collect::<Vec<_>>().join(" "),
        None => String::new(),
    }
}

/// One input feeding a merged phrase set: either a free-text field (itself a
/// possible comma list) or a preset-tag list.
pub(crate) enum Source<'a> {
    Field(Option<&'a str>),
    Tags(Option<&'a [String]>),
}

/// Splits every source on commas, trims each piece, and merges the results
/// into one ordered set. First occurrence wins; order of first appearance is
/// preserved; matching is case-sensitive and exact.
pub(crate) fn collect_phrases(sources: &[Source<'_>]) -> Vec<String> {
    let mut phrases: Vec<String> = Vec::new();
    for source in sources {
        let chunks: Vec<&str> = match source {
            Source::Field(Some(text)) => vec![*text],
            Source::Tags(Some(items)) => items.iter().map(String::as_str).collect(),
            _ => continue,
        };
        for chunk in chunks {
            for piece in chunk.split(',') {
                let candidate = piece.trim();
                if candidate.is_empty() {
                    continue;
                }
                if !phrases.iter().any(|existing| existing == candidate) {
                    phrases.push(candidate.to_string());
                }
            }
        }
    }
    phrases
}

/// Assembles the image-generation prompt. Pure and deterministic: the same
/// input always yields byte-identical output.
pub fn build_photography_prompt(input: &InputPrompt) -> Result<String> {
    if input.product_images.is_empty() {
        return Err(WorkflowError::Validation(
            "at least one reference image is required".to_string(),
        ));
    }

    let product_name = {
        let cleaned = sanitize(input.product_name.as_deref());
        if cleaned.is_empty() {
            "the product".to_string()
        } else {
            cleaned
        }
    };
    let description = sanitize(input.product_description.as_deref());
    let features = sanitize(input.product_main_features.as_deref());
    let benefits = sanitize(input.product_benefits.as_deref());
    let use_cases = sanitize(input.product_use_cases.as_deref());
    let pricing = sanitize(input.product_pricing.as_deref());
    let pricing_details = sanitize(input.product_pricing_details.as_deref());
    let pricing_features = sanitize(input.product_pricing_features.as_deref());
    let pricing_benefits = sanitize(input.product_pricing_benefits.as_deref());
    let target_audience = sanitize(input.product_target_audience.as_deref());

    let environment_tags = collect_phrases(&[Source::Tags(input.environment_presets.as_deref())]);

    let background_scene = {
        let cleaned = sanitize(input.background_scene.as_deref());
        if !cleaned.is_empty() {
            cleaned
        } else if !use_cases.is_empty() {
            use_cases.clone()
        } else if let Some(first) = environment_tags.first() {
            first.clone()
        } else {
            DEFAULT_SCENE.to_string()
        }
    };

    let subject = if description.is_empty() {
        product_name
    } else {
        format!("{product_name}, {description}")
    };

    let style_tags = collect_phrases(&[
        Source::Tags(input.style_presets.as_deref()),
        Source::Field(input.composition_style.as_deref()),
        Source::Field(input.mood.as_deref()),
        Source::Field(input.additional_modifiers.as_deref()),
    ]);

    let lighting_tags = collect_phrases(&[
        Source::Field(input.lighting_preferences.as_deref()),
        Source::Tags(input.lighting_presets.as_deref()),
    ]);

    let camera_tags = collect_phrases(&[
        Source::Field(input.camera_setup.as_deref()),
        Source::Tags(input.camera_angle_presets.as_deref()),
        Source::Tags(input.lens_presets.as_deref()),
    ]);

    let color_tags = collect_phrases(&[
        Source::Field(input.color_palette.as_deref()),
        Source::Tags(input.color_grade_presets.as_deref()),
    ]);

    let format_tags = collect_phrases(&[
        Source::Tags(input.format_presets.as_deref()),
        Source::Tags(input.shot_presets.as_deref()),
    ]);

    let post_process_tags =
        collect_phrases(&[Source::Tags(input.post_processing_presets.as_deref())]);

    let mut narrative_tags = collect_phrases(&[Source::Field(Some(target_audience.as_str()))]);
    if !pricing.is_empty() {
        narrative_tags.push(pricing);
    }
    if !pricing_details.is_empty() {
        narrative_tags.push(pricing_details);
    }

    let mut supporting_details: Vec<String> = Vec::new();
    if !features.is_empty() {
        supporting_details.push(format!("Highlight key features: {features}."));
    }
    if !benefits.is_empty() {
        supporting_details.push(format!("Showcase benefits: {benefits}."));
    }

    let value_tags = collect_phrases(&[
        Source::Field(Some(pricing_features.as_str())),
        Source::Field(Some(pricing_benefits.as_str())),
    ]);
    if !value_tags.is_empty() {
        supporting_details.push(format!(
            "Reinforce value proposition: {}.",
            value_tags.join(", ")
        ));
    }

    if !narrative_tags.is_empty() {
        supporting_details.push(format!("Align messaging with {}.", narrative_tags.join(", ")));
    }

    if !environment_tags.is_empty() {
        supporting_details.push(format!("Environment cues: {}.", environment_tags.join(", ")));
    }

    if !lighting_tags.is_empty() {
        supporting_details.push(format!("Lighting: {}.", lighting_tags.join(", ")));
    }

    if !camera_tags.is_empty() {
        supporting_details.push(format!("Camera and lens: {}.", camera_tags.join(", ")));
    }

    if !style_tags.is_empty() {
        supporting_details.push(format!("Styling cues: {}.", style_tags.join(", ")));
    }

    if !format_tags.is_empty() {
        supporting_details.push(format!(
            "Framing preferences: {}.",
            format_tags.join(", ")
        ));
    }

    if !color_tags.is_empty() {
        supporting_details.push(format!("Color treatment: {}.", color_tags.join(", ")));
    }

    if !post_process_tags.is_empty() {
        supporting_details.push(format!("Post-processing: {}.", post_process_tags.join(", ")));
    }

    let mut prompt_lines = vec![
        format!("Create a professional product photograph of {subject}."),
        format!("Set the scene in {background_scene}."),
    ];
    prompt_lines.extend(supporting_details);
    prompt_lines.push(CLOSING_INSTRUCTION.to_string());

    Ok(prompt_lines.join("\n"))
}
