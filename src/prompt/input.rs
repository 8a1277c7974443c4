use serde::Deserialize;

/// Product attributes collected per request. Free-text fields may themselves
/// hold comma-separated phrases; preset lists carry short categorical tags
/// picked in the client. `product_images` holds stored file names or URLs of
/// the uploaded reference images.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InputPrompt {
    pub product_images: Vec<String>,
    pub product_name: Option<String>,
    pub product_description: Option<String>,
    pub product_main_features: Option<String>,
    pub product_benefits: Option<String>,
    pub product_use_cases: Option<String>,
    pub product_pricing: Option<String>,
    pub product_pricing_details: Option<String>,
    pub product_pricing_features: Option<String>,
    pub product_pricing_benefits: Option<String>,
    pub product_target_audience: Option<String>,
    pub background_scene: Option<String>,
    pub composition_style: Option<String>,
    pub lighting_preferences: Option<String>,
    pub mood: Option<String>,
    pub camera_setup: Option<String>,
    pub color_palette: Option<String>,
    pub additional_modifiers: Option<String>,
    pub style_presets: Option<Vec<String>>,
    pub format_presets: Option<Vec<String>>,
    pub shot_presets: Option<Vec<String>>,
    pub lighting_presets: Option<Vec<String>>,
    pub camera_angle_presets: Option<Vec<String>>,
    pub lens_presets: Option<Vec<String>>,
    pub environment_presets: Option<Vec<String>>,
    pub color_grade_presets: Option<Vec<String>>,
    pub post_processing_presets: Option<Vec<String>>,
}
