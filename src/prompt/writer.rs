use super::input::InputPrompt;
use super::photography::sanitize;

const BRIEF_HEADER: &str = "Create engaging social media content for this product:";
const EMPTY_BRIEF: &str = "Create engaging social media content for our product";

/// Renders the product fields as labelled lines for the caption model.
/// Populated fields only; an entirely empty record falls back to a generic
/// request.
pub fn build_writer_brief(input: &InputPrompt) -> String {
    let fields: [(&str, Option<&str>); 9] = [
        ("Product Name", input.product_name.as_deref()),
        ("Product Description", input.product_description.as_deref()),
        ("Main Features", input.product_main_features.as_deref()),
        ("Benefits", input.product_benefits.as_deref()),
        ("Use Cases", input.product_use_cases.as_deref()),
        ("Pricing", input.product_pricing.as_deref()),
        ("Pricing Details", input.product_pricing_details.as_deref()),
        ("Pricing Features", input.product_pricing_features.as_deref()),
        ("Pricing Benefits", input.product_pricing_benefits.as_deref()),
    ];

    let mut query_parts: Vec<String> = Vec::new();
    for (label, value) in fields {
        let cleaned = sanitize(value);
        if !cleaned.is_empty() {
            query_parts.push(format!("{label}: {cleaned}"));
        }
    }

    if query_parts.is_empty() {
        EMPTY_BRIEF.to_string()
    } else {
        format!("{BRIEF_HEADER}\n\n{}", query_parts.join("\n"))
    }
}
