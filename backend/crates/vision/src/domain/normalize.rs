//! Model Output Normalization
//!
//! Models wrap JSON in code fences or chatter around it, drop fields, and
//! send `"yes"` where a boolean belongs. Everything here turns that into a
//! complete [`ListingFields`].

use kernel::fields::ListingFields;
use serde_json::{Map, Value};

use crate::error::{VisionError, VisionResult};

const FENCE: &str = "```";

/// Parse raw model text into listing fields
pub fn normalize_model_output(raw: &str) -> VisionResult<ListingFields> {
    let candidate = extract_json_text(raw);
    let parsed: Value =
        serde_json::from_str(candidate).map_err(|_| VisionError::unparsable(raw))?;
    match parsed {
        Value::Object(payload) => Ok(normalize_listing(&payload)),
        _ => Err(VisionError::unparsable(raw)),
    }
}

/// Strip a surrounding code fence and cut to the outermost `{...}`
pub fn extract_json_text(raw: &str) -> &str {
    let mut text = raw.trim();

    if text.starts_with(FENCE) {
        // Opening fence line may carry a language tag
        text = text.split_once('\n').map_or("", |(_, rest)| rest);
        if let Some((body, last)) = text.rsplit_once('\n') {
            if last.trim() == FENCE {
                text = body;
            }
        } else if text.trim() == FENCE {
            text = "";
        }
        text = text.trim();
    }

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => text,
    }
}

/// Fill every field, coercing loose model types
pub fn normalize_listing(payload: &Map<String, Value>) -> ListingFields {
    ListingFields {
        title: text_field(payload.get("title")),
        price: text_field(payload.get("price")),
        description: text_field(payload.get("description")),
        condition: text_field(payload.get("condition")),
        location: text_field(payload.get("location")),
        brand: text_field(payload.get("brand")),
        pickup_available: to_bool(payload.get("pickupAvailable")),
        shipping_available: to_bool(payload.get("shippingAvailable")),
        pickup_notes: text_field(payload.get("pickupNotes")),
    }
}

/// Loose truthiness for flags
///
/// Booleans pass through, numbers are true unless zero, and strings are
/// matched against `1/true/yes/y`. Anything else is false.
pub fn to_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(text)) => matches!(
            text.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "y"
        ),
        _ => false,
    }
}

// Empty, zero, null and structured values become ""
fn text_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) if number.as_f64().is_some_and(|n| n != 0.0) => {
            number.to_string()
        }
        _ => String::new(),
    }
}
