//! Coercion of the model's design payload into [`Product`] and
//! [`RoomDimensions`] values.
//!
//! The payload is untrusted: every field is looked up, type-checked and given
//! an explicit fallback. Key spellings the model is known to use are listed in
//! the alias tables below rather than derived from one another.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::makeover::error::RedesignError;
use crate::makeover::types::{BoundingBox, Point, Product, RoomDimensions};

pub const PRICE_PLACEHOLDER: &str = "See website";
pub const DEFAULT_STORE: &str = "Online retailer";
pub const DEFAULT_DESCRIPTION: &str = "Suggested piece for your new room.";

const IMAGE_PROMPT_KEYS: &[&str] = &["imagePrompt", "image_prompt"];
const NARRATIVE_KEYS: &[&str] = &["narrative", "designNotes", "design_notes"];
const PRODUCTS_KEYS: &[&str] = &["products"];
const DIMENSIONS_KEYS: &[&str] = &["estimatedDimensions", "estimated_dimensions", "dimensions"];
const BOUNDING_BOX_KEYS: &[&str] = &["boundingBox", "bounding_box", "bbox"];

/// Aliases for `x_min`, `y_min`, `x_max`, `y_max`, in that order.
const COORDINATE_KEYS: [&[&str]; 4] = [
    &["x_min", "xMin"],
    &["y_min", "yMin"],
    &["x_max", "xMax"],
    &["y_max", "yMax"],
];

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)\r?\n?[ \t]*```$").expect("valid regex")
});

/// Structured half of a redesign: everything the first model call yields.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignBrief {
    pub image_prompt: Option<String>,
    pub narrative: Option<String>,
    pub products: Vec<Product>,
    pub dimensions: Option<RoomDimensions>,
}

pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    match CODE_FENCE.captures(trimmed).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => trimmed,
    }
}

pub fn parse_design_brief(text: &str) -> Result<DesignBrief, RedesignError> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        debug!("Design brief response was empty");
        return Err(RedesignError::Unintelligible);
    }

    let value: Value = serde_json::from_str(body).map_err(|err| {
        debug!("Design brief response is not JSON: {}", err);
        RedesignError::Unintelligible
    })?;
    let Value::Object(payload) = value else {
        debug!("Design brief response is JSON but not an object");
        return Err(RedesignError::Unintelligible);
    };

    Ok(normalize_design_brief(&payload))
}

pub fn normalize_design_brief(payload: &Map<String, Value>) -> DesignBrief {
    DesignBrief {
        image_prompt: text_field(payload, IMAGE_PROMPT_KEYS),
        narrative: text_field(payload, NARRATIVE_KEYS),
        products: normalize_products(lookup(payload, PRODUCTS_KEYS)),
        dimensions: lookup(payload, DIMENSIONS_KEYS).and_then(normalize_dimensions),
    }
}

fn lookup<'a>(object: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
}

fn text_field(object: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    lookup(object, aliases)
        .and_then(|value| value.as_str())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Numbers and numeric strings; anything non-finite counts as absent.
fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn coerce_unit(value: &Value) -> Option<f64> {
    coerce_number(value).map(|number| number.clamp(0.0, 1.0))
}

/// Absolute web URL only. The prefix check comes first because the WHATWG
/// parser also accepts `http:host/path` and backslash forms.
pub fn valid_product_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let lowered = trimmed.get(..8).unwrap_or(trimmed).to_ascii_lowercase();
    if !(lowered.starts_with("http://") || lowered.starts_with("https://")) {
        return None;
    }
    let parsed = Url::parse(trimmed).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    parsed.host_str().filter(|host| !host.is_empty())?;
    Some(trimmed.to_string())
}

pub fn normalize_products(raw: Option<&Value>) -> Vec<Product> {
    let Some(entries) = raw.and_then(|value| value.as_array()) else {
        return Vec::new();
    };

    let mut products = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let Some(entry) = entry.as_object() else {
            debug!("Dropping product #{index}: entry is not an object");
            continue;
        };

        let name = text_field(entry, &["name"]);
        let description = text_field(entry, &["description"]);
        let raw_url = text_field(entry, &["url"]);
        if name.is_none() && description.is_none() && raw_url.is_none() {
            debug!("Dropping product #{index}: no name, description or url");
            continue;
        }
        let Some(url) = raw_url.as_deref().and_then(valid_product_url) else {
            debug!("Dropping product #{index}: invalid url {:?}", raw_url);
            continue;
        };

        let position = products.len() + 1;
        products.push(Product {
            name: name.unwrap_or_else(|| format!("Design pick {position}")),
            description: description.unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            url,
            store: text_field(entry, &["store"]).unwrap_or_else(|| DEFAULT_STORE.to_string()),
            price: normalize_price(entry.get("price")),
            bounding_box: normalize_bounding_box(entry),
            silhouette: normalize_silhouette(entry.get("silhouette")),
        });
    }

    products
}

pub fn normalize_bounding_box(entry: &Map<String, Value>) -> BoundingBox {
    let coordinates = match lookup(entry, BOUNDING_BOX_KEYS) {
        Some(Value::Object(raw)) => COORDINATE_KEYS
            .iter()
            .map(|aliases| lookup(raw, aliases).and_then(coerce_unit))
            .collect::<Option<Vec<f64>>>(),
        Some(Value::Array(raw)) if raw.len() == 4 => raw
            .iter()
            .map(coerce_unit)
            .collect::<Option<Vec<f64>>>(),
        _ => None,
    };

    match coordinates.as_deref() {
        Some(&[x_min, y_min, x_max, y_max]) => BoundingBox {
            x_min,
            y_min,
            x_max,
            y_max,
        },
        _ => BoundingBox::FULL_FRAME,
    }
}

fn normalize_silhouette(raw: Option<&Value>) -> Option<Vec<Point>> {
    let points: Vec<Point> = raw?
        .as_array()?
        .iter()
        .filter_map(|point| {
            let point = point.as_object()?;
            Some(Point {
                x: point.get("x").and_then(coerce_unit)?,
                y: point.get("y").and_then(coerce_unit)?,
            })
        })
        .collect();
    (!points.is_empty()).then_some(points)
}

pub fn normalize_price(raw: Option<&Value>) -> String {
    match raw {
        Some(Value::Number(number)) => format_price(number.as_f64()),
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                PRICE_PLACEHOLDER.to_string()
            } else if let Ok(number) = trimmed.parse::<f64>() {
                format_price(Some(number))
            } else {
                trimmed.to_string()
            }
        }
        _ => PRICE_PLACEHOLDER.to_string(),
    }
}

// Above this the cast to u64 would saturate.
const MAX_PRICE: f64 = u64::MAX as f64;

fn format_price(amount: Option<f64>) -> String {
    match amount {
        Some(amount) if amount.is_finite() && amount >= 0.0 && amount.round() < MAX_PRICE => {
            format!("${}", group_thousands(amount.round() as u64))
        }
        _ => PRICE_PLACEHOLDER.to_string(),
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// All three sides or nothing; a partially known room is reported as unknown.
pub fn normalize_dimensions(raw: &Value) -> Option<RoomDimensions> {
    let raw = raw.as_object()?;
    let side = |key: &str| {
        raw.get(key)
            .and_then(coerce_number)
            .filter(|value| *value > 0.0)
            .map(f64::round)
            .filter(|value| *value >= 1.0)
    };

    Some(RoomDimensions {
        length: side("length")?,
        width: side("width")?,
        height: side("height")?,
    })
}
