use serde_json::{json, Value};

pub fn design_brief_instruction(style_prompt: &str) -> String {
    format!(
        "You are an interior design expert. Study the attached photo of a room and plan a \
redesign in this style: \"{style}\".

Respond with JSON only:
- imagePrompt: a concise rendering brief (under 120 words) describing the redesigned room, \
its palette, materials, lighting and the furniture that should appear.
- narrative: two or three sentences explaining the design choices.
- estimatedDimensions: your best estimate of the room's length, width and height in feet.
- products: three to six real furniture or decor items that would appear in the redesign. \
For each give name, description, an absolute https product url from a real retailer, store, \
price in US dollars, and boundingBox with x_min, y_min, x_max, y_max as fractions (0 to 1) \
of the image width and height locating where the item will sit in the room.",
        style = style_prompt.trim()
    )
}

pub fn render_instruction(design_brief: &str) -> String {
    format!(
        "Redesign the room in the attached photo. {brief}

Keep the same camera perspective, room layout, windows and doors. Produce exactly one \
photorealistic image. Do not add text, captions, labels or watermarks.",
        brief = design_brief.trim()
    )
}

fn coordinate() -> Value {
    json!({ "type": "NUMBER", "minimum": 0, "maximum": 1 })
}

/// Response schema for the structured design-brief call.
pub fn design_brief_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "imagePrompt": { "type": "STRING" },
            "narrative": { "type": "STRING" },
            "estimatedDimensions": {
                "type": "OBJECT",
                "properties": {
                    "length": { "type": "NUMBER" },
                    "width": { "type": "NUMBER" },
                    "height": { "type": "NUMBER" }
                },
                "required": ["length", "width", "height"]
            },
            "products": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "description": { "type": "STRING" },
                        "url": { "type": "STRING" },
                        "store": { "type": "STRING" },
                        "price": { "type": "STRING" },
                        "boundingBox": {
                            "type": "OBJECT",
                            "properties": {
                                "x_min": coordinate(),
                                "y_min": coordinate(),
                                "x_max": coordinate(),
                                "y_max": coordinate()
                            },
                            "required": ["x_min", "y_min", "x_max", "y_max"]
                        }
                    },
                    "required": ["name", "description", "url"]
                }
            }
        },
        "required": ["imagePrompt", "products"]
    })
}
