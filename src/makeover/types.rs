use serde::{Deserialize, Serialize};

/// Normalized object location, each coordinate a fraction of the image size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingBox {
    pub const FULL_FRAME: BoundingBox = BoundingBox {
        x_min: 0.0,
        y_min: 0.0,
        x_max: 1.0,
        y_max: 1.0,
    };
}

impl Default for BoundingBox {
    fn default() -> Self {
        BoundingBox::FULL_FRAME
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub name: String,
    pub description: String,
    pub url: String,
    pub store: String,
    pub price: String,
    pub bounding_box: BoundingBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silhouette: Option<Vec<Point>>,
}

/// Room size in whole feet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomDimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedesignOutcome {
    /// `data:<mime>;base64,<payload>`
    pub redesigned_image: String,
    pub products: Vec<Product>,
    pub estimated_dimensions: Option<RoomDimensions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_notes: Option<String>,
}
