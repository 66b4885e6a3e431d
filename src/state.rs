use serde::Serialize;

use crate::makeover::error::RedesignError;
use crate::makeover::types::{Product, RedesignOutcome, RoomDimensions};
use crate::utils::data_uri::DataUri;

pub const MISSING_INPUT_MESSAGE: &str = "Please provide an image and a style prompt.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppStep {
    SelectMode,
    ProvideInput,
    ProvidePrompt,
    Generating,
    ShowResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    Upload,
    Live,
}

/// What a redesign call needs, split out of the session's data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationInput {
    pub image_base64: String,
    pub mime_type: String,
    pub prompt: String,
}

/// One user's makeover session. Lives only in memory and is replaced whole on
/// start-over.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub step: AppStep,
    pub input_mode: Option<InputMode>,
    pub prompt: String,
    pub original_image: Option<String>,
    pub redesigned_image: Option<String>,
    pub products: Vec<Product>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub estimated_dimensions: Option<RoomDimensions>,
}

impl Default for AppState {
    fn default() -> Self {
        AppState {
            step: AppStep::SelectMode,
            input_mode: None,
            prompt: String::new(),
            original_image: None,
            redesigned_image: None,
            products: Vec::new(),
            is_loading: false,
            error: None,
            estimated_dimensions: None,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        AppState::default()
    }

    pub fn select_mode(&mut self, mode: InputMode) {
        self.step = AppStep::ProvideInput;
        self.input_mode = Some(mode);
        self.error = None;
    }

    pub fn image_ready(&mut self, image: &DataUri) {
        self.step = AppStep::ProvidePrompt;
        self.original_image = Some(image.to_string());
        self.error = None;
    }

    /// Capture failures keep the user on the input step.
    pub fn capture_failed(&mut self, message: &str) {
        self.error = Some(message.to_string());
    }

    pub fn set_prompt(&mut self, prompt: &str) {
        self.prompt = prompt.to_string();
    }

    /// Moves to GENERATING if an image and a non-blank prompt are present.
    pub fn begin_generation(&mut self) -> Result<GenerationInput, RedesignError> {
        let image = self
            .original_image
            .as_deref()
            .filter(|_| !self.prompt.trim().is_empty())
            .map(DataUri::parse);

        let image = match image {
            Some(Ok(image)) => image,
            Some(Err(err)) => {
                self.error = Some(format!("The captured image is unusable: {err}."));
                return Err(RedesignError::Input(err.to_string()));
            }
            None => {
                self.error = Some(MISSING_INPUT_MESSAGE.to_string());
                return Err(RedesignError::Input(MISSING_INPUT_MESSAGE.to_string()));
            }
        };

        self.is_loading = true;
        self.error = None;
        self.step = AppStep::Generating;

        Ok(GenerationInput {
            image_base64: image.payload().to_string(),
            mime_type: image.mime_type().to_string(),
            prompt: self.prompt.clone(),
        })
    }

    pub fn complete(&mut self, outcome: RedesignOutcome) {
        self.redesigned_image = Some(outcome.redesigned_image);
        self.products = outcome.products;
        self.estimated_dimensions = outcome.estimated_dimensions;
        self.is_loading = false;
        self.step = AppStep::ShowResult;
    }

    /// Returns to the prompt step; image and prompt are kept for a retry.
    pub fn fail(&mut self, err: &RedesignError) {
        self.is_loading = false;
        self.error = Some(format!("Failed to generate redesign. {err}"));
        self.step = AppStep::ProvidePrompt;
    }

    pub fn start_over(&mut self) {
        *self = AppState::default();
    }
}
