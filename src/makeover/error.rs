/// Failures of a single redesign request.
#[derive(Debug, thiserror::Error)]
pub enum RedesignError {
    /// Caller supplied unusable input; no model call was made.
    #[error("{0}")]
    Input(String),
    #[error("{0}")]
    Configuration(String),
    #[error("The design service failed: {0}")]
    Upstream(String),
    #[error("The design service returned a response we could not understand.")]
    Unintelligible,
    #[error("The design service did not produce a redesigned image.")]
    ImageNotProduced,
}

impl RedesignError {
    pub fn is_input(&self) -> bool {
        matches!(self, RedesignError::Input(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RedesignError::Input(_) => "input",
            RedesignError::Configuration(_) => "configuration",
            RedesignError::Upstream(_) => "upstream",
            RedesignError::Unintelligible => "unintelligible",
            RedesignError::ImageNotProduced => "image_not_produced",
        }
    }
}
