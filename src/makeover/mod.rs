pub mod error;
pub mod normalize;
pub mod prompts;
pub mod service;
pub mod types;

pub use error::RedesignError;
pub use service::redesign;
pub use types::RedesignOutcome;
