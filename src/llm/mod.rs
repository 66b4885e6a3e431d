pub mod gemini;
pub mod media;
#[cfg(test)]
pub mod mock;

pub use gemini::GeminiClient;
