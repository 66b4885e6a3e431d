use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use tracing::warn;

pub const PLACEHOLDER_API_KEY: &str = "PLACEHOLDER_API_KEY";

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub log_dir: PathBuf,
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub gemini_brief_model: String,
    pub gemini_image_model: String,
    pub gemini_temperature: f32,
    pub gemini_max_output_tokens: i32,
    pub gemini_safety_settings: String,
    pub gemini_timeout_seconds: u64,
    pub server_host: String,
    pub server_port: u16,
    pub max_request_bytes: usize,
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_f32(name: &str, default: f32) -> f32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<f32>().ok())
        .unwrap_or(default)
}

fn env_i32(name: &str, default: i32) -> i32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<i32>().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(default)
}

fn normalize_gemini_safety_settings(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "standard".to_string();
    }

    let lowered = trimmed.to_lowercase();
    match lowered.as_str() {
        "permissive" | "off" | "none" => "permissive".to_string(),
        "standard" | "default" | "medium" => "standard".to_string(),
        _ => {
            warn!(
                "Unknown GEMINI_SAFETY_SETTINGS value '{}', using standard thresholds.",
                trimmed
            );
            "standard".to_string()
        }
    }
}

fn normalize_base_url(value: String) -> String {
    value.trim().trim_end_matches('/').to_string()
}

/// Returns true when the credential is missing or still the template placeholder.
pub fn is_unusable_api_key(key: &str) -> bool {
    let key = key.trim();
    key.is_empty() || key == PLACEHOLDER_API_KEY
}

impl Config {
    pub fn load() -> Result<Self> {
        let port = env_string("SERVER_PORT", "8080");
        let server_port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| anyhow!("Invalid SERVER_PORT value: {port}"))?;

        Ok(Config {
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            log_dir: PathBuf::from(env_string("LOG_DIR", "logs")),
            gemini_api_key: env_string("GEMINI_API_KEY", "").trim().to_string(),
            gemini_base_url: normalize_base_url(env_string(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com/v1beta",
            )),
            gemini_brief_model: env_string("GEMINI_BRIEF_MODEL", "gemini-2.5-flash"),
            gemini_image_model: env_string("GEMINI_IMAGE_MODEL", "gemini-2.5-flash-image"),
            gemini_temperature: env_f32("GEMINI_TEMPERATURE", 0.4),
            gemini_max_output_tokens: env_i32("GEMINI_MAX_OUTPUT_TOKENS", 4096),
            gemini_safety_settings: normalize_gemini_safety_settings(env_string(
                "GEMINI_SAFETY_SETTINGS",
                "standard",
            )),
            gemini_timeout_seconds: env_u64("GEMINI_TIMEOUT_SECONDS", 120).max(1),
            server_host: env_string("SERVER_HOST", "0.0.0.0"),
            server_port,
            max_request_bytes: env_usize("MAX_REQUEST_BYTES", 20 * 1024 * 1024).max(1024),
        })
    }
}

#[cfg(test)]
impl Config {
    /// Configuration pointing the Gemini client at a local mock server.
    pub fn for_tests(base_url: &str) -> Self {
        Config {
            log_level: "debug".to_string(),
            log_dir: PathBuf::from("logs"),
            gemini_api_key: "test-key".to_string(),
            gemini_base_url: normalize_base_url(base_url.to_string()),
            gemini_brief_model: "brief-model".to_string(),
            gemini_image_model: "image-model".to_string(),
            gemini_temperature: 0.4,
            gemini_max_output_tokens: 1024,
            gemini_safety_settings: "standard".to_string(),
            gemini_timeout_seconds: 5,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            max_request_bytes: 1024 * 1024,
        }
    }
}
