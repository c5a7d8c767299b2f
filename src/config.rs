use std::env;
use std::path::PathBuf;

use anyhow::Result;
use once_cell::sync::Lazy;
use tracing::warn;

use crate::imaging::upscale::MAX_DIMENSION;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub gemini_api_key: String,
    pub gemini_image_model: String,
    pub gemini_fallback_models: Vec<String>,
    pub gemini_safety_settings: String,
    pub gemini_image_size: String,
    pub gemini_aspect_ratio: String,
    pub gemini_max_attempts: usize,
    pub gemini_retry_delay_ms: u64,
    pub gemini_request_timeout_secs: u64,
    pub booth_style: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub photo_count: usize,
    pub target_width: u32,
    pub between_photo_delay_secs: u64,
    pub verify_tolerance: u8,
    pub verify_min_ratio: f32,
    pub comparison_grid: bool,
}

pub static CONFIG: Lazy<Config> =
    Lazy::new(|| Config::load().expect("Failed to load configuration"));

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .map(|value| value.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(default)
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

fn env_u8(name: &str, default: u8) -> u8 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u8>().ok())
        .unwrap_or(default)
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
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

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim().to_string())
        .filter(|entry| !entry.is_empty())
        .collect()
}

fn env_csv(name: &str, default: &str) -> Vec<String> {
    split_csv(&env::var(name).unwrap_or_else(|_| default.to_string()))
}

pub fn normalize_gemini_safety_settings(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "permissive".to_string();
    }

    let lowered = trimmed.to_lowercase();
    match lowered.as_str() {
        "permissive" | "off" | "none" => "permissive".to_string(),
        "standard" => "standard".to_string(),
        _ => {
            warn!(
                "Unknown GEMINI_SAFETY_SETTINGS value '{}'; defaulting to permissive.",
                value
            );
            "permissive".to_string()
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let verify_min_ratio = env_f32("BOOTH_VERIFY_MIN_RATIO", 0.85).clamp(0.0, 1.0);

        Ok(Config {
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            gemini_api_key: env_string("GEMINI_API_KEY", ""),
            gemini_image_model: env_string("GEMINI_IMAGE_MODEL", "gemini-3-pro-image-preview"),
            gemini_fallback_models: env_csv("GEMINI_FALLBACK_MODELS", "gemini-2.5-flash-image"),
            gemini_safety_settings: normalize_gemini_safety_settings(env_string(
                "GEMINI_SAFETY_SETTINGS",
                "permissive",
            )),
            gemini_image_size: env_string("GEMINI_IMAGE_SIZE", ""),
            gemini_aspect_ratio: env_string("GEMINI_ASPECT_RATIO", ""),
            gemini_max_attempts: env_usize("GEMINI_MAX_ATTEMPTS", 3).max(1),
            gemini_retry_delay_ms: env_u64("GEMINI_RETRY_DELAY_MS", 30_000),
            gemini_request_timeout_secs: env_u64("GEMINI_REQUEST_TIMEOUT_SECS", 180),
            booth_style: env_string("BOOTH_STYLE", "japanese").to_lowercase(),
            input_dir: PathBuf::from(env_string("BOOTH_INPUT_DIR", "input")),
            output_dir: PathBuf::from(env_string("BOOTH_OUTPUT_DIR", "output")),
            photo_count: env_usize("BOOTH_PHOTO_COUNT", 4).max(1),
            target_width: env_u32("BOOTH_TARGET_WIDTH", 2400).clamp(1, MAX_DIMENSION),
            between_photo_delay_secs: env_u64("BOOTH_BETWEEN_PHOTO_DELAY_SECS", 5),
            verify_tolerance: env_u8("BOOTH_VERIFY_TOLERANCE", 12),
            verify_min_ratio,
            comparison_grid: env_bool("BOOTH_COMPARISON_GRID", true),
        })
    }
}
