//! Data models and structures
//!
//! Defines the plant report returned to callers, the inbound request and
//! error envelopes, and the process-wide configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const UNKNOWN: &str = "Unknown";
pub const FALLBACK_PLANT_NAME: &str = "Unknown Plant";
pub const FALLBACK_CONFIDENCE: &str = "Low";
pub const FALLBACK_SAFETY_TIP: &str = "Unable to determine safety - consult a botanist if needed";

/// Structured identification and safety report for one submitted photo.
///
/// `danger_level` is kept as an open string: the model is asked for one of
/// `Safe`, `Mildly Toxic`, `Moderately Toxic`, `Highly Toxic`, `Deadly` or
/// `Unknown`, but nothing forces it to comply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlantReport {
    pub plant_name: String,
    pub is_dangerous: bool,
    pub danger_level: String,
    pub toxic_parts: Vec<String>,
    pub symptoms: Vec<String>,
    pub safety_tips: Vec<String>,
    pub general_info: String,
    pub habitat: String,
    pub uses: String,
    pub confidence: String,
}

impl PlantReport {
    /// Report substituted when the model reply holds no usable JSON object.
    /// The raw reply is preserved verbatim in `general_info`.
    pub fn fallback(raw_text: impl Into<String>) -> Self {
        Self {
            plant_name: FALLBACK_PLANT_NAME.to_string(),
            is_dangerous: false,
            danger_level: UNKNOWN.to_string(),
            toxic_parts: Vec::new(),
            symptoms: Vec::new(),
            safety_tips: vec![FALLBACK_SAFETY_TIP.to_string()],
            general_info: raw_text.into(),
            habitat: UNKNOWN.to_string(),
            uses: UNKNOWN.to_string(),
            confidence: FALLBACK_CONFIDENCE.to_string(),
        }
    }
}

/// Inbound body of the identify call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyRequest {
    #[serde(default)]
    pub image_data: Option<String>,
}

/// Error envelope returned for every non-success response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub bind_addr: String,
    pub max_body_bytes: usize,
    pub model_timeout: Duration,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gemini_api_key = lookup("GEMINI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| crate::Error::Config("GEMINI_API_KEY not set".to_string()))?;

        let timeout_secs = parse_var(&lookup, "MODEL_TIMEOUT_SECS", DEFAULT_MODEL_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(crate::Error::Config(
                "MODEL_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            gemini_api_key,
            gemini_model: lookup("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            max_body_bytes: parse_var(&lookup, "MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?,
            model_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> crate::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| crate::Error::Config(format!("{} has invalid value '{}'", key, raw))),
        None => Ok(default),
    }
}
