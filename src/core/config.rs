//! Process-environment configuration.
//!
//! The environment inputs (`USE_LLM`, `LLM_PROVIDER`, `LLM_MODEL`,
//! `*_API_KEY`, `API_KEY`, `ALLOWED_ORIGINS`, `MAX_FILE_SIZE_MB`,
//! `DEFAULT_THRESHOLDS`, `DATASETS_PATH`) are read once, at process start, by
//! whatever binary wires this crate to an HTTP server. This type is that
//! read: plain `std::env::var` lookups with documented defaults, no
//! config-loading crate — the surface is small enough that one doesn't earn
//! its keep here.

use std::path::PathBuf;

use super::error::CoreError;

pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 25;
pub const DEFAULT_THRESHOLDS: &[u32] = &[10, 20, 50];
pub const DEFAULT_LARGE_DATASET_THRESHOLD: usize = 10_000;
pub const DEFAULT_ADVISORY_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ADVISORY_BUDGET_PER_DATASET: u32 = 10;
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 60;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub use_llm: bool,
    pub llm_provider: Option<String>,
    pub llm_model: Option<String>,
    pub api_key: Option<String>,
    pub allowed_origins: Vec<String>,
    pub max_file_size_bytes: u64,
    pub default_thresholds: Vec<u32>,
    pub datasets_path: PathBuf,
    pub large_dataset_threshold: usize,
    pub advisory_timeout_secs: u64,
    pub advisory_budget_per_dataset: u32,
    pub rate_limit_per_minute: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            use_llm: true,
            llm_provider: None,
            llm_model: None,
            api_key: None,
            allowed_origins: Vec::new(),
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_MB * 1024 * 1024,
            default_thresholds: DEFAULT_THRESHOLDS.to_vec(),
            datasets_path: PathBuf::from("./datasets"),
            large_dataset_threshold: DEFAULT_LARGE_DATASET_THRESHOLD,
            advisory_timeout_secs: DEFAULT_ADVISORY_TIMEOUT_SECS,
            advisory_budget_per_dataset: DEFAULT_ADVISORY_BUDGET_PER_DATASET,
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
        }
    }
}

impl EngineConfig {
    /// Read configuration from the process environment, falling back to
    /// documented defaults for anything unset.
    pub fn from_env() -> Result<Self, CoreError> {
        let mut config = EngineConfig::default();

        if let Ok(v) = std::env::var("USE_LLM") {
            config.use_llm = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("LLM_PROVIDER") {
            config.llm_provider = Some(v);
        }
        if let Ok(v) = std::env::var("LLM_MODEL") {
            config.llm_model = Some(v);
        }
        if let Ok(v) = std::env::var("API_KEY") {
            config.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("ALLOWED_ORIGINS") {
            config.allowed_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = std::env::var("MAX_FILE_SIZE_MB") {
            let mb: u64 = v
                .parse()
                .map_err(|_| CoreError::Validation(format!("MAX_FILE_SIZE_MB must be an integer, got '{v}'")))?;
            config.max_file_size_bytes = mb * 1024 * 1024;
        }
        if let Ok(v) = std::env::var("DEFAULT_THRESHOLDS") {
            config.default_thresholds = v
                .split(',')
                .map(|s| {
                    s.trim()
                        .parse::<u32>()
                        .map_err(|_| CoreError::Validation(format!("DEFAULT_THRESHOLDS must be a comma-separated integer list, got '{v}'")))
                })
                .collect::<Result<Vec<_>, _>>()?;
        }
        if let Ok(v) = std::env::var("DATASETS_PATH") {
            config.datasets_path = PathBuf::from(v);
        }

        Ok(config)
    }
}

fn parse_bool(raw: &str) -> bool {
    !matches!(raw.to_ascii_lowercase().as_str(), "false" | "0" | "no" | "off" | "")
}
