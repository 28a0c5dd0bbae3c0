//! The advisory (LLM) layer's narrow contract: narrative commentary that
//! never participates in the math, dispatched as a fire-and-forget
//! background task after the analysis artifact is durably written.

use async_trait::async_trait;
use serde_json::Value;

/// Why no real advisory artifact was produced this call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderReason {
    Disabled,
    UsageLimit,
    ValidationError,
    ApiError,
    Timeout,
}

impl PlaceholderReason {
    pub fn as_str(self) -> &'static str {
        match self {
            PlaceholderReason::Disabled => "disabled",
            PlaceholderReason::UsageLimit => "usage_limit",
            PlaceholderReason::ValidationError => "validation_error",
            PlaceholderReason::ApiError => "api_error",
            PlaceholderReason::Timeout => "timeout",
        }
    }
}

pub enum AdvisoryOutcome {
    Generated(Value),
    Placeholder(PlaceholderReason),
}

/// Implemented by an external collaborator (prompt construction, HTTP calls
/// to a model provider) that this crate does not own. The core only depends
/// on this trait's shape.
#[async_trait]
pub trait AdvisoryProvider: Send + Sync {
    async fn generate(&self, dataset_id: &str, analysis: &Value) -> AdvisoryOutcome;
}

/// The default provider when `USE_LLM` is unset or false: every call is a
/// `disabled` placeholder, with no network or provider dependency at all.
pub struct DisabledAdvisoryProvider;

#[async_trait]
impl AdvisoryProvider for DisabledAdvisoryProvider {
    async fn generate(&self, _dataset_id: &str, _analysis: &Value) -> AdvisoryOutcome {
        AdvisoryOutcome::Placeholder(PlaceholderReason::Disabled)
    }
}
