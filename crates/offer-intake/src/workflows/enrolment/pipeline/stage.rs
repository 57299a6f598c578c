use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::collaborators::FieldIssue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineStage {
    Prepare,
    ExternalValidate,
    ExternalSubmit,
    Notify,
    ForwardFiles,
    Complete,
}

impl PipelineStage {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Prepare,
            Self::ExternalValidate,
            Self::ExternalSubmit,
            Self::Notify,
            Self::ForwardFiles,
            Self::Complete,
        ]
    }

    pub const fn id(self) -> &'static str {
        match self {
            Self::Prepare => "prepare",
            Self::ExternalValidate => "external-validate",
            Self::ExternalSubmit => "external-submit",
            Self::Notify => "notify",
            Self::ForwardFiles => "forward-files",
            Self::Complete => "complete",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Prepare => "Preparing submission data",
            Self::ExternalValidate => "Offer validation",
            Self::ExternalSubmit => "Offer submission",
            Self::Notify => "Notification workflow",
            Self::ForwardFiles => "File forwarding",
            Self::Complete => "Submission complete",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Error,
}

impl StageStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In progress",
            Self::Completed => "Completed",
            Self::Error => "Error",
        }
    }
}

/// Failure attributed to a single stage. `detail` carries field-level issues
/// reported by the validation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message}")]
pub struct StageError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Vec<FieldIssue>>,
}

impl StageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(message: impl Into<String>, detail: Vec<FieldIssue>) -> Self {
        Self {
            message: message.into(),
            detail: Some(detail),
        }
    }
}
