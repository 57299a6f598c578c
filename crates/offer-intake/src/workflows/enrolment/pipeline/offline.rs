//! Collaborators that accept everything locally and log what they would send.
//! Used for dry runs.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use super::collaborators::{
    CollaboratorError, FileForwardingClient, ForwardOutcome, NotificationClient,
    NotificationPayload, ServiceResponse, SubjectContext, SubmissionApiClient,
    ValidationApiClient, ValidationOutcome,
};
use super::stage::PipelineStage;
use crate::config::EndpointConfig;
use crate::workflows::enrolment::form::AttachedFile;
use crate::workflows::enrolment::mapper::SubmissionRecord;

/// One call observed by an offline collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfflineCall {
    pub stage: PipelineStage,
    pub summary: String,
}

/// Which collaborators count as configured. Unconfigured ones are never called.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Configured {
    validation: bool,
    submission: bool,
    notification: bool,
    forwarding: bool,
}

#[derive(Debug, Default)]
pub struct OfflineCollaborator {
    configured: Configured,
    calls: Mutex<Vec<OfflineCall>>,
}

impl OfflineCollaborator {
    /// Mirror the endpoints present in `endpoints`.
    pub fn from_endpoints(endpoints: &EndpointConfig) -> Self {
        Self::with(Configured {
            validation: endpoints.validation_configured(),
            submission: endpoints.submission_configured(),
            notification: endpoints.notification_configured(),
            forwarding: endpoints.file_forwarding_configured(),
        })
    }

    pub fn all_configured() -> Self {
        Self::with(Configured {
            validation: true,
            submission: true,
            notification: true,
            forwarding: true,
        })
    }

    fn with(configured: Configured) -> Self {
        Self {
            configured,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<OfflineCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, stage: PipelineStage, summary: String) {
        info!(stage = %stage, %summary, "offline collaborator called");
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(OfflineCall { stage, summary });
    }
}

#[async_trait]
impl ValidationApiClient for OfflineCollaborator {
    fn is_configured(&self) -> bool {
        self.configured.validation
    }

    async fn validate(
        &self,
        record: &SubmissionRecord,
    ) -> Result<ValidationOutcome, CollaboratorError> {
        self.record(
            PipelineStage::ExternalValidate,
            format!("validate {}", record.offer_id),
        );
        Ok(ValidationOutcome {
            success: true,
            status: 200,
            errors: Vec::new(),
            message: None,
        })
    }
}

#[async_trait]
impl SubmissionApiClient for OfflineCollaborator {
    fn is_configured(&self) -> bool {
        self.configured.submission
    }

    async fn submit(&self, record: &SubmissionRecord) -> Result<ServiceResponse, CollaboratorError> {
        self.record(
            PipelineStage::ExternalSubmit,
            format!("submit {}", record.offer_id),
        );
        Ok(ServiceResponse::accepted(
            201,
            json!({ "OfferId": record.offer_id }),
        ))
    }
}

#[async_trait]
impl NotificationClient for OfflineCollaborator {
    fn is_configured(&self) -> bool {
        self.configured.notification
    }

    async fn post(
        &self,
        payload: &NotificationPayload,
    ) -> Result<ServiceResponse, CollaboratorError> {
        self.record(
            PipelineStage::Notify,
            format!("notify {}", payload.record.offer_id),
        );
        Ok(ServiceResponse::accepted(202, json!({})))
    }
}

#[async_trait]
impl FileForwardingClient for OfflineCollaborator {
    fn is_configured(&self) -> bool {
        self.configured.forwarding
    }

    async fn forward(
        &self,
        files: &[AttachedFile],
        context: &SubjectContext,
    ) -> Result<ForwardOutcome, CollaboratorError> {
        self.record(
            PipelineStage::ForwardFiles,
            format!("forward {} file(s) as \"{}\"", files.len(), context.subject),
        );
        Ok(ForwardOutcome {
            success: true,
            message: format!("{} file(s) forwarded", files.len()),
        })
    }
}
