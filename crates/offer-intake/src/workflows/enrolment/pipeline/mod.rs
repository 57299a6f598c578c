//! Staged submission pipeline.
//!
//! prepare → external-validate → external-submit → notify → forward-files →
//! complete. Each stage starts only after the previous one completed; the
//! first failure halts the run and leaves every later stage pending.

mod collaborators;
pub mod offline;
mod run;
mod stage;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use super::clock::Clock;
use super::form::{AttachedFile, FormValues};
use super::mapper::{map_to_submission, project_flattened, validate_record, SubmissionRecord};
use super::wizard::{EnrolmentWizard, FinalCheck, WizardError};

pub use collaborators::{
    material_subject, parse_validation_errors, CollaboratorError, FieldIssue,
    FileForwardingClient, ForwardOutcome, NotificationClient, NotificationPayload,
    ServiceResponse, SubjectContext, SubmissionApiClient, ValidationApiClient, ValidationOutcome,
};
pub use run::PipelineRun;
pub use stage::{PipelineStage, StageError, StageStatus};

/// The external services a run talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub validation: Arc<dyn ValidationApiClient>,
    pub submission: Arc<dyn SubmissionApiClient>,
    pub notification: Arc<dyn NotificationClient>,
    pub files: Arc<dyn FileForwardingClient>,
}

/// Outcome of submitting straight from the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardSubmission {
    /// The final sweep failed; nothing was sent.
    Blocked(FinalCheck),
    Finished(PipelineRun),
}

pub struct SubmissionOrchestrator {
    collaborators: Collaborators,
    clock: Arc<dyn Clock>,
    updates: watch::Sender<PipelineRun>,
}

impl SubmissionOrchestrator {
    pub fn new(collaborators: Collaborators, clock: Arc<dyn Clock>) -> Self {
        let (updates, _) = watch::channel(PipelineRun::new());
        Self {
            collaborators,
            clock,
            updates,
        }
    }

    /// Progress feed; every stage transition publishes a fresh snapshot.
    pub fn subscribe(&self) -> watch::Receiver<PipelineRun> {
        self.updates.subscribe()
    }

    fn publish(&self, run: &PipelineRun) {
        self.updates.send_replace(run.clone());
    }

    fn begin(&self, run: &mut PipelineRun, stage: PipelineStage) {
        info!(stage = %stage, "stage started");
        run.begin(stage);
        self.publish(run);
    }

    fn complete(&self, run: &mut PipelineRun, stage: PipelineStage) {
        info!(stage = %stage, "stage completed");
        run.complete(stage);
        self.publish(run);
    }

    fn fail(&self, run: &mut PipelineRun, stage: PipelineStage, error: StageError) {
        warn!(stage = %stage, error = %error.message, "stage failed; halting submission");
        run.fail(stage, error);
        self.publish(run);
    }

    /// Run every stage for one attempt. Each call starts from a fresh run
    /// and maps the form once, so a retry gets a new offer id.
    pub async fn submit(&self, form: &FormValues, files: &[AttachedFile]) -> PipelineRun {
        let mut run = PipelineRun::new();
        self.publish(&run);

        let Some(record) = self.prepare(&mut run, form) else {
            return run;
        };
        if !self.external_validate(&mut run, &record).await {
            return run;
        }
        if !self.external_submit(&mut run, &record).await {
            return run;
        }
        if !self.notify(&mut run, &record, form).await {
            return run;
        }
        if !self.forward_files(&mut run, &record, form, files).await {
            return run;
        }

        self.complete(&mut run, PipelineStage::Complete);
        info!(offer_id = %record.offer_id, "submission complete");
        run
    }

    /// Sweep the wizard, submit, and reset the wizard only on full success.
    pub async fn submit_wizard(
        &self,
        wizard: &mut EnrolmentWizard,
    ) -> Result<WizardSubmission, WizardError> {
        let check = wizard.validate_all();
        if !check.is_ready() {
            info!(
                errors = check.errors.len(),
                missing_files = check.missing_files.len(),
                "submission blocked by final check"
            );
            return Ok(WizardSubmission::Blocked(check));
        }

        let run = self.submit(wizard.form(), &wizard.attached_files()).await;
        if run.is_complete() {
            wizard.reset()?;
        }
        Ok(WizardSubmission::Finished(run))
    }

    fn prepare(&self, run: &mut PipelineRun, form: &FormValues) -> Option<SubmissionRecord> {
        let stage = PipelineStage::Prepare;
        self.begin(run, stage);

        let record = map_to_submission(form, self.clock.now());
        run.offer_id = Some(record.offer_id.clone());
        let verdict = validate_record(&record);
        if !verdict.is_valid {
            let message = format!("Form validation failed: {}", verdict.messages().join(", "));
            self.fail(run, stage, StageError::new(message));
            return None;
        }

        self.complete(run, stage);
        Some(record)
    }

    async fn external_validate(&self, run: &mut PipelineRun, record: &SubmissionRecord) -> bool {
        let stage = PipelineStage::ExternalValidate;
        self.begin(run, stage);

        let client = &self.collaborators.validation;
        if !client.is_configured() {
            let error = CollaboratorError::NotConfigured {
                service: "Validation API",
            };
            self.fail(run, stage, StageError::new(error.to_string()));
            return false;
        }

        match client.validate(record).await {
            Ok(outcome) if outcome.success => {
                self.complete(run, stage);
                true
            }
            Ok(outcome) => {
                let message = if outcome.errors.is_empty() {
                    let reason = outcome
                        .message
                        .unwrap_or_else(|| format!("status {}", outcome.status));
                    format!("External validation failed: {reason}")
                } else {
                    format!("{} validation errors found", outcome.errors.len())
                };
                self.fail(run, stage, StageError::with_detail(message, outcome.errors));
                false
            }
            Err(err) => {
                self.fail(run, stage, StageError::new(err.to_string()));
                false
            }
        }
    }

    async fn external_submit(&self, run: &mut PipelineRun, record: &SubmissionRecord) -> bool {
        let stage = PipelineStage::ExternalSubmit;
        self.begin(run, stage);

        let client = &self.collaborators.submission;
        if !client.is_configured() {
            let error = CollaboratorError::NotConfigured {
                service: "Submission API",
            };
            self.fail(run, stage, StageError::new(error.to_string()));
            return false;
        }

        let reason = match client.submit(record).await {
            Ok(response) if response.success => {
                self.complete(run, stage);
                return true;
            }
            Ok(response) => response
                .message
                .unwrap_or_else(|| format!("status {}", response.status)),
            Err(err) => err.to_string(),
        };
        self.fail(
            run,
            stage,
            StageError::new(format!("Submission failed: {reason}")),
        );
        false
    }

    async fn notify(
        &self,
        run: &mut PipelineRun,
        record: &SubmissionRecord,
        form: &FormValues,
    ) -> bool {
        let stage = PipelineStage::Notify;
        self.begin(run, stage);

        let client = &self.collaborators.notification;
        if !client.is_configured() {
            let error = CollaboratorError::NotConfigured {
                service: "Notification flow",
            };
            self.fail(run, stage, StageError::new(error.to_string()));
            return false;
        }

        let payload = NotificationPayload::new(project_flattened(record), form);
        let message = match client.post(&payload).await {
            Ok(response) if response.success => {
                self.complete(run, stage);
                return true;
            }
            Ok(response) => response
                .message
                .unwrap_or_else(|| "Notification workflow failed".to_string()),
            Err(err) => err.to_string(),
        };
        self.fail(run, stage, StageError::new(message));
        false
    }

    async fn forward_files(
        &self,
        run: &mut PipelineRun,
        record: &SubmissionRecord,
        form: &FormValues,
        files: &[AttachedFile],
    ) -> bool {
        let stage = PipelineStage::ForwardFiles;
        let client = &self.collaborators.files;

        if files.is_empty() {
            info!("no documents attached; skipping file forwarding");
            self.complete(run, stage);
            return true;
        }

        self.begin(run, stage);
        if !client.is_configured() {
            info!("file forwarding not configured; skipping");
            self.complete(run, stage);
            return true;
        }

        let context = SubjectContext::for_submission(form, record.offer_id.clone());
        let message = match client.forward(files, &context).await {
            Ok(outcome) if outcome.success => {
                self.complete(run, stage);
                return true;
            }
            Ok(outcome) if !outcome.message.trim().is_empty() => outcome.message,
            Ok(_) => "File forwarding failed".to_string(),
            Err(err) => err.to_string(),
        };
        self.fail(run, stage, StageError::new(message));
        false
    }
}
