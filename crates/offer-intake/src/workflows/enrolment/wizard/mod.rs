//! Four-step enrolment wizard.
//!
//! The wizard owns the form values, the set of completed steps, and the
//! draft written to its [`DraftStore`]. Advancing is gated on every effective
//! field of the current step passing validation.

mod autosave;
mod draft;
mod steps;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::form::{AttachedFile, DocumentSlot, FormValues};
use super::validation::{FieldRegistry, ValidationError};

pub use autosave::{spawn_autosave, AutosaveHandle, SharedWizard};
pub use draft::{Draft, DraftStore, DraftStoreError, JsonFileDraftStore, MemoryDraftStore};
pub use steps::{ConditionalFields, StepBlueprint, StepDefinition};

pub const FIRST_STEP: u8 = 1;

pub fn default_draft_expiry() -> Duration {
    Duration::hours(24)
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("step {step} does not exist")]
    StepOutOfRange { step: u8 },
    #[error("step {step} cannot be opened before the steps leading to it are completed")]
    StepLocked { step: u8 },
    #[error(transparent)]
    Draft(#[from] DraftStoreError),
}

/// What happened to the stored draft when the wizard started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    Fresh,
    Restored { saved_at: DateTime<Utc> },
    Expired { saved_at: DateTime<Utc> },
    Unreadable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Advanced { to: u8 },
    /// The step stays open; `focus` is the first failing field.
    Blocked {
        errors: Vec<ValidationError>,
        focus: String,
    },
    /// The last step passed; the application can be submitted.
    ReadyForSubmission,
}

/// Result of the pre-submission sweep over every step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalCheck {
    pub errors: Vec<ValidationError>,
    pub missing_files: Vec<DocumentSlot>,
}

impl FinalCheck {
    pub fn is_ready(&self) -> bool {
        self.errors.is_empty() && self.missing_files.is_empty()
    }

    pub fn missing_file_labels(&self) -> Vec<&'static str> {
        self.missing_files.iter().map(|slot| slot.label()).collect()
    }
}

pub struct EnrolmentWizard {
    registry: FieldRegistry,
    blueprint: StepBlueprint,
    store: Arc<dyn DraftStore>,
    clock: Arc<dyn Clock>,
    draft_expiry: Duration,
    current: u8,
    completed: BTreeSet<u8>,
    form: FormValues,
    files: BTreeMap<DocumentSlot, AttachedFile>,
    interacted: bool,
}

impl EnrolmentWizard {
    pub fn new(store: Arc<dyn DraftStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            registry: FieldRegistry::standard(),
            blueprint: StepBlueprint::standard(),
            store,
            clock,
            draft_expiry: default_draft_expiry(),
            current: FIRST_STEP,
            completed: BTreeSet::new(),
            form: FormValues::new(),
            files: BTreeMap::new(),
            interacted: false,
        }
    }

    pub fn with_draft_expiry(mut self, expiry: std::time::Duration) -> Self {
        self.draft_expiry = Duration::from_std(expiry).unwrap_or_else(|_| default_draft_expiry());
        self
    }

    /// Load the stored draft once. Drafts past their expiry are dropped from
    /// the store and never applied; unreadable drafts are ignored.
    pub fn initialize(&mut self) -> RestoreOutcome {
        let draft = match self.store.get() {
            Ok(Some(draft)) => draft,
            Ok(None) => return RestoreOutcome::Fresh,
            Err(err) => {
                warn!(error = %err, "stored draft unreadable; starting fresh");
                return RestoreOutcome::Unreadable;
            }
        };

        let now = self.clock.now();
        if draft.is_expired(now, self.draft_expiry) {
            info!(saved_at = %draft.saved_at, "discarding expired draft");
            if let Err(err) = self.store.clear() {
                warn!(error = %err, "failed to clear expired draft");
            }
            return RestoreOutcome::Expired {
                saved_at: draft.saved_at,
            };
        }

        let last = self.last_step();
        self.current = draft.step_index.clamp(FIRST_STEP, last);
        self.completed = draft
            .completed_steps
            .into_iter()
            .filter(|step| (FIRST_STEP..=last).contains(step))
            .collect();
        self.form = draft.form_values;
        self.interacted = true;
        info!(step = self.current, saved_at = %draft.saved_at, "draft restored");
        RestoreOutcome::Restored {
            saved_at: draft.saved_at,
        }
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn blueprint(&self) -> &StepBlueprint {
        &self.blueprint
    }

    pub fn current_step(&self) -> u8 {
        self.current
    }

    pub fn last_step(&self) -> u8 {
        self.blueprint.len()
    }

    pub fn completed_steps(&self) -> &BTreeSet<u8> {
        &self.completed
    }

    pub fn is_step_completed(&self, step: u8) -> bool {
        self.completed.contains(&step)
    }

    pub fn form(&self) -> &FormValues {
        &self.form
    }

    pub fn set_value(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.form.set(name, value);
        self.interacted = true;
    }

    pub fn clear_value(&mut self, name: &str) {
        self.form.remove(name);
        self.interacted = true;
    }

    pub fn attach(&mut self, file: AttachedFile) {
        self.files.insert(file.slot, file);
        self.interacted = true;
    }

    pub fn detach(&mut self, slot: DocumentSlot) -> Option<AttachedFile> {
        self.files.remove(&slot)
    }

    pub fn attached_files(&self) -> Vec<AttachedFile> {
        self.files.values().cloned().collect()
    }

    fn ensure_step(&self, step: u8) -> Result<(), WizardError> {
        if (FIRST_STEP..=self.last_step()).contains(&step) {
            Ok(())
        } else {
            Err(WizardError::StepOutOfRange { step })
        }
    }

    /// Fields shown on `step` for the current answers, in registry order.
    pub fn effective_fields(&self, step: u8) -> Result<Vec<&'static str>, WizardError> {
        let definition = self
            .blueprint
            .step(step)
            .ok_or(WizardError::StepOutOfRange { step })?;
        let mut fields = definition.effective_fields(&self.form);
        self.sort_by_declaration(&mut fields);
        Ok(fields)
    }

    fn sort_by_declaration(&self, fields: &mut [&'static str]) {
        let position = |name: &str| {
            self.registry
                .fields()
                .iter()
                .position(|field| field.name == name)
                .unwrap_or(usize::MAX)
        };
        fields.sort_by_key(|name| position(name));
    }

    pub fn validate_step(&self, step: u8) -> Result<Vec<ValidationError>, WizardError> {
        let fields = self.effective_fields(step)?;
        Ok(self
            .registry
            .validate_fields(fields, &self.form, self.clock.today()))
    }

    /// Validate the open step and move forward when it passes.
    pub fn advance(&mut self) -> Result<Advance, WizardError> {
        let errors = self.validate_step(self.current)?;
        if let Some(first) = errors.first() {
            let focus = first.field.clone();
            debug!(
                step = self.current,
                failing = errors.len(),
                focus = %focus,
                "step blocked by validation"
            );
            return Ok(Advance::Blocked { errors, focus });
        }

        self.completed.insert(self.current);
        self.interacted = true;
        if self.current == self.last_step() {
            self.persist()?;
            return Ok(Advance::ReadyForSubmission);
        }

        self.current += 1;
        self.persist()?;
        info!(step = self.current, "advanced to next step");
        Ok(Advance::Advanced { to: self.current })
    }

    pub fn back(&mut self) -> Result<u8, WizardError> {
        if self.current == FIRST_STEP {
            return Err(WizardError::StepOutOfRange { step: 0 });
        }
        self.current -= 1;
        self.persist()?;
        Ok(self.current)
    }

    /// Open `step`. A completed step or the one before the current step is
    /// always reachable; the next step only once the current one is completed.
    pub fn go_to(&mut self, step: u8) -> Result<(), WizardError> {
        self.ensure_step(step)?;
        if step == self.current {
            return Ok(());
        }

        let reachable = self.completed.contains(&step)
            || step + 1 == self.current
            || (step == self.current + 1 && self.completed.contains(&self.current));
        if !reachable {
            return Err(WizardError::StepLocked { step });
        }

        self.current = step;
        self.persist()?;
        Ok(())
    }

    /// Re-check every step against the final values, plus required uploads.
    pub fn validate_all(&self) -> FinalCheck {
        let mut seen = BTreeSet::new();
        let mut fields = Vec::new();
        for step in self.blueprint.steps() {
            for name in step.effective_fields(&self.form) {
                if seen.insert(name) {
                    fields.push(name);
                }
            }
        }
        self.sort_by_declaration(&mut fields);

        let errors = self
            .registry
            .validate_fields(fields, &self.form, self.clock.today());
        let missing_files = DocumentSlot::required()
            .into_iter()
            .filter(|slot| !self.files.contains_key(slot))
            .collect();

        FinalCheck {
            errors,
            missing_files,
        }
    }

    pub fn snapshot(&self) -> Draft {
        Draft {
            step_index: self.current,
            completed_steps: self.completed.clone(),
            form_values: self.form.clone(),
            saved_at: self.clock.now(),
        }
    }

    /// Write the draft. Nothing is written before the first interaction, so an
    /// untouched wizard never overwrites an older draft. Returns whether a
    /// draft was written.
    pub fn persist(&mut self) -> Result<bool, WizardError> {
        if !self.interacted {
            return Ok(false);
        }
        let draft = self.snapshot();
        self.store.set(&draft)?;
        debug!(step = draft.step_index, "draft saved");
        Ok(true)
    }

    /// Final save when the wizard is torn down.
    pub fn teardown(&mut self) -> Result<bool, WizardError> {
        self.persist()
    }

    /// Drop all progress and the stored draft.
    pub fn reset(&mut self) -> Result<(), WizardError> {
        self.store.clear()?;
        self.current = FIRST_STEP;
        self.completed.clear();
        self.form = FormValues::new();
        self.files.clear();
        self.interacted = false;
        info!("wizard reset");
        Ok(())
    }
}

impl std::fmt::Debug for EnrolmentWizard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrolmentWizard")
            .field("current", &self.current)
            .field("completed", &self.completed)
            .field("fields", &self.form.len())
            .field("files", &self.files.len())
            .finish()
    }
}
