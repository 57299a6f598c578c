//! Student enrolment offer intake: field validation, the step wizard, record
//! mapping, reference-data caches, and the staged submission pipeline.

pub mod clock;
pub mod directory;
pub mod form;
pub mod mapper;
pub mod options;
pub mod pipeline;
pub mod validation;
pub mod wizard;

pub use clock::{Clock, FixedClock, SystemClock};
pub use form::{AttachedFile, DocumentSlot, FormValues};
pub use mapper::{
    map_to_flattened_submission, map_to_submission, validate_record, FlattenedSubmissionRecord,
    OfferId, RecordValidation, SubmissionRecord,
};
pub use pipeline::{
    Collaborators, PipelineRun, PipelineStage, StageError, StageStatus, SubmissionOrchestrator,
    WizardSubmission,
};
pub use validation::{FieldRegistry, ValidationError};
pub use wizard::{
    Advance, Draft, DraftStore, DraftStoreError, EnrolmentWizard, FinalCheck, JsonFileDraftStore,
    MemoryDraftStore, RestoreOutcome, WizardError,
};
