use std::collections::BTreeMap;

use serde::Serialize;

use super::stage::{PipelineStage, StageError, StageStatus};
use crate::workflows::enrolment::mapper::OfferId;

/// Observable state of one submission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRun {
    pub offer_id: Option<OfferId>,
    status_by_stage: BTreeMap<PipelineStage, StageStatus>,
    error_by_stage: BTreeMap<PipelineStage, StageError>,
    current: Option<PipelineStage>,
    is_complete: bool,
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineRun {
    pub fn new() -> Self {
        Self {
            offer_id: None,
            status_by_stage: PipelineStage::ordered()
                .into_iter()
                .map(|stage| (stage, StageStatus::Pending))
                .collect(),
            error_by_stage: BTreeMap::new(),
            current: None,
            is_complete: false,
        }
    }

    pub fn status(&self, stage: PipelineStage) -> StageStatus {
        self.status_by_stage
            .get(&stage)
            .copied()
            .unwrap_or_default()
    }

    pub fn error(&self, stage: PipelineStage) -> Option<&StageError> {
        self.error_by_stage.get(&stage)
    }

    pub fn current(&self) -> Option<PipelineStage> {
        self.current
    }

    pub fn stages(&self) -> impl Iterator<Item = (PipelineStage, StageStatus)> + '_ {
        PipelineStage::ordered()
            .into_iter()
            .map(|stage| (stage, self.status(stage)))
    }

    pub(super) fn begin(&mut self, stage: PipelineStage) {
        self.status_by_stage.insert(stage, StageStatus::InProgress);
        self.current = Some(stage);
    }

    pub(super) fn complete(&mut self, stage: PipelineStage) {
        self.status_by_stage.insert(stage, StageStatus::Completed);
        self.current = Some(stage);
        if stage == PipelineStage::Complete {
            self.is_complete = true;
        }
    }

    pub(super) fn fail(&mut self, stage: PipelineStage, error: StageError) {
        self.status_by_stage.insert(stage, StageStatus::Error);
        self.error_by_stage.insert(stage, error);
        self.current = Some(stage);
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn has_error(&self) -> bool {
        !self.error_by_stage.is_empty()
    }

    /// The caller may dismiss progress once the run finished or halted.
    pub fn can_close(&self) -> bool {
        self.is_complete || self.has_error()
    }

    pub fn failed_stage(&self) -> Option<PipelineStage> {
        PipelineStage::ordered()
            .into_iter()
            .find(|stage| self.status(*stage) == StageStatus::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_run_is_all_pending() {
        let run = PipelineRun::new();
        assert!(run
            .stages()
            .all(|(_, status)| status == StageStatus::Pending));
        assert!(!run.can_close());
        assert_eq!(run.failed_stage(), None);
    }

    #[test]
    fn failure_makes_the_run_closable() {
        let mut run = PipelineRun::new();
        run.begin(PipelineStage::Prepare);
        run.complete(PipelineStage::Prepare);
        run.begin(PipelineStage::ExternalValidate);
        run.fail(PipelineStage::ExternalValidate, StageError::new("rejected"));

        assert!(run.can_close());
        assert!(!run.is_complete());
        assert_eq!(run.status(PipelineStage::Prepare), StageStatus::Completed);
        assert_eq!(run.failed_stage(), Some(PipelineStage::ExternalValidate));
        assert_eq!(
            run.error(PipelineStage::ExternalValidate)
                .map(|error| error.message.as_str()),
            Some("rejected")
        );
    }

    #[test]
    fn serializes_stage_ids_as_keys() {
        let mut run = PipelineRun::new();
        run.fail(PipelineStage::Notify, StageError::new("flow down"));
        let value = serde_json::to_value(&run).expect("serializes");
        assert_eq!(value["statusByStage"]["external-validate"], "pending");
        assert_eq!(value["statusByStage"]["notify"], "error");
        assert_eq!(value["errorByStage"]["notify"]["message"], "flow down");
        assert_eq!(value["isComplete"], false);
    }
}
