//! Classification option lists fetched from the reference API.
//!
//! The five datasets are fetched concurrently and joined. A failure anywhere in
//! the join replaces every dataset with its static defaults, so the form never
//! mixes remote and fallback lists.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::form::value_text;
use super::mapper::codes::{
    CodeTable, EMPLOYMENT_STATUS, INDUSTRY_OF_EMPLOYMENT, OCCUPATION, QUALIFICATION_LEVEL,
    QUALIFICATION_RECOGNITION,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionDataset {
    EmploymentStatuses,
    IndustryOfEmployments,
    OccupationCodes,
    QualificationLevels,
    QualificationRecognitions,
}

impl OptionDataset {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::EmploymentStatuses,
            Self::IndustryOfEmployments,
            Self::OccupationCodes,
            Self::QualificationLevels,
            Self::QualificationRecognitions,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::EmploymentStatuses => "EmploymentStatuses",
            Self::IndustryOfEmployments => "IndustryOfEmployments",
            Self::OccupationCodes => "OccupationCodes",
            Self::QualificationLevels => "QualificationLevels",
            Self::QualificationRecognitions => "QualificationAchievementRecognitions",
        }
    }

    const fn table(self) -> CodeTable {
        match self {
            Self::EmploymentStatuses => EMPLOYMENT_STATUS,
            Self::IndustryOfEmployments => INDUSTRY_OF_EMPLOYMENT,
            Self::OccupationCodes => OCCUPATION,
            Self::QualificationLevels => QUALIFICATION_LEVEL,
            Self::QualificationRecognitions => QUALIFICATION_RECOGNITION,
        }
    }

    /// Static list used when the remote source cannot be trusted.
    pub fn defaults(self) -> Vec<SelectOption> {
        std::iter::once(SelectOption::new("", "Please select"))
            .chain(
                self.table()
                    .entries()
                    .iter()
                    .map(|(code, label)| SelectOption::new(*code, *label)),
            )
            .collect()
    }
}

impl fmt::Display for OptionDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OptionSetError {
    #[error("option source unavailable: {0}")]
    Unavailable(String),
    #[error("option source rejected the request with status {status}")]
    Rejected { status: u16 },
}

/// Failure of one dataset inside the joined fetch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{dataset} fetch failed: {source}")]
pub struct DatasetFetchError {
    pub dataset: OptionDataset,
    #[source]
    pub source: OptionSetError,
}

/// Remote reference data, fetched one dataset at a time.
#[async_trait]
pub trait OptionSetSource: Send + Sync {
    /// Raw response body; expected to be an array of `{ "Value", "Name" }`.
    async fn fetch_dataset(&self, dataset: OptionDataset) -> Result<Value, OptionSetError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionSetOrigin {
    Remote,
    Defaults,
}

/// The joined result of one load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionSets {
    pub origin: OptionSetOrigin,
    sets: BTreeMap<OptionDataset, Vec<SelectOption>>,
}

impl OptionSets {
    pub fn defaults() -> Self {
        Self {
            origin: OptionSetOrigin::Defaults,
            sets: OptionDataset::ordered()
                .into_iter()
                .map(|dataset| (dataset, dataset.defaults()))
                .collect(),
        }
    }

    pub fn get(&self, dataset: OptionDataset) -> &[SelectOption] {
        self.sets.get(&dataset).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_default(&self, dataset: OptionDataset) -> bool {
        self.get(dataset) == dataset.defaults().as_slice()
    }
}

/// Converts one response body, falling back to that dataset's defaults when
/// the shape is wrong.
pub fn parse_dataset(dataset: OptionDataset, body: &Value) -> Vec<SelectOption> {
    let Some(items) = body.as_array() else {
        warn!(dataset = dataset.label(), "option response is not an array; using defaults");
        return dataset.defaults();
    };

    let parsed: Option<Vec<SelectOption>> = items
        .iter()
        .map(|item| {
            let value = item.get("Value").filter(|value| !value.is_null())?;
            let name = item.get("Name").filter(|name| !name.is_null())?;
            Some(SelectOption::new(value_text(value), value_text(name)))
        })
        .collect();

    match parsed {
        Some(options) => options,
        None => {
            warn!(
                dataset = dataset.label(),
                "option response items lack Value/Name; using defaults"
            );
            dataset.defaults()
        }
    }
}

/// Fan-out loader with joint fallback.
pub struct OptionSetCache {
    source: Arc<dyn OptionSetSource>,
    current: RwLock<OptionSets>,
}

impl OptionSetCache {
    pub fn new(source: Arc<dyn OptionSetSource>) -> Self {
        Self {
            source,
            current: RwLock::new(OptionSets::defaults()),
        }
    }

    async fn fetch(&self, dataset: OptionDataset) -> Result<Vec<SelectOption>, DatasetFetchError> {
        let body = self
            .source
            .fetch_dataset(dataset)
            .await
            .map_err(|source| DatasetFetchError { dataset, source })?;
        debug!(dataset = dataset.label(), "option dataset fetched");
        Ok(parse_dataset(dataset, &body))
    }

    /// Fetch all datasets concurrently. Any failure yields defaults for all.
    pub async fn load_all(&self) -> OptionSets {
        let joined = tokio::try_join!(
            self.fetch(OptionDataset::EmploymentStatuses),
            self.fetch(OptionDataset::IndustryOfEmployments),
            self.fetch(OptionDataset::OccupationCodes),
            self.fetch(OptionDataset::QualificationLevels),
            self.fetch(OptionDataset::QualificationRecognitions),
        );

        let sets = match joined {
            Ok((employment, industry, occupation, levels, recognitions)) => {
                info!("classification option sets loaded");
                OptionSets {
                    origin: OptionSetOrigin::Remote,
                    sets: BTreeMap::from([
                        (OptionDataset::EmploymentStatuses, employment),
                        (OptionDataset::IndustryOfEmployments, industry),
                        (OptionDataset::OccupationCodes, occupation),
                        (OptionDataset::QualificationLevels, levels),
                        (OptionDataset::QualificationRecognitions, recognitions),
                    ]),
                }
            }
            Err(err) => {
                warn!(
                    dataset = err.dataset.label(),
                    error = %err.source,
                    "option set fetch failed; falling back to defaults for every dataset"
                );
                OptionSets::defaults()
            }
        };

        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = sets.clone();
        sets
    }

    /// Last loaded sets, or defaults before the first load.
    pub fn current(&self) -> OptionSets {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    struct ScriptedSource {
        failing: Option<OptionDataset>,
        calls: Mutex<Vec<OptionDataset>>,
    }

    impl ScriptedSource {
        fn new(failing: Option<OptionDataset>) -> Self {
            Self {
                failing,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl OptionSetSource for ScriptedSource {
        async fn fetch_dataset(&self, dataset: OptionDataset) -> Result<Value, OptionSetError> {
            self.calls.lock().expect("calls mutex").push(dataset);
            if self.failing == Some(dataset) {
                return Err(OptionSetError::Rejected { status: 503 });
            }
            Ok(json!([
                { "Value": "R1", "Name": format!("{} remote", dataset.label()) }
            ]))
        }
    }

    #[tokio::test]
    async fn successful_join_uses_remote_lists() {
        let source = Arc::new(ScriptedSource::new(None));
        let cache = OptionSetCache::new(source.clone());

        let sets = cache.load_all().await;

        assert_eq!(sets.origin, OptionSetOrigin::Remote);
        for dataset in OptionDataset::ordered() {
            assert_eq!(sets.get(dataset).len(), 1);
            assert_eq!(sets.get(dataset)[0].value, "R1");
        }
        assert_eq!(cache.current(), sets);
    }

    #[tokio::test]
    async fn one_failed_dataset_resets_all_to_defaults() {
        let source = Arc::new(ScriptedSource::new(Some(OptionDataset::OccupationCodes)));
        let cache = OptionSetCache::new(source);

        let sets = cache.load_all().await;

        assert_eq!(sets.origin, OptionSetOrigin::Defaults);
        for dataset in OptionDataset::ordered() {
            assert!(sets.is_default(dataset), "{dataset} should be defaults");
        }
    }

    #[test]
    fn malformed_body_falls_back_for_that_dataset_only() {
        let parsed = parse_dataset(
            OptionDataset::QualificationLevels,
            &json!({ "items": [] }),
        );
        assert_eq!(parsed, OptionDataset::QualificationLevels.defaults());

        let parsed = parse_dataset(
            OptionDataset::QualificationLevels,
            &json!([{ "Value": "008" }]),
        );
        assert_eq!(parsed, OptionDataset::QualificationLevels.defaults());

        let parsed = parse_dataset(
            OptionDataset::OccupationCodes,
            &json!([{ "Value": 1, "Name": "1 - Manager" }]),
        );
        assert_eq!(parsed, vec![SelectOption::new("1", "1 - Manager")]);
    }

    #[test]
    fn defaults_lead_with_a_placeholder() {
        let defaults = OptionDataset::EmploymentStatuses.defaults();
        assert_eq!(defaults[0], SelectOption::new("", "Please select"));
        assert_eq!(defaults.len(), 10);
    }
}
