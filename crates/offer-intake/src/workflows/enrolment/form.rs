use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Flat field map captured by the wizard, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormValues(BTreeMap<String, Value>);

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// String view of a field; missing, null, and non-scalar values read as empty.
    pub fn text(&self, name: &str) -> String {
        self.get(name).map(value_text).unwrap_or_default()
    }

    /// `Some(text)` when the field holds a non-blank value.
    pub fn non_blank(&self, name: &str) -> Option<String> {
        let text = self.text(name);
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    pub fn is_yes(&self, name: &str) -> bool {
        self.text(name) == "Yes"
    }

    pub fn is_blank(&self, name: &str) -> bool {
        is_blank_value(self.get(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for FormValues
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Emptiness as the required-field check sees it: unchecked boxes and
/// whitespace-only strings count as missing.
pub fn is_blank_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(Value::Bool(checked)) => !checked,
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(Value::Number(_)) => false,
    }
}

pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(true) => "true".to_string(),
        _ => String::new(),
    }
}

/// Upload slots offered by the document step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSlot {
    Year12Evidence,
    Passport,
    EnglishTest,
    AcademicQualifications,
    Cv,
    StatementOfPurpose,
    FinancialDeclaration,
    BankStatement,
    SponsorDocuments,
}

impl DocumentSlot {
    pub const fn required() -> [Self; 4] {
        [
            Self::Year12Evidence,
            Self::Passport,
            Self::EnglishTest,
            Self::AcademicQualifications,
        ]
    }

    pub const fn is_required(self) -> bool {
        matches!(
            self,
            Self::Year12Evidence | Self::Passport | Self::EnglishTest | Self::AcademicQualifications
        )
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Year12Evidence => "Evidence of Year 12 or Vocational Education",
            Self::Passport => "Current Passport",
            Self::EnglishTest => "English Test Results",
            Self::AcademicQualifications => "Academic Qualifications & Transcripts",
            Self::Cv => "Curriculum Vitae",
            Self::StatementOfPurpose => "Statement of Purpose",
            Self::FinancialDeclaration => "Financial Declaration",
            Self::BankStatement => "Bank Statement",
            Self::SponsorDocuments => "Sponsor Documents",
        }
    }
}

/// A document attached to the application, held in memory until forwarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedFile {
    pub slot: DocumentSlot,
    pub filename: String,
    pub content_type: Option<String>,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}
