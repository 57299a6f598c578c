//! Declarative per-field validation.
//!
//! Every field carries a requirement and an ordered rule list. Evaluation is
//! pure: the same value, form snapshot, and evaluation date always produce the
//! same verdict, so the wizard can re-check a step as often as it likes.

mod fields;
mod rules;

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use super::form::FormValues;

pub use fields::standard_fields;
pub(crate) use fields::OVERSEAS_ORIGINS;
pub use rules::{Check, Pattern, Rule, RulePhase};

/// Widget family a field is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Select,
    Date,
    Radio,
    Checkbox,
    Custom,
}

/// Predicate over the current form values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Equals {
        field: &'static str,
        value: &'static str,
    },
    OneOf {
        field: &'static str,
        values: &'static [&'static str],
    },
}

impl Condition {
    pub fn holds(&self, form: &FormValues) -> bool {
        match self {
            Condition::Equals { field, value } => form.text(field) == *value,
            Condition::OneOf { field, values } => {
                let current = form.text(field);
                values.iter().any(|candidate| *candidate == current)
            }
        }
    }

    /// Field the predicate reads.
    pub fn subject(&self) -> &'static str {
        match self {
            Condition::Equals { field, .. } | Condition::OneOf { field, .. } => field,
        }
    }
}

/// Whether a value must be present, possibly depending on other answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Optional,
    Always(&'static str),
    When(Condition, &'static str),
}

impl Requirement {
    /// Message to report when the value is missing, or `None` if it may be.
    pub fn missing_message(&self, form: &FormValues) -> Option<&'static str> {
        match self {
            Requirement::Optional => None,
            Requirement::Always(message) => Some(message),
            Requirement::When(condition, message) => condition.holds(form).then_some(*message),
        }
    }
}

/// Immutable description of one form field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub requirement: Requirement,
    rules: Vec<Rule>,
}

impl FieldDefinition {
    pub fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            requirement: Requirement::Optional,
            rules: Vec::new(),
        }
    }

    pub fn required(mut self, message: &'static str) -> Self {
        self.requirement = Requirement::Always(message);
        self
    }

    pub fn required_when(mut self, condition: Condition, message: &'static str) -> Self {
        self.requirement = Requirement::When(condition, message);
        self
    }

    /// Append a rule. Rules are kept sorted by phase so declaration order only
    /// matters within a phase.
    pub fn rule(mut self, rule: Rule) -> Self {
        let phase = rule.phase();
        let position = self
            .rules
            .iter()
            .position(|existing| existing.phase() > phase)
            .unwrap_or(self.rules.len());
        self.rules.insert(position, rule);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

/// Category of the first failed check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    Required,
    Pattern,
    Bounds,
    Custom,
    UnknownField,
}

/// User-correctable field error, surfaced inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{label}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub label: String,
    pub message: String,
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    fn for_field(field: &FieldDefinition, kind: ValidationErrorKind, message: String) -> Self {
        Self {
            field: field.name.to_string(),
            label: field.label.to_string(),
            message,
            kind,
        }
    }
}

/// Registry of field definitions keyed by name, preserving declaration order.
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    fields: Vec<FieldDefinition>,
    index: HashMap<&'static str, usize>,
}

impl FieldRegistry {
    pub fn new(fields: Vec<FieldDefinition>) -> Self {
        let index = fields
            .iter()
            .enumerate()
            .map(|(position, field)| (field.name, position))
            .collect();
        Self { fields, index }
    }

    /// The enrolment form's field set.
    pub fn standard() -> Self {
        Self::new(standard_fields())
    }

    pub fn get(&self, name: &str) -> Option<&FieldDefinition> {
        self.index.get(name).map(|position| &self.fields[*position])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Check one value. Order: required, pattern, bounds, custom; first
    /// failure wins.
    pub fn validate(
        &self,
        name: &str,
        value: Option<&Value>,
        form: &FormValues,
        today: NaiveDate,
    ) -> Result<(), ValidationError> {
        let Some(field) = self.get(name) else {
            return Err(ValidationError {
                field: name.to_string(),
                label: name.to_string(),
                message: format!("no definition registered for field '{name}'"),
                kind: ValidationErrorKind::UnknownField,
            });
        };

        rules::evaluate(field, value, form, today)
    }

    /// Validate the named fields against the form, keeping the caller's order.
    pub fn validate_fields<'a, I>(
        &self,
        names: I,
        form: &FormValues,
        today: NaiveDate,
    ) -> Vec<ValidationError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .filter_map(|name| self.validate(name, form.get(name), form, today).err())
            .collect()
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests;
