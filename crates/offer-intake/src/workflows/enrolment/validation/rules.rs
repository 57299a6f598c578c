use std::sync::OnceLock;

use chrono::{DateTime, Datelike, Months, NaiveDate};
use regex::Regex;
use serde_json::Value;

use super::{FieldDefinition, ValidationError, ValidationErrorKind};
use crate::workflows::enrolment::form::{is_blank_value, value_text, FormValues};

/// Evaluation phase; rules run in phase order after the required check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RulePhase {
    Pattern,
    Bounds,
    Custom,
}

/// Shape constraints with a fixed regular expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Email,
    Digits,
    Decimal,
}

impl Pattern {
    fn regex(self) -> &'static Regex {
        static EMAIL: OnceLock<Regex> = OnceLock::new();
        static DIGITS: OnceLock<Regex> = OnceLock::new();
        static DECIMAL: OnceLock<Regex> = OnceLock::new();

        match self {
            Pattern::Email => EMAIL.get_or_init(|| {
                Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").expect("email pattern")
            }),
            Pattern::Digits => {
                DIGITS.get_or_init(|| Regex::new(r"^[0-9]+$").expect("digits pattern"))
            }
            Pattern::Decimal => {
                DECIMAL.get_or_init(|| Regex::new(r"^(\d+\.?\d*|\.\d+)$").expect("decimal pattern"))
            }
        }
    }

    pub fn matches(self, text: &str) -> bool {
        self.regex().is_match(text)
    }
}

fn english_text() -> &'static Regex {
    static ENGLISH: OnceLock<Regex> = OnceLock::new();
    ENGLISH.get_or_init(|| {
        Regex::new(r#"^[a-zA-Z0-9\s\-.,'"()&@#$%/\\:;!?]*$"#).expect("english text pattern")
    })
}

/// Named predicates that need more than a regex or a bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    /// Latin letters, digits, whitespace, and common punctuation only.
    EnglishText,
    /// Date at least `years` before the evaluation date.
    MinimumAge { years: u32 },
    /// Date strictly after the evaluation date.
    FutureDate { message: &'static str },
    /// Date on or before the evaluation date.
    NotFutureDate { message: &'static str },
    /// `name|category` with both halves non-blank.
    CompositeKey,
    /// Any parsable calendar date.
    CalendarDate,
}

const INVALID_DATE: &str = "Please enter a valid date";

impl Check {
    fn violation(&self, text: &str, today: NaiveDate) -> Option<String> {
        match self {
            Check::EnglishText => (!english_text().is_match(text))
                .then(|| "Please use English letters and numbers only".to_string()),
            Check::MinimumAge { years } => {
                let Some(born) = parse_date(text) else {
                    return Some(INVALID_DATE.to_string());
                };
                let threshold = today
                    .checked_sub_months(Months::new(years * 12))
                    .unwrap_or(NaiveDate::MIN);
                if born > today {
                    Some("Date of Birth cannot be in the future".to_string())
                } else if born > threshold {
                    Some(format!("Date of Birth must be at least {years} years ago"))
                } else {
                    None
                }
            }
            Check::FutureDate { message } => match parse_date(text) {
                Some(date) if date <= today => Some(message.to_string()),
                Some(_) => None,
                None => Some(INVALID_DATE.to_string()),
            },
            Check::NotFutureDate { message } => match parse_date(text) {
                Some(date) if date > today => Some(message.to_string()),
                Some(_) => None,
                None => Some(INVALID_DATE.to_string()),
            },
            Check::CompositeKey => {
                let mut parts = text.split('|');
                let valid = match (parts.next(), parts.next(), parts.next()) {
                    (Some(name), Some(category), None) => {
                        !name.trim().is_empty() && !category.trim().is_empty()
                    }
                    _ => false,
                };
                (!valid).then(|| "Invalid agent selection format".to_string())
            }
            Check::CalendarDate => parse_date(text)
                .is_none()
                .then(|| INVALID_DATE.to_string()),
        }
    }
}

/// One validation rule attached to a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Pattern {
        pattern: Pattern,
        message: &'static str,
    },
    MinLength {
        length: usize,
        message: &'static str,
    },
    MaxLength {
        length: usize,
        message: &'static str,
    },
    Min {
        value: f64,
        message: &'static str,
    },
    Max {
        value: f64,
        message: &'static str,
    },
    Custom(Check),
}

impl Rule {
    pub fn phase(&self) -> RulePhase {
        match self {
            Rule::Pattern { .. } => RulePhase::Pattern,
            Rule::MinLength { .. } | Rule::MaxLength { .. } | Rule::Min { .. } | Rule::Max { .. } => {
                RulePhase::Bounds
            }
            Rule::Custom(_) => RulePhase::Custom,
        }
    }

    fn violation(&self, text: &str, today: NaiveDate) -> Option<(ValidationErrorKind, String)> {
        match self {
            Rule::Pattern { pattern, message } => (!pattern.matches(text))
                .then(|| (ValidationErrorKind::Pattern, message.to_string())),
            Rule::MinLength { length, message } => (text.chars().count() < *length)
                .then(|| (ValidationErrorKind::Bounds, message.to_string())),
            Rule::MaxLength { length, message } => (text.chars().count() > *length)
                .then(|| (ValidationErrorKind::Bounds, message.to_string())),
            // Unparsable numbers are the pattern phase's concern.
            Rule::Min { value, message } => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|number| number < value)
                .map(|_| (ValidationErrorKind::Bounds, message.to_string())),
            Rule::Max { value, message } => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|number| number > value)
                .map(|_| (ValidationErrorKind::Bounds, message.to_string())),
            Rule::Custom(check) => check
                .violation(text, today)
                .map(|message| (ValidationErrorKind::Custom, message)),
        }
    }
}

/// Accepts `YYYY-MM-DD` and RFC 3339 timestamps with four-digit years.
pub(crate) fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|timestamp| timestamp.date_naive())
        })
        .filter(|date| (1..=9999).contains(&date.year()))
}

pub(super) fn evaluate(
    field: &FieldDefinition,
    value: Option<&Value>,
    form: &FormValues,
    today: NaiveDate,
) -> Result<(), ValidationError> {
    if is_blank_value(value) {
        return match field.requirement.missing_message(form) {
            Some(message) => Err(ValidationError::for_field(
                field,
                ValidationErrorKind::Required,
                message.to_string(),
            )),
            None => Ok(()),
        };
    }

    let text = value.map(value_text).unwrap_or_default();
    for rule in field.rules() {
        if let Some((kind, message)) = rule.violation(&text, today) {
            return Err(ValidationError::for_field(field, kind, message));
        }
    }

    Ok(())
}
