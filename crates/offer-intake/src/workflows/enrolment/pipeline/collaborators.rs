//! Interfaces of the external services the pipeline talks to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::workflows::enrolment::form::{AttachedFile, FormValues};
use crate::workflows::enrolment::mapper::{FlattenedSubmissionRecord, OfferId, SubmissionRecord};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("{service} is not configured")]
    NotConfigured { service: &'static str },
    #[error("{0}")]
    Transport(String),
}

/// One field-level complaint from the validation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical: Option<String>,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            technical: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub success: bool,
    pub status: u16,
    pub errors: Vec<FieldIssue>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceResponse {
    pub success: bool,
    pub status: u16,
    pub body: Value,
    pub message: Option<String>,
}

impl ServiceResponse {
    pub fn accepted(status: u16, body: Value) -> Self {
        Self {
            success: true,
            status,
            body,
            message: None,
        }
    }

    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self {
            success: false,
            status,
            body: Value::Null,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForwardOutcome {
    pub success: bool,
    pub message: String,
}

/// Metadata sent alongside forwarded documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectContext {
    pub subject: String,
    pub offer_id: OfferId,
    pub source: &'static str,
    pub form_type: &'static str,
}

impl SubjectContext {
    pub fn for_submission(form: &FormValues, offer_id: OfferId) -> Self {
        Self {
            subject: material_subject(form),
            offer_id,
            source: "main_submission",
            form_type: "student-form",
        }
    }
}

/// `"<first> <family>'s Material Upload"`, degrading to whichever name is present.
pub fn material_subject(form: &FormValues) -> String {
    match (form.non_blank("firstName"), form.non_blank("familyName")) {
        (Some(first), Some(family)) => format!("{first} {family}'s Material Upload"),
        (Some(first), None) => format!("{first}'s Material Upload"),
        (None, Some(family)) => format!("{family}'s Material Upload"),
        (None, None) => "Material Upload".to_string(),
    }
}

/// Flattened record plus the answers the notification flow reads directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NotificationPayload {
    #[serde(flatten)]
    pub record: FlattenedSubmissionRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub english_language_proficiency_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub how_did_you_hear_about_us: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub how_did_you_hear_details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_agent: Option<String>,
}

impl NotificationPayload {
    pub fn new(record: FlattenedSubmissionRecord, form: &FormValues) -> Self {
        Self {
            record,
            english_language_proficiency_method: form.non_blank("hasCompletedEnglishTest"),
            how_did_you_hear_about_us: form.non_blank("howDidYouHearAboutUs"),
            how_did_you_hear_details: form.non_blank("howDidYouHearDetails"),
            agent_name: form.non_blank("agentName"),
            agent_email: form.non_blank("agentEmail"),
            selected_agent: form.non_blank("selectedAgent"),
        }
    }
}

#[async_trait]
pub trait ValidationApiClient: Send + Sync {
    fn is_configured(&self) -> bool {
        true
    }

    async fn validate(&self, record: &SubmissionRecord)
        -> Result<ValidationOutcome, CollaboratorError>;
}

#[async_trait]
pub trait SubmissionApiClient: Send + Sync {
    fn is_configured(&self) -> bool {
        true
    }

    async fn submit(&self, record: &SubmissionRecord) -> Result<ServiceResponse, CollaboratorError>;
}

#[async_trait]
pub trait NotificationClient: Send + Sync {
    fn is_configured(&self) -> bool {
        true
    }

    async fn post(&self, payload: &NotificationPayload)
        -> Result<ServiceResponse, CollaboratorError>;
}

/// Forwarding is optional; an unconfigured client makes the stage a no-op.
#[async_trait]
pub trait FileForwardingClient: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn forward(
        &self,
        files: &[AttachedFile],
        context: &SubjectContext,
    ) -> Result<ForwardOutcome, CollaboratorError>;
}

/// Normalize a validation-service error body into field issues.
///
/// Recognizes coded `itemList` entries, ASP.NET-style `ModelState` maps
/// (paths lose their `application.` prefix and first index), and falls back
/// to a top-level `Message` only when nothing else was found.
pub fn parse_validation_errors(body: &Value) -> Vec<FieldIssue> {
    let mut issues = Vec::new();

    if body.get("IsSuccess") == Some(&Value::Bool(false)) {
        if let Some(items) = body.get("itemList").and_then(Value::as_object) {
            for (code, message) in items {
                issues.push(FieldIssue {
                    field: format!("Error {code}"),
                    message: scalar_text(message),
                    technical: Some(format!("Code: {code}")),
                });
            }
        }
    }

    if let Some(model_state) = body.get("ModelState").and_then(Value::as_object) {
        for (path, messages) in model_state {
            let field = strip_model_path(path);
            let messages = match messages {
                Value::Array(items) => items.iter().map(scalar_text).collect(),
                other => vec![scalar_text(other)],
            };
            for message in messages {
                issues.push(FieldIssue {
                    field: field.clone(),
                    message,
                    technical: Some(format!("Field: {path}")),
                });
            }
        }
    }

    if issues.is_empty() {
        if let Some(message) = body.get("Message").and_then(Value::as_str) {
            issues.push(FieldIssue {
                field: "General".to_string(),
                message: message.to_string(),
                technical: Some("API Response Message".to_string()),
            });
        }
    }

    issues
}

fn strip_model_path(path: &str) -> String {
    let path = path.strip_prefix("application.").unwrap_or(path);
    let Some(open) = path.find('[') else {
        return path.to_string();
    };
    match path[open..].find(']') {
        Some(close)
            if close > 1 && path[open + 1..open + close].chars().all(|c| c.is_ascii_digit()) =>
        {
            format!("{}{}", &path[..open], &path[open + close + 1..])
        }
        _ => path.to_string(),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn item_list_codes_become_numbered_fields() {
        let issues = parse_validation_errors(&json!({
            "IsSuccess": false,
            "itemList": { "E102": "Course is not offered at this campus" }
        }));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "Error E102");
        assert_eq!(issues[0].technical.as_deref(), Some("Code: E102"));
    }

    #[test]
    fn model_state_paths_are_cleaned() {
        let issues = parse_validation_errors(&json!({
            "Message": "The request is invalid.",
            "ModelState": {
                "application.Addresses[0].Postcode": ["Postcode is required", "Postcode must be numeric"],
                "application.Email": ["invalid"]
            }
        }));

        let fields: Vec<_> = issues.iter().map(|issue| issue.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["Addresses.Postcode", "Addresses.Postcode", "Email"]
        );
        assert!(issues.iter().all(|issue| issue.field != "General"));
    }

    #[test]
    fn general_message_is_a_last_resort() {
        let issues = parse_validation_errors(&json!({ "Message": "Service unavailable" }));
        assert_eq!(issues, vec![FieldIssue {
            field: "General".to_string(),
            message: "Service unavailable".to_string(),
            technical: Some("API Response Message".to_string()),
        }]);
        assert!(parse_validation_errors(&json!({})).is_empty());
    }

    #[test]
    fn subject_degrades_with_missing_names() {
        let both: FormValues = [("firstName", "Ana"), ("familyName", "Lee")]
            .into_iter()
            .collect();
        assert_eq!(material_subject(&both), "Ana Lee's Material Upload");

        let first: FormValues = [("firstName", "Ana")].into_iter().collect();
        assert_eq!(material_subject(&first), "Ana's Material Upload");

        let family: FormValues = [("familyName", "Lee"), ("firstName", " ")]
            .into_iter()
            .collect();
        assert_eq!(material_subject(&family), "Lee's Material Upload");

        assert_eq!(material_subject(&FormValues::new()), "Material Upload");
    }
}
