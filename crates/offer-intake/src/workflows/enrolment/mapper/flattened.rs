use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::codes::{
    CodeTable, EMPLOYMENT_STATUS, HIGHEST_SCHOOL_LEVEL, INDUSTRY_OF_EMPLOYMENT, OCCUPATION,
    QUALIFICATION_LEVEL, QUALIFICATION_RECOGNITION,
};
use super::record::{
    Address, AddressType, Applicant, AppliedCourse, ComplianceInfo, EmergencyContact,
    EducationHistory, MarketingCampaign, OfferId, SubmissionRecord,
};
use super::map_to_submission;
use crate::workflows::enrolment::form::FormValues;

/// First education entry inlined as `Education*` fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FlattenedEducation {
    pub education_qualification_name: String,
    pub education_institute_name: String,
    pub education_institute_location: String,
    pub education_year_completed: i32,
    pub education_level_code: String,
    pub education_achievement_recognition_code: String,
    pub education_level_code_full: String,
    pub education_achievement_recognition_code_full: String,
}

/// Coded values paired with their human-readable labels. Absent codes are
/// omitted from the output entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CodeLabels {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_employment_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_employment_status_full: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry_of_employment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry_of_employment_full: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupation_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupation_identifier_full: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualification_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualification_level_full: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualification_recognition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualification_recognition_full: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highest_school_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highest_school_level_full: Option<String>,
}

/// Record shape for the notification flow: addresses inlined, postal as an
/// explicit `null` when absent, labels alongside codes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FlattenedSubmissionRecord {
    pub offer_id: OfferId,
    pub time_stamp: String,
    #[serde(flatten)]
    pub applicant: Applicant,
    pub compliance_and_other_info: ComplianceInfo,
    pub current_address: Option<Address>,
    pub postal_address: Option<Address>,
    pub applied_courses: Vec<AppliedCourse>,
    pub disabilities: Vec<Value>,
    pub emergency_contact: EmergencyContact,
    pub education_history_list: Vec<EducationHistory>,
    pub employment_history_list: Vec<Value>,
    #[serde(rename = "Leads_MarketingCampaign")]
    pub marketing_campaign: MarketingCampaign,
    #[serde(flatten)]
    pub education: Option<FlattenedEducation>,
    #[serde(flatten)]
    pub labels: CodeLabels,
}

fn coded(table: CodeTable, code: &str) -> (Option<String>, Option<String>) {
    if code.trim().is_empty() {
        (None, None)
    } else {
        (Some(code.to_string()), Some(table.label_or_code(code)))
    }
}

fn labels(record: &SubmissionRecord) -> CodeLabels {
    let compliance = &record.compliance_and_other_info;
    let education = record.education_history_list.first();

    let (current_employment_status, current_employment_status_full) =
        coded(EMPLOYMENT_STATUS, &compliance.current_employ_status);
    let (industry_of_employment, industry_of_employment_full) =
        coded(INDUSTRY_OF_EMPLOYMENT, &compliance.industry_employment);
    let (occupation_identifier, occupation_identifier_full) =
        coded(OCCUPATION, &compliance.occupation_code);
    let (qualification_level, qualification_level_full) = coded(
        QUALIFICATION_LEVEL,
        education.map_or("", |entry| entry.education_level_code.as_str()),
    );
    let (qualification_recognition, qualification_recognition_full) = coded(
        QUALIFICATION_RECOGNITION,
        education.map_or("", |entry| entry.achievement_recognition_code.as_str()),
    );
    let (highest_school_level, highest_school_level_full) =
        coded(HIGHEST_SCHOOL_LEVEL, &compliance.high_school_level);

    CodeLabels {
        current_employment_status,
        current_employment_status_full,
        industry_of_employment,
        industry_of_employment_full,
        occupation_identifier,
        occupation_identifier_full,
        qualification_level,
        qualification_level_full,
        qualification_recognition,
        qualification_recognition_full,
        highest_school_level,
        highest_school_level_full,
    }
}

/// Pure projection of the canonical record; shares its id and timestamp.
pub fn project_flattened(record: &SubmissionRecord) -> FlattenedSubmissionRecord {
    let find = |address_type: AddressType| {
        record
            .addresses
            .iter()
            .find(|address| address.address_type == address_type)
            .cloned()
    };

    let education = record
        .education_history_list
        .first()
        .map(|entry| FlattenedEducation {
            education_qualification_name: entry.qualification_name.clone(),
            education_institute_name: entry.institute_name.clone(),
            education_institute_location: entry.institute_location.clone(),
            education_year_completed: entry.year_completed,
            education_level_code: entry.education_level_code.clone(),
            education_achievement_recognition_code: entry.achievement_recognition_code.clone(),
            education_level_code_full: QUALIFICATION_LEVEL.label_or_code(&entry.education_level_code),
            education_achievement_recognition_code_full: QUALIFICATION_RECOGNITION
                .label_or_code(&entry.achievement_recognition_code),
        });

    FlattenedSubmissionRecord {
        offer_id: record.offer_id.clone(),
        time_stamp: record.time_stamp.clone(),
        applicant: record.applicant.clone(),
        compliance_and_other_info: record.compliance_and_other_info.clone(),
        current_address: find(AddressType::Current),
        postal_address: find(AddressType::Postal),
        applied_courses: record.applied_courses.clone(),
        disabilities: record.disabilities.clone(),
        emergency_contact: record.emergency_contact.clone(),
        education_history_list: record.education_history_list.clone(),
        employment_history_list: record.employment_history_list.clone(),
        marketing_campaign: record.marketing_campaign.clone(),
        education,
        labels: labels(record),
    }
}

pub fn map_to_flattened_submission(form: &FormValues, now: DateTime<Utc>) -> FlattenedSubmissionRecord {
    project_flattened(&map_to_submission(form, now))
}
