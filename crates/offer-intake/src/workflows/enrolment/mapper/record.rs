use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `OFFER_YYYYMMDD_HHMMSS`, derived from the record timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfferId(pub String);

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenderCode {
    M,
    F,
    X,
}

impl GenderCode {
    pub fn from_form(value: &str) -> Self {
        match value {
            "Male" => Self::M,
            "Female" => Self::F,
            _ => Self::X,
        }
    }
}

/// Identity block shared by both record shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Applicant {
    pub title: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub preferred_name: String,
    pub gender: GenderCode,
    #[serde(rename = "DoB")]
    pub dob: Option<String>,
    pub email: String,
    pub birthplace: String,
    pub student_origin: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ComplianceInfo {
    pub offer_id: OfferId,
    pub country_birth: String,
    pub nationality: String,
    pub passport_number: String,
    pub passport_expiry_date: Option<String>,
    pub visa_type: String,
    pub visa_number: String,
    pub visa_expiry_date: String,
    pub first_language: String,
    pub how_well_eng_speak: String,
    pub study_reason: String,
    pub current_employ_status: String,
    pub industry_employment: String,
    pub occupation_code: String,
    #[serde(rename = "USI")]
    pub usi: String,
    pub is_aboriginal: bool,
    pub is_torres_strait_islander: bool,
    pub is_eng_language_in_class: bool,
    pub eng_test_type: String,
    pub eng_test_date: Option<String>,
    pub eng_test_listening_score: String,
    pub eng_test_reading_score: String,
    pub eng_test_writing_score: String,
    pub eng_test_speaking_score: String,
    pub eng_test_overall_score: String,
    pub high_school_level: String,
    pub high_school_year_completed: String,
    pub is_still_at_high_school: bool,
    pub school_type: String,
    pub is_disabled: bool,
    pub is_request_help_for_disabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressType {
    Current,
    Postal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Address {
    pub offer_id: OfferId,
    pub address_type: AddressType,
    pub is_primary: bool,
    pub building_name: String,
    pub flat_unit_detail: String,
    pub street_number: String,
    pub street_name: String,
    pub suburb: String,
    pub state: String,
    pub postcode: String,
    pub country: String,
    pub phone: String,
    pub fax: String,
    pub mobile: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppliedCourse {
    pub offer_id: OfferId,
    pub course_id: String,
    pub campus_id: u32,
    pub intake_date: String,
    pub start_date: String,
    pub finish_date: Option<String>,
    #[serde(rename = "ELICOS_NumOfWeeks")]
    pub elicos_num_of_weeks: u32,
    pub tuition_fee: f64,
    pub enrolment_fee: f64,
    pub material_fee: f64,
    pub upfront_fee: f64,
    pub special_condition: String,
    pub application_request: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmergencyContact {
    pub offer_id: OfferId,
    pub contact_type: String,
    pub relationship: String,
    pub contact_name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub languages_spoken: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EducationHistory {
    pub offer_id: OfferId,
    pub qualification_name: String,
    pub institute_name: String,
    pub institute_location: String,
    pub year_completed: i32,
    pub education_level_code: String,
    pub achievement_recognition_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MarketingCampaign {
    pub offer_id: OfferId,
    pub know_from: String,
    pub lead_source: String,
    pub campaign_name: String,
}

/// Canonical nested submission record. Built once per attempt, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubmissionRecord {
    pub offer_id: OfferId,
    pub time_stamp: String,
    #[serde(flatten)]
    pub applicant: Applicant,
    pub compliance_and_other_info: ComplianceInfo,
    pub addresses: Vec<Address>,
    pub applied_courses: Vec<AppliedCourse>,
    pub disabilities: Vec<Value>,
    pub emergency_contact: EmergencyContact,
    pub education_history_list: Vec<EducationHistory>,
    pub employment_history_list: Vec<Value>,
    #[serde(rename = "Leads_MarketingCampaign")]
    pub marketing_campaign: MarketingCampaign,
}

impl SubmissionRecord {
    pub fn primary_address(&self) -> Option<&Address> {
        self.addresses.iter().find(|address| address.is_primary)
    }

    pub fn postal_address(&self) -> Option<&Address> {
        self.addresses
            .iter()
            .find(|address| address.address_type == AddressType::Postal)
    }
}
