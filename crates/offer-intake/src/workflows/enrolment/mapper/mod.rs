//! Flat form values → submission records.
//!
//! Mapping is pure. The only time input is the `now` passed by the caller,
//! which stamps the record, derives the offer id, and seeds the default
//! intake date, so a fixed `now` yields byte-identical output.

pub mod codes;
mod flattened;
mod record;

use chrono::{DateTime, Datelike, Duration, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

use super::form::FormValues;

pub use flattened::{
    map_to_flattened_submission, project_flattened, CodeLabels, FlattenedEducation,
    FlattenedSubmissionRecord,
};
pub use record::{
    Address, AddressType, AppliedCourse, Applicant, ComplianceInfo, EducationHistory,
    EmergencyContact, GenderCode, MarketingCampaign, OfferId, SubmissionRecord,
};

/// Length of the diploma from intake to finish.
pub const COURSE_DURATION_WEEKS: i64 = 66;
/// Gap between "now" and the intake used when none was chosen.
pub const DEFAULT_INTAKE_OFFSET_DAYS: i64 = 30;
pub const DEFAULT_COURSE_ID: &str = "CPC50220";
pub const DEFAULT_CAMPUS_ID: u32 = 1;
pub const DEFAULT_VISA_TYPE: &str = "Student Visa";
pub const DEFAULT_VISA_NUMBER: &str = "V0000000";
pub const DEFAULT_CAMPAIGN: &str = "Website";

pub fn offer_id_for(now: DateTime<Utc>) -> OfferId {
    OfferId(now.format("OFFER_%Y%m%d_%H%M%S").to_string())
}

/// Millisecond-precision UTC timestamp with a `Z` suffix.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses `YYYY-MM-DD` (as UTC midnight) or an RFC 3339 timestamp.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|midnight| midnight.and_utc());
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|timestamp| timestamp.with_timezone(&Utc))
}

/// Normalizes a form date to [`iso_timestamp`]; blank or unparsable input is `None`.
pub fn format_date(text: &str) -> Option<String> {
    parse_timestamp(text).map(iso_timestamp)
}

/// Space-joined non-empty parts.
fn join_present(parts: &[String]) -> String {
    parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn or_default(form: &FormValues, name: &str, fallback: &str) -> String {
    form.non_blank(name).unwrap_or_else(|| fallback.to_string())
}

fn address(
    form: &FormValues,
    offer_id: &OfferId,
    address_type: AddressType,
    prefix: &str,
) -> Address {
    // Current-address fields are unprefixed; postal ones carry `postal` and
    // capitalize the remainder.
    let field = |name: &str| -> String {
        if prefix.is_empty() {
            form.text(name)
        } else {
            let mut chars = name.chars();
            let capitalized: String = chars
                .next()
                .map(|first| first.to_ascii_uppercase().to_string() + chars.as_str())
                .unwrap_or_default();
            form.text(&format!("{prefix}{capitalized}"))
        }
    };
    let country_field = if prefix.is_empty() {
        "currentCountry".to_string()
    } else {
        format!("{prefix}Country")
    };

    Address {
        offer_id: offer_id.clone(),
        address_type,
        is_primary: address_type == AddressType::Current,
        building_name: field("buildingPropertyName"),
        flat_unit_detail: field("flatUnitDetails"),
        street_number: field("streetNumber"),
        street_name: field("streetName"),
        suburb: field("cityTownSuburb"),
        state: field("state"),
        postcode: field("postcode"),
        country: form.text(&country_field),
        phone: String::new(),
        fax: String::new(),
        mobile: field("mobilePhone"),
    }
}

fn applied_course(form: &FormValues, offer_id: &OfferId, now: DateTime<Utc>) -> AppliedCourse {
    let intake = form
        .non_blank("selectedIntake")
        .unwrap_or_else(|| iso_timestamp(now + Duration::days(DEFAULT_INTAKE_OFFSET_DAYS)));
    // Intakes too close to the calendar's end have no representable finish date.
    let finish_date = parse_timestamp(&intake)
        .and_then(|start| start.checked_add_signed(Duration::weeks(COURSE_DURATION_WEEKS)))
        .map(iso_timestamp);

    AppliedCourse {
        offer_id: offer_id.clone(),
        course_id: or_default(form, "selectedCourse", DEFAULT_COURSE_ID),
        campus_id: DEFAULT_CAMPUS_ID,
        intake_date: intake.clone(),
        start_date: intake,
        finish_date,
        elicos_num_of_weeks: 0,
        tuition_fee: 0.0,
        enrolment_fee: 0.0,
        material_fee: 0.0,
        upfront_fee: 0.0,
        special_condition: String::new(),
        application_request: String::new(),
        status: "Pending".to_string(),
    }
}

fn compliance(form: &FormValues, offer_id: &OfferId) -> ComplianceInfo {
    let first_language = if form.is_yes("isEnglishMainLanguage") {
        "English".to_string()
    } else {
        form.text("languageSpokenAtHome")
    };

    ComplianceInfo {
        offer_id: offer_id.clone(),
        country_birth: form.text("countryOfBirth"),
        nationality: form.text("nationality"),
        passport_number: form.text("passportNumber"),
        passport_expiry_date: format_date(&form.text("passportExpiryDate")),
        visa_type: DEFAULT_VISA_TYPE.to_string(),
        visa_number: or_default(form, "visaNumber", DEFAULT_VISA_NUMBER),
        visa_expiry_date: format_date(&form.text("visaExpiryDate")).unwrap_or_default(),
        first_language,
        how_well_eng_speak: String::new(),
        study_reason: "04".to_string(),
        current_employ_status: form.text("currentEmploymentStatus"),
        industry_employment: form.text("industryOfEmployment"),
        occupation_code: form.text("occupationIdentifier"),
        usi: form.text("usi"),
        is_aboriginal: form.is_yes("isAboriginal"),
        is_torres_strait_islander: form.is_yes("isTorresStraitIslander"),
        is_eng_language_in_class: form.is_yes("wasEnglishInstructionLanguage"),
        eng_test_type: form.text("englishTestType"),
        eng_test_date: format_date(&form.text("engTestDate")),
        eng_test_listening_score: form.text("listeningScore"),
        eng_test_reading_score: form.text("readingScore"),
        eng_test_writing_score: form.text("writingScore"),
        eng_test_speaking_score: form.text("speakingScore"),
        eng_test_overall_score: form.text("overallScore"),
        high_school_level: form.text("highestSchoolLevel"),
        high_school_year_completed: String::new(),
        is_still_at_high_school: form.is_yes("isStillAttendingSchool"),
        school_type: "Government".to_string(),
        is_disabled: false,
        is_request_help_for_disabled: false,
    }
}

/// Build the canonical nested record.
pub fn map_to_submission(form: &FormValues, now: DateTime<Utc>) -> SubmissionRecord {
    let offer_id = offer_id_for(now);

    let mut addresses = vec![address(form, &offer_id, AddressType::Current, "")];
    if form.is_yes("hasPostalAddress") {
        addresses.push(address(form, &offer_id, AddressType::Postal, "postal"));
    }

    let mut education_history_list = Vec::new();
    if form.is_yes("hasAchievedQualifications") {
        education_history_list.push(EducationHistory {
            offer_id: offer_id.clone(),
            qualification_name: form.text("qualificationName"),
            institute_name: form.text("institutionName"),
            institute_location: form.text("stateCountry"),
            year_completed: now.year(),
            education_level_code: form.text("qualificationLevel"),
            achievement_recognition_code: form.text("qualificationRecognition"),
        });
    }

    let heard_from = form.text("howDidYouHearAboutUs");
    let lead_source = if heard_from == "Agent" { "Agent" } else { "Direct" };

    SubmissionRecord {
        offer_id: offer_id.clone(),
        time_stamp: iso_timestamp(now),
        applicant: Applicant {
            title: form.text("title"),
            first_name: form.text("firstName"),
            middle_name: form.text("middleName"),
            last_name: form.text("familyName"),
            preferred_name: form.text("preferredName"),
            gender: GenderCode::from_form(&form.text("gender")),
            dob: format_date(&form.text("dateOfBirth")),
            email: form.text("email"),
            birthplace: form.text("birthplace"),
            student_origin: "OverseasStudent".to_string(),
        },
        compliance_and_other_info: compliance(form, &offer_id),
        addresses,
        applied_courses: vec![applied_course(form, &offer_id, now)],
        disabilities: Vec::new(),
        emergency_contact: EmergencyContact {
            offer_id: offer_id.clone(),
            contact_type: form.text("contactType"),
            relationship: form.text("relationship"),
            contact_name: join_present(&[
                form.text("contactGivenName"),
                form.text("contactFamilyName"),
            ]),
            address: join_present(&[
                form.text("contactFlatUnitDetails"),
                form.text("contactStreetAddress"),
                form.text("contactCityTownSuburb"),
                form.text("contactState"),
                form.text("contactPostcode"),
                form.text("contactCountry"),
            ]),
            phone: form.text("contactMobile"),
            email: form.text("contactEmail"),
            languages_spoken: form.text("contactLanguagesSpoken"),
        },
        education_history_list,
        employment_history_list: Vec::new(),
        marketing_campaign: MarketingCampaign {
            offer_id,
            know_from: heard_from,
            lead_source: lead_source.to_string(),
            campaign_name: or_default(form, "howDidYouHearDetails", DEFAULT_CAMPAIGN),
        },
    }
}

/// A required record field left empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Error)]
pub enum RecordValidationError {
    #[error("First Name is required")]
    FirstName,
    #[error("Last Name is required")]
    LastName,
    #[error("Email is required")]
    Email,
    #[error("Date of Birth is required")]
    DateOfBirth,
    #[error("Country of Birth is required")]
    CountryOfBirth,
    #[error("Nationality is required")]
    Nationality,
    #[error("Passport Number is required")]
    PassportNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordValidation {
    pub is_valid: bool,
    pub errors: Vec<RecordValidationError>,
}

impl RecordValidation {
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// Blocking record-level check run before any network call.
pub fn validate_record(record: &SubmissionRecord) -> RecordValidation {
    let applicant = &record.applicant;
    let compliance = &record.compliance_and_other_info;
    let blank = |value: &str| value.trim().is_empty();

    let checks = [
        (blank(&applicant.first_name), RecordValidationError::FirstName),
        (blank(&applicant.last_name), RecordValidationError::LastName),
        (blank(&applicant.email), RecordValidationError::Email),
        (applicant.dob.is_none(), RecordValidationError::DateOfBirth),
        (blank(&compliance.country_birth), RecordValidationError::CountryOfBirth),
        (blank(&compliance.nationality), RecordValidationError::Nationality),
        (blank(&compliance.passport_number), RecordValidationError::PassportNumber),
    ];

    let errors: Vec<_> = checks
        .into_iter()
        .filter_map(|(missing, error)| missing.then_some(error))
        .collect();

    RecordValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}
