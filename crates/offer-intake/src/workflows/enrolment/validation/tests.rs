use chrono::NaiveDate;
use serde_json::json;

use super::*;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 1).expect("valid date")
}

fn check(
    registry: &FieldRegistry,
    name: &str,
    value: Value,
    form: &FormValues,
) -> Result<(), ValidationError> {
    registry.validate(name, Some(&value), form, today())
}

#[test]
fn empty_required_field_reports_required_and_nothing_else() {
    let registry = FieldRegistry::standard();
    let form = FormValues::new();

    let err = check(&registry, "firstName", json!(""), &form).expect_err("required");
    assert_eq!(err.kind, ValidationErrorKind::Required);
    assert_eq!(err.message, "Please enter your first name");

    let err = check(&registry, "email", json!("   "), &form).expect_err("required");
    assert_eq!(err.kind, ValidationErrorKind::Required);
    assert_eq!(err.message, "Please enter your email address");
}

#[test]
fn optional_blank_value_skips_every_rule() {
    let registry = FieldRegistry::standard();
    let form = FormValues::new();
    assert!(check(&registry, "usi", json!(""), &form).is_ok());
    assert!(registry.validate("agentEmail", None, &form, today()).is_ok());
}

#[test]
fn pattern_runs_before_bounds() {
    let registry = FieldRegistry::standard();
    let form = FormValues::new();

    let err = check(&registry, "listeningScore", json!("-1"), &form);
    // Not required without an English test; the value is still shape-checked.
    let err = err.expect_err("negative score fails the decimal pattern");
    assert_eq!(err.kind, ValidationErrorKind::Pattern);
    assert_eq!(err.message, "Please enter a valid number");

    let err = check(&registry, "firstName", json!("A"), &form).expect_err("too short");
    assert_eq!(err.kind, ValidationErrorKind::Bounds);
    assert_eq!(err.message, "First name must be at least 2 characters");
}

#[test]
fn bounds_run_before_custom_checks() {
    let registry = FieldRegistry::standard();
    let form = FormValues::new();

    let long_non_latin = "张".repeat(51);
    let err = check(&registry, "familyName", json!(long_non_latin), &form).expect_err("too long");
    assert_eq!(err.kind, ValidationErrorKind::Bounds);

    let err = check(&registry, "familyName", json!("李雷"), &form).expect_err("non-latin");
    assert_eq!(err.kind, ValidationErrorKind::Custom);
    assert_eq!(err.message, "Please use English letters and numbers only");
}

#[test]
fn conditional_requirement_follows_other_answers() {
    let registry = FieldRegistry::standard();
    let mut form = FormValues::new();

    assert!(check(&registry, "postalStreetName", json!(""), &form).is_ok());

    form.set("hasPostalAddress", "Yes");
    let err = check(&registry, "postalStreetName", json!(""), &form).expect_err("required");
    assert_eq!(err.message, "Please enter street name");

    form.set("studentOrigin", "OverseasStudentOffshore");
    let err = check(&registry, "visaNumber", json!(""), &form).expect_err("visa required");
    assert_eq!(err.message, "Please enter your visa number");

    form.set("studentOrigin", "ResidentStudent");
    assert!(check(&registry, "visaNumber", json!(""), &form).is_ok());
}

#[test]
fn date_checks_use_the_evaluation_date() {
    let registry = FieldRegistry::standard();
    let form = FormValues::new();

    let err = check(&registry, "passportExpiryDate", json!("2025-10-01"), &form)
        .expect_err("expiry today is not in the future");
    assert_eq!(err.message, "Passport expiry date must be in the future");
    assert!(check(&registry, "passportExpiryDate", json!("2025-10-02"), &form).is_ok());

    let err = check(&registry, "dateOfBirth", json!("2016-01-01"), &form).expect_err("too young");
    assert_eq!(err.message, "Date of Birth must be at least 10 years ago");
    assert!(check(&registry, "dateOfBirth", json!("2015-10-01"), &form).is_ok());

    let err = check(&registry, "engTestDate", json!("2025-10-02T00:00:00Z"), &form)
        .expect_err("future test date");
    assert_eq!(err.message, "Test date cannot be in the future");
}

#[test]
fn intake_must_be_a_real_calendar_date() {
    let registry = FieldRegistry::standard();
    let form = FormValues::new();

    assert!(check(&registry, "selectedIntake", json!("2026-02-02"), &form).is_ok());
    assert!(check(&registry, "selectedIntake", json!("2026-07-13T00:00:00Z"), &form).is_ok());
    for broken in ["+262142-12-01", "+262142-01-01", "next spring", "2026-02-30"] {
        let err = check(&registry, "selectedIntake", json!(broken), &form).expect_err(broken);
        assert_eq!(err.kind, ValidationErrorKind::Custom);
        assert_eq!(err.message, "Please enter a valid date");
    }

    let err = check(&registry, "passportExpiryDate", json!("+262142-01-01"), &form)
        .expect_err("extended years are not form dates");
    assert_eq!(err.message, "Please enter a valid date");
}

#[test]
fn scores_need_at_least_one_digit() {
    let registry = FieldRegistry::standard();
    let form = FormValues::new();

    for accepted in ["7", "6.5", ".5", "65."] {
        assert!(
            check(&registry, "overallScore", json!(accepted), &form).is_ok(),
            "{accepted} rejected"
        );
    }
    for rejected in [".", "..", "6.5.1"] {
        let err = check(&registry, "overallScore", json!(rejected), &form).expect_err(rejected);
        assert_eq!(err.kind, ValidationErrorKind::Pattern);
        assert_eq!(err.message, "Please enter a valid number");
    }
}

#[test]
fn agent_selection_requires_name_and_country() {
    let registry = FieldRegistry::standard();
    let form = FormValues::new();

    assert!(check(&registry, "selectedAgent", json!("Acme Education|India"), &form).is_ok());
    for broken in ["Acme Education", "Acme|", "|India", "a|b|c"] {
        let err = check(&registry, "selectedAgent", json!(broken), &form).expect_err(broken);
        assert_eq!(err.message, "Invalid agent selection format");
    }
}

#[test]
fn unchecked_terms_box_is_missing() {
    let registry = FieldRegistry::standard();
    let form = FormValues::new();

    let err = check(&registry, "agreeToTerms", json!(false), &form).expect_err("unchecked");
    assert_eq!(err.kind, ValidationErrorKind::Required);
    assert!(check(&registry, "agreeToTerms", json!(true), &form).is_ok());
}

#[test]
fn unknown_field_is_reported() {
    let registry = FieldRegistry::standard();
    let err = check(&registry, "favouriteColour", json!("blue"), &FormValues::new())
        .expect_err("unknown");
    assert_eq!(err.kind, ValidationErrorKind::UnknownField);
}

#[test]
fn validation_is_deterministic() {
    let registry = FieldRegistry::standard();
    let form: FormValues = [("email", json!("not-an-email"))].into_iter().collect();
    let first = registry.validate_fields(["email", "firstName"], &form, today());
    let second = registry.validate_fields(["email", "firstName"], &form, today());
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].field, "email");
}

#[test]
fn rules_are_ordered_by_phase_regardless_of_declaration() {
    let field = FieldDefinition::new("code", "Code", FieldKind::Text)
        .rule(Rule::Custom(Check::EnglishText))
        .rule(Rule::MaxLength {
            length: 3,
            message: "too long",
        })
        .rule(Rule::Pattern {
            pattern: Pattern::Digits,
            message: "digits only",
        });
    let phases: Vec<RulePhase> = field.rules().iter().map(Rule::phase).collect();
    assert_eq!(
        phases,
        vec![RulePhase::Pattern, RulePhase::Bounds, RulePhase::Custom]
    );
}
