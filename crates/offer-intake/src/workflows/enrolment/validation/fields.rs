use super::{Check, Condition, FieldDefinition, FieldKind, Pattern, Rule};

pub(crate) const OVERSEAS_ORIGINS: &[&str] =
    &["OverseasStudentOffshore", "OverseasStudentInAustralia"];

const ENGLISH: Rule = Rule::Custom(Check::EnglishText);

const EMAIL: Rule = Rule::Pattern {
    pattern: Pattern::Email,
    message: "Please enter a valid email address",
};

const POSTCODE: Rule = Rule::Pattern {
    pattern: Pattern::Digits,
    message: "Please enter a valid postcode",
};

const MOBILE: Rule = Rule::Pattern {
    pattern: Pattern::Digits,
    message: "Please enter a valid mobile phone number (numbers only)",
};

const SCORE_FORMAT: Rule = Rule::Pattern {
    pattern: Pattern::Decimal,
    message: "Please enter a valid number",
};

const SCORE_FLOOR: Rule = Rule::Min {
    value: 0.0,
    message: "Score must be 0 or greater",
};

fn text(name: &'static str, label: &'static str) -> FieldDefinition {
    FieldDefinition::new(name, label, FieldKind::Text)
}

fn select(name: &'static str, label: &'static str) -> FieldDefinition {
    FieldDefinition::new(name, label, FieldKind::Select)
}

fn date(name: &'static str, label: &'static str) -> FieldDefinition {
    FieldDefinition::new(name, label, FieldKind::Date)
}

fn overseas() -> Condition {
    Condition::OneOf {
        field: "studentOrigin",
        values: OVERSEAS_ORIGINS,
    }
}

fn answered_yes(field: &'static str) -> Condition {
    Condition::Equals { field, value: "Yes" }
}

fn sat_english_test() -> Condition {
    Condition::Equals {
        field: "hasCompletedEnglishTest",
        value: "English test",
    }
}

fn score(name: &'static str, label: &'static str, missing: &'static str) -> FieldDefinition {
    FieldDefinition::new(name, label, FieldKind::Text)
        .required_when(sat_english_test(), missing)
        .rule(SCORE_FORMAT)
        .rule(SCORE_FLOOR)
}

fn personal() -> Vec<FieldDefinition> {
    vec![
        FieldDefinition::new("studentOrigin", "Student Origin", FieldKind::Radio)
            .required("Please select your student origin"),
        select("visaResidentName", "Visa Type").required_when(
            Condition::Equals {
                field: "studentOrigin",
                value: "ResidentStudent",
            },
            "Please select your visa type",
        ),
        select("title", "Title").required("Please select your title"),
        text("firstName", "First Name")
            .required("Please enter your first name")
            .rule(Rule::MinLength {
                length: 2,
                message: "First name must be at least 2 characters",
            })
            .rule(Rule::MaxLength {
                length: 50,
                message: "First name cannot exceed 50 characters",
            })
            .rule(ENGLISH),
        text("middleName", "Middle Name")
            .rule(Rule::MaxLength {
                length: 50,
                message: "Middle name cannot exceed 50 characters",
            })
            .rule(ENGLISH),
        text("familyName", "Family Name")
            .required("Please enter your family name")
            .rule(Rule::MinLength {
                length: 2,
                message: "Family name must be at least 2 characters",
            })
            .rule(Rule::MaxLength {
                length: 50,
                message: "Family name cannot exceed 50 characters",
            })
            .rule(ENGLISH),
        text("preferredName", "Preferred Name")
            .rule(Rule::MaxLength {
                length: 50,
                message: "Preferred name cannot exceed 50 characters",
            })
            .rule(ENGLISH),
        select("gender", "Gender").required("Please select your gender"),
        date("dateOfBirth", "Date of Birth")
            .required("Please select your date of birth")
            .rule(Rule::Custom(Check::MinimumAge { years: 10 })),
        text("email", "Email Address")
            .required("Please enter your email address")
            .rule(EMAIL),
        text("visaNumber", "Visa Number")
            .required_when(overseas(), "Please enter your visa number")
            .rule(ENGLISH),
        date("visaExpiryDate", "Visa Expiry Date")
            .required_when(overseas(), "Please select your visa expiry date")
            .rule(Rule::Custom(Check::FutureDate {
                message: "Visa expiry date must be in the future",
            })),
        text("birthplace", "Birthplace").rule(ENGLISH),
        select("countryOfBirth", "Country of Birth").required("Please select your country of birth"),
        select("nationality", "Nationality").required("Please select your nationality"),
        text("passportNumber", "Passport Number")
            .required("Please enter your passport number")
            .rule(ENGLISH),
        date("passportExpiryDate", "Passport Expiry Date")
            .required("Please select passport expiry date")
            .rule(Rule::Custom(Check::FutureDate {
                message: "Passport expiry date must be in the future",
            })),
        text("usi", "USI (Unique Student Identifier)")
            .rule(Rule::MinLength {
                length: 10,
                message: "USI must be at least 10 characters",
            })
            .rule(ENGLISH),
    ]
}

fn current_address() -> Vec<FieldDefinition> {
    vec![
        select("currentCountry", "Country").required("Please select your country"),
        text("buildingPropertyName", "Building/Property Name").rule(ENGLISH),
        text("flatUnitDetails", "Flat/Unit Details").rule(ENGLISH),
        text("streetNumber", "Street Number")
            .required("Please enter street number")
            .rule(ENGLISH),
        text("streetName", "Street Name")
            .required("Please enter street name")
            .rule(ENGLISH),
        text("cityTownSuburb", "City/Town/Suburb")
            .required("Please enter city/town/suburb")
            .rule(ENGLISH),
        text("state", "State")
            .required("Please enter state")
            .rule(ENGLISH),
        text("postcode", "Postcode")
            .required("Please enter postcode")
            .rule(POSTCODE),
        text("mobilePhone", "Mobile Phone")
            .required("Please enter your mobile phone number")
            .rule(MOBILE),
        select(
            "hasPostalAddress",
            "Do you have a postal address? (if different to your current street address)",
        )
        .required("Please select if you have a different postal address"),
        select(
            "hasOverseasAddress",
            "Do you have an Overseas/Permanent Address? (if different to your current street address)",
        )
        .required_when(
            overseas(),
            "Please select if you have an overseas/permanent address",
        ),
    ]
}

fn postal_address() -> Vec<FieldDefinition> {
    let postal = || answered_yes("hasPostalAddress");
    vec![
        select("postalCountry", "Country").required_when(postal(), "Please select country"),
        text("postalBuildingPropertyName", "Building/Property Name").rule(ENGLISH),
        text("postalFlatUnitDetails", "Flat/Unit Details").rule(ENGLISH),
        text("postalStreetNumber", "Street Number")
            .required_when(postal(), "Please enter street number"),
        text("postalStreetName", "Street Name")
            .required_when(postal(), "Please enter street name")
            .rule(ENGLISH),
        text("postalCityTownSuburb", "City/Town/Suburb")
            .required_when(postal(), "Please enter city/town/suburb")
            .rule(ENGLISH),
        text("postalState", "State")
            .required_when(postal(), "Please enter state")
            .rule(ENGLISH),
        text("postalPostcode", "Postcode")
            .required_when(postal(), "Please enter postcode")
            .rule(POSTCODE),
        text("postalMobilePhone", "Mobile Phone")
            .required_when(postal(), "Please enter mobile phone number")
            .rule(MOBILE),
    ]
}

fn overseas_address() -> Vec<FieldDefinition> {
    vec![
        select("overseasCountry", "Country"),
        text("overseasBuildingPropertyName", "Building/Property Name").rule(ENGLISH),
        text("overseasFlatUnitDetails", "Flat/Unit Details").rule(ENGLISH),
        text("overseasStreetNumber", "Street Number"),
        text("overseasStreetName", "Street Name").rule(ENGLISH),
        text("overseasCityTownSuburb", "City/Town/Suburb").rule(ENGLISH),
        text("overseasState", "State/Province").rule(ENGLISH),
        text("overseasPostcode", "Postcode").rule(POSTCODE),
        text("overseasMobilePhone", "Mobile Phone").rule(MOBILE),
    ]
}

fn emergency_contact() -> Vec<FieldDefinition> {
    vec![
        select("contactType", "Contact Type").required("Please select contact type"),
        text("relationship", "Relationship")
            .required("Please enter relationship")
            .rule(ENGLISH),
        text("contactGivenName", "Given Name")
            .required("Please enter contact given name")
            .rule(ENGLISH),
        text("contactFamilyName", "Family Name")
            .required("Please enter contact family name")
            .rule(ENGLISH),
        text("contactFlatUnitDetails", "Flat/unit Details").rule(ENGLISH),
        text("contactStreetAddress", "Street Address").rule(ENGLISH),
        text("contactCityTownSuburb", "City/Town/Suburb").rule(ENGLISH),
        text("contactPostcode", "Postcode").rule(Rule::Pattern {
            pattern: Pattern::Digits,
            message: "Please enter a valid postcode (numbers only)",
        }),
        text("contactState", "State").rule(ENGLISH),
        text("contactCountry", "Country").rule(ENGLISH),
        text("contactEmail", "Email")
            .required("Please enter contact email")
            .rule(EMAIL),
        text("contactMobile", "Mobile")
            .required("Please enter contact mobile number")
            .rule(Rule::Pattern {
                pattern: Pattern::Digits,
                message: "Please enter a valid mobile number",
            }),
        text("contactLanguagesSpoken", "Language(s) Spoken").rule(ENGLISH),
    ]
}

fn language() -> Vec<FieldDefinition> {
    vec![
        select("isAboriginal", "Are you of Australian Aboriginal origin?")
            .required("Please select if you are of Aboriginal origin"),
        select("isTorresStraitIslander", "Are you of Torres Strait Islander origin?")
            .required("Please select if you are of Torres Strait Islander origin"),
        select("isEnglishMainLanguage", "Is English your main language?")
            .required("Please select if English is your main language"),
        select(
            "languageSpokenAtHome",
            "If no, what is your language spoken at home?",
        )
        .rule(ENGLISH),
        select(
            "wasEnglishInstructionLanguage",
            "Was English the language of instruction in previous secondary or tertiary studies?",
        )
        .required("Please select if English was the language of instruction"),
        select(
            "hasCompletedEnglishTest",
            "How do you complete English Language Proficiency?",
        )
        .required("Please select how you complete English Language Proficiency"),
    ]
}

fn english_test() -> Vec<FieldDefinition> {
    vec![
        select("englishTestType", "What test did you sit?")
            .required_when(sat_english_test(), "Please select test type"),
        score("listeningScore", "Listening Score", "Please enter listening score"),
        score("readingScore", "Reading Score", "Please enter reading score"),
        score("writingScore", "Writing Score", "Please enter writing score"),
        score("speakingScore", "Speaking Score", "Please enter speaking score"),
        score("overallScore", "Overall Score", "Please enter overall score"),
        date("engTestDate", "Test Date")
            .required_when(sat_english_test(), "Please select test date")
            .rule(Rule::Custom(Check::NotFutureDate {
                message: "Test date cannot be in the future",
            })),
    ]
}

fn education() -> Vec<FieldDefinition> {
    let achieved = || answered_yes("hasAchievedQualifications");
    vec![
        select(
            "highestSchoolLevel",
            "What is your highest completed school level?",
        )
        .required("Please select your highest completed school level"),
        select(
            "isStillAttendingSchool",
            "Are you still attending secondary school?",
        ),
        select(
            "hasAchievedQualifications",
            "Have you achieved any education qualifications?",
        )
        .required("Please select if you have achieved any qualifications"),
        select("qualificationLevel", "Your latest educational qualification")
            .required_when(achieved(), "Please select qualification level"),
        text("qualificationName", "Qualification Name")
            .required_when(achieved(), "Please enter qualification name")
            .rule(ENGLISH),
        select("qualificationRecognition", "Qualification Recognition")
            .required_when(achieved(), "Please select qualification recognition"),
        text("institutionName", "School/Institution Name")
            .required_when(achieved(), "Please enter institution name")
            .rule(ENGLISH),
        text("stateCountry", "State/Country")
            .required_when(achieved(), "Please enter state/country")
            .rule(ENGLISH),
    ]
}

fn employment() -> Vec<FieldDefinition> {
    vec![
        select(
            "currentEmploymentStatus",
            "Which best describes your current employment status?",
        )
        .required("Please select your current employment status"),
        select("industryOfEmployment", "Industry of Employment"),
        select("occupationIdentifier", "Occupation Identifier"),
    ]
}

fn course_and_marketing() -> Vec<FieldDefinition> {
    vec![
        select("selectedCourse", "Course").required("Please select your course"),
        select("selectedIntake", "Preferred Course Intake Date")
            .required("Please select your preferred intake date")
            .rule(Rule::Custom(Check::CalendarDate)),
        select("howDidYouHearAboutUs", "How did you hear about us?")
            .required("Please select how you heard about us"),
        text(
            "howDidYouHearDetails",
            "Please specify how you hear about us?",
        )
        .rule(ENGLISH),
        text("agentName", "Agent Name").rule(ENGLISH),
        text("agentEmail", "Agent Email").rule(EMAIL),
        FieldDefinition::new("selectedAgent", "Selected Agent", FieldKind::Custom)
            .rule(Rule::Custom(Check::CompositeKey)),
        FieldDefinition::new(
            "agreeToTerms",
            "I agree to the enrolment terms and conditions.",
            FieldKind::Checkbox,
        )
        .required("Please agree to the terms and conditions"),
    ]
}

/// Every field of the student enrolment form, grouped roughly by step.
pub fn standard_fields() -> Vec<FieldDefinition> {
    [
        personal(),
        current_address(),
        postal_address(),
        overseas_address(),
        emergency_contact(),
        language(),
        english_test(),
        education(),
        employment(),
        course_and_marketing(),
    ]
    .into_iter()
    .flatten()
    .collect()
}
