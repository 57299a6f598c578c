use crate::workflows::enrolment::form::FormValues;
use crate::workflows::enrolment::validation::{Condition, FieldRegistry, OVERSEAS_ORIGINS};

/// Fields that join a step while `when` holds.
#[derive(Debug, Clone)]
pub struct ConditionalFields {
    pub when: Condition,
    pub fields: Vec<&'static str>,
}

#[derive(Debug, Clone)]
pub struct StepDefinition {
    pub number: u8,
    pub title: &'static str,
    pub base_fields: Vec<&'static str>,
    pub conditional: Vec<ConditionalFields>,
}

impl StepDefinition {
    /// Base fields plus every conditional group whose predicate currently holds.
    pub fn effective_fields(&self, form: &FormValues) -> Vec<&'static str> {
        let mut fields = self.base_fields.clone();
        for group in &self.conditional {
            if group.when.holds(form) {
                fields.extend(group.fields.iter().copied());
            }
        }
        fields
    }

    fn referenced_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.base_fields.iter().copied().chain(
            self.conditional
                .iter()
                .flat_map(|group| group.fields.iter().copied()),
        )
    }
}

#[derive(Debug, Clone)]
pub struct StepBlueprint {
    steps: Vec<StepDefinition>,
}

impl StepBlueprint {
    pub fn standard() -> Self {
        Self {
            steps: standard_steps(),
        }
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn step(&self, number: u8) -> Option<&StepDefinition> {
        self.steps.iter().find(|step| step.number == number)
    }

    pub fn len(&self) -> u8 {
        self.steps.len() as u8
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Names referenced by a step but missing from the registry.
    pub fn unregistered_fields(&self, registry: &FieldRegistry) -> Vec<&'static str> {
        self.steps
            .iter()
            .flat_map(StepDefinition::referenced_fields)
            .filter(|name| !registry.contains(name))
            .collect()
    }
}

fn equals(field: &'static str, value: &'static str) -> Condition {
    Condition::Equals { field, value }
}

fn standard_steps() -> Vec<StepDefinition> {
    vec![
        StepDefinition {
            number: 1,
            title: "Personal Details",
            base_fields: vec![
                "studentOrigin",
                "title",
                "firstName",
                "middleName",
                "familyName",
                "preferredName",
                "gender",
                "dateOfBirth",
                "email",
                "birthplace",
                "countryOfBirth",
                "nationality",
                "passportNumber",
                "passportExpiryDate",
                "usi",
            ],
            conditional: vec![
                ConditionalFields {
                    when: Condition::OneOf {
                        field: "studentOrigin",
                        values: OVERSEAS_ORIGINS,
                    },
                    fields: vec!["visaNumber", "visaExpiryDate"],
                },
                ConditionalFields {
                    when: equals("studentOrigin", "ResidentStudent"),
                    fields: vec!["visaResidentName"],
                },
            ],
        },
        StepDefinition {
            number: 2,
            title: "Contact Details",
            base_fields: vec![
                "currentCountry",
                "buildingPropertyName",
                "flatUnitDetails",
                "streetNumber",
                "streetName",
                "cityTownSuburb",
                "state",
                "postcode",
                "mobilePhone",
                "hasPostalAddress",
                "contactType",
                "relationship",
                "contactGivenName",
                "contactFamilyName",
                "contactFlatUnitDetails",
                "contactStreetAddress",
                "contactCityTownSuburb",
                "contactPostcode",
                "contactState",
                "contactCountry",
                "contactEmail",
                "contactMobile",
                "contactLanguagesSpoken",
            ],
            conditional: vec![
                ConditionalFields {
                    when: equals("hasPostalAddress", "Yes"),
                    fields: vec![
                        "postalCountry",
                        "postalBuildingPropertyName",
                        "postalFlatUnitDetails",
                        "postalStreetNumber",
                        "postalStreetName",
                        "postalCityTownSuburb",
                        "postalState",
                        "postalPostcode",
                        "postalMobilePhone",
                    ],
                },
                ConditionalFields {
                    when: Condition::OneOf {
                        field: "studentOrigin",
                        values: OVERSEAS_ORIGINS,
                    },
                    fields: vec!["hasOverseasAddress"],
                },
                ConditionalFields {
                    when: equals("hasOverseasAddress", "Yes"),
                    fields: vec![
                        "overseasCountry",
                        "overseasBuildingPropertyName",
                        "overseasFlatUnitDetails",
                        "overseasStreetNumber",
                        "overseasStreetName",
                        "overseasCityTownSuburb",
                        "overseasState",
                        "overseasPostcode",
                        "overseasMobilePhone",
                    ],
                },
            ],
        },
        StepDefinition {
            number: 3,
            title: "Language, Education & Employment",
            base_fields: vec![
                "isAboriginal",
                "isTorresStraitIslander",
                "isEnglishMainLanguage",
                "wasEnglishInstructionLanguage",
                "hasCompletedEnglishTest",
                "highestSchoolLevel",
                "isStillAttendingSchool",
                "hasAchievedQualifications",
                "currentEmploymentStatus",
                "industryOfEmployment",
                "occupationIdentifier",
            ],
            conditional: vec![
                ConditionalFields {
                    when: equals("isEnglishMainLanguage", "No"),
                    fields: vec!["languageSpokenAtHome"],
                },
                ConditionalFields {
                    when: equals("hasCompletedEnglishTest", "English test"),
                    fields: vec![
                        "englishTestType",
                        "listeningScore",
                        "readingScore",
                        "writingScore",
                        "speakingScore",
                        "overallScore",
                        "engTestDate",
                    ],
                },
                ConditionalFields {
                    when: equals("hasAchievedQualifications", "Yes"),
                    fields: vec![
                        "qualificationLevel",
                        "qualificationName",
                        "qualificationRecognition",
                        "institutionName",
                        "stateCountry",
                    ],
                },
            ],
        },
        StepDefinition {
            number: 4,
            title: "Course & Declaration",
            base_fields: vec![
                "selectedCourse",
                "selectedIntake",
                "howDidYouHearAboutUs",
                "howDidYouHearDetails",
                "agreeToTerms",
            ],
            conditional: vec![ConditionalFields {
                when: equals("howDidYouHearAboutUs", "Agent"),
                fields: vec!["agentName", "agentEmail", "selectedAgent"],
            }],
        },
    ]
}
