/// Fixed code → label table for one classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeTable {
    pub name: &'static str,
    entries: &'static [(&'static str, &'static str)],
}

impl CodeTable {
    pub const fn new(name: &'static str, entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { name, entries }
    }

    pub fn entries(&self) -> &'static [(&'static str, &'static str)] {
        self.entries
    }

    pub fn label(&self, code: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == code)
            .map(|(_, label)| *label)
    }

    /// Label for `code`, or the code itself when the table has no entry.
    pub fn label_or_code(&self, code: &str) -> String {
        self.label(code)
            .map(str::to_string)
            .unwrap_or_else(|| code.to_string())
    }
}

pub const EMPLOYMENT_STATUS: CodeTable = CodeTable::new(
    "employment status",
    &[
        ("01", "01: Full-time employee"),
        ("02", "02: Part-time employee"),
        ("03", "03: Self-employed - not employing others"),
        ("04", "04: Employer"),
        ("05", "05: Employed - unpaid worker in a family business"),
        ("06", "06: Unemployed - seeking full-time work"),
        ("07", "07: Unemployed - seeking part-time work"),
        ("08", "08: Not employed - not seeking employment"),
        ("@@", "@@ - Not Specified"),
    ],
);

pub const INDUSTRY_OF_EMPLOYMENT: CodeTable = CodeTable::new(
    "industry of employment",
    &[
        ("A", "A - Agriculture, Forestry and Fishing"),
        ("B", "B - Mining"),
        ("C", "C - Manufacturing"),
        ("D", "D - Electricity, Gas, Water and Waste Services"),
        ("E", "E - Construction"),
        ("F", "F - Wholesale Trade"),
        ("G", "G - Retail Trade"),
        ("H", "H - Accommodation and Food Services"),
        ("I", "I - Transport, Postal and Warehousing"),
        ("J", "J - Information Media and telecommunications"),
        ("K", "K - Financial and Insurance Services"),
        ("L", "L - Rental, Hiring and real Estate Services"),
        ("M", "M - Professional, Scientific and Technical Services"),
        ("N", "N - Administrative and Support Services"),
        ("O", "O - Public Administration and Safety"),
        ("P", "P - Education and Training"),
        ("Q", "Q - Health Care and Social Assistance"),
        ("R", "R - Arts and recreation Services"),
        ("S", "S - Other Services"),
    ],
);

pub const OCCUPATION: CodeTable = CodeTable::new(
    "occupation",
    &[
        ("1", "1 - Manager"),
        ("2", "2 - Professionals"),
        ("3", "3 - Technicians and Trades Workers"),
        ("4", "4 - Community and personal Service Workers"),
        ("5", "5 - Clerical and Administrative Workers"),
        ("6", "6 - Sales Workers"),
        ("7", "7 - Machinery Operators and Drivers"),
        ("8", "8 - Labourers"),
        ("9", "9 - Other"),
    ],
);

pub const QUALIFICATION_LEVEL: CodeTable = CodeTable::new(
    "qualification level",
    &[
        ("008", "008 - Bachelor Degree or Higher Degree Level"),
        ("410", "410 - Advanced Diploma or Associate Degree Level"),
        ("420", "420 - Diploma Level"),
        ("511", "511 - Certificate IV"),
        ("514", "514 - Certificate III"),
        ("521", "521 - Certificate II"),
        ("524", "524 - Certificate I"),
        ("990", "990 - Miscellaneous Education"),
    ],
);

pub const QUALIFICATION_RECOGNITION: CodeTable = CodeTable::new(
    "qualification recognition",
    &[
        ("A", "A - Australian qualification"),
        ("E", "E - Australian equivalent"),
        ("I", "I - International"),
    ],
);

pub const HIGHEST_SCHOOL_LEVEL: CodeTable = CodeTable::new(
    "highest school level",
    &[
        ("@@", "@@ - Not Specified"),
        ("02", "02 - Did not go to school"),
        ("08", "08 - Year 8 or below"),
        ("09", "09 - Year 9 or equivalent"),
        ("10", "10 - Completed Year 10"),
        ("11", "11 - Completed Year 11"),
        ("12", "12 - Completed Year 12"),
    ],
);
