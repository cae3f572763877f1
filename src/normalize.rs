use std::sync::LazyLock;

use regex::Regex;

use crate::filing::{Field, NormalizedFiling, PLACEHOLDER, RawAttributes};

static RATIO_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.\d+|\d+)").expect("ratio number pattern is valid"));

const IDENTITY_DELIMITER: &str = "_";

/// De-duplication key of a filing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FilingIdentity(String);

impl FilingIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FilingIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reduces holding ratios to their leading number; every other field passes through.
pub fn normalize(raw: RawAttributes) -> NormalizedFiling {
    let mut fields = raw.fields;
    for field in Field::ALL.into_iter().filter(|field| field.is_holding_ratio()) {
        if let Some(Some(value)) = fields.slot_mut(field) {
            *value = leading_number(value).to_owned();
        }
    }
    NormalizedFiling::new(fields)
}

/// First decimal-or-integer token of `value`, or `value` itself when it has none.
pub fn leading_number(value: &str) -> &str {
    RATIO_NUMBER
        .find(value)
        .map_or(value, |number| number.as_str())
}

pub fn identity_of(filing: &NormalizedFiling) -> FilingIdentity {
    let submission_digits = filing
        .get(Field::SubmissionDate)
        .map(ascii_digits)
        .unwrap_or_default();
    let report_digits = filing
        .get(Field::ReportDate)
        .map(ascii_digits)
        .unwrap_or_default();

    let parts = [
        filing.get(Field::SecurityCode).unwrap_or(PLACEHOLDER),
        submission_digits.as_str(),
        report_digits.as_str(),
        filing.kind().label(),
        filing.get(Field::HolderName).unwrap_or(PLACEHOLDER),
    ];
    FilingIdentity(parts.join(IDENTITY_DELIMITER))
}

fn ascii_digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}
