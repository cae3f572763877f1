/// Rendered in place of any value the filing did not carry.
pub const PLACEHOLDER: &str = "不明";

pub const LARGE_VOLUME_LABEL: &str = "大量保有報告書";
pub const CHANGE_REPORT_LABEL: &str = "変更報告書";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilingKind {
    LargeVolumeReport,
    ChangeReport,
}

impl FilingKind {
    /// Report type as persisted and as used in filing identities.
    pub fn label(self) -> &'static str {
        match self {
            FilingKind::LargeVolumeReport => LARGE_VOLUME_LABEL,
            FilingKind::ChangeReport => CHANGE_REPORT_LABEL,
        }
    }
}

impl std::fmt::Display for FilingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Every optional data point a filing can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    TargetCompany,
    SecurityCode,
    HolderName,
    ReportDate,
    SubmissionDate,
    SharesHeld,
    Purpose,
    HoldingRatio,
    HoldingRatioBefore,
    HoldingRatioAfter,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::TargetCompany,
        Field::SecurityCode,
        Field::HolderName,
        Field::ReportDate,
        Field::SubmissionDate,
        Field::SharesHeld,
        Field::Purpose,
        Field::HoldingRatio,
        Field::HoldingRatioBefore,
        Field::HoldingRatioAfter,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::TargetCompany => "target_company",
            Field::SecurityCode => "security_code",
            Field::HolderName => "holder_name",
            Field::ReportDate => "report_date",
            Field::SubmissionDate => "submission_date",
            Field::SharesHeld => "shares_held",
            Field::Purpose => "purpose",
            Field::HoldingRatio => "holding_ratio",
            Field::HoldingRatioBefore => "holding_ratio_before",
            Field::HoldingRatioAfter => "holding_ratio_after",
        }
    }

    pub fn is_holding_ratio(self) -> bool {
        self.name().contains("holding_ratio")
    }
}

/// Kind-specific ratio fields. The filing kind is derived from the variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Holdings {
    LargeVolume {
        holding_ratio: Option<String>,
    },
    Change {
        holding_ratio_before: Option<String>,
        holding_ratio_after: Option<String>,
    },
}

impl Holdings {
    pub fn empty(kind: FilingKind) -> Self {
        match kind {
            FilingKind::LargeVolumeReport => Holdings::LargeVolume {
                holding_ratio: None,
            },
            FilingKind::ChangeReport => Holdings::Change {
                holding_ratio_before: None,
                holding_ratio_after: None,
            },
        }
    }

    pub fn kind(&self) -> FilingKind {
        match self {
            Holdings::LargeVolume { .. } => FilingKind::LargeVolumeReport,
            Holdings::Change { .. } => FilingKind::ChangeReport,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingFields {
    pub target_company: Option<String>,
    pub security_code: Option<String>,
    pub holder_name: Option<String>,
    pub report_date: Option<String>,
    pub submission_date: Option<String>,
    pub shares_held: Option<String>,
    pub purpose: Option<String>,
    pub holdings: Holdings,
}

impl FilingFields {
    pub fn empty(kind: FilingKind) -> Self {
        Self {
            target_company: None,
            security_code: None,
            holder_name: None,
            report_date: None,
            submission_date: None,
            shares_held: None,
            purpose: None,
            holdings: Holdings::empty(kind),
        }
    }

    pub fn kind(&self) -> FilingKind {
        self.holdings.kind()
    }

    /// Value of `field`, `None` when absent or not applicable to this kind.
    pub fn get(&self, field: Field) -> Option<&str> {
        match (field, &self.holdings) {
            (Field::TargetCompany, _) => self.target_company.as_deref(),
            (Field::SecurityCode, _) => self.security_code.as_deref(),
            (Field::HolderName, _) => self.holder_name.as_deref(),
            (Field::ReportDate, _) => self.report_date.as_deref(),
            (Field::SubmissionDate, _) => self.submission_date.as_deref(),
            (Field::SharesHeld, _) => self.shares_held.as_deref(),
            (Field::Purpose, _) => self.purpose.as_deref(),
            (Field::HoldingRatio, Holdings::LargeVolume { holding_ratio }) => {
                holding_ratio.as_deref()
            }
            (
                Field::HoldingRatioBefore,
                Holdings::Change {
                    holding_ratio_before,
                    ..
                },
            ) => holding_ratio_before.as_deref(),
            (
                Field::HoldingRatioAfter,
                Holdings::Change {
                    holding_ratio_after, ..
                },
            ) => holding_ratio_after.as_deref(),
            _ => None,
        }
    }

    /// Storage slot of `field`, `None` when this kind has no such field.
    pub fn slot_mut(&mut self, field: Field) -> Option<&mut Option<String>> {
        match (field, &mut self.holdings) {
            (Field::TargetCompany, _) => Some(&mut self.target_company),
            (Field::SecurityCode, _) => Some(&mut self.security_code),
            (Field::HolderName, _) => Some(&mut self.holder_name),
            (Field::ReportDate, _) => Some(&mut self.report_date),
            (Field::SubmissionDate, _) => Some(&mut self.submission_date),
            (Field::SharesHeld, _) => Some(&mut self.shares_held),
            (Field::Purpose, _) => Some(&mut self.purpose),
            (Field::HoldingRatio, Holdings::LargeVolume { holding_ratio }) => Some(holding_ratio),
            (
                Field::HoldingRatioBefore,
                Holdings::Change {
                    holding_ratio_before,
                    ..
                },
            ) => Some(holding_ratio_before),
            (
                Field::HoldingRatioAfter,
                Holdings::Change {
                    holding_ratio_after, ..
                },
            ) => Some(holding_ratio_after),
            _ => None,
        }
    }
}

/// Attribute mapping read straight from a filing's documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttributes {
    pub fields: FilingFields,
}

impl RawAttributes {
    pub fn kind(&self) -> FilingKind {
        self.fields.kind()
    }
}

/// Cleaned filing. Missing values stay `None`; see [`PLACEHOLDER`] for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedFiling {
    fields: FilingFields,
}

impl NormalizedFiling {
    pub(crate) fn new(fields: FilingFields) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &FilingFields {
        &self.fields
    }

    pub fn kind(&self) -> FilingKind {
        self.fields.kind()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.fields.get(field)
    }

    /// Value of `field` or the placeholder literal.
    pub fn display(&self, field: Field) -> &str {
        self.fields.get(field).unwrap_or(PLACEHOLDER)
    }
}

impl From<NormalizedFiling> for RawAttributes {
    fn from(normalized: NormalizedFiling) -> Self {
        RawAttributes {
            fields: normalized.fields,
        }
    }
}
