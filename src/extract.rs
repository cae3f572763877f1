use crate::document::MarkupDocument;
use crate::filing::{Field, FilingFields, FilingKind, RawAttributes};

/// Body document element ids read for a large volume report.
pub const LARGE_VOLUME_IDS: &[(Field, &str)] = &[
    (Field::TargetCompany, "T0100000000101"),
    (Field::SecurityCode, "T0100000000201"),
    (Field::HolderName, "T0201010100401"),
    (Field::HoldingRatio, "T0201040200201"),
    (Field::SharesHeld, "T0201040101401"),
    (Field::Purpose, "T0201020000101"),
];

/// Body document element ids read for a change report.
///
/// The current ratio sits where a large volume report keeps its only ratio.
pub const CHANGE_REPORT_IDS: &[(Field, &str)] = &[
    (Field::TargetCompany, "T0100000000101"),
    (Field::SecurityCode, "T0100000000201"),
    (Field::HolderName, "T0201010100401"),
    (Field::HoldingRatioBefore, "T0201040200301"),
    (Field::HoldingRatioAfter, "T0201040200201"),
    (Field::SharesHeld, "T0201040101401"),
    (Field::Purpose, "T0201020000101"),
];

pub const NAME_LABEL: &str = "氏名又は名称";
pub const OBLIGATION_DATE_LABEL: &str = "報告義務発生日";
pub const SUBMISSION_DATE_LABEL: &str = "提出日";

pub fn identifier_table(kind: FilingKind) -> &'static [(Field, &'static str)] {
    match kind {
        FilingKind::LargeVolumeReport => LARGE_VOLUME_IDS,
        FilingKind::ChangeReport => CHANGE_REPORT_IDS,
    }
}

/// Filer details labelled in the header's first table.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FilerInfo {
    pub name: Option<String>,
    pub report_date: Option<String>,
    pub submission_date: Option<String>,
}

pub fn filer_info(header: &MarkupDocument) -> anyhow::Result<FilerInfo> {
    let mut info = FilerInfo::default();
    for row in header.first_table_rows()? {
        let [label, value, ..] = row.as_slice() else {
            continue;
        };
        let value = (!value.is_empty()).then(|| value.clone());

        if label.contains(NAME_LABEL) {
            info.name = value;
        } else if label.contains(OBLIGATION_DATE_LABEL) {
            info.report_date = value;
        } else if label.contains(SUBMISSION_DATE_LABEL) {
            info.submission_date = value;
        }
    }
    Ok(info)
}

/// Reads every field of a `kind` filing from its header and body documents.
///
/// Any error discards the whole mapping; callers skip the bundle.
pub fn extract(
    kind: FilingKind,
    header: &MarkupDocument,
    body: &MarkupDocument,
) -> anyhow::Result<RawAttributes> {
    let filer = filer_info(header)?;

    let mut fields = FilingFields::empty(kind);
    for (field, id) in identifier_table(kind) {
        let value = body.text_by_id(id)?;
        if let Some(slot) = fields.slot_mut(*field) {
            *slot = value;
        }
    }

    if fields.holder_name.is_none() {
        fields.holder_name = filer.name;
    }
    fields.report_date = filer.report_date;
    fields.submission_date = filer.submission_date;

    Ok(RawAttributes { fields })
}
