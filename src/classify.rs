use crate::document::MarkupDocument;
use crate::filing::{CHANGE_REPORT_LABEL, FilingKind, LARGE_VOLUME_LABEL};

/// First-cell label of the header row declaring the submitted document type.
pub const DOCUMENT_TYPE_LABEL: &str = "提出書類";

/// Decides which kind of filing a header document introduces.
///
/// The declared document type row wins; without one the `<title>` decides.
/// Returns `None` when the header cannot be read at all, which callers treat
/// as a skippable classification failure.
pub fn classify(header: &MarkupDocument) -> Option<FilingKind> {
    match try_classify(header) {
        Ok(kind) => kind,
        Err(err) => {
            tracing::warn!(?err, "filing classification failed");
            None
        }
    }
}

fn try_classify(header: &MarkupDocument) -> anyhow::Result<Option<FilingKind>> {
    for row in header.first_table_rows()? {
        let [label, value, ..] = row.as_slice() else {
            continue;
        };
        if !label.contains(DOCUMENT_TYPE_LABEL) {
            continue;
        }

        tracing::debug!(document_type = %value, "declared document type");
        if value.contains(CHANGE_REPORT_LABEL) {
            return Ok(Some(FilingKind::ChangeReport));
        }
        return Ok(Some(FilingKind::LargeVolumeReport));
    }

    let Some(title) = header.title()? else {
        return Ok(None);
    };
    if title.contains(LARGE_VOLUME_LABEL) && !title.contains(CHANGE_REPORT_LABEL) {
        return Ok(Some(FilingKind::LargeVolumeReport));
    }
    if title.contains(CHANGE_REPORT_LABEL) {
        return Ok(Some(FilingKind::ChangeReport));
    }

    tracing::warn!(%title, "document type not declared; assuming large volume report");
    Ok(Some(FilingKind::LargeVolumeReport))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_with_type(document_type: &str) -> MarkupDocument {
        MarkupDocument::parse(&format!(
            r#"<html><head><title>大量保有報告書</title></head><body><table>
<tr><td>【表紙】</td><td></td></tr>
<tr><td>【提出書類】</td><td>{document_type}</td></tr>
</table></body></html>"#
        ))
    }

    #[test]
    fn declared_change_report_wins_over_title() {
        let header = header_with_type("変更報告書（短期大量譲渡）");
        assert_eq!(classify(&header), Some(FilingKind::ChangeReport));
    }

    #[test]
    fn declared_other_type_is_large_volume() {
        let header = header_with_type("大量保有報告書");
        assert_eq!(classify(&header), Some(FilingKind::LargeVolumeReport));
    }

    #[test]
    fn title_fallback_detects_change_report() {
        let header = MarkupDocument::parse(
            "<html><head><title>変更報告書 No.3</title></head><body></body></html>",
        );
        assert_eq!(classify(&header), Some(FilingKind::ChangeReport));
    }

    #[test]
    fn title_with_both_markers_is_change_report() {
        let header = MarkupDocument::parse(
            "<html><head><title>大量保有報告書（変更報告書）</title></head></html>",
        );
        assert_eq!(classify(&header), Some(FilingKind::ChangeReport));
    }

    #[test]
    fn unmarked_title_defaults_to_large_volume() {
        let header =
            MarkupDocument::parse("<html><head><title>提出書類一覧</title></head></html>");
        assert_eq!(classify(&header), Some(FilingKind::LargeVolumeReport));
    }

    #[test]
    fn header_without_type_row_or_title_is_unknown() {
        let header = MarkupDocument::parse("<div><table><tr><td>x</td></tr></table></div>");
        assert_eq!(classify(&header), None);
    }
}
