use crate::filing::{Field, FilingKind, NormalizedFiling};

/// Push notification text for a new filing. Every template line is always present.
pub fn render_message(filing: &NormalizedFiling) -> String {
    let company = filing.display(Field::TargetCompany);
    let code = filing.display(Field::SecurityCode);
    let holder = filing.display(Field::HolderName);
    let shares = filing.display(Field::SharesHeld);
    let report_date = filing.display(Field::ReportDate);
    let purpose = filing.display(Field::Purpose);

    let mut lines = vec![
        format!("📊 {}", filing.kind().label()),
        String::new(),
        format!("🏢 {company} ({code})"),
        format!("👤 {holder}"),
    ];
    match filing.kind() {
        FilingKind::LargeVolumeReport => {
            lines.push(format!(
                "📈 保有割合: {}%",
                filing.display(Field::HoldingRatio)
            ));
        }
        FilingKind::ChangeReport => {
            lines.push(format!(
                "📉 変更前: {}%",
                filing.display(Field::HoldingRatioBefore)
            ));
            lines.push(format!(
                "📈 変更後: {}% ({})",
                filing.display(Field::HoldingRatioAfter),
                ratio_delta(filing)
            ));
        }
    }
    lines.push(format!("📝 {shares}株"));
    lines.push(format!("📅 {report_date}"));
    lines.push(format!("🔍 目的: {purpose}"));
    lines.join("\n")
}

/// Plain console rendering printed for each new filing.
pub fn render_digest(filing: &NormalizedFiling) -> String {
    let mut lines = vec![
        format!("【{}】", filing.kind().label()),
        format!(
            "対象企業: {} ({})",
            filing.display(Field::TargetCompany),
            filing.display(Field::SecurityCode)
        ),
        format!("保有者: {}", filing.display(Field::HolderName)),
    ];
    match filing.kind() {
        FilingKind::LargeVolumeReport => {
            lines.push(format!("保有割合: {}%", filing.display(Field::HoldingRatio)));
        }
        FilingKind::ChangeReport => {
            lines.push(format!(
                "変更前保有割合: {}%",
                filing.display(Field::HoldingRatioBefore)
            ));
            lines.push(format!(
                "変更後保有割合: {}%",
                filing.display(Field::HoldingRatioAfter)
            ));
        }
    }
    lines.push(format!("保有株式数: {}株", filing.display(Field::SharesHeld)));
    lines.push(format!("報告義務発生日: {}", filing.display(Field::ReportDate)));
    lines.push(format!("提出日: {}", filing.display(Field::SubmissionDate)));
    lines.push(format!("目的: {}", filing.display(Field::Purpose)));
    lines.join("\n")
}

/// Signed change between the before and after ratios, e.g. `+2.25%`.
///
/// Missing or non-numeric ratios count as zero.
pub fn ratio_delta(filing: &NormalizedFiling) -> String {
    let before = parse_ratio(filing.get(Field::HoldingRatioBefore));
    let after = parse_ratio(filing.get(Field::HoldingRatioAfter));
    let delta = after - before;
    if delta > 0.0 {
        format!("+{delta:.2}%")
    } else {
        format!("{delta:.2}%")
    }
}

fn parse_ratio(value: Option<&str>) -> f64 {
    value
        .and_then(|value| value.trim().trim_end_matches('%').trim().parse::<f64>().ok())
        .filter(|ratio| ratio.is_finite())
        .unwrap_or(0.0)
}
