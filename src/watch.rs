use anyhow::Context as _;

use crate::cli::{GlobalArgs, RunArgs};

/// Daily job: fetch the date's filings, process every bundle, notify the new ones.
pub async fn run(global: &GlobalArgs, args: RunArgs) -> anyhow::Result<()> {
    let notifier = crate::notify::notifier_from_args(&args.line, args.dry_run)?;
    let date = crate::fetch::resolve_date(args.date);
    tracing::info!(%date, "starting daily run");

    let fetched = crate::fetch::fetch_filings(&args.api, date, &global.download_dir)
        .await
        .context("fetch filings")?;
    if fetched.failed > 0 || fetched.unzip.failed > 0 {
        tracing::warn!(
            downloads_failed = fetched.failed,
            archives_failed = fetched.unzip.failed,
            "some filings could not be fetched"
        );
    }

    let root = crate::pipeline::scan_root(&global.download_dir, None)?;
    let report =
        tokio::task::block_in_place(|| crate::pipeline::process_directory(global, &root))?;
    let delivered = crate::notify::deliver(notifier.as_ref(), &report).await;

    tracing::info!(%date, delivered, "daily run finished");
    eprintln!("{date}: {}, {delivered} notified", report.summary());
    Ok(())
}
