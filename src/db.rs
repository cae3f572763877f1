use std::io::Write as _;

use anyhow::Context as _;

use crate::cli::{DbCommand, ExportArgs, GlobalArgs, ImportArgs, SearchArgs};
use crate::formats::ProcessedReportRecord;
use crate::store::{JsonReportStore, ReportQuery, ReportStore};

pub fn run(global: &GlobalArgs, command: DbCommand) -> anyhow::Result<()> {
    match command {
        DbCommand::Stats => stats(global),
        DbCommand::List => {
            let store = open(global)?;
            print_records(&store.list_all().context("list records")?)
        }
        DbCommand::Search(args) => search(global, args),
        DbCommand::Latest => {
            let store = open(global)?;
            print_records(
                &store
                    .latest_submission_reports()
                    .context("load latest records")?,
            )
        }
        DbCommand::Import(args) => import(global, args),
        DbCommand::Export(args) => export(global, args),
    }
}

fn open(global: &GlobalArgs) -> anyhow::Result<Box<dyn ReportStore>> {
    crate::store::open(global.store, &global.db)
        .with_context(|| format!("open report store: {}", global.db.display()))
}

fn stats(global: &GlobalArgs) -> anyhow::Result<()> {
    let store = open(global)?;
    let counts = store.count_by_type().context("count records")?;
    let total: u64 = counts.values().sum();

    let mut stdout = std::io::stdout().lock();
    for (report_type, count) in &counts {
        writeln!(stdout, "{report_type}: {count}")?;
    }
    writeln!(stdout, "total: {total}")?;
    Ok(())
}

fn search(global: &GlobalArgs, args: SearchArgs) -> anyhow::Result<()> {
    let store = open(global)?;
    let query = ReportQuery {
        security_code: args.security_code,
        holder_name: args.holder,
        report_type: args.report_type,
        target_company: args.company,
        limit: args.limit,
    };
    print_records(&store.search(&query).context("search records")?)
}

fn import(global: &GlobalArgs, args: ImportArgs) -> anyhow::Result<()> {
    let source = JsonReportStore::open(&args.json)
        .with_context(|| format!("open json store: {}", args.json.display()))?;
    let mut target = open(global)?;
    let copied = crate::store::copy_all(&source, target.as_mut()).context("import records")?;
    tracing::info!(copied, from = %args.json.display(), to = %global.db.display(), "imported records");
    eprintln!("imported {copied} records");
    Ok(())
}

fn export(global: &GlobalArgs, args: ExportArgs) -> anyhow::Result<()> {
    let source = open(global)?;
    let mut target = JsonReportStore::open(&args.json)
        .with_context(|| format!("open json store: {}", args.json.display()))?;
    let copied = crate::store::copy_all(source.as_ref(), &mut target).context("export records")?;
    tracing::info!(copied, from = %global.db.display(), to = %args.json.display(), "exported records");
    eprintln!("exported {copied} records");
    Ok(())
}

/// One JSON object per line.
fn print_records(records: &[ProcessedReportRecord]) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    for record in records {
        let line = serde_json::to_string(record).context("serialize record")?;
        writeln!(stdout, "{line}")?;
    }
    Ok(())
}
