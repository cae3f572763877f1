use std::path::{Path, PathBuf};

use anyhow::Context as _;
use thiserror::Error;

use crate::cli::{GlobalArgs, ProcessArgs};
use crate::document::MarkupDocument;
use crate::filing::NormalizedFiling;
use crate::gate::DedupGate;
use crate::normalize::{FilingIdentity, identity_of, normalize};
use crate::store::{ReportStore, StoreError};

/// Directory name under which an unpacked filing keeps its documents.
pub const BUNDLE_DIR_NAME: &str = "PublicDoc";
const HEADER_MARKER: &str = "header";
const BODY_MARKER: &str = "honbun";

/// Header and body documents found together in one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingBundle {
    pub dir: PathBuf,
    pub header: Option<PathBuf>,
    pub body: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum FilingError {
    #[error("cannot determine filing kind of {0}")]
    Classification(PathBuf),

    #[error("cannot extract filing from {path}: {reason}")]
    Extraction { path: PathBuf, reason: String },

    #[error("report store unavailable: {0}")]
    Store(#[from] StoreError),
}

impl FilingError {
    fn extraction(path: &Path, err: &anyhow::Error) -> Self {
        FilingError::Extraction {
            path: path.to_path_buf(),
            reason: format!("{err:#}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewFiling {
    pub bundle: PathBuf,
    pub identity: FilingIdentity,
    pub filing: NormalizedFiling,
}

#[derive(Debug)]
pub struct BundleFailure {
    pub bundle: PathBuf,
    pub error: FilingError,
}

#[derive(Debug, Default)]
pub struct RunReport {
    /// Filings extracted successfully, new or not.
    pub seen: usize,
    pub new: Vec<NewFiling>,
    pub failures: Vec<BundleFailure>,
}

impl RunReport {
    pub fn already_seen(&self) -> usize {
        self.seen - self.new.len()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} filings seen, {} new, {} already processed, {} failed",
            self.seen,
            self.new.len(),
            self.already_seen(),
            self.failures.len()
        )
    }
}

enum Outcome {
    New(NewFiling),
    AlreadySeen,
}

/// Every bundle directory below `root`, sorted by path.
pub fn discover_bundles(root: &Path) -> anyhow::Result<Vec<FilingBundle>> {
    let mut bundles = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = std::fs::read_dir(&dir)
            .with_context(|| format!("read dir: {}", dir.display()))?;
        for entry in entries {
            let entry = entry.with_context(|| format!("list dir: {}", dir.display()))?;
            let file_type = entry
                .file_type()
                .with_context(|| format!("stat: {}", entry.path().display()))?;
            // Never follow symlinked dirs: a link back up the tree loops.
            if file_type.is_symlink() || !file_type.is_dir() {
                continue;
            }
            let path = entry.path();
            if path.file_name().and_then(|n| n.to_str()) == Some(BUNDLE_DIR_NAME) {
                bundles.push(bundle_in(&path)?);
            }
            stack.push(path);
        }
    }
    bundles.sort_by(|a, b| a.dir.cmp(&b.dir));
    tracing::info!(root = %root.display(), count = bundles.len(), "discovered filing bundles");
    Ok(bundles)
}

fn bundle_in(dir: &Path) -> anyhow::Result<FilingBundle> {
    let mut names = std::fs::read_dir(dir)
        .with_context(|| format!("read bundle dir: {}", dir.display()))?
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("list bundle dir: {}", dir.display()))?
        .into_iter()
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_owned))
        .filter(|name| is_markup(name))
        .collect::<Vec<_>>();
    names.sort();

    let pick = |marker: &str| {
        names
            .iter()
            .find(|name| name.contains(marker))
            .map(|name| dir.join(name))
    };
    Ok(FilingBundle {
        dir: dir.to_path_buf(),
        header: pick(HEADER_MARKER),
        body: pick(BODY_MARKER),
    })
}

fn is_markup(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("htm") || ext.eq_ignore_ascii_case("html"))
}

/// Classifies, extracts and de-duplicates every bundle in order.
///
/// A failing bundle is logged and skipped; it never aborts the batch.
pub fn process_bundles(store: &mut dyn ReportStore, bundles: &[FilingBundle]) -> RunReport {
    let mut gate = DedupGate::new(store);
    let mut report = RunReport::default();

    for bundle in bundles {
        match process_bundle(&mut gate, bundle) {
            Ok(Outcome::New(new)) => {
                tracing::info!(
                    bundle = %bundle.dir.display(),
                    identity = %new.identity,
                    kind = %new.filing.kind(),
                    "new filing"
                );
                report.seen += 1;
                report.new.push(new);
            }
            Ok(Outcome::AlreadySeen) => report.seen += 1,
            Err(error) => {
                match &error {
                    FilingError::Store(_) => {
                        tracing::error!(bundle = %bundle.dir.display(), %error, "skipping filing")
                    }
                    _ => tracing::warn!(bundle = %bundle.dir.display(), %error, "skipping filing"),
                }
                report.failures.push(BundleFailure {
                    bundle: bundle.dir.clone(),
                    error,
                });
            }
        }
    }

    tracing::info!(summary = %report.summary(), "processed filing bundles");
    report
}

fn process_bundle(gate: &mut DedupGate<'_>, bundle: &FilingBundle) -> Result<Outcome, FilingError> {
    let (Some(header_path), Some(body_path)) = (&bundle.header, &bundle.body) else {
        return Err(FilingError::Extraction {
            path: bundle.dir.clone(),
            reason: "bundle needs both a header and a body document".to_owned(),
        });
    };

    let header = MarkupDocument::open(header_path)
        .map_err(|err| FilingError::extraction(header_path, &err))?;
    let kind = crate::classify::classify(&header)
        .ok_or_else(|| FilingError::Classification(header_path.clone()))?;
    let body = MarkupDocument::open(body_path)
        .map_err(|err| FilingError::extraction(body_path, &err))?;
    let raw = crate::extract::extract(kind, &header, &body)
        .map_err(|err| FilingError::extraction(body_path, &err))?;

    let filing = normalize(raw);
    let identity = identity_of(&filing);

    if !gate.is_new(&identity)? {
        return Ok(Outcome::AlreadySeen);
    }
    gate.record(&identity, &filing)?;

    Ok(Outcome::New(NewFiling {
        bundle: bundle.dir.clone(),
        identity,
        filing,
    }))
}

/// Directory to scan: `subdir` (relative to the download root unless absolute) or the root.
pub fn scan_root(download_dir: &Path, subdir: Option<&Path>) -> anyhow::Result<PathBuf> {
    let root = match subdir {
        Some(subdir) if subdir.is_absolute() => subdir.to_path_buf(),
        Some(subdir) => download_dir.join(subdir),
        None => download_dir.to_path_buf(),
    };
    if !root.is_dir() {
        anyhow::bail!("scan directory does not exist: {}", root.display());
    }
    Ok(root)
}

/// Opens the store, processes every bundle below `root` and releases the store.
pub fn process_directory(global: &GlobalArgs, root: &Path) -> anyhow::Result<RunReport> {
    let mut store = crate::store::open(global.store, &global.db)
        .with_context(|| format!("open report store: {}", global.db.display()))?;
    let bundles = discover_bundles(root)?;
    Ok(process_bundles(store.as_mut(), &bundles))
}

pub async fn run(global: &GlobalArgs, args: ProcessArgs) -> anyhow::Result<()> {
    let notifier = crate::notify::notifier_from_args(&args.line, args.dry_run)?;
    let root = scan_root(&global.download_dir, args.dir.as_deref())?;

    let report = tokio::task::block_in_place(|| {
        if global.download_dir.is_dir() {
            let unzipped = crate::archive::unzip_all(&global.download_dir).with_context(|| {
                format!("unzip archives in {}", global.download_dir.display())
            })?;
            if unzipped.failed > 0 {
                tracing::warn!(failed = unzipped.failed, "some archives could not be extracted");
            }
        }
        process_directory(global, &root)
    })?;
    crate::notify::deliver(notifier.as_ref(), &report).await;
    eprintln!("{}", report.summary());
    Ok(())
}
