use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UnzipSummary {
    pub extracted: usize,
    pub failed: usize,
}

/// Unpacks `zip_path` into `out_dir`, returning the number of files written.
///
/// Entries whose names would land outside `out_dir` are rejected.
pub fn extract_archive(zip_path: &Path, out_dir: &Path) -> anyhow::Result<usize> {
    let file =
        File::open(zip_path).with_context(|| format!("open zip: {}", zip_path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("read zip: {}", zip_path.display()))?;

    let mut written = 0_usize;
    for idx in 0..archive.len() {
        let mut entry = archive
            .by_index(idx)
            .with_context(|| format!("read zip entry #{idx}: {}", zip_path.display()))?;
        let Some(relative) = entry.enclosed_name() else {
            anyhow::bail!("zip entry escapes output dir: {}", entry.name());
        };
        let out_path = out_dir.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)
                .with_context(|| format!("create dir: {}", out_path.display()))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let mut out = File::create(&out_path)
            .with_context(|| format!("create file: {}", out_path.display()))?;
        io::copy(&mut entry, &mut out)
            .with_context(|| format!("write file: {}", out_path.display()))?;
        written += 1;
    }

    Ok(written)
}

/// Zip archives directly inside `dir`, sorted by name.
pub fn find_archives(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut archives = std::fs::read_dir(dir)
        .with_context(|| format!("read dir: {}", dir.display()))?
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("list dir: {}", dir.display()))?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
        })
        .collect::<Vec<_>>();
    archives.sort();
    Ok(archives)
}

/// Extracts every archive in `dir` next to itself (`x.zip` -> `x/`) and deletes it.
///
/// A bad archive is logged, kept, and counted as failed.
pub fn unzip_all(dir: &Path) -> anyhow::Result<UnzipSummary> {
    let archives = find_archives(dir)?;
    tracing::info!(dir = %dir.display(), count = archives.len(), "found zip archives");

    let mut summary = UnzipSummary::default();
    for zip_path in archives {
        let Some(stem) = zip_path.file_stem() else {
            continue;
        };
        let out_dir = dir.join(stem);

        match extract_archive(&zip_path, &out_dir) {
            Ok(files) => {
                tracing::info!(zip = %zip_path.display(), out = %out_dir.display(), files, "extracted archive");
                if let Err(err) = std::fs::remove_file(&zip_path) {
                    tracing::warn!(zip = %zip_path.display(), ?err, "failed to delete extracted archive");
                }
                summary.extracted += 1;
            }
            Err(err) => {
                tracing::error!(zip = %zip_path.display(), ?err, "failed to extract archive");
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        extracted = summary.extracted,
        failed = summary.failed,
        "finished extracting archives"
    );
    Ok(summary)
}

pub fn run(global: &crate::cli::GlobalArgs, args: crate::cli::UnzipArgs) -> anyhow::Result<()> {
    let dir = args.dir.unwrap_or_else(|| global.download_dir.clone());
    let summary = unzip_all(&dir)?;
    eprintln!(
        "extracted {} archives, {} failed",
        summary.extracted, summary.failed
    );
    Ok(())
}
