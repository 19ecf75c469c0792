use anyhow::Result;
use ignore::Walk;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::image_processing::{convert_to_web_jpeg, MediaKind, OutputOptions};
use crate::utils::{ensure_directory_exists, lowercase_output_path};

/// Outcome of processing a media directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingStats {
    pub total_files: usize,
    pub converted: usize,
    pub heic_files: usize,
    pub skipped: usize,
    pub failed: usize,
}

enum FileOutcome {
    Converted { heic: bool },
    Skipped,
}

/// Lists regular files under `media_dir`, skipping hidden entries and build directories.
fn collect_media_files(media_dir: &Path) -> Vec<PathBuf> {
    Walk::new(media_dir)
        .filter_map(|entry| entry.ok())
        .filter(|e| e.path().starts_with(media_dir))
        .filter(|e| {
            let relative = e.path().strip_prefix(media_dir).unwrap_or(e.path());
            !relative.components().any(|component| {
                component
                    .as_os_str()
                    .to_str()
                    .is_some_and(|name| name.starts_with('.') || name == "node_modules" || name == "target")
            })
        })
        .filter(|e| e.file_type().is_some_and(|ft| ft.is_file()))
        .map(|e| e.into_path())
        .collect()
}

fn process_file(path: &Path, media_dir: &Path, output_dir: &Path, options: OutputOptions) -> Result<FileOutcome> {
    let kind = MediaKind::from_path(path);
    if kind == MediaKind::Unsupported {
        debug!("Skipping file: {}", path.display());
        return Ok(FileOutcome::Skipped);
    }

    let relative = path.strip_prefix(media_dir).unwrap_or(path);
    let output_path = output_dir.join(lowercase_output_path(relative, "jpg"));

    let jpeg_data = convert_to_web_jpeg(path, options)?;
    if let Some(parent) = output_path.parent() {
        ensure_directory_exists(parent)?;
    }
    fs::write(&output_path, jpeg_data)?;
    info!("💾 Saved JPEG: {}", output_path.display());

    Ok(FileOutcome::Converted {
        heic: kind == MediaKind::Heic,
    })
}

/// Converts every JPEG/HEIC under `media_dir` into a resized JPEG under `output_dir`.
///
/// Files are independent, so they are processed in parallel; one bad file is
/// logged and counted without stopping the rest.
pub fn process_media_directory(media_dir: &Path, output_dir: &Path, options: OutputOptions) -> Result<ProcessingStats> {
    info!("🔍 Reading all files in {}", media_dir.display());
    if !media_dir.exists() {
        anyhow::bail!("Media directory not found: {}", media_dir.display());
    }
    ensure_directory_exists(output_dir)?;

    let files = collect_media_files(media_dir);
    let total_files = files.len();
    info!("✅ Found {} files. Starting processing...", total_files);

    let start_time = std::time::Instant::now();

    let results: Vec<_> = files
        .par_iter()
        .map(|path| {
            let result = process_file(path, media_dir, output_dir, options);
            if let Err(ref e) = result {
                warn!("❌ Error processing {}: {:#}", path.display(), e);
            }
            result
        })
        .collect();

    let mut stats = ProcessingStats {
        total_files,
        ..Default::default()
    };
    for result in &results {
        match result {
            Ok(FileOutcome::Converted { heic }) => {
                stats.converted += 1;
                if *heic {
                    stats.heic_files += 1;
                }
            }
            Ok(FileOutcome::Skipped) => stats.skipped += 1,
            Err(_) => stats.failed += 1,
        }
    }

    let processing_secs = start_time.elapsed().as_secs_f64();
    let avg_time_per_file_ms = if total_files > 0 {
        (processing_secs * 1000.0) / total_files as f64
    } else {
        0.0
    };

    info!("\n📊 Processing statistics:");
    info!("   🔍 Files checked: {}", stats.total_files);
    info!("   📸 Converted: {}", stats.converted);
    info!("   📱 HEIC files: {}", stats.heic_files);
    info!("   ⏭️  Skipped: {}", stats.skipped);
    info!("   ❌ Failed: {}", stats.failed);
    info!("   ⏱️  Processing time: {:.2} s", processing_secs);
    info!("   📈 Average per file: {:.1} ms", avg_time_per_file_ms);

    Ok(stats)
}
