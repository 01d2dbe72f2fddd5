//! Batch export over every variation and modifier combination.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use bevy::prelude::*;
use image::{ImageFormat, RgbaImage};

use crate::combinations::{
    effective_combinations, expected_image_count, modifiers_to_apply, suffix_for,
};
use crate::constants::{EXPORT_EXTENSION, PARTIAL_EXTENSION};
use crate::document::{LayerDocument, LayerTree};
use crate::error::{Result, VariationError};
use crate::rules::{apply_rule_set, apply_rule_sets, Combination, Modifier, RuleBook, RuleSet};

/// Progress notifications of a running export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportEvent {
    /// Sent once before the first image with the number of images to write
    Planned { total: usize },
    ImageExported { path: PathBuf },
    Finished { count: usize },
}

/// Everything an export run needs besides the document itself.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub output_dir: PathBuf,
    /// File name prefix of every image, normally the document stem
    pub base_name: String,
    pub baseline: LayerTree,
    pub book: RuleBook,
}

/// Run the whole export, in variation order then combination order.
///
/// Stops at the first failure. `cancel` is checked before each image, so an
/// image being flattened is always finished. Returns the number of images
/// written.
pub fn run_export(
    document: &mut dyn LayerDocument,
    job: &ExportJob,
    progress: &flume::Sender<ExportEvent>,
    cancel: &AtomicBool,
) -> Result<usize> {
    let started = Instant::now();
    let total = expected_image_count(&job.book.variations);
    let _ = progress.send(ExportEvent::Planned { total });
    info!("Exporting {} image(s) to {:?}", total, job.output_dir);

    let mut count = 0;
    for variation in &job.book.variations {
        let out_dir = if variation.subfolder.is_empty() {
            job.output_dir.clone()
        } else {
            job.output_dir.join(&variation.subfolder)
        };
        std::fs::create_dir_all(&out_dir)
            .map_err(|e| VariationError::io("Failed to create output directory", &out_dir, e))?;

        let base_nodes = apply_rule_set(variation, &job.baseline)?;
        let mut mods = job.book.variation_modifiers(variation)?;
        let combinations = if mods.is_empty() {
            mods.push(Modifier::empty_sentinel());
            vec![Combination::empty_sentinel()]
        } else {
            effective_combinations(variation, &mods)
        };

        for combination in &combinations {
            if cancel.load(Ordering::Relaxed) {
                info!("Export cancelled after {} image(s)", count);
                return Err(VariationError::Cancelled);
            }
            let image_started = Instant::now();

            let active = modifiers_to_apply(&mods, &combination.bitmask)?;
            let suffix = suffix_for(variation, &active);
            let tree = apply_rule_sets(active.iter().map(|m| m as &dyn RuleSet), &base_nodes)?;
            tree.apply_to(document)?;
            let image = document.flatten()?;

            let path = unique_filename(&out_dir, &format!("{}{}", job.base_name, suffix), EXPORT_EXTENSION);
            write_png(&image, &path)?;
            count += 1;
            let _ = progress.send(ExportEvent::ImageExported { path: path.clone() });
            info!(
                "Exported {:?} ({} / {}) in {:.2?}",
                path,
                count,
                total,
                image_started.elapsed()
            );
        }
    }

    let _ = progress.send(ExportEvent::Finished { count });
    info!("Export of {} image(s) took {:.2?}", count, started.elapsed());
    Ok(count)
}

/// `dir/base+ext`, or the first free `dir/base{n}+ext` for n = 1, 2, ...
pub fn unique_filename(dir: &Path, base: &str, extension: &str) -> PathBuf {
    let mut candidate = dir.join(format!("{}{}", base, extension));
    let mut n = 1;
    while candidate.exists() {
        warn!("File name clash detected on {:?}", candidate);
        candidate = dir.join(format!("{}{}{}", base, n, extension));
        n += 1;
    }
    candidate
}

/// Encode to a sibling `.part` file and rename it into place, so `path`
/// never holds a partial image.
pub fn write_png(image: &RgbaImage, path: &Path) -> Result<()> {
    let partial = crate::paths::with_appended_extension(path, PARTIAL_EXTENSION.trim_start_matches('.'));
    if let Err(e) = image.save_with_format(&partial, ImageFormat::Png) {
        let _ = std::fs::remove_file(&partial);
        return Err(e.into());
    }
    std::fs::rename(&partial, path).map_err(|e| {
        let _ = std::fs::remove_file(&partial);
        VariationError::io("Failed to move exported image into place", path, e)
    })
}

/// True when `dir` exists and has at least one entry.
pub fn is_non_empty_dir(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}
