//! On-disk glyph template library.
//!
//! One directory per digit class, entries named by a zero-padded sequence
//! number. The library is append-only: templates are loaded once at startup
//! and only ever grow while the program runs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{GrayImage, imageops};
use regex::Regex;
use tracing::{info, warn};

/// Canonical template width in pixels.
pub const TEMPLATE_WIDTH: u32 = 30;
/// Canonical template height in pixels.
pub const TEMPLATE_HEIGHT: u32 = 37;

/// Resizes a glyph to the canonical template size if needed.
pub fn normalize_size(img: &GrayImage) -> GrayImage {
    if img.dimensions() == (TEMPLATE_WIDTH, TEMPLATE_HEIGHT) {
        img.clone()
    } else {
        imageops::resize(
            img,
            TEMPLATE_WIDTH,
            TEMPLATE_HEIGHT,
            imageops::FilterType::Triangle,
        )
    }
}

struct DigitClass {
    dir: PathBuf,
    templates: Vec<GrayImage>,
    last_index: u32,
}

/// Per-digit template store backed by a directory tree.
pub struct TemplateRepository {
    classes: Vec<DigitClass>,
}

impl TemplateRepository {
    /// Opens (and creates if missing) the library under `root`.
    ///
    /// Corrupt or oddly named entries are logged and skipped; entries with
    /// the wrong size are resized on load and noted.
    pub fn open(root: &Path) -> Result<Self> {
        let name_pattern = Regex::new(r"^\d{5}\.png$").context("Template name pattern")?;
        let mut classes = Vec::with_capacity(10);

        for digit in 0..10u8 {
            let dir = root.join(digit.to_string());
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create template directory {}", dir.display()))?;

            let mut entries: Vec<PathBuf> = std::fs::read_dir(&dir)
                .with_context(|| format!("Failed to list template directory {}", dir.display()))?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| {
                    path.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| name_pattern.is_match(n))
                })
                .collect();
            entries.sort();

            let mut templates = Vec::with_capacity(entries.len());
            let mut last_index = 0;
            for path in &entries {
                let img = match image::open(path) {
                    Ok(img) => img.to_luma8(),
                    Err(e) => {
                        warn!("Skipping unreadable template {}: {}", path.display(), e);
                        continue;
                    }
                };
                if img.dimensions() != (TEMPLATE_WIDTH, TEMPLATE_HEIGHT) {
                    info!(
                        "Template {} has unexpected size {}x{}, resizing",
                        path.display(),
                        img.width(),
                        img.height()
                    );
                }
                templates.push(normalize_size(&img));
                if let Some(index) = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(|s| s.parse::<u32>().ok())
                {
                    last_index = last_index.max(index);
                }
            }

            classes.push(DigitClass {
                dir,
                templates,
                last_index,
            });
        }

        Ok(Self { classes })
    }

    /// Templates of one digit class, oldest first.
    pub fn templates(&self, digit: u8) -> &[GrayImage] {
        &self.classes[digit as usize].templates
    }

    /// Total template count across all classes.
    pub fn len(&self) -> usize {
        self.classes.iter().map(|c| c.templates.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a glyph as a new template of `digit`, persisting it under the
    /// next sequence number. Returns the path of the stored file.
    pub fn add(&mut self, digit: u8, glyph: &GrayImage) -> Result<PathBuf> {
        let normalized = normalize_size(glyph);
        let class = &mut self.classes[digit as usize];
        class.last_index += 1;
        let path = class.dir.join(format!("{:05}.png", class.last_index));
        normalized
            .save(&path)
            .with_context(|| format!("Failed to persist template {}", path.display()))?;
        class.templates.push(normalized);
        info!("Added new template for digit {}: {}", digit, path.display());
        Ok(path)
    }
}
