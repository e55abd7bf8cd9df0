//! Best-match template search.

use std::cmp::Ordering;

use image::GrayImage;

use super::correlate::normalized_match;
use super::templates::{TemplateRepository, normalize_size};

/// Outcome of matching one glyph against the template library.
///
/// `digit` is `None` when nothing scored above zero. The caller decides what
/// to do with the match (grow the library, accept the label, or file the
/// glyph as unrecognized) based on its own confidence tiers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphMatch {
    pub digit: Option<u8>,
    pub confidence: f32,
}

/// Finds the digit class a glyph most likely belongs to.
pub struct GlyphRecognizer {
    end_search: f32,
}

impl GlyphRecognizer {
    /// `end_search` is the confidence at which scanning stops early.
    pub fn new(end_search: f32) -> Self {
        Self { end_search }
    }

    /// Matches a glyph against the library.
    ///
    /// Classes are visited in hierarchy order: each non-empty class is
    /// pre-scored by its first template only, classes without any
    /// correlation are dropped, the rest sorted best-first. Within that
    /// order every template is tried, and a score reaching `end_search`
    /// ends the search immediately. A later class could in principle hold
    /// a better template, but a good-enough hit is taken over scanning the
    /// whole library.
    pub fn match_glyph(&self, repository: &TemplateRepository, glyph: &GrayImage) -> GlyphMatch {
        let glyph = normalize_size(glyph);
        let mut best = GlyphMatch {
            digit: None,
            confidence: 0.0,
        };

        for digit in self.hierarchy(repository, &glyph) {
            for template in repository.templates(digit) {
                let score = normalized_match(&glyph, template);
                if score > best.confidence {
                    best = GlyphMatch {
                        digit: Some(digit),
                        confidence: score,
                    };
                    if score >= self.end_search {
                        return best;
                    }
                }
            }
        }
        best
    }

    /// Orders the digit classes by how well their first template matches.
    fn hierarchy(&self, repository: &TemplateRepository, glyph: &GrayImage) -> Vec<u8> {
        let mut scored: Vec<(u8, f32)> = (0..10u8)
            .filter_map(|digit| {
                let first = repository.templates(digit).first()?;
                let score = normalized_match(glyph, first);
                (score > 0.0).then_some((digit, score))
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.into_iter().map(|(digit, _)| digit).collect()
    }
}
