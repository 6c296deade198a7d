// * Word cloud rendering
// * Layout is pure geometry over a measuring function; rendering draws the
// * placed words with imageproc.

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::Path;

use super::tfidf::TermScore;
use super::AnalyticsError;
use crate::config::TfidfConfig;
use crate::persistence::ensure_parent;

// ? Spiral parameters in pixels / radians
const SPIRAL_STEP: f64 = 0.1;
const SPIRAL_GROWTH: f64 = 2.0;
const SHRINK_STEP_PX: f32 = 2.0;
const PADDING: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width as i32 + PADDING
            && other.x < self.x + self.width as i32 + PADDING
            && self.y < other.y + other.height as i32 + PADDING
            && other.y < self.y + self.height as i32 + PADDING
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedWord {
    pub word: String,
    pub font_px: f32,
    pub bounds: Rect,
}

/// Linear size between `min_px` and `max_px` relative to the top score
pub fn font_size(score: f64, top_score: f64, min_px: f32, max_px: f32) -> f32 {
    if top_score <= 0.0 {
        return min_px;
    }
    let ratio = (score / top_score).clamp(0.0, 1.0) as f32;
    min_px + (max_px - min_px) * ratio
}

/// First free position on the spiral around the canvas centre
fn spiral_fit(size: (u32, u32), canvas: (u32, u32), placed: &[PlacedWord]) -> Option<Rect> {
    let (w, h) = size;
    let (cw, ch) = canvas;
    if w > cw || h > ch {
        return None;
    }

    let cx = cw as f64 / 2.0;
    let cy = ch as f64 / 2.0;
    let max_radius = (cx * cx + cy * cy).sqrt();

    let mut theta = 0.0f64;
    loop {
        let radius = SPIRAL_GROWTH * theta;
        if radius > max_radius {
            return None;
        }
        let x = (cx + radius * theta.cos() - w as f64 / 2.0).round() as i32;
        let y = (cy + radius * theta.sin() - h as f64 / 2.0).round() as i32;
        theta += SPIRAL_STEP;

        if x < 0 || y < 0 || x + w as i32 > cw as i32 || y + h as i32 > ch as i32 {
            continue;
        }
        let candidate = Rect {
            x,
            y,
            width: w,
            height: h,
        };
        if placed.iter().all(|p| !p.bounds.intersects(&candidate)) {
            return Some(candidate);
        }
    }
}

/// Places words largest first. A word that does not fit is retried at a
/// smaller size and dropped once it would fall below `min_px`.
pub fn layout<M>(
    scores: &[TermScore],
    canvas: (u32, u32),
    min_px: f32,
    max_px: f32,
    measure: M,
) -> Vec<PlacedWord>
where
    M: Fn(&str, f32) -> (u32, u32),
{
    let top_score = scores.iter().map(|s| s.score).fold(0.0f64, f64::max);
    let mut ordered: Vec<&TermScore> = scores.iter().filter(|s| s.score > 0.0).collect();
    ordered.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut placed: Vec<PlacedWord> = Vec::new();
    for term in ordered {
        let mut px = font_size(term.score, top_score, min_px, max_px);
        while px >= min_px {
            if let Some(bounds) = spiral_fit(measure(&term.word, px), canvas, &placed) {
                placed.push(PlacedWord {
                    word: term.word.clone(),
                    font_px: px,
                    bounds,
                });
                break;
            }
            px -= SHRINK_STEP_PX;
        }
    }
    placed
}

/// Draws placed words on a white canvas, colors drawn from a seeded palette
pub fn render(placed: &[PlacedWord], font: &FontVec, canvas: (u32, u32), seed: u64) -> RgbImage {
    let mut img = RgbImage::from_pixel(canvas.0, canvas.1, Rgb([255, 255, 255]));
    let mut rng = StdRng::seed_from_u64(seed);

    for word in placed {
        // dark enough to read on white
        let color = Rgb([
            rng.gen_range(0..=180u8),
            rng.gen_range(0..=180u8),
            rng.gen_range(0..=180u8),
        ]);
        draw_text_mut(
            &mut img,
            color,
            word.bounds.x,
            word.bounds.y,
            PxScale::from(word.font_px),
            font,
            &word.word,
        );
    }
    img
}

pub fn load_font(path: &Path) -> Result<FontVec, AnalyticsError> {
    let bytes = fs::read(path).map_err(|e| AnalyticsError::io(path, e))?;
    FontVec::try_from_vec(bytes).map_err(|_| AnalyticsError::Font {
        path: path.to_path_buf(),
    })
}

/// Lays out, renders and saves the cloud as configured
pub fn render_to_file(
    scores: &[TermScore],
    font_path: &Path,
    config: &TfidfConfig,
) -> Result<(), AnalyticsError> {
    let font = load_font(font_path)?;
    let canvas = (config.width, config.height);

    let placed = layout(
        scores,
        canvas,
        config.min_font_px,
        config.max_font_px,
        |word, px| text_size(PxScale::from(px), &font, word),
    );
    tracing::debug!(placed = placed.len(), candidates = scores.len(), "Word cloud layout done");

    let img = render(&placed, &font, canvas, config.seed);
    ensure_parent(&config.output_image)?;
    img.save(&config.output_image)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // monospace stand-in: 0.6em per char, 1em tall
    fn mono(word: &str, px: f32) -> (u32, u32) {
        ((word.chars().count() as f32 * px * 0.6).ceil() as u32, px.ceil() as u32)
    }

    fn term(word: &str, score: f64) -> TermScore {
        TermScore {
            word: word.to_string(),
            score,
        }
    }

    #[test]
    fn test_font_size_scales_linearly() {
        assert_eq!(font_size(1.0, 1.0, 10.0, 90.0), 90.0);
        assert_eq!(font_size(0.5, 1.0, 10.0, 90.0), 50.0);
        assert_eq!(font_size(0.0, 0.0, 10.0, 90.0), 10.0);
    }

    #[test]
    fn test_largest_word_is_centred() {
        let placed = layout(&[term("big", 1.0)], (800, 400), 10.0, 96.0, mono);
        assert_eq!(placed.len(), 1);
        let r = placed[0].bounds;
        assert_eq!(placed[0].font_px, 96.0);
        assert!((r.x + r.width as i32 / 2 - 400).abs() <= 1);
        assert!((r.y + r.height as i32 / 2 - 200).abs() <= 1);
    }

    #[test]
    fn test_placed_words_never_overlap() {
        let scores: Vec<TermScore> = (0..40)
            .map(|i| term(&format!("word{}", i), 1.0 / (i as f64 + 1.0)))
            .collect();
        let placed = layout(&scores, (800, 400), 10.0, 96.0, mono);
        assert!(!placed.is_empty());
        for (i, a) in placed.iter().enumerate() {
            assert!(a.bounds.x >= 0 && a.bounds.y >= 0);
            assert!(a.bounds.x + a.bounds.width as i32 <= 800);
            assert!(a.bounds.y + a.bounds.height as i32 <= 400);
            for b in &placed[i + 1..] {
                assert!(!a.bounds.intersects(&b.bounds), "{} overlaps {}", a.word, b.word);
            }
        }
    }

    #[test]
    fn test_word_too_wide_is_shrunk_or_dropped() {
        let long = "x".repeat(30);
        // 30 chars * 96 * 0.6 > 800, fits once shrunk below ~44px
        let placed = layout(&[term(&long, 1.0)], (800, 400), 10.0, 96.0, mono);
        assert_eq!(placed.len(), 1);
        assert!(placed[0].font_px < 96.0);

        let huge = "x".repeat(200);
        assert!(layout(&[term(&huge, 1.0)], (800, 400), 10.0, 96.0, mono).is_empty());
    }
}
