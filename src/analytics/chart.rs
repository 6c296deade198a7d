// * Perplexity / coherence versus K, two line panels side by side

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_text_mut};
use std::path::Path;

use super::topics::SweepPoint;
use super::wordcloud::load_font;
use super::AnalyticsError;
use crate::persistence::ensure_parent;

pub const PANEL_WIDTH: u32 = 600;
pub const CHART_HEIGHT: u32 = 400;
pub const MARGIN: f32 = 50.0;
pub const PERPLEXITY_COLOR: Rgb<u8> = Rgb([31, 119, 180]);
pub const COHERENCE_COLOR: Rgb<u8> = Rgb([214, 39, 40]);

const AXIS_COLOR: Rgb<u8> = Rgb([60, 60, 60]);
const MARKER_RADIUS: i32 = 4;
const TITLE_PX: f32 = 20.0;
const LABEL_PX: f32 = 14.0;

struct Panel {
    left: f32,
    right: f32,
    top: f32,
    bottom: f32,
}

impl Panel {
    fn at(index: u32) -> Self {
        let x0 = (index * PANEL_WIDTH) as f32;
        Self {
            left: x0 + MARGIN,
            right: x0 + PANEL_WIDTH as f32 - MARGIN,
            top: MARGIN,
            bottom: CHART_HEIGHT as f32 - MARGIN,
        }
    }

    /// Pixel positions of a series; a flat series sits mid-height
    fn positions(&self, values: &[f64]) -> Vec<(f32, f32)> {
        let finite = values.iter().copied().filter(|v| v.is_finite());
        let lo = finite.clone().fold(f64::INFINITY, f64::min);
        let hi = finite.fold(f64::NEG_INFINITY, f64::max);
        let span = hi - lo;

        let n = values.len();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let x = if n <= 1 {
                    (self.left + self.right) / 2.0
                } else {
                    self.left + i as f32 * (self.right - self.left) / (n - 1) as f32
                };
                let frac = if span > 1e-12 && v.is_finite() {
                    ((v - lo) / span) as f32
                } else {
                    0.5
                };
                (x, self.bottom - frac * (self.bottom - self.top))
            })
            .collect()
    }

    fn draw(
        &self,
        img: &mut RgbImage,
        ks: &[usize],
        values: &[f64],
        color: Rgb<u8>,
        title: &str,
        font: Option<&FontVec>,
    ) {
        draw_line_segment_mut(img, (self.left, self.top), (self.left, self.bottom), AXIS_COLOR);
        draw_line_segment_mut(img, (self.left, self.bottom), (self.right, self.bottom), AXIS_COLOR);

        let points = self.positions(values);
        for pair in points.windows(2) {
            draw_line_segment_mut(img, pair[0], pair[1], color);
        }
        for &(x, y) in &points {
            draw_filled_circle_mut(img, (x.round() as i32, y.round() as i32), MARKER_RADIUS, color);
        }

        let Some(font) = font else {
            return;
        };
        draw_text_mut(img, AXIS_COLOR, self.left as i32, 12, PxScale::from(TITLE_PX), font, title);
        for (k, &(x, _)) in ks.iter().zip(&points) {
            let y = (self.bottom + 8.0) as i32;
            draw_text_mut(img, AXIS_COLOR, x as i32 - 4, y, PxScale::from(LABEL_PX), font, &k.to_string());
        }
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if let (Some(lo), Some(hi)) = (
            finite.iter().copied().reduce(f64::min),
            finite.iter().copied().reduce(f64::max),
        ) {
            let x = (self.left - MARGIN + 2.0) as i32;
            draw_text_mut(img, AXIS_COLOR, x, self.top as i32 - 16, PxScale::from(LABEL_PX), font, &format!("{:.3}", hi));
            draw_text_mut(img, AXIS_COLOR, x, self.bottom as i32 + 24, PxScale::from(LABEL_PX), font, &format!("{:.3}", lo));
        }
    }
}

/// Left panel perplexity, right panel coherence, K on the x axis
pub fn render_sweep_chart(sweep: &[SweepPoint], font: Option<&FontVec>) -> RgbImage {
    let mut img = RgbImage::from_pixel(PANEL_WIDTH * 2, CHART_HEIGHT, Rgb([255, 255, 255]));
    let ks: Vec<usize> = sweep.iter().map(|p| p.n_topics).collect();
    let perplexity: Vec<f64> = sweep.iter().map(|p| p.perplexity).collect();
    let coherence: Vec<f64> = sweep.iter().map(|p| p.coherence).collect();

    Panel::at(0).draw(&mut img, &ks, &perplexity, PERPLEXITY_COLOR, "perplexity", font);
    Panel::at(1).draw(&mut img, &ks, &coherence, COHERENCE_COLOR, "coherence", font);
    img
}

/// Renders and saves the chart; labels need `font_path`
pub fn save_sweep_chart(
    sweep: &[SweepPoint],
    path: &Path,
    font_path: Option<&Path>,
) -> Result<(), AnalyticsError> {
    let font = font_path.map(load_font).transpose()?;
    let img = render_sweep_chart(sweep, font.as_ref());
    ensure_parent(path)?;
    img.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(n_topics: usize, perplexity: f64, coherence: f64) -> SweepPoint {
        SweepPoint {
            n_topics,
            perplexity,
            coherence,
        }
    }

    #[test]
    fn test_markers_span_each_panel() {
        let sweep = vec![point(2, 10.0, 0.3), point(3, 20.0, 0.5)];
        let img = render_sweep_chart(&sweep, None);
        assert_eq!(img.dimensions(), (1200, 400));

        assert_eq!(*img.get_pixel(50, 350), PERPLEXITY_COLOR);
        assert_eq!(*img.get_pixel(550, 50), PERPLEXITY_COLOR);
        assert_eq!(*img.get_pixel(650, 350), COHERENCE_COLOR);
        assert_eq!(*img.get_pixel(1150, 50), COHERENCE_COLOR);
        assert_eq!(*img.get_pixel(300, 20), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_single_point_is_centred() {
        let img = render_sweep_chart(&[point(4, 7.0, 0.4)], None);
        assert_eq!(*img.get_pixel(300, 200), PERPLEXITY_COLOR);
        assert_eq!(*img.get_pixel(900, 200), COHERENCE_COLOR);
    }
}
