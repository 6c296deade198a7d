// * Grid collage of downloaded images
// * Memory stays bounded: one decoded source, one row strip and the canvas.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{ImageReader, RgbImage};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::MediaError;
use crate::config::CollageConfig;
use crate::persistence::ensure_parent;

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollageReport {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    /// Candidates that failed to decode and were replaced by spares
    pub skipped: usize,
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|ok| e.eq_ignore_ascii_case(ok)))
        .unwrap_or(false)
}

/// Image files directly inside `dir`, sorted by name
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>, MediaError> {
    let entries = fs::read_dir(dir).map_err(|e| MediaError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| MediaError::io(dir, e))?.path();
        if path.is_file() && has_image_extension(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Tile size: width from the grid, height keeping the first image's aspect ratio
pub fn tile_size(first: (u32, u32), cols: u32, max_width: u32) -> Result<(u32, u32), MediaError> {
    let tile_width = max_width / cols.max(1);
    let (w, h) = first;
    if tile_width == 0 || w == 0 {
        return Err(MediaError::InvalidGeometry(format!(
            "tile width {} from max width {} over {} columns",
            tile_width, max_width, cols
        )));
    }
    let tile_height = (tile_width as f64 / w as f64 * h as f64) as u32;
    if tile_height == 0 {
        return Err(MediaError::InvalidGeometry(format!(
            "first image {}x{} gives a zero tile height",
            w, h
        )));
    }
    Ok((tile_width, tile_height))
}

fn decode(path: &Path) -> Result<RgbImage, MediaError> {
    let img = ImageReader::open(path)
        .map_err(|e| MediaError::io(path, e))?
        .with_guessed_format()
        .map_err(|e| MediaError::io(path, e))?
        .decode()
        .map_err(|e| MediaError::image(path, e))?;
    Ok(img.to_rgb8())
}

/// Yields decoded images in order, skipping files that fail to decode
struct TileSource {
    paths: std::vec::IntoIter<PathBuf>,
    total: usize,
    skipped: usize,
    required: usize,
}

impl TileSource {
    fn next_image(&mut self) -> Result<RgbImage, MediaError> {
        for path in self.paths.by_ref() {
            match decode(&path) {
                Ok(img) => return Ok(img),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping undecodable image");
                    self.skipped += 1;
                }
            }
        }
        Err(MediaError::NotEnoughImages {
            available: self.total - self.skipped,
            required: self.required,
        })
    }
}

fn save(canvas: &RgbImage, output: &Path, quality: u8) -> Result<(), MediaError> {
    ensure_parent(output)?;
    let is_jpeg = output
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
        .unwrap_or(false);

    if is_jpeg {
        let file = File::create(output).map_err(|e| MediaError::io(output, e))?;
        let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), quality);
        canvas
            .write_with_encoder(encoder)
            .map_err(|e| MediaError::image(output, e))
    } else {
        canvas.save(output).map_err(|e| MediaError::image(output, e))
    }
}

/// Builds the collage as configured
pub fn compose(config: &CollageConfig) -> Result<CollageReport, MediaError> {
    if config.rows == 0 || config.cols == 0 {
        return Err(MediaError::InvalidGeometry(format!(
            "grid {}x{} has no cells",
            config.rows, config.cols
        )));
    }

    let mut files = list_images(&config.image_dir)?;
    let required = (config.rows * config.cols) as usize;
    if files.len() < required {
        return Err(MediaError::NotEnoughImages {
            available: files.len(),
            required,
        });
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    files.shuffle(&mut rng);
    info!(
        candidates = files.len(),
        rows = config.rows,
        cols = config.cols,
        "Composing collage"
    );

    let mut source = TileSource {
        total: files.len(),
        paths: files.into_iter(),
        skipped: 0,
        required,
    };

    let first = source.next_image()?;
    let (tile_w, tile_h) = tile_size(first.dimensions(), config.cols, config.max_width)?;
    let width = tile_w * config.cols;
    let height = tile_h * config.rows;
    let mut canvas = RgbImage::new(width, height);
    let mut pending = Some(first);

    for row in 0..config.rows {
        let mut strip = RgbImage::new(width, tile_h);
        for col in 0..config.cols {
            let img = match pending.take() {
                Some(img) => img,
                None => source.next_image()?,
            };
            let tile = imageops::resize(&img, tile_w, tile_h, FilterType::CatmullRom);
            imageops::replace(&mut strip, &tile, (col * tile_w) as i64, 0);
        }
        imageops::replace(&mut canvas, &strip, 0, (row * tile_h) as i64);
        debug!(row = row + 1, of = config.rows, "Collage row placed");
    }

    save(&canvas, &config.output, config.jpeg_quality)?;
    info!(
        output = %config.output.display(),
        width = width,
        height = height,
        skipped = source.skipped,
        "Collage saved"
    );

    Ok(CollageReport {
        output: config.output.clone(),
        width,
        height,
        tile_width: tile_w,
        tile_height: tile_h,
        skipped: source.skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_filter_is_case_insensitive() {
        assert!(has_image_extension(Path::new("a.PNG")));
        assert!(has_image_extension(Path::new("a.webp")));
        assert!(has_image_extension(Path::new("a.JpEg")));
        assert!(!has_image_extension(Path::new("a.gif")));
        assert!(!has_image_extension(Path::new("noext")));
    }

    #[test]
    fn test_tile_size_keeps_aspect() {
        assert_eq!(tile_size((200, 100), 50, 5000).unwrap(), (100, 50));
        assert_eq!(tile_size((3, 4), 3, 30).unwrap(), (10, 13));
        assert!(tile_size((10, 10), 100, 50).is_err());
    }
}
