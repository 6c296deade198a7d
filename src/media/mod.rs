// * Image harvesting and the collage built from it

pub mod collage;
pub mod downloader;

pub use collage::CollageReport;
pub use downloader::DownloadStats;

use std::path::PathBuf;
use thiserror::Error;

use crate::network::NetworkError;
use crate::persistence::StoreError;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Image error on {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not enough images for the grid: found {available}, need {required}")]
    NotEnoughImages { available: usize, required: usize },

    #[error("Invalid collage geometry: {0}")]
    InvalidGeometry(String),
}

impl MediaError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Image {
            path: path.into(),
            source,
        }
    }
}
