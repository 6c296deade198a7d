use reqwest::{Client, StatusCode};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::config::HttpConfig;
use crate::network::errors::NetworkError;
use crate::network::identity::IdentityProfile;

// * HTTP client for media downloads.
pub struct MediaClient {
    inner: Client,
}

impl MediaClient {
    // * Builds the client with the identity's default headers and optional proxy
    pub fn new(config: &HttpConfig, identity: &IdentityProfile) -> Result<Self, NetworkError> {
        let mut builder = Client::builder()
            .default_headers(identity.headers()?)
            .cookie_store(true)
            .timeout(config.timeout);

        if let Some(url) = &config.proxy {
            builder = builder.proxy(reqwest::Proxy::all(url)?);
        }

        Ok(Self {
            inner: builder.build()?,
        })
    }

    // * Streams the body of `url` into `dest` chunk by chunk.
    // * Anything but 200 OK is an error and no file is created.
    pub async fn download_to(&self, url: &str, dest: &Path) -> Result<u64, NetworkError> {
        let parsed = reqwest::Url::parse(url).map_err(|_| NetworkError::InvalidUrl(url.to_string()))?;
        let mut resp = self.inner.get(parsed).send().await?;

        if resp.status() != StatusCode::OK {
            return Err(NetworkError::Status(resp.status().as_u16(), url.to_string()));
        }

        let io_err = |source: std::io::Error| NetworkError::Io {
            path: dest.to_path_buf(),
            source,
        };

        let mut file = File::create(dest).await.map_err(io_err)?;
        let mut written = 0u64;
        while let Some(chunk) = resp.chunk().await? {
            file.write_all(&chunk).await.map_err(io_err)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(io_err)?;

        Ok(written)
    }
}
