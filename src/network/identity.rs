use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};

use super::errors::NetworkError;

// * IdentityProfile is the desktop browser identity shared by the Chromium
// * session (user-agent flag) and the image HTTP client (default headers).
#[derive(Debug, Clone)]
pub struct IdentityProfile {
    pub chrome_version: &'static str,
    pub user_agent: String,
    pub accept_language: &'static str,
    // * Image CDNs reject hotlinks without a site referer
    pub referer: String,
}

impl IdentityProfile {
    // * Desktop Chrome on Windows with a Chinese locale preference
    pub fn desktop_chrome(referer: &str) -> Self {
        let full_version = "120.0.6099.109";

        Self {
            chrome_version: "120",
            user_agent: format!(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{} Safari/537.36",
                full_version
            ),
            accept_language: "zh-CN,zh;q=0.9,en;q=0.8",
            referer: referer.to_string(),
        }
    }

    // * Builds the default header set for HTTP requests
    pub fn headers(&self) -> Result<HeaderMap, NetworkError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&self.user_agent)?);
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(self.accept_language));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("image/avif,image/webp,image/apng,image/*,*/*;q=0.8"),
        );
        if !self.referer.is_empty() {
            headers.insert(REFERER, HeaderValue::from_str(&self.referer)?);
        }
        Ok(headers)
    }
}
