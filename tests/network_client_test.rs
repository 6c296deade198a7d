use notesift::config::HttpConfig;
use notesift::network::{IdentityProfile, MediaClient, NetworkError};
use tempfile::tempdir;

#[tokio::test]
async fn test_client_initialization() {
    let identity = IdentityProfile::desktop_chrome("https://www.xiaohongshu.com");
    let client = MediaClient::new(&HttpConfig::default(), &identity);
    assert!(client.is_ok());
}

#[tokio::test]
async fn test_invalid_url_creates_no_file() {
    let identity = IdentityProfile::desktop_chrome("https://www.xiaohongshu.com");
    let client = MediaClient::new(&HttpConfig::default(), &identity).unwrap();
    let dir = tempdir().unwrap();
    let dest = dir.path().join("x.webp");

    let result = client.download_to("not a url", &dest).await;
    assert!(matches!(result, Err(NetworkError::InvalidUrl(_))));
    assert!(!dest.exists());
}
