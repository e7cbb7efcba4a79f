use std::time::Duration;

use reqwest::{Client, Url};
use tracing::instrument;

use crate::errors::{ConfigurationError, FetchError};
use crate::imaging::transcode_to_jpeg_base64;

/// Downloads user-supplied image URLs and converts them to base64 JPEG.
#[derive(Clone)]
pub struct RemoteImageFetcher {
    client: Client,
    quality: u8,
}

impl RemoteImageFetcher {
    pub fn new(timeout: Duration, quality: u8) -> Result<Self, ConfigurationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ConfigurationError::HttpClient)?;
        Ok(Self { client, quality })
    }

    #[instrument(name = "fetch", skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let url = Url::parse(url.trim())
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .ok_or_else(|| FetchError::InvalidUrl(url.to_string()))?;

        let res = self.client.get(url).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = res.bytes().await?;
        tracing::debug!(bytes = bytes.len(), "Downloaded remote image");

        transcode_to_jpeg_base64(&bytes, self.quality).map_err(FetchError::NotAnImage)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::imaging::sample_png;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> RemoteImageFetcher {
        RemoteImageFetcher::new(Duration::from_secs(5), 90).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_image() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/specimen.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(sample_png()))
            .mount(&server)
            .await;

        let encoded = fetcher()
            .fetch(&format!("{}/specimen.png", server.uri()))
            .await
            .unwrap();
        assert!(!encoded.is_empty());
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = fetcher()
            .fetch(&format!("{}/private.jpg", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status(403)));
    }

    #[tokio::test]
    async fn test_non_image_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let err = fetcher().fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::NotAnImage(_)));
    }

    #[tokio::test]
    async fn test_rejects_non_http_urls() {
        for url in ["file:///etc/passwd", "not a url", ""] {
            let err = fetcher().fetch(url).await.unwrap_err();
            assert!(matches!(err, FetchError::InvalidUrl(_)));
        }
    }
}
