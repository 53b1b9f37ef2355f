use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use url::Url;

pub const DEFAULT_SHORTENER_URL: &str = "https://git.io";

/// Provides shortened links for chat reports.
#[async_trait]
pub trait UrlShortener: Send + Sync {
    /// Returns a shortened form of `url`, or `url` itself if it cannot be shortened.
    async fn shorten(&self, url: &str) -> String;
}

/// Shortener backed by a git.io-like service: the URL is POSTed as a form and the short link
/// is returned in the `Location` header.
pub struct HttpUrlShortener {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpUrlShortener {
    pub fn new(endpoint: Url) -> anyhow::Result<Self> {
        // The short link is read from the redirect itself, it must not be followed.
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .build()
            .context("Cannot build URL shortener HTTP client")?;
        Ok(Self { client, endpoint })
    }

    async fn request_short_url(&self, url: &str) -> anyhow::Result<Option<String>> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .form(&[("url", url)])
            .send()
            .await?;
        let location = response
            .headers()
            .get(LOCATION)
            .map(|value| value.to_str())
            .transpose()
            .context("Location header is not valid text")?;
        Ok(location.map(str::to_string))
    }
}

#[async_trait]
impl UrlShortener for HttpUrlShortener {
    async fn shorten(&self, url: &str) -> String {
        match self.request_short_url(url).await {
            Ok(Some(short)) => short,
            Ok(None) => {
                tracing::debug!("URL shortener did not return a location for {url}");
                url.to_string()
            }
            Err(error) => {
                tracing::debug!("Cannot shorten {url}: {error:?}");
                url.to_string()
            }
        }
    }
}
