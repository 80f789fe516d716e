use crate::error::{Result, ScanError};
use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_MAX_BODY_BYTES: usize = 3 * 1024 * 1024;
pub const DEFAULT_MAX_REDIRECTS: usize = 5;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Page fetch collaborator.
///
/// Implementations own their timeout and size policy and must report every
/// failure as an empty string.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> String;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

fn default_max_redirects() -> usize {
    DEFAULT_MAX_REDIRECTS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_body_bytes: default_max_body_bytes(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
        }
    }
}

/// `Fetch` over a pooled reqwest client.
pub struct HttpFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_config(&FetchConfig::default())
    }

    pub fn with_config(config: &FetchConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs.max(1));
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(timeout)
            .connect_timeout(timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// Fetch the body of `url`, enforcing status and size limits.
    pub async fn try_fetch(&self, url: &str) -> Result<String> {
        let mut response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let too_large = || ScanError::BodyTooLarge {
            url: url.to_string(),
            limit: self.max_body_bytes,
        };

        if let Some(declared) = response.content_length()
            && declared > self.max_body_bytes as u64
        {
            return Err(too_large());
        }

        let charset = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(charset_label)
            .map(str::to_string);

        // Content-Length can be absent or wrong, so count what actually arrives
        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        Ok(decode_body(&body, charset.as_deref()))
    }
}

/// The `charset` parameter of a `Content-Type` value, if any.
pub fn charset_label(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}

/// Decode `bytes` in the labelled encoding. Unknown or missing labels fall
/// back to UTF-8; a byte order mark wins over the label.
pub fn decode_body(bytes: &[u8], label: Option<&str>) -> String {
    let encoding = label
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> String {
        match self.try_fetch(url).await {
            Ok(body) => body,
            Err(e) => {
                debug!("Fetch failed for {}: {}", url, e);
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Page;
    use crate::score::KeywordScorer;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    async fn serve(mock_server: &MockServer, route: &str, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(template)
            .mount(mock_server)
            .await;
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let mock_server = MockServer::start().await;
        serve(
            &mock_server,
            "/page",
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<html><body>machine learning</body></html>"),
        )
        .await;

        let fetcher = HttpFetcher::new().unwrap();
        let body = fetcher.fetch(&format!("{}/page", mock_server.uri())).await;
        assert!(body.contains("machine learning"));
    }

    #[tokio::test]
    async fn test_body_is_decoded_with_declared_charset() {
        let mock_server = MockServer::start().await;
        let (big5, _, _) = encoding_rs::BIG5.encode("機器人 robot");
        serve(
            &mock_server,
            "/big5",
            ResponseTemplate::new(200)
                .set_body_raw(big5.into_owned(), "text/plain; charset=big5"),
        )
        .await;

        let fetcher = HttpFetcher::new().unwrap();
        let url = format!("{}/big5", mock_server.uri());
        let body = fetcher.fetch(&url).await;
        assert_eq!(body, "機器人 robot");

        let page = Page::fetched(&url, body, &KeywordScorer::default(), "robot 機器人");
        assert_eq!(page.user_count(), 2);
    }

    #[test]
    fn test_charset_label() {
        assert_eq!(charset_label("text/html; charset=Shift_JIS"), Some("Shift_JIS"));
        assert_eq!(charset_label("text/html;charset=\"gbk\""), Some("gbk"));
        assert_eq!(charset_label("text/html; boundary=x; Charset=big5"), Some("big5"));
        assert_eq!(charset_label("text/html"), None);
    }

    #[test]
    fn test_unknown_charset_falls_back_to_utf8() {
        assert_eq!(decode_body("café".as_bytes(), Some("no-such-charset")), "café");
        assert_eq!(decode_body("café".as_bytes(), None), "café");
    }

    #[tokio::test]
    async fn test_non_success_status_is_empty() {
        let mock_server = MockServer::start().await;
        serve(
            &mock_server,
            "/missing",
            ResponseTemplate::new(404).set_body_string("not found"),
        )
        .await;

        let fetcher = HttpFetcher::new().unwrap();
        let url = format!("{}/missing", mock_server.uri());
        assert!(matches!(
            fetcher.try_fetch(&url).await,
            Err(ScanError::Status { status: 404, .. })
        ));
        assert_eq!(fetcher.fetch(&url).await, "");
    }

    #[tokio::test]
    async fn test_oversized_body_is_empty() {
        let mock_server = MockServer::start().await;
        serve(
            &mock_server,
            "/big",
            ResponseTemplate::new(200).set_body_string("x".repeat(4096)),
        )
        .await;

        let config = FetchConfig {
            max_body_bytes: 1024,
            ..Default::default()
        };
        let fetcher = HttpFetcher::with_config(&config).unwrap();
        let url = format!("{}/big", mock_server.uri());
        assert!(matches!(
            fetcher.try_fetch(&url).await,
            Err(ScanError::BodyTooLarge { limit: 1024, .. })
        ));
        assert_eq!(fetcher.fetch(&url).await, "");
    }

    #[tokio::test]
    async fn test_slow_response_times_out_to_empty() {
        let mock_server = MockServer::start().await;
        serve(
            &mock_server,
            "/slow",
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(3)),
        )
        .await;

        let config = FetchConfig {
            timeout_secs: 1,
            ..Default::default()
        };
        let fetcher = HttpFetcher::with_config(&config).unwrap();
        assert_eq!(fetcher.fetch(&format!("{}/slow", mock_server.uri())).await, "");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_empty() {
        let fetcher = HttpFetcher::new().unwrap();
        assert_eq!(fetcher.fetch("not a url").await, "");
    }
}
