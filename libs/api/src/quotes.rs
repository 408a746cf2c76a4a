//! Quote of the day
//!
//! Fetches a random quotation from a ZenQuotes-compatible endpoint. The
//! homepage must render even when the upstream is down, so
//! [`QuoteClient::fetch_quote`] never fails: it falls back to
//! [`FALLBACK_QUOTE`] and logs the reason.

use harmonist_shared::tls_client::{TlsClientConfig, create_tls_client};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_QUOTE_API_URL: &str = "https://zenquotes.io/api/random";
pub const DEFAULT_QUOTE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Quote {
    pub text: String,
    pub author: String,
}

/// Static quote shown whenever the upstream API cannot be used
pub const FALLBACK_QUOTE: StaticQuote = StaticQuote {
    text: "The ocean is a mighty harmonist.",
    author: "William Wordsworth",
};

#[derive(Debug, Clone, Copy)]
pub struct StaticQuote {
    pub text: &'static str,
    pub author: &'static str,
}

impl From<StaticQuote> for Quote {
    fn from(quote: StaticQuote) -> Self {
        Quote {
            text: quote.text.to_string(),
            author: quote.author.to_string(),
        }
    }
}

impl Quote {
    pub fn fallback() -> Self {
        FALLBACK_QUOTE.into()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    #[error("quote request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("quote API returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("quote API returned an unreadable body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("quote API returned no usable quote")]
    Empty,
}

/// Wire shape of a ZenQuotes entry
#[derive(Debug, Deserialize)]
struct ZenQuote {
    q: String,
    #[serde(default)]
    a: String,
}

#[derive(Clone)]
pub struct QuoteClient {
    client: reqwest::Client,
    url: String,
}

impl QuoteClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, String> {
        let client = create_tls_client(TlsClientConfig::default().with_timeout(timeout))?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Fetch a quote, surfacing upstream failures
    pub async fn try_fetch_quote(&self) -> Result<Quote, QuoteError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuoteError::Status(status));
        }

        let body = response.bytes().await?;
        let quotes: Vec<ZenQuote> = serde_json::from_slice(&body)?;

        let first = quotes.into_iter().next().ok_or(QuoteError::Empty)?;
        let text = first.q.trim();
        if text.is_empty() {
            return Err(QuoteError::Empty);
        }

        let author = match first.a.trim() {
            "" => "Unknown",
            author => author,
        };

        Ok(Quote {
            text: text.to_string(),
            author: author.to_string(),
        })
    }

    /// Fetch a quote, falling back to [`FALLBACK_QUOTE`] on any failure
    pub async fn fetch_quote(&self) -> Quote {
        match self.try_fetch_quote().await {
            Ok(quote) => quote,
            Err(error) => {
                tracing::warn!(url = %self.url, %error, "using fallback quote");
                Quote::fallback()
            }
        }
    }
}
