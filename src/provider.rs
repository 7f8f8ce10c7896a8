use std::time::Duration;

use async_trait::async_trait;
use feed_rs::parser;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;
use url::form_urlencoded;

use crate::config::ProviderConfig;
use crate::timestamp::TimeParts;

/// Source label stored on every article.
pub const GOOGLE_NEWS: &str = "Google News";

/// An entry as handed over by the provider, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub published: Option<TimeParts>,
    pub updated: Option<TimeParts>,
    /// Raw published text, kept for entries whose date the parser rejected
    pub published_text: Option<String>,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("invalid feed url: {0}")]
    Url(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned HTTP {0}")]
    Status(StatusCode),
    #[error("malformed feed: {0}")]
    Malformed(#[from] parser::ParseFeedError),
}

/// A news search backend queried once per tracked entity.
#[async_trait]
pub trait FeedProvider: Send + Sync {
    /// Entries matching `query`, in provider order.
    async fn search(&self, query: &str) -> Result<Vec<FeedEntry>, FeedError>;
}

pub struct GoogleNewsProvider {
    client: Client,
    config: ProviderConfig,
}

impl GoogleNewsProvider {
    pub fn new(config: ProviderConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("FamilyOfficeNews/1.0 (News Tracker)")
            .build()?;

        Ok(Self { client, config })
    }

    /// Search URL for `query`. The name is sent as one phrase, form-encoded.
    pub fn query_url(&self, query: &str) -> String {
        let q: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
        format!(
            "{}?q={}&hl={}&gl={}&ceid={}",
            self.config.base_url, q, self.config.hl, self.config.gl, self.config.ceid
        )
    }

    /// Extract `<pubDate>` text from raw RSS XML, one slot per `<item>` in
    /// document order.
    ///
    /// feed_rs drops dates it cannot parse, so the raw text is kept here for
    /// the free-text fallback. feed_rs yields RSS items in the same order, so
    /// slot `i` belongs to entry `i`.
    pub fn extract_pub_dates_from_xml(xml_bytes: &[u8]) -> Vec<Option<String>> {
        let xml_str = match std::str::from_utf8(xml_bytes) {
            Ok(s) => s,
            Err(_) => return Vec::new(),
        };

        Self::item_blocks(xml_str)
            .map(|item| {
                Self::extract_xml_element(item, "pubDate").map(|text| Self::unwrap_text(&text))
            })
            .collect()
    }

    /// Bodies of `<item>` / `<item ...>` elements; `<itemFoo>` does not match.
    fn item_blocks(xml: &str) -> impl Iterator<Item = &str> {
        xml.match_indices("<item")
            .filter_map(move |(idx, tag)| {
                let rest = &xml[idx + tag.len()..];
                match rest.chars().next() {
                    Some('>') => Some(&rest[1..]),
                    Some(c) if c.is_whitespace() => rest.find('>').map(|gt| &rest[gt + 1..]),
                    _ => None,
                }
            })
            .map(|body| &body[..body.find("</item>").unwrap_or(body.len())])
    }

    pub fn extract_xml_element(xml: &str, tag: &str) -> Option<String> {
        let start_tag = format!("<{}>", tag);
        let end_tag = format!("</{}>", tag);

        let start = xml.find(&start_tag)? + start_tag.len();
        let end = xml[start..].find(&end_tag)? + start;

        Some(xml[start..end].trim().to_string())
    }

    /// Strip a CDATA wrapper, or decode the predefined XML entities.
    pub fn unwrap_text(raw: &str) -> String {
        let raw = raw.trim();
        if let Some(inner) = raw
            .strip_prefix("<![CDATA[")
            .and_then(|r| r.strip_suffix("]]>"))
        {
            return inner.trim().to_string();
        }

        raw.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&amp;", "&")
    }

    pub fn entry_from_feed(
        entry: feed_rs::model::Entry,
        published_text: Option<String>,
    ) -> FeedEntry {
        FeedEntry {
            title: entry.title.map(|t| t.content),
            link: entry.links.first().map(|l| l.href.clone()),
            published: entry.published.map(TimeParts::from),
            updated: entry.updated.map(TimeParts::from),
            published_text,
        }
    }
}

#[async_trait]
impl FeedProvider for GoogleNewsProvider {
    async fn search(&self, query: &str) -> Result<Vec<FeedEntry>, FeedError> {
        let url = url::Url::parse(&self.query_url(query))?;
        debug!("Requesting {}", url);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FeedError::Status(response.status()));
        }
        let bytes = response.bytes().await?;

        let mut pub_dates = Self::extract_pub_dates_from_xml(&bytes);
        let parsed = parser::parse(&bytes[..])?;

        Ok(parsed
            .entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| {
                let published_text = pub_dates.get_mut(i).and_then(Option::take);
                Self::entry_from_feed(entry, published_text)
            })
            .collect())
    }
}
