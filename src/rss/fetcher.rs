//! Feed document fetcher.
//!
//! This module downloads one feed URL with a bounded timeout and decodes the
//! body into a [`FeedDocument`]. It also holds the SSRF guard applied to URLs
//! submitted through the API and to every redirect the fetcher follows.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use feed_rs::parser;
use reqwest::redirect::Policy;
use reqwest::Client;

use crate::config::ScraperConfig;
use crate::rss::error::FetchError;
use crate::rss::types::{FeedDocument, FeedItem, MAX_FEED_SIZE};
use crate::{AppError, Result};

/// Upper bound on the connect phase.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// User agent used when none is configured.
const DEFAULT_USER_AGENT: &str = "rssagg/0.1 (feed aggregator)";

/// Source of parsed feed documents.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Download and decode the feed at `url`.
    async fn fetch(&self, url: &str) -> std::result::Result<FeedDocument, FetchError>;
}

/// HTTP feed fetcher.
///
/// One client is shared by every request so connections are pooled across
/// workers.
#[derive(Debug, Clone)]
pub struct RssFetcher {
    client: Client,
    max_size: u64,
}

impl RssFetcher {
    /// Create a fetcher from the scraper configuration.
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        Self::build(
            config.request_timeout(),
            config.max_feed_size_bytes,
            &config.user_agent,
        )
    }

    /// Create a fetcher with default limits and the given total timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Self::build(timeout, MAX_FEED_SIZE, DEFAULT_USER_AGENT)
    }

    fn build(timeout: Duration, max_size: u64, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout.min(Duration::from_secs(CONNECT_TIMEOUT_SECS)))
            .timeout(timeout)
            .redirect(redirect_policy())
            .user_agent(user_agent)
            .build()
            .map_err(|e| AppError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, max_size })
    }

    /// Maximum accepted body size in bytes.
    pub fn max_size(&self) -> u64 {
        self.max_size
    }
}

/// Follow at most [`MAX_REDIRECTS`] hops, each to a URL that passes
/// [`validate_url`].
fn redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() > MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        match validate_url(attempt.url().as_str()) {
            Ok(()) => attempt.follow(),
            Err(e) => {
                let message = format!("redirect to {} refused: {}", attempt.url(), e);
                attempt.error(message)
            }
        }
    })
}

#[async_trait]
impl Fetcher for RssFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<FeedDocument, FetchError> {
        let mut response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_size {
                return Err(FetchError::TooLarge {
                    size: content_length,
                    max: self.max_size,
                });
            }
        }

        // Content-Length may be missing or wrong, so count while reading.
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            let size = (body.len() + chunk.len()) as u64;
            if size > self.max_size {
                return Err(FetchError::TooLarge {
                    size,
                    max: self.max_size,
                });
            }
            body.extend_from_slice(&chunk);
        }

        parse_feed(&body)
    }
}

/// Decode a feed body.
///
/// RSS 2.0 is the primary format; Atom and JSON Feed map onto the same shape.
/// Missing fields become empty strings and the item date is rendered as
/// RFC 2822.
pub fn parse_feed(bytes: &[u8]) -> std::result::Result<FeedDocument, FetchError> {
    let feed = parser::parse(bytes).map_err(|e| FetchError::Parse(e.to_string()))?;

    let items = feed
        .entries
        .into_iter()
        .map(|entry| FeedItem {
            title: entry.title.map(|t| t.content).unwrap_or_default(),
            link: entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default(),
            description: entry
                .summary
                .map(|t| t.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .unwrap_or_default(),
            pub_date: entry
                .published
                .or(entry.updated)
                .map(|d| d.to_rfc2822())
                .unwrap_or_default(),
        })
        .collect();

    Ok(FeedDocument {
        title: feed.title.map(|t| t.content).unwrap_or_default(),
        link: feed
            .links
            .first()
            .map(|l| l.href.clone())
            .unwrap_or_default(),
        description: feed.description.map(|d| d.content).unwrap_or_default(),
        language: feed.language.unwrap_or_default(),
        items,
    })
}

/// Validate a feed URL submitted by a user.
///
/// Only http(s) URLs with a public host are accepted.
pub fn validate_url(url: &str) -> Result<()> {
    let parsed =
        url::Url::parse(url).map_err(|e| AppError::Validation(format!("invalid URL: {}", e)))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(AppError::Validation(format!(
                "unsupported URL scheme: {}",
                scheme
            )));
        }
    }

    let host = parsed
        .host()
        .ok_or_else(|| AppError::Validation("URL has no host".to_string()))?;

    let ip = match host {
        url::Host::Domain(domain) => {
            if is_forbidden_hostname(domain) {
                return Err(AppError::Validation(format!("forbidden host: {}", domain)));
            }
            return Ok(());
        }
        url::Host::Ipv4(ipv4) => IpAddr::V4(ipv4),
        url::Host::Ipv6(ipv6) => IpAddr::V6(ipv6),
    };

    if is_private_ip(&ip) {
        return Err(AppError::Validation(format!(
            "private IP address not allowed: {}",
            ip
        )));
    }

    Ok(())
}

fn is_forbidden_hostname(host: &str) -> bool {
    const FORBIDDEN_SUFFIXES: [&str; 5] = [".local", ".localhost", ".internal", ".lan", ".home"];

    let host = host.to_lowercase();
    host == "localhost" || FORBIDDEN_SUFFIXES.iter().any(|s| host.ends_with(s))
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let o = v4.octets();
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                // carrier-grade NAT 100.64.0.0/10
                || (o[0] == 100 && (64..=127).contains(&o[1]))
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
                || v6.to_ipv4_mapped().is_some_and(|v4| is_private_ip(&IpAddr::V4(v4)))
        }
    }
}
