use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::FetchError;
use crate::model::{RawItem, RawPage};

/// Anything that can serve one page of source items.
pub trait PageSource {
    fn fetch(&self, locale: &str, page: u32) -> Result<RawPage, FetchError>;
}

/// The tourism API over blocking HTTP.
pub struct HttpSource {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl HttpSource {
    pub fn new(settings: &Settings) -> Result<Self> {
        let api_key = settings.require_api_key()?.to_string();
        let client = reqwest::blocking::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.request_timeout())
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(HttpSource {
            client,
            base_url: settings.api_base_url.clone(),
            api_key,
        })
    }
}

impl PageSource for HttpSource {
    fn fetch(&self, locale: &str, page: u32) -> Result<RawPage, FetchError> {
        let page = page.to_string();
        // Errors are stripped of their URL: it carries the API key.
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("locale", locale),
                ("page", page.as_str()),
            ])
            .send()
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        let body = response.text().map_err(reqwest::Error::without_url)?;
        decode_page(&body)
    }
}

/// Parse a page body. Mistyped fields inside an item read as absent, so
/// only a body that is not a JSON object fails.
pub fn decode_page(body: &str) -> Result<RawPage, FetchError> {
    Ok(serde_json::from_str(body)?)
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts per page, including the first.
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Pause between successfully fetched pages.
    pub page_delay: Duration,
}

impl RetryPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        RetryPolicy {
            max_retries: settings.max_retries,
            retry_delay: settings.retry_delay(),
            page_delay: settings.page_delay(),
        }
    }
}

/// Why `collect_all` stopped asking for pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The source served an empty page.
    Exhausted,
    /// The accumulated items reached the source's reported total.
    TotalReached,
    /// A page failed on every attempt. Handled like the end of data, so the
    /// result may be truncated.
    FetchFailed,
}

#[derive(Debug)]
pub struct Extraction {
    pub items: Vec<RawItem>,
    pub pages: u32,
    pub reported_total: Option<u64>,
    pub stop: StopReason,
}

/// Request one page, retrying transport failures. `None` once every attempt
/// has failed; the caller cannot tell that apart from "no page".
pub fn fetch_page(
    source: &dyn PageSource,
    locale: &str,
    page: u32,
    policy: &RetryPolicy,
) -> Option<RawPage> {
    let attempts = policy.max_retries.max(1);
    for attempt in 1..=attempts {
        match source.fetch(locale, page) {
            Ok(data) => {
                debug!(code = ?data.result_code, message = ?data.result_message, "Source status");
                info!(page, attempt, items = data.item_count(), "Fetched page");
                return Some(data);
            }
            Err(e) => {
                warn!("Page {} attempt {}/{} failed: {}", page, attempt, attempts, e);
                if attempt < attempts {
                    info!("Retrying page {} in {:.1}s", page, policy.retry_delay.as_secs_f64());
                    pause(policy.retry_delay);
                }
            }
        }
    }
    warn!("Page {}: all {} attempts failed", page, attempts);
    None
}

/// Walk pages from 1 until an empty or failed page, or until the reported
/// total is reached.
pub fn collect_all(source: &dyn PageSource, locale: &str, policy: &RetryPolicy) -> Extraction {
    let mut items: Vec<RawItem> = Vec::new();
    let mut page: u32 = 1;
    let mut pages = 0;
    let mut reported_total = None;

    let stop = loop {
        let Some(data) = fetch_page(source, locale, page, policy) else {
            break StopReason::FetchFailed;
        };
        let total = data.total_count();
        let batch = data.items;
        if batch.is_empty() {
            break StopReason::Exhausted;
        }

        items.extend(batch);
        pages += 1;
        info!("Page {}: {} items so far", page, items.len());

        if let Some(total) = total {
            reported_total = Some(total);
            if items.len() as u64 >= total {
                break StopReason::TotalReached;
            }
        }

        page += 1;
        pause(policy.page_delay);
    };

    match stop {
        StopReason::FetchFailed => warn!(
            "Stopped at page {} after repeated failures; {} items collected, data may be truncated",
            page,
            items.len()
        ),
        _ => info!(?stop, pages, items = items.len(), "Extraction finished"),
    }
    if let Some(total) = reported_total.filter(|t| *t != items.len() as u64) {
        warn!("Source reported {} items but {} were collected", total, items.len());
    }

    Extraction {
        items,
        pages,
        reported_total,
        stop,
    }
}

fn pause(d: Duration) {
    if !d.is_zero() {
        thread::sleep(d);
    }
}
