use std::collections::HashSet;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::info;

const USER_AGENT: &str = concat!("ofcom_scraper/", env!("CARGO_PKG_VERSION"));
const TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("page not found: {url}")]
    NotFound { url: String },
    #[error("unexpected status {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("request failed for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Build the blocking HTTP client shared across the whole run.
pub fn build_client() -> anyhow::Result<Client> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(TIMEOUT_SECS))
        .build()?;
    Ok(client)
}

/// GET a page and return its body. Anything other than HTTP 200 is an error,
/// with 404 reported distinctly from other statuses.
pub fn fetch_page(client: &Client, url: &str) -> Result<String, FetchError> {
    let response = client.get(url).send().map_err(|source| FetchError::Transport {
        url: url.to_string(),
        source,
    })?;

    match response.status() {
        StatusCode::OK => response.text().map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        }),
        StatusCode::NOT_FOUND => Err(FetchError::NotFound {
            url: url.to_string(),
        }),
        status => Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        }),
    }
}

/// Fetch a listing page and return every distinct hyperlink target in it,
/// in first-occurrence order.
pub fn collect_links(client: &Client, url: &str) -> Result<Vec<String>, FetchError> {
    info!("Fetching listing page: {}", url);
    let body = fetch_page(client, url)?;
    let links = hrefs(&body);
    info!("Found {} distinct links", links.len());
    Ok(links)
}

/// Pull all a[href] values out of an HTML document, deduplicated but keeping
/// the order they first appear in.
pub fn hrefs(body: &str) -> Vec<String> {
    let document = Html::parse_document(body);
    let anchors = Selector::parse("a[href]").expect("anchor selector");

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for element in document.select(&anchors) {
        if let Some(href) = element.value().attr("href") {
            if seen.insert(href.to_string()) {
                links.push(href.to_string());
            }
        }
    }
    links
}
