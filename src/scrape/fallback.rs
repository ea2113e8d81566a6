//! General web-search fallback for when the review site's own search finds nothing.

use html_scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, trace};
use url::Url;

use crate::data::names::NameKey;
use crate::scrape::errors::ScrapeError;
use crate::scrape::fetch::PageFetcher;

static ANCHOR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

pub const DEFAULT_SEARCH_URL: &str = "https://www.google.com/search?q=";
pub const DEFAULT_QUALIFIER: &str = "+university+of+texas+at+dallas";
pub const DEFAULT_ORIGIN: &str = "https://www.google.com";
pub const DEFAULT_LINK_MARKER: &str = "tid";

/// Search-engine query settings for the fallback path.
#[derive(Debug, Clone)]
pub struct FallbackSearch {
    /// Query prefix the name fragment is appended to.
    pub search_url: String,
    /// Appended after the name to scope results to the institution.
    pub qualifier: String,
    /// Base that result hrefs are resolved against.
    pub origin: String,
    /// Lowercase substring identifying a profile link.
    pub link_marker: String,
}

impl Default for FallbackSearch {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_owned(),
            qualifier: DEFAULT_QUALIFIER.to_owned(),
            origin: DEFAULT_ORIGIN.to_owned(),
            link_marker: DEFAULT_LINK_MARKER.to_owned(),
        }
    }
}

impl FallbackSearch {
    pub fn query_url(&self, key: &NameKey) -> Result<Url, ScrapeError> {
        let raw = format!("{}{}{}", self.search_url, key.query_fragment(), self.qualifier);
        Url::parse(&raw).map_err(|source| ScrapeError::InvalidUrl { url: raw, source })
    }

    /// Pick the profile link out of a results page.
    ///
    /// Every matching anchor replaces the previous pick, so the last match in
    /// document order wins.
    pub fn pick_link(&self, body: &str) -> Option<Url> {
        let origin = match Url::parse(&self.origin) {
            Ok(origin) => origin,
            Err(e) => {
                debug!(origin = %self.origin, error = %e, "Invalid fallback origin");
                return None;
            }
        };
        let marker = self.link_marker.to_lowercase();
        let html = Html::parse_document(body);

        let mut picked = None;
        for anchor in html.select(&ANCHOR_SEL) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            if !href.to_lowercase().contains(&marker) {
                continue;
            }
            match origin.join(href) {
                Ok(link) => {
                    trace!(link = %link, "Fallback candidate");
                    picked = Some(link);
                }
                Err(e) => debug!(href, error = %e, "Unresolvable fallback link"),
            }
        }
        picked
    }

    /// Run the search and return the profile link it points at.
    pub async fn find_profile_link(
        &self,
        fetcher: &dyn PageFetcher,
        key: &NameKey,
    ) -> Result<Url, ScrapeError> {
        let url = self.query_url(key)?;
        let body = fetcher.fetch(&url).await?;
        self.pick_link(&body).ok_or(ScrapeError::ProfessorNotFound)
    }
}
