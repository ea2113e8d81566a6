//! Professor rating scraper.
//!
//! A lookup is an ordered queue of page visits: the review site's search page,
//! then any matching profile pages, then (only if nothing was extracted) the
//! page a web-search fallback points at. The lookup finishes when the queue
//! drains.

pub mod errors;
pub mod fallback;
pub mod fetch;
pub mod profile;

pub use errors::ScrapeError;
pub use fallback::FallbackSearch;
pub use fetch::{HttpFetcher, PageFetcher};

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

use crate::data::names::NameKey;
use crate::data::rating::{RatingRecord, RatingValue};
use crate::utils::fmt_duration;

/// Review-site search for UT Dallas (school 1273); the name fragment is appended.
pub const DEFAULT_SEARCH_URL: &str = "https://www.ratemyprofessors.com/search.jsp?queryoption=HEADER&queryBy=teacherName&schoolName=The+University+of+Texas+at+Dallas&schoolID=1273&query=";

/// Listings must mention this city to count as the target institution.
pub const DEFAULT_SCHOOL_CITY: &str = "Dallas";

pub const DEFAULT_MAX_VISITS: usize = 8;

/// Primary search settings.
#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    pub search_url: String,
    pub school_city: String,
    /// Upper bound on page fetches in one lookup, fallback included.
    pub max_visits: usize,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_owned(),
            school_city: DEFAULT_SCHOOL_CITY.to_owned(),
            max_visits: DEFAULT_MAX_VISITS,
        }
    }
}

/// Which path produced a lookup's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingSource {
    Primary,
    Fallback,
}

/// How a lookup ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStatus {
    Found(RatingSource),
    NotFound,
    /// Nothing found and every fetch attempted failed.
    Unreachable,
}

#[derive(Debug, Clone)]
pub struct LookupOutcome {
    pub record: RatingRecord,
    pub status: LookupStatus,
}

impl LookupOutcome {
    /// Only primary-path results are worth remembering.
    pub fn is_cacheable(&self) -> bool {
        self.status == LookupStatus::Found(RatingSource::Primary)
    }

    fn unreachable() -> Self {
        Self {
            record: RatingRecord::default(),
            status: LookupStatus::Unreachable,
        }
    }
}

/// Scrapes professor ratings through a [`PageFetcher`].
pub struct RmpScraper {
    fetcher: Arc<dyn PageFetcher>,
    settings: ScrapeSettings,
    fallback: FallbackSearch,
}

impl RmpScraper {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        settings: ScrapeSettings,
        fallback: FallbackSearch,
    ) -> Self {
        Self {
            fetcher,
            settings,
            fallback,
        }
    }

    pub fn search_url(&self, key: &NameKey) -> Result<Url, ScrapeError> {
        let raw = format!("{}{}", self.settings.search_url, key.query_fragment());
        Url::parse(&raw).map_err(|source| ScrapeError::InvalidUrl { url: raw, source })
    }

    /// Look up ratings for `key`, falling back to a web search when the
    /// review site's own search yields nothing.
    pub async fn lookup(&self, key: &NameKey) -> LookupOutcome {
        let start = Instant::now();
        let mut visits = VisitQueue::new(
            self.fetcher.as_ref(),
            key.normalized(),
            &self.settings.school_city,
            self.settings.max_visits,
        );

        match self.search_url(key) {
            Ok(url) => visits.enqueue(url),
            Err(e) => warn!(name = %key, error = %e, "Could not build search URL"),
        }
        visits.drain().await;

        let source = if visits.values.is_empty() {
            self.run_fallback(key, &mut visits).await;
            RatingSource::Fallback
        } else {
            RatingSource::Primary
        };

        let status = if !visits.values.is_empty() {
            LookupStatus::Found(source)
        } else if visits.succeeded == 0 && visits.failed > 0 {
            LookupStatus::Unreachable
        } else {
            LookupStatus::NotFound
        };

        info!(
            name = %key,
            status = ?status,
            values = visits.values.len(),
            fetched = visits.succeeded,
            failed = visits.failed,
            duration = fmt_duration(start.elapsed()),
            "rating lookup finished"
        );

        LookupOutcome {
            record: RatingRecord::new(visits.values),
            status,
        }
    }

    /// [`lookup`](Self::lookup) bounded by `limit`; running out of time counts
    /// as unreachable.
    pub async fn lookup_within(&self, key: &NameKey, limit: Duration) -> LookupOutcome {
        match tokio::time::timeout(limit, self.lookup(key)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(name = %key, limit = fmt_duration(limit), "rating lookup timed out");
                LookupOutcome::unreachable()
            }
        }
    }

    async fn run_fallback(&self, key: &NameKey, visits: &mut VisitQueue<'_>) {
        if !visits.has_budget() {
            warn!(name = %key, "Visit budget exhausted before fallback search");
            return;
        }
        visits.spent += 1;

        match self
            .fallback
            .find_profile_link(self.fetcher.as_ref(), key)
            .await
        {
            Ok(link) => {
                visits.succeeded += 1;
                debug!(name = %key, link = %link, "Fallback search found a profile link");
                visits.enqueue(link);
                visits.drain().await;
            }
            Err(ScrapeError::ProfessorNotFound) => {
                visits.succeeded += 1;
                debug!(name = %key, "Fallback search found no profile link");
            }
            Err(e) => {
                if e.is_fetch_failure() {
                    visits.failed += 1;
                }
                warn!(name = %key, error = %e, "Fallback search failed");
            }
        }
    }
}

/// Pending page visits for one lookup plus everything they produced so far.
struct VisitQueue<'a> {
    fetcher: &'a dyn PageFetcher,
    target: NameKey,
    city: &'a str,
    max_visits: usize,
    pending: VecDeque<Url>,
    visited: HashSet<Url>,
    values: Vec<RatingValue>,
    spent: usize,
    succeeded: usize,
    failed: usize,
}

impl<'a> VisitQueue<'a> {
    fn new(fetcher: &'a dyn PageFetcher, target: NameKey, city: &'a str, max_visits: usize) -> Self {
        Self {
            fetcher,
            target,
            city,
            max_visits,
            pending: VecDeque::new(),
            visited: HashSet::new(),
            values: Vec::new(),
            spent: 0,
            succeeded: 0,
            failed: 0,
        }
    }

    fn has_budget(&self) -> bool {
        self.spent < self.max_visits
    }

    /// Queue a page unless it was already visited in this lookup.
    fn enqueue(&mut self, url: Url) {
        if self.visited.insert(url.clone()) {
            self.pending.push_back(url);
        } else {
            debug!(url = %url, "Already visited, skipping");
        }
    }

    /// Visit pages until the queue is empty, queueing links discovered on the way.
    async fn drain(&mut self) {
        while let Some(url) = self.pending.pop_front() {
            if !self.has_budget() {
                warn!(
                    url = %url,
                    max_visits = self.max_visits,
                    "Visit budget exhausted, dropping queued pages"
                );
                self.pending.clear();
                break;
            }
            self.spent += 1;

            let body = match self.fetcher.fetch(&url).await {
                Ok(body) => body,
                Err(e) => {
                    self.failed += 1;
                    warn!(url = %url, error = %e, "Page fetch failed");
                    continue;
                }
            };
            self.succeeded += 1;

            let scan = profile::scan_page(&body, &url, &self.target, self.city);
            self.values.extend(scan.values);
            for link in scan.profile_links {
                debug!(from = %url, link = %link, "Following matching listing");
                self.enqueue(link);
            }
        }
    }
}
