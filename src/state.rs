//! Application state shared across request handlers.

use crate::data::RatingCache;
use crate::scrape::RmpScraper;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub scraper: Arc<RmpScraper>,
    pub rating_cache: RatingCache,
    /// Upper bound on one rating lookup, fallback included.
    pub lookup_timeout: Duration,
}

impl AppState {
    pub fn new(scraper: RmpScraper, lookup_timeout: Duration) -> Self {
        Self {
            scraper: Arc::new(scraper),
            rating_cache: RatingCache::new(),
            lookup_timeout,
        }
    }
}
