//! Lookup keys, scraped rating records, and their in-memory cache.

pub mod cache;
pub mod json;
pub mod names;
pub mod rating;

pub use cache::RatingCache;
pub use names::{NameKey, NameKeyError};
pub use rating::{RatingRecord, RatingValue};
