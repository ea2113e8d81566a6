//! Professor rating lookup service: scrapes RateMyProfessors (with a web-search
//! fallback) and memoizes results per name for the life of the process.

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod logging;
pub mod scrape;
pub mod state;
pub mod utils;
pub mod web;
