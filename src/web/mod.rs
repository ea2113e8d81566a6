//! HTTP surface: greeting, rating lookup and status.

pub mod error;
pub mod middleware;
pub mod rate;
pub mod routes;
pub mod status;

pub use routes::*;
