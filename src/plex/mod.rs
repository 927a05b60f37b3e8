//! Media server boundary.
//!
//! [`RefreshClient`] is the only thing the scheduler needs; [`PlexClient`]
//! implements it over HTTP and also lists library sections at startup.

mod client;
mod error;
mod sections;

pub use client::{PlexClient, RefreshClient};
pub use error::RefreshError;
pub use sections::parse_sections;
