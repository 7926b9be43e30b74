//! Where section listings and article bodies come from.
//!
//! The rest of the crate depends only on the [`ArticleSource`] contract:
//!
//! - [`HttpSource`] - live RSS listings plus a markdown reader proxy for bodies
//! - [`FixtureSource`] - built-in demo content, no network
//!
//! The fetch daemon and the orchestrator both hold a source as
//! `Arc<dyn ArticleSource>`, so tests can wire in counting or scripted fakes.

mod fixtures;
mod http;
mod reader_proxy;
pub mod sections;

use crate::article::{Article, Section};
use crate::error::FetchError;

pub use fixtures::FixtureSource;
pub use http::{HttpSource, HttpSourceOptions, DEFAULT_FEED_BASE};
pub use reader_proxy::{ContentError, DEFAULT_READER_BASE};

/// Maximum items kept from one section listing.
pub const MAX_SECTION_ITEMS: usize = 50;

#[async_trait::async_trait]
pub trait ArticleSource: Send + Sync {
    /// Title and ordered items for a section name or alias.
    async fn section(&self, name: &str) -> Result<Section, FetchError>;

    /// Full content for an item's permanent link.
    async fn article(&self, url: &str) -> Result<Article, FetchError>;
}
