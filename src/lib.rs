//! broadsheet: a terminal reader for a sectioned news site.
//!
//! The interactive UI lives in [`ui`] and is driven by the state in [`app`].
//! Article bodies come through [`fetch::FetchOrchestrator`], which prefers the
//! on-disk [`cache`], then a warm background [`daemon`], then the [`source`]
//! directly.

pub mod app;
pub mod article;
pub mod cache;
pub mod config;
pub mod daemon;
pub mod error;
pub mod fetch;
pub mod headlines;
pub mod layout;
pub mod search;
pub mod source;
pub mod theme;
pub mod ui;
pub mod util;
