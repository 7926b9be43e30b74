//! Utility functions shared by layout, rendering and fetching.
//!
//! - **Text**: Unicode-aware width, truncation, wrapping and sanitising
//! - **URL validation**: refuses article links that point at local or private hosts
//!
//! ```
//! use broadsheet::util::{display_width, truncate_to_width, wrap_lines};
//!
//! assert_eq!(display_width("Hello"), 5);
//! assert_eq!(truncate_to_width("Long article title", 10), "Long ar...");
//! assert_eq!(wrap_lines("one two three", 7), vec!["one two", "three"]);
//! ```

mod text;
mod url_validator;

pub use text::{
    clean_inline, display_width, ellipsize, is_blank, limit_lines, pad_right,
    strip_control_chars, truncate_to_width, wrap_lines,
};
pub use url_validator::{validate_article_url, UrlValidationError};
