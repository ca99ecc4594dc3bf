//! Presentation layer
//!
//! The research page is rendered on the server as plain HTML. There is no
//! client framework; a few lines of inline script show the busy indicator
//! while the form submission is pending.

pub mod markdown;
pub mod page;

pub use markdown::{escape_html, markdown_to_html};
pub use page::{Notice, ResearchPage};
