//! API request handlers.

/// Research page, form submission and notes download.
pub mod pages;
/// Pipeline description, runner status and health.
pub mod pipeline;
/// JSON research endpoint.
pub mod research;
