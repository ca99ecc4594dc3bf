//! HTTP Handlers and Routes
//!
//! Built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # Endpoints
//!
//! ## Page
//! - `GET /` - Research page
//! - `POST /research` - Submit a topic (form field `topic`) and render the results
//! - `GET /download` - The notes written by the last run, as `text/markdown`
//!
//! ## JSON API (`/api`)
//! - `POST /api/research` - Run the pipeline for `{"topic": "..."}`
//! - `GET /api/pipeline` - Configured agents and tasks
//! - `GET /api/status` - Runner state
//! - `GET /api/health` - Health check
//! - `GET /api/openapi.json` - OpenAPI document
//!
//! There is no authentication. The server is meant to run on localhost.

/// Request and response handlers for all endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;
