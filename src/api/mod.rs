//! API Module
//!
//! HTTP handlers and routing for the local cache API used by the browser UI.
//!
//! # Endpoints
//! - `GET/PUT /chapters/:key` - Read or store a chapter
//! - `POST /chapters/:key/touch` - Mark a chapter as used
//! - `POST /chapters/prune` - Evict the least recently used chapters
//! - `GET/PUT /translations/:key` - Read or store a model response
//! - `POST /translations/:key/touch` - Mark a model response as used
//! - `POST /translations/prune` - Evict the least recently used responses
//! - `GET /quota` - Storage usage snapshot
//! - `GET/POST/DELETE /history` - AI history
//! - `GET /state`, `PUT /state/verse`, `PUT /settings` - Reader state
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
