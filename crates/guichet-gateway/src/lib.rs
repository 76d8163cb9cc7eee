//! # Guichet Gateway
//!
//! Thin HTTP surface over one bound answering strategy and the FAQ index.
//!
//! ## Design
//! - **Configuration-time binding** — the serving strategy is chosen at
//!   startup; the API never switches strategies per request.
//! - **Stateless handlers** — all state is the immutable index plus the
//!   strategy behind an `Arc`, so the router clones freely.
//! - **Degraded, not broken** — backend failures arrive here as answer
//!   payloads with a zero confidence, and are served with status 200.

pub mod routes;
pub mod server;

pub use server::{AppState, build_router, start};
