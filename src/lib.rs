//! symcalc — symbolic calculation web API with persistent history.
//!
//! The crate is organised leaf-first:
//! - [`engine`] — self-contained symbolic kernel (parse, simplify,
//!   differentiate, integrate).
//! - [`store`] — SQLite-backed calculation history.
//! - [`service`] — the expression service: validation, deadline-bounded
//!   computation, error translation, optional persistence.
//! - [`api`] — axum router mapping HTTP requests onto the service and store.
//! - [`config`], [`logger`], [`error`] — runtime settings, tracing setup,
//!   and process-level errors.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod logger;
pub mod service;
pub mod store;
