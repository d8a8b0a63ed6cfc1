//! Upload CSV/Excel files, compute summary statistics and clean tabular
//! data behind a small HTTP API.
//!
//! - [`domain`]: table model, statistics/cleaning result types, errors
//! - [`application`]: statistics engine, data cleaner, request use cases
//! - [`infrastructure`]: configuration, upload storage, file formats, SQLite
//! - [`interfaces`]: actix-web routes

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;

mod app;

pub use app::run;
