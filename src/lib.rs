//! Wardbook: hospital-records administration core.
//!
//! Two stateless workflow components over a shared relational store:
//! the Allotment Manager (`allotment`) admits and discharges patients
//! against the ward/room/bed hierarchy, and the Clinical Episode
//! Composer (`episode`) creates a diagnosis together with its optional
//! prescription, line items and ordered tests as one atomic unit.
//! Plain per-entity CRUD lives in `db::repository`; the HTTP layer and
//! token issuance are external callers.

pub mod allotment;
pub mod authorization;
pub mod config;
pub mod db;
pub mod episode;
pub mod models;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for binaries embedding the crate. Tests and
/// library consumers that install their own subscriber skip this.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}
