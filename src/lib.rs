//! comandero — headless core for the Restaurante admin console.
//!
//! Implements the state and consistency logic behind the console's screens:
//! an explicit session store, one thin authenticated client per backend
//! resource, and per-screen view-state reconcilers that fetch full lists,
//! derive filtered/aggregated views, and sequence multi-step workflows
//! (create order → add line items → finalize/pay → free table) with
//! partial-failure handling. The presentation layer (routing, templates,
//! widget mechanics) lives elsewhere and renders the view state these
//! reconcilers own.
//!
//! Data flow: a reconciler requests data through one or more resource
//! clients → each client issues an authenticated HTTP call → the response is
//! merged into local view state (guarded against stale reloads) → derived
//! views recompute → the shell re-renders.

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod api;
pub mod catalogo;
pub mod clients;
pub mod cocina;
pub mod mesas;
pub mod models;
pub mod nueva_comanda;
pub mod panel;
pub mod reload;
pub mod session;
pub mod ui;
pub mod usuarios;

pub use api::{ApiClient, ApiError};
pub use session::{SesionUsuario, SessionStore};

/// Initialize structured logging (console + rolling file), to be called once
/// by the embedding shell.
pub fn init_tracing(log_dir: &std::path::Path) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,comandero=debug"));

    std::fs::create_dir_all(log_dir).ok();

    // Rolling file appender: daily log files in the logs directory
    let file_appender = tracing_appender::rolling::daily(log_dir, "comandero");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    let console_layer = fmt::layer().with_target(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    // Keep the guard alive for the lifetime of the process — dropping it
    // flushes and stops the file writer.
    std::mem::forget(guard);

    info!("comandero v{} logging initialized", env!("CARGO_PKG_VERSION"));
}
