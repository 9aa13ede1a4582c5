//! Stockflow API Library
//!
//! Inventory and financial consistency core for a distribution backend:
//! stock ledger, batch-tracked receiving, reserved fulfillment, balanced
//! billing and payment allocation.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod audit;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod migrator;
pub mod services;
pub mod state_machine;

use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Everything a caller embedding the crate needs to operate it.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: services::AppServices,
}

impl AppState {
    /// Wires the services against an established pool and spawns the event
    /// consumer loop.
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.event_buffer_size);
        tokio::spawn(events::process_events(rx));

        let event_sender = events::EventSender::new(tx);
        let services = services::AppServices::new(db.clone(), event_sender.clone());
        Self {
            db,
            config,
            event_sender,
            services,
        }
    }
}

/// Installs the global tracing subscriber.
///
/// The filter honours `RUST_LOG` when set and falls back to the configured
/// log level. JSON output is for aggregated environments; plain output for
/// local work.
pub fn init_tracing(config: &config::AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    if config.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}
