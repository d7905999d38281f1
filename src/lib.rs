//! Decor Checklist Backend
//!
//! Layered architecture:
//! - domain: Checklist entities and provenance rules
//! - repository: Transactional storage of checklist rows
//! - gateway: Design source, item catalog and session interfaces
//! - service: The checklist engine
//! - commands: Caller-facing handlers

use std::sync::Arc;

pub mod config;
pub mod domain;
pub mod repository;
pub mod gateway;
pub mod service;
pub mod commands;

use config::AppConfig;
use gateway::{DesignSource, ItemCatalog, SessionResolver};
use repository::{init_db, ChecklistRepository, DbState};
use service::ChecklistEngine;

/// Application state shared across commands
pub struct AppState {
    pub db_state: DbState,
    pub engine: Arc<ChecklistEngine>,
    pub sessions: Arc<dyn SessionResolver>,
    pub config: AppConfig,
}

impl AppState {
    /// Start logging, open the database and wire the engine
    pub async fn init(
        config: AppConfig,
        designs: Arc<dyn DesignSource>,
        catalog: Arc<dyn ItemCatalog>,
        sessions: Arc<dyn SessionResolver>,
    ) -> Result<Self, String> {
        if let Some(logger) = config.logger_config() {
            // A host that installed its own subscriber keeps it
            if let Err(e) = rolling_logger::init_logger_with(logger) {
                eprintln!("[{}] Logger not installed: {}", chrono::Local::now().format("%H:%M:%S%.3f"), e);
            }
        }

        let db_state = match init_db(&config.db_path).await {
            Ok(state) => state,
            Err(e) => {
                let _ = rolling_logger::error(&format!("DB init failed: {}", e));
                return Err(e);
            }
        };

        let store = Arc::new(ChecklistRepository::new(db_state.connection()));
        let engine = Arc::new(ChecklistEngine::new(store, designs, catalog));
        let _ = rolling_logger::info("Checklist engine ready");

        Ok(Self {
            db_state,
            engine,
            sessions,
            config,
        })
    }

    /// Release the database connection
    pub async fn shutdown(&self) {
        self.db_state.close().await;
        log::info!("Database closed");
    }
}
