//! Shared application state for the Axum server.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use studyview_core::{Result, StudyviewError};

/// A dashboard data source registered through `register_dashboard_app`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardRegistration {
    pub id: Uuid,
    pub storage_url: String,
    pub artifact_path: String,
    pub registered_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AppState {
    base_dir: Arc<PathBuf>,
    registration: Arc<RwLock<Option<DashboardRegistration>>>,
}

impl AppState {
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            base_dir: Arc::new(base_dir),
            registration: Arc::new(RwLock::new(None)),
        }
    }

    /// Directory studies are currently read from: the registered storage if
    /// any, otherwise the configured base directory.
    pub fn storage_dir(&self) -> PathBuf {
        match self.registration() {
            Some(reg) => PathBuf::from(reg.storage_url),
            None => self.base_dir.as_ref().clone(),
        }
    }

    pub fn registration(&self) -> Option<DashboardRegistration> {
        self.registration
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Validate and install a new data source, replacing any previous one.
    pub fn register(&self, storage_url: &str, artifact_path: &str) -> Result<DashboardRegistration> {
        let storage_url = storage_url.trim();
        if storage_url.is_empty() {
            return Err(StudyviewError::Registration(
                "storage_url must not be empty".to_string(),
            ));
        }
        if !Path::new(storage_url).is_dir() {
            return Err(StudyviewError::Registration(format!(
                "storage '{}' is not a directory",
                storage_url
            )));
        }
        let artifact_path = artifact_path.trim();
        if !artifact_path.is_empty() {
            std::fs::create_dir_all(artifact_path)?;
        }

        let reg = DashboardRegistration {
            id: Uuid::new_v4(),
            storage_url: storage_url.to_string(),
            artifact_path: artifact_path.to_string(),
            registered_at: Utc::now(),
        };
        *self
            .registration
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(reg.clone());

        info!(
            id = %reg.id,
            storage = %reg.storage_url,
            artifacts = %reg.artifact_path,
            "Dashboard app registered"
        );
        Ok(reg)
    }
}

/// Configuration for the web server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub base_dir: PathBuf,
    pub host: String,
    pub port: u16,
    /// Artifact directory registered at startup, if given.
    pub artifact_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("studies"),
            host: "127.0.0.1".to_string(),
            port: 8080,
            artifact_dir: None,
        }
    }
}
