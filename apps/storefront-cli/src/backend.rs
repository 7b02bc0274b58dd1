//! # Backend File
//!
//! Keeps the record service's tables in `backend.json` under the data
//! directory, so online-mode commands in separate runs see each other's
//! writes.
//!
//! ```text
//! open()  ── backend.json ──► MemorySnapshot ──► MemoryRecordService
//! save()  ◄─ backend.json ◄── MemorySnapshot ◄── export()
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use storefront_sync::service::MemorySnapshot;
use storefront_sync::{MemoryRecordService, RecordService};

use crate::error::CliResult;

pub const BACKEND_FILE: &str = "backend.json";

pub struct Backend {
    path: PathBuf,
    service: Arc<MemoryRecordService>,
}

impl Backend {
    /// Loads the tables from `dir`, or starts an empty storefront schema.
    pub async fn open(dir: &Path) -> CliResult<Self> {
        let path = dir.join(BACKEND_FILE);

        let service = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                let snapshot: MemorySnapshot = serde_json::from_str(&contents)?;
                debug!(path = %path.display(), tables = snapshot.tables.len(), "Backend loaded");
                MemoryRecordService::import(snapshot)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No backend file, starting empty");
                MemoryRecordService::storefront()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Backend {
            path,
            service: Arc::new(service),
        })
    }

    pub fn service(&self) -> Arc<dyn RecordService> {
        Arc::clone(&self.service) as Arc<dyn RecordService>
    }

    /// Writes the tables back.
    pub async fn save(&self) -> CliResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let encoded = serde_json::to_string_pretty(&self.service.export())?;
        let temp = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp, encoded).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        debug!(path = %self.path.display(), "Backend saved");
        Ok(())
    }
}
