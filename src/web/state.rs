use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tracing::info;

use crate::{config::ServerConfig, web::uploads::ensure_directory};

#[derive(Clone)]
pub struct AppState {
    config: Arc<ServerConfig>,
    numbering: Arc<Mutex<()>>,
}

impl AppState {
    /// Prepares the upload directory and wraps the shared settings.
    pub async fn new(config: ServerConfig) -> Result<Self> {
        ensure_directory(&config.upload_dir)
            .await
            .with_context(|| {
                format!(
                    "failed to prepare upload directory {}",
                    config.upload_dir.display()
                )
            })?;
        info!(dir = %config.upload_dir.display(), "upload directory ready");

        Ok(Self {
            config: Arc::new(config),
            numbering: Arc::new(Mutex::new(())),
        })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.config.upload_dir
    }

    /// Held while a new upload picks its sequence number.
    pub fn numbering(&self) -> &Mutex<()> {
        &self.numbering
    }
}
