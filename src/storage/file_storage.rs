use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::fs;

use crate::app_settings::AppSettings;

pub struct FileStorage {
    base: PathBuf,
}

impl FileStorage {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn settings_path(&self) -> PathBuf {
        self.base.join("settings.json")
    }
}

#[async_trait::async_trait]
impl super::Storage for FileStorage {
    /// `None` when the file does not exist; a file that exists but does not
    /// parse is an error.
    async fn load_settings(&self) -> Result<Option<AppSettings>> {
        let path = self.settings_path();
        match fs::read_to_string(&path).await {
            Ok(data) => {
                let settings = serde_json::from_str(&data)
                    .with_context(|| format!("invalid settings file {}", path.display()))?;
                Ok(Some(settings))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }
}
