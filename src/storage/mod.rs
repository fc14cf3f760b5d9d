use async_trait::async_trait;

use crate::app_settings::AppSettings;

mod file_storage;

pub use file_storage::FileStorage;

pub type AppStorage = FileStorage;

#[async_trait]
pub trait Storage {
    async fn load_settings(&self) -> anyhow::Result<Option<AppSettings>>;
}

pub fn get_storage() -> AppStorage {
    use directories_next::ProjectDirs;
    use std::path::PathBuf;

    let base = if let Some(proj_dirs) = ProjectDirs::from("dev", "mcp-agents", "mcp-agent") {
        proj_dirs.config_dir().to_path_buf()
        // Lin: ~/.config/mcp-agent
        // Mac: ~/Library/Application Support/dev.mcp-agents.mcp-agent
    } else {
        PathBuf::from(".")
    };
    AppStorage::new(base)
}
