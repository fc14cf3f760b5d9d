pub mod app_settings;
pub mod config;
pub mod dispatch;
pub mod llm;
pub mod logging;
pub mod mcp;
pub mod registry;
pub mod repl;
pub mod storage;
pub mod tools;
pub mod toolset;
pub mod utils;
