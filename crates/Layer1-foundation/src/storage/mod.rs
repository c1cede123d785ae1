//! Storage module for b10-cfgmgr
//!
//! - `json`: JSON - 범용 파일 저장/로드 (원자적 저장)
//! - `config_data`: 설정 트리 DB (`b10-config.db`)

mod config_data;
mod json;

// JSON Storage (범용)
pub use json::JsonStore;

// 설정 트리 DB
pub use config_data::{ConfigManagerData, CONFIG_VERSION, DB_FILENAME, VERSION_KEY};
