//! Manager Settings - 설정 매니저 자체의 실행 설정
//!
//! 관리 대상 설정 트리(`b10-config.db`)와는 별개다. 선택적인 TOML 파일에서
//! 읽고, CLI 플래그가 그 위를 덮어쓴다.
//!
//! ```toml
//! data_path = "/var/lib/bind10"
//! db_filename = "b10-config.db"
//! manager_channel = "ConfigManager"
//! boss_channel = "Boss"
//! ack_timeout_secs = 30
//! ```

use crate::storage::{JsonStore, DB_FILENAME};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 기본 설정 파일명
pub const SETTINGS_FILE: &str = "b10-cfgmgr.toml";

/// 매니저가 구독하는 기본 채널
pub const MANAGER_CHANNEL: &str = "ConfigManager";

/// 감독 프로세스 채널
pub const BOSS_CHANNEL: &str = "Boss";

/// 설정 매니저 실행 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerSettings {
    /// 설정 DB 디렉토리
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// 설정 DB 파일명
    #[serde(default = "default_db_filename")]
    pub db_filename: String,

    /// 매니저 채널 이름
    #[serde(default = "default_manager_channel")]
    pub manager_channel: String,

    /// 감독 프로세스 채널 이름
    #[serde(default = "default_boss_channel")]
    pub boss_channel: String,

    /// set_config 응답 대기 시간 (초, 없으면 무제한)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack_timeout_secs: Option<u64>,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            db_filename: default_db_filename(),
            manager_channel: default_manager_channel(),
            boss_channel: default_boss_channel(),
            ack_timeout_secs: None,
        }
    }
}

impl ManagerSettings {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load
    // ========================================================================

    /// TOML 파일에서 로드
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let settings: Self = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// 파일이 있으면 로드, 없으면 기본값
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// 유효성 검증
    pub fn validate(&self) -> Result<()> {
        if self.db_filename.is_empty() {
            return Err(Error::Config("db_filename must not be empty".to_string()));
        }
        if self.manager_channel.is_empty() || self.boss_channel.is_empty() {
            return Err(Error::Config("channel names must not be empty".to_string()));
        }
        if self.ack_timeout_secs == Some(0) {
            return Err(Error::Config(
                "ack_timeout_secs must be positive (omit it to wait forever)".to_string(),
            ));
        }
        Ok(())
    }

    /// 응답 대기 시간
    pub fn ack_timeout(&self) -> Option<Duration> {
        self.ack_timeout_secs.map(Duration::from_secs)
    }

    /// 설정 DB 전체 경로
    pub fn db_path(&self) -> PathBuf {
        self.data_path.join(&self.db_filename)
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    pub fn db_filename(mut self, filename: impl Into<String>) -> Self {
        self.db_filename = filename.into();
        self
    }

    pub fn manager_channel(mut self, channel: impl Into<String>) -> Self {
        self.manager_channel = channel.into();
        self
    }

    pub fn boss_channel(mut self, channel: impl Into<String>) -> Self {
        self.boss_channel = channel.into();
        self
    }

    pub fn ack_timeout_secs(mut self, secs: u64) -> Self {
        self.ack_timeout_secs = Some(secs);
        self
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn default_data_path() -> PathBuf {
    JsonStore::data_dir()
        .map(|store| store.base_dir().to_path_buf())
        .unwrap_or_else(|_| PathBuf::from("."))
}

fn default_db_filename() -> String {
    DB_FILENAME.to_string()
}

fn default_manager_channel() -> String {
    MANAGER_CHANNEL.to_string()
}

fn default_boss_channel() -> String {
    BOSS_CHANNEL.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_settings_default() {
        let settings = ManagerSettings::new();
        assert_eq!(settings.db_filename, "b10-config.db");
        assert_eq!(settings.manager_channel, "ConfigManager");
        assert_eq!(settings.boss_channel, "Boss");
        assert!(settings.ack_timeout().is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_builder() {
        let settings = ManagerSettings::new()
            .data_path("/var/lib/bind10")
            .db_filename("test.db")
            .ack_timeout_secs(5);

        assert_eq!(settings.db_path(), PathBuf::from("/var/lib/bind10/test.db"));
        assert_eq!(settings.ack_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_load_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(
            &path,
            r#"
            data_path = "/tmp/cfgmgr"
            ack_timeout_secs = 10
            "#,
        )
        .unwrap();

        let settings = ManagerSettings::load(&path).unwrap();
        assert_eq!(settings.data_path, PathBuf::from("/tmp/cfgmgr"));
        assert_eq!(settings.db_filename, "b10-config.db");
        assert_eq!(settings.ack_timeout_secs, Some(10));
    }

    #[test]
    fn test_load_rejects_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);

        std::fs::write(&path, "ack_timeout_secs = 0\n").unwrap();
        assert!(matches!(ManagerSettings::load(&path), Err(Error::Config(_))));

        std::fs::write(&path, "data_path = [1, 2\n").unwrap();
        assert!(matches!(ManagerSettings::load(&path), Err(Error::Toml(_))));
    }

    #[test]
    fn test_load_or_default_missing() {
        let dir = tempdir().unwrap();
        let settings = ManagerSettings::load_or_default(dir.path().join("missing.toml")).unwrap();
        assert_eq!(settings, ManagerSettings::default());
    }
}
