//! Error types for b10-cfgmgr
//!
//! 모든 에러를 중앙에서 관리

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// 설정 DB 파일 읽기 실패 원인
///
/// 파일이 아예 없는 경우는 에러가 아니다 (`read_from_file`이 `None` 반환).
#[derive(Error, Debug)]
pub enum DataReadError {
    /// JSON 파싱 실패
    #[error("Config file unreadable: {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// 최상위가 mapping이 아님
    #[error("Config file is not a mapping: {path}")]
    Shape { path: PathBuf },

    /// version 누락 또는 지원하지 않는 버전
    #[error("Config file version is not up to date: {path} (found {found:?}, expected {expected})")]
    Version {
        path: PathBuf,
        found: Option<i64>,
        expected: i64,
    },
}

/// b10-cfgmgr 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 저장소 관련
    // ========================================================================
    #[error("Storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    DataRead(#[from] DataReadError),

    // ========================================================================
    // 모듈 스펙 관련
    // ========================================================================
    #[error("{0}")]
    ModuleSpec(String),

    // ========================================================================
    // 메시지 세션 관련
    // ========================================================================
    #[error("Session error: {0}")]
    Session(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// 시작 시점에 만나면 매니저를 띄우면 안 되는 에러인지 확인
    ///
    /// 읽을 수 없는 설정 DB 위에서 계속 진행하면 다음 저장 때 덮어쓰게 된다.
    pub fn is_fatal_at_startup(&self) -> bool {
        matches!(self, Error::DataRead(_) | Error::Config(_) | Error::Toml(_))
    }

    /// 수리 도구로 복구를 시도해볼 만한 에러인지 확인
    pub fn is_repairable(&self) -> bool {
        matches!(self, Error::DataRead(DataReadError::Parse { .. }))
    }

    /// 모듈 스펙 에러 생성 헬퍼
    pub fn module_spec(message: impl Into<String>) -> Self {
        Error::ModuleSpec(message.into())
    }
}
