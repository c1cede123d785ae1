//! # cfgmgr-foundation
//!
//! Foundation layer for b10-cfgmgr:
//! - Storage: JsonStore (원자적 저장), ConfigManagerData (설정 트리 DB)
//! - Registry: 모듈 스펙 레지스트리
//! - Protocol: 응답 봉투 (`{"result": [...]}`)
//! - Session: 메시지 채널 경계 (Memory, Stdio)
//! - Config: ManagerSettings
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Session (pub/sub)                                       │
//! │     │ recv                                   ▲ reply     │
//! │     ▼                                        │           │
//! │  ConfigManager (cfgmgr-core) ───── Answer ───┘           │
//! │     │                    │                               │
//! │     ▼                    ▼                               │
//! │  SpecRegistry      ConfigManagerData ──► JsonStore       │
//! │  (메모리 전용)      (설정 트리)           (b10-config.db)  │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod session;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{DataReadError, Error, Result};

// ============================================================================
// Config (실행 설정)
// ============================================================================
pub use config::{ManagerSettings, BOSS_CHANNEL, MANAGER_CHANNEL, SETTINGS_FILE};

// ============================================================================
// Storage (저장소)
// ============================================================================
pub use storage::{ConfigManagerData, JsonStore, CONFIG_VERSION, DB_FILENAME, VERSION_KEY};

// ============================================================================
// Registry (모듈 스펙)
// ============================================================================
pub use registry::{ModuleSpec, SpecRegistry, MODULE_SPEC_KEY};

// ============================================================================
// Protocol (응답 봉투)
// ============================================================================
pub use protocol::{render, Answer, RCODE_ERROR, RCODE_OK, RESULT_KEY};

// ============================================================================
// Session (메시지 채널)
// ============================================================================
pub use session::{Envelope, MemorySession, Session, StdioSession, WireFrame};
