//! cfgmgr-core: Core Runtime for b10-cfgmgr
//!
//! Layer2 - 설정 매니저 구현 레이어
//!
//! # 주요 모듈
//!
//! - `manager`: 명령 디스패처, 이벤트 루프
//!
//! # 사용 예시
//!
//! ```ignore
//! use cfgmgr_core::ConfigManager;
//! use cfgmgr_foundation::{ManagerSettings, MemorySession};
//!
//! let session = Arc::new(MemorySession::new());
//! let mut cm = ConfigManager::new(ManagerSettings::new(), session).await?;
//!
//! let answer = cm.handle_msg(json!({"command": ["get_config"]})).await?;
//! assert_eq!(answer, json!({"result": [0, {"version": 1}]}));
//!
//! // 설정 읽기 → Boss 알림 → 루프
//! cm.start().await?;
//! ```

pub mod manager;

// Re-exports: Manager
pub use manager::{Command, CommandError, ConfigManager, ShutdownHandle, CONFIG_UPDATE_KEY};
