//! Manager - 설정 매니저 상태 머신
//!
//! - `command.rs` - 명령 디코딩/검증 (`Command`, `CommandError`)
//! - `config_manager.rs` - 디스패처 (`ConfigManager::handle_msg`)
//! - `runner.rs` - 이벤트 루프와 종료 핸들
//!
//! ## 메시지 흐름
//!
//! ```text
//! Session ──recv──► handle_msg ──► Command::decode ──► 트리/스펙 변경
//!                                                        │
//!                          ConfigManagerData::write ◄────┘
//!                                    │
//!                  config_update ──► 모듈 채널 ──► 모듈 응답 대기
//!                                    │
//! Session ◄──reply── {"result": [...]} ◄─┘
//! ```

mod command;
mod config_manager;
mod runner;

pub use command::{
    Command, CommandError, COMMAND_KEY, GET_COMMANDS_SPEC, GET_CONFIG, GET_MODULE_SPEC,
    SET_CONFIG,
};
pub use config_manager::{ConfigManager, CONFIG_UPDATE_KEY};
pub use runner::ShutdownHandle;
