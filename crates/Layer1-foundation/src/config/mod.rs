//! Config - 매니저 실행 설정
//!
//! - `settings.rs` - ManagerSettings (데이터 경로, 채널 이름, 응답 대기 시간)

mod settings;

pub use settings::{ManagerSettings, BOSS_CHANNEL, MANAGER_CHANNEL, SETTINGS_FILE};
