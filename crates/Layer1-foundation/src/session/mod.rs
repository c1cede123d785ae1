//! Session - 메시지 채널(pub/sub) 경계
//!
//! 설정 매니저는 메시지 버스 자체를 구현하지 않는다. 버스가 제공해야 하는
//! 최소 기능(구독, 발행, 수신, 응답)을 `Session` trait으로 정의하고,
//! 두 가지 구현을 제공한다.
//!
//! - `MemorySession` - 프로세스 내부 큐 (테스트, 임베딩용)
//! - `StdioSession` - stdin/stdout JSON 라인 (바이너리용)
//!
//! ## 사용법
//!
//! ```ignore
//! use cfgmgr_foundation::session::{MemorySession, Session};
//!
//! let session = Arc::new(MemorySession::new());
//! session.group_subscribe("ConfigManager", None).await?;
//! session.group_sendmsg(json!({"command": ["get_config"]}), "ConfigManager", None).await?;
//!
//! if let Some((msg, env)) = session.group_recvmsg(false).await? {
//!     session.group_reply(&env, json!({"result": [0]})).await?;
//! }
//! ```

mod memory;
mod stdio;

pub use memory::MemorySession;
pub use stdio::{StdioSession, WireFrame};

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Envelope
// ============================================================================

/// 수신 메시지의 라우팅 정보
///
/// 응답을 원래 보낸 쪽으로 돌려보낼 때 사용한다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// 메시지가 도착한 그룹 (채널)
    pub group: String,

    /// 대상 인스턴스
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    /// 보낸 쪽 식별자
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// 보낸 쪽 시퀀스 번호
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

impl Envelope {
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            ..Default::default()
        }
    }
}

// ============================================================================
// Session Trait
// ============================================================================

/// 메시지 버스 세션
///
/// 모든 메서드는 `&self`를 받으므로 `Arc<dyn Session>`으로 공유할 수 있다.
#[async_trait]
pub trait Session: Send + Sync {
    /// 그룹 구독 (instance를 주면 그 인스턴스 앞으로 온 메시지도 받음)
    async fn group_subscribe(&self, group: &str, instance: Option<&str>) -> Result<()>;

    /// 그룹으로 메시지 발행
    async fn group_sendmsg(&self, msg: Value, group: &str, instance: Option<&str>) -> Result<()>;

    /// 다음 메시지 수신
    ///
    /// `blocking`이 false면 대기 중인 메시지가 없을 때 바로 `None`.
    /// true면 메시지가 올 때까지 기다리고, 세션이 닫히면 `None`.
    async fn group_recvmsg(&self, blocking: bool) -> Result<Option<(Value, Envelope)>>;

    /// 수신한 메시지에 응답
    async fn group_reply(&self, envelope: &Envelope, msg: Value) -> Result<()>;

    /// 구독 여부 확인
    fn has_subscription(&self, group: &str, instance: Option<&str>) -> bool;
}
