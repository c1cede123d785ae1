//! Runner - 이벤트 루프
//!
//! 수신 → 처리 → 응답을 반복한다. 메시지 하나의 처리 실패는 로그만 남기고
//! 루프는 계속 돈다. 종료 요청은 메시지 사이에서만 반영된다.

use super::config_manager::ConfigManager;
use cfgmgr_foundation::{Answer, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{error, info, warn};

// ============================================================================
// ShutdownHandle
// ============================================================================

#[derive(Debug, Default)]
struct ShutdownState {
    requested: AtomicBool,
    notify: Notify,
}

/// 이벤트 루프 종료 핸들
///
/// 복제해서 다른 task(시그널 핸들러 등)에 넘길 수 있다.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    inner: Arc<ShutdownState>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// 종료 요청
    pub fn shutdown(&self) {
        self.inner.requested.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// 종료가 요청되었는지
    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    /// 종료 요청까지 대기
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_requested() {
                return;
            }
            notified.await;
        }
    }
}

// ============================================================================
// Event Loop
// ============================================================================

impl ConfigManager {
    /// 설정 읽기 → 감독 프로세스에 알림 → 이벤트 루프
    ///
    /// 설정 DB를 읽을 수 없으면 루프에 들어가지 않고 에러를 돌려준다.
    pub async fn start(&mut self) -> Result<()> {
        self.read_config()?;

        if let Err(e) = self.notify_boss().await {
            warn!("Failed to notify boss: {}", e);
        }

        self.run().await
    }

    /// 이벤트 루프
    ///
    /// 종료 요청이 오거나 세션이 닫힐 때까지 돈다. 수신 자체가 실패하면
    /// 에러를 돌려주고 멈춘다.
    pub async fn run(&mut self) -> Result<()> {
        self.running = true;
        info!(channel = %self.settings.manager_channel, "Config manager running");

        let result = self.run_loop().await;

        self.running = false;
        info!("Config manager stopped");
        result
    }

    async fn run_loop(&mut self) -> Result<()> {
        let shutdown = self.shutdown.clone();

        while !shutdown.is_requested() {
            let (msg, envelope) = match self.deferred.pop_front() {
                Some(deferred) => deferred,
                None => {
                    let session = Arc::clone(&self.session);
                    let received = tokio::select! {
                        _ = shutdown.wait() => break,
                        received = session.group_recvmsg(true) => received?,
                    };

                    let Some(received) = received else {
                        info!("Session closed");
                        break;
                    };
                    received
                }
            };

            // 시간 초과 뒤에 도착한 모듈 응답 (대기 중인 set_config 없음)
            if Answer::parse(&msg).is_ok() {
                warn!(group = %envelope.group, "Discarding answer with no pending request");
                continue;
            }

            let answer = match self.handle_msg(msg).await {
                Ok(answer) => answer,
                Err(e) => {
                    error!(group = %envelope.group, "Failed to handle message: {}", e);
                    Answer::error(e.to_string()).into_value()
                }
            };

            if let Err(e) = self.session.group_reply(&envelope, answer).await {
                error!(group = %envelope.group, "Failed to send answer: {}", e);
            }
        }

        if !self.deferred.is_empty() {
            warn!(count = self.deferred.len(), "Dropping unprocessed messages");
            self.deferred.clear();
        }

        Ok(())
    }
}
