//! Memory Session - 프로세스 내부 메시지 큐
//!
//! 버스 데몬 없이 같은 프로세스 안에서 메시지를 주고받는다.
//! 테스트에서는 모듈 쪽 응답을 미리 큐에 넣어두고 매니저를 돌린다.

use super::{Envelope, Session};
use crate::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;
use tracing::trace;

/// 큐에 쌓인 메시지
#[derive(Debug, Clone, PartialEq)]
struct QueuedMessage {
    /// 대상 그룹
    group: String,
    /// 대상 인스턴스 (None이면 그룹 전체)
    instance: Option<String>,
    /// 메시지 본문
    msg: Value,
}

/// 프로세스 내부 세션
///
/// 발행된 메시지는 하나의 큐에 쌓인다. 수신은 큐 앞에서부터 이 세션이
/// 구독한 그룹(과 인스턴스)에 해당하는 첫 메시지를 꺼낸다. 구독하지 않은
/// 그룹 앞으로 간 메시지는 `get_message`로 꺼낼 때까지 남아 있다.
#[derive(Debug, Default)]
pub struct MemorySession {
    /// 그룹 -> 구독한 인스턴스 목록
    subscriptions: Mutex<HashMap<String, Vec<String>>>,

    /// 발행된 메시지
    queue: Mutex<VecDeque<QueuedMessage>>,

    /// 응답 기록
    replies: Mutex<Vec<(Envelope, Value)>>,

    /// 새 메시지 / 종료 알림
    notify: Notify,

    /// 닫힘 여부
    closed: AtomicBool,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// 특정 그룹/인스턴스 앞으로 간 메시지를 꺼냄 (구독 여부 무시)
    pub fn get_message(&self, group: &str, instance: Option<&str>) -> Option<Value> {
        let mut queue = self.queue.lock();
        let index = queue
            .iter()
            .position(|q| q.group == group && q.instance.as_deref() == instance)?;
        queue.remove(index).map(|q| q.msg)
    }

    /// 대기 중인 메시지 수
    pub fn queue_len(&self) -> usize {
        self.queue.lock().len()
    }

    /// 지금까지 보낸 응답
    pub fn replies(&self) -> Vec<(Envelope, Value)> {
        self.replies.lock().clone()
    }

    /// 세션 닫기 (대기 중인 blocking 수신은 `None`으로 깨어남)
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn is_deliverable(subscriptions: &HashMap<String, Vec<String>>, q: &QueuedMessage) -> bool {
        match (subscriptions.get(&q.group), &q.instance) {
            (Some(_), None) => true,
            (Some(instances), Some(instance)) => instances.contains(instance),
            (None, _) => false,
        }
    }

    fn take_deliverable(&self) -> Option<(Value, Envelope)> {
        let subscriptions = self.subscriptions.lock();
        let mut queue = self.queue.lock();
        let index = queue
            .iter()
            .position(|q| Self::is_deliverable(&subscriptions, q))?;
        let q = queue.remove(index)?;

        let envelope = Envelope {
            instance: q.instance,
            ..Envelope::new(q.group)
        };
        Some((q.msg, envelope))
    }
}

#[async_trait]
impl Session for MemorySession {
    async fn group_subscribe(&self, group: &str, instance: Option<&str>) -> Result<()> {
        let mut subscriptions = self.subscriptions.lock();
        let instances = subscriptions.entry(group.to_string()).or_default();
        if let Some(instance) = instance {
            if !instances.iter().any(|i| i == instance) {
                instances.push(instance.to_string());
            }
        }
        trace!(group, ?instance, "Subscribed");
        Ok(())
    }

    async fn group_sendmsg(&self, msg: Value, group: &str, instance: Option<&str>) -> Result<()> {
        trace!(group, ?instance, "Queueing message");
        self.queue.lock().push_back(QueuedMessage {
            group: group.to_string(),
            instance: instance.map(str::to_string),
            msg,
        });
        self.notify.notify_waiters();
        Ok(())
    }

    async fn group_recvmsg(&self, blocking: bool) -> Result<Option<(Value, Envelope)>> {
        loop {
            // 확인 전에 등록해야 그 사이에 온 알림을 놓치지 않는다
            let notified = self.notify.notified();

            if let Some(received) = self.take_deliverable() {
                return Ok(Some(received));
            }
            if !blocking || self.is_closed() {
                return Ok(None);
            }

            notified.await;
        }
    }

    async fn group_reply(&self, envelope: &Envelope, msg: Value) -> Result<()> {
        self.replies.lock().push((envelope.clone(), msg));
        Ok(())
    }

    fn has_subscription(&self, group: &str, instance: Option<&str>) -> bool {
        let subscriptions = self.subscriptions.lock();
        match (subscriptions.get(group), instance) {
            (Some(instances), Some(instance)) => instances.iter().any(|i| i == instance),
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}
