//! Stdio Session - 줄 단위 JSON 프레임
//!
//! 한 줄에 프레임 하나. 입력은 외부 버스 어댑터가 넣어주고,
//! 출력(발행/응답)도 같은 형식으로 내보낸다.
//!
//! ```text
//! 입력  {"group": "ConfigManager", "from": "bindctl", "seq": 3, "msg": {"command": ["get_config"]}}
//! 발행  {"group": "Auth", "msg": {"config_update": {...}}}
//! 응답  {"group": "ConfigManager", "to": "bindctl", "reply": 3, "msg": {"result": [0, {...}]}}
//! ```

use super::{Envelope, Session};
use crate::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tracing::{debug, error, warn};

/// 입력 채널 용량
const INBOUND_CAPACITY: usize = 64;

/// 한 줄짜리 wire 프레임
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireFrame {
    pub group: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    /// 보낸 쪽 (입력 프레임)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// 보낸 쪽 시퀀스 (입력 프레임)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,

    /// 응답 대상 (응답 프레임)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,

    /// 응답하는 시퀀스 (응답 프레임)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<u64>,

    pub msg: Value,
}

impl WireFrame {
    fn message(group: &str, instance: Option<&str>, msg: Value) -> Self {
        Self {
            group: group.to_string(),
            instance: instance.map(str::to_string),
            from: None,
            seq: None,
            to: None,
            reply: None,
            msg,
        }
    }
}

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// stdin/stdout 기반 세션
pub struct StdioSession {
    /// 그룹 -> 구독한 인스턴스 목록
    subscriptions: Mutex<HashMap<String, Vec<String>>>,

    /// reader task가 채우는 입력 채널
    inbound: AsyncMutex<mpsc::Receiver<WireFrame>>,

    /// 출력
    writer: AsyncMutex<BoxedWriter>,
}

impl StdioSession {
    /// 프로세스 stdin/stdout으로 생성 (tokio 런타임 안에서 호출)
    pub fn spawn() -> Self {
        Self::with_io(tokio::io::stdin(), tokio::io::stdout())
    }

    /// 임의의 reader/writer로 생성
    pub fn with_io<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (tx, rx) = mpsc::channel::<WireFrame>(INBOUND_CAPACITY);

        // stdin reader task
        let mut lines = BufReader::new(reader).lines();
        tokio::spawn(async move {
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<WireFrame>(&line) {
                            Ok(frame) => {
                                if tx.send(frame).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("Dropping malformed frame: {}", e),
                        }
                    }
                    Ok(None) => {
                        debug!("Input closed");
                        break;
                    }
                    Err(e) => {
                        error!("Failed to read input: {}", e);
                        break;
                    }
                }
            }
        });

        Self {
            subscriptions: Mutex::new(HashMap::new()),
            inbound: AsyncMutex::new(rx),
            writer: AsyncMutex::new(Box::new(writer)),
        }
    }

    async fn write_frame(&self, frame: &WireFrame) -> Result<()> {
        let mut line = serde_json::to_string(frame)?;
        line.push('\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| Error::Session(format!("Failed to write frame: {}", e)))?;
        writer
            .flush()
            .await
            .map_err(|e| Error::Session(format!("Failed to flush output: {}", e)))
    }
}

#[async_trait]
impl Session for StdioSession {
    async fn group_subscribe(&self, group: &str, instance: Option<&str>) -> Result<()> {
        let mut subscriptions = self.subscriptions.lock();
        let instances = subscriptions.entry(group.to_string()).or_default();
        if let Some(instance) = instance {
            if !instances.iter().any(|i| i == instance) {
                instances.push(instance.to_string());
            }
        }
        Ok(())
    }

    async fn group_sendmsg(&self, msg: Value, group: &str, instance: Option<&str>) -> Result<()> {
        self.write_frame(&WireFrame::message(group, instance, msg))
            .await
    }

    async fn group_recvmsg(&self, blocking: bool) -> Result<Option<(Value, Envelope)>> {
        let mut inbound = self.inbound.lock().await;
        loop {
            let frame = if blocking {
                match inbound.recv().await {
                    Some(frame) => frame,
                    None => return Ok(None),
                }
            } else {
                match inbound.try_recv() {
                    Ok(frame) => frame,
                    Err(_) => return Ok(None),
                }
            };

            if !self.has_subscription(&frame.group, frame.instance.as_deref()) {
                debug!(group = %frame.group, "Dropping frame for unsubscribed group");
                continue;
            }

            let envelope = Envelope {
                group: frame.group,
                instance: frame.instance,
                from: frame.from,
                seq: frame.seq,
            };
            return Ok(Some((frame.msg, envelope)));
        }
    }

    async fn group_reply(&self, envelope: &Envelope, msg: Value) -> Result<()> {
        let mut frame = WireFrame::message(&envelope.group, envelope.instance.as_deref(), msg);
        frame.to = envelope.from.clone();
        frame.reply = envelope.seq;
        self.write_frame(&frame).await
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
