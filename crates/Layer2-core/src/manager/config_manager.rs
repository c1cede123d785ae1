//! ConfigManager - 명령 디스패처
//!
//! 메시지 하나를 받아 검증 → 상태 변경 → 저장 → 알림 → 응답 순으로 처리한다.
//! 검증은 항상 변경 전에 끝난다 (부분 적용 없음).

use super::command::{Command, CommandError, COMMAND_KEY};
use super::runner::ShutdownHandle;
use cfgmgr_foundation::{
    render, Answer, ConfigManagerData, Envelope, ManagerSettings, ModuleSpec, Result, Session,
    SpecRegistry, MODULE_SPEC_KEY,
};
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

/// 모듈에 보내는 설정 변경 알림 키
pub const CONFIG_UPDATE_KEY: &str = "config_update";

/// 설정 매니저
///
/// 설정 트리와 모듈 스펙 레지스트리를 소유한다. 메시지는 한 번에 하나씩
/// 처리되므로 (`&mut self`) 별도의 잠금은 없다.
pub struct ConfigManager {
    /// 실행 설정
    pub(super) settings: ManagerSettings,

    /// 메시지 세션
    pub(super) session: Arc<dyn Session>,

    /// 설정 트리
    config: ConfigManagerData,

    /// 모듈 스펙
    specs: SpecRegistry,

    /// 모듈 응답을 기다리는 동안 도착한 메시지 (루프가 순서대로 처리)
    pub(super) deferred: VecDeque<(Value, Envelope)>,

    /// 이벤트 루프 실행 중 여부
    pub(super) running: bool,

    /// 종료 요청
    pub(super) shutdown: ShutdownHandle,
}

impl ConfigManager {
    /// 매니저 생성 및 채널 구독
    ///
    /// 설정 트리는 기본값 `{version: 1}`으로 시작한다. 디스크 내용은
    /// `read_config`로 읽는다.
    pub async fn new(settings: ManagerSettings, session: Arc<dyn Session>) -> Result<Self> {
        settings.validate()?;

        session
            .group_subscribe(&settings.manager_channel, None)
            .await?;
        session
            .group_subscribe(&settings.boss_channel, Some(&settings.manager_channel))
            .await?;

        let config = ConfigManagerData::new(&settings.data_path, settings.db_filename.clone());
        debug!(
            data_path = %settings.data_path.display(),
            channel = %settings.manager_channel,
            "Config manager created"
        );

        Ok(Self {
            settings,
            session,
            config,
            specs: SpecRegistry::new(),
            deferred: VecDeque::new(),
            running: false,
            shutdown: ShutdownHandle::new(),
        })
    }

    // ========================================================================
    // 접근자
    // ========================================================================

    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    pub fn data_path(&self) -> &Path {
        &self.config.data_path
    }

    /// 현재 설정 트리
    pub fn config(&self) -> &ConfigManagerData {
        &self.config
    }

    /// 등록된 모듈 스펙
    pub fn specs(&self) -> &SpecRegistry {
        &self.specs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// 외부에서 루프를 멈추기 위한 핸들
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    // ========================================================================
    // 감독 프로세스
    // ========================================================================

    /// 감독 프로세스에 기동 알림
    pub async fn notify_boss(&self) -> Result<()> {
        self.session
            .group_sendmsg(
                json!({"running": "configmanager"}),
                &self.settings.boss_channel,
                None,
            )
            .await
    }

    // ========================================================================
    // 모듈 스펙
    // ========================================================================

    /// 모듈 스펙 등록 (같은 이름이면 교체)
    pub fn set_module_spec(&mut self, spec: ModuleSpec) -> Result<()> {
        self.specs.set(spec)
    }

    /// 모듈 스펙 제거
    pub fn remove_module_spec(&mut self, module_name: &str) {
        self.specs.remove(module_name);
    }

    pub fn get_module_spec(&self, module_name: &str) -> Option<&ModuleSpec> {
        self.specs.get(module_name)
    }

    /// 설정 스키마 (이름 -> config_data)
    pub fn get_config_spec(&self, module_name: Option<&str>) -> Map<String, Value> {
        self.specs.config_specs(module_name)
    }

    /// 명령 스키마 (이름 -> commands)
    pub fn get_commands_spec(&self, module_name: Option<&str>) -> Map<String, Value> {
        self.specs.commands_specs(module_name)
    }

    // ========================================================================
    // 설정 트리 Load / Save
    // ========================================================================

    /// 디스크에서 설정 트리 읽기
    ///
    /// 파일이 없으면 현재 트리를 유지한다. 깨진 파일이나 버전 불일치는
    /// 에러로 돌려주며, 호출자는 기동을 멈춰야 한다.
    pub fn read_config(&mut self) -> Result<()> {
        match ConfigManagerData::read_from_file(
            &self.settings.data_path,
            &self.settings.db_filename,
        )? {
            Some(config) => self.config = config,
            None => info!(
                path = %self.settings.db_path().display(),
                "No config file found, using defaults"
            ),
        }
        Ok(())
    }

    /// 설정 트리 저장
    pub fn write_config(&self) -> Result<()> {
        self.config.write_to_file()
    }

    // ========================================================================
    // 메시지 처리
    // ========================================================================

    /// 메시지 하나 처리 후 응답 봉투 반환
    ///
    /// 프로토콜 수준의 실패(모르는 명령, 잘못된 인자 등)는 `{"result": [1, msg]}`
    /// 응답으로 돌아온다. `Err`는 저장 실패나 세션 오류 같은 내부 장애다.
    pub async fn handle_msg(&mut self, msg: Value) -> Result<Value> {
        let Some(fields) = msg.as_object() else {
            return Ok(unknown_format(&msg));
        };

        if let Some(Value::Array(command)) = fields.get(COMMAND_KEY) {
            if !command.is_empty() {
                return match Command::decode(command) {
                    Ok(command) => self.handle_command(command).await,
                    Err(e) => {
                        debug!(error = %e, "Rejected command");
                        Ok(command_error(e))
                    }
                };
            }
        }

        if let Some(spec) = fields.get(MODULE_SPEC_KEY) {
            return Ok(self.handle_module_spec(spec.clone()).into_value());
        }

        Ok(unknown_format(&msg))
    }

    async fn handle_command(&mut self, command: Command) -> Result<Value> {
        debug!(command = command.name(), "Handling command");

        let answer = match command {
            Command::GetCommandsSpec(module_name) => {
                Answer::with(self.get_commands_spec(module_name.as_deref()))
            }
            Command::GetModuleSpec(module_name) => {
                Answer::with(self.get_config_spec(module_name.as_deref()))
            }
            Command::GetConfig(None) => Answer::with(self.config.data.clone()),
            Command::GetConfig(Some(module_name)) => Answer::with(
                self.config
                    .module(&module_name)
                    .cloned()
                    .unwrap_or_else(|| Value::Object(Map::new())),
            ),
            Command::SetConfig {
                module: None,
                value,
            } => {
                let mut updated = Vec::new();
                self.apply(|config| updated = config.merge_root(value))?;
                info!(modules = updated.len(), "Updated top-level config");
                return self.push_updates(&updated).await;
            }
            Command::SetConfig {
                module: Some(module_name),
                value,
            } => {
                self.apply(|config| {
                    config.merge_module(&module_name, value);
                })?;
                info!(module = %module_name, "Updated module config");
                return self.push_update(&module_name).await;
            }
        };

        Ok(answer.into_value())
    }

    /// 바뀐 모듈마다 알림 후 응답 대기
    ///
    /// 첫 번째 실패 응답에서 멈추고 그 응답을 돌려준다. 모두 성공하면 `[0]`.
    async fn push_updates(&mut self, module_names: &[String]) -> Result<Value> {
        for module_name in module_names {
            let answer = self.push_update(module_name).await?;
            if !Answer::parse(&answer).is_ok_and(|a| a.is_ok()) {
                return Ok(answer);
            }
        }
        Ok(Answer::ok().into_value())
    }

    /// 저장된 모듈 설정을 모듈 채널로 보내고 모듈의 응답을 기다린다
    ///
    /// 모듈의 응답이 그대로 호출자에게 가는 응답이 된다. 저장은 모듈이
    /// 변경을 받아들였는지 알기 전에 이미 끝나 있다.
    ///
    /// 응답은 보낸 모듈과 대조하지 않는다. 대기 중 매니저 채널에 처음 도착한
    /// `result` 봉투가 이 모듈의 응답으로 간주된다.
    async fn push_update(&mut self, module_name: &str) -> Result<Value> {
        let merged = self
            .config
            .module(module_name)
            .cloned()
            .unwrap_or(Value::Null);

        self.session
            .group_sendmsg(json!({ CONFIG_UPDATE_KEY: merged }), module_name, None)
            .await?;

        match self.await_answer(module_name).await? {
            Some(answer) => Ok(answer),
            None => {
                warn!(module = %module_name, "No usable answer to config_update");
                Ok(Answer::error("Error handling set_config command").into_value())
            }
        }
    }

    /// `result` 봉투가 올 때까지 수신
    ///
    /// 그 사이에 온 다른 메시지는 `deferred`에 쌓아 루프가 나중에 처리한다.
    /// 시간 초과나 세션 종료면 `None`.
    async fn await_answer(&mut self, module_name: &str) -> Result<Option<Value>> {
        let deadline = self.settings.ack_timeout().map(|limit| Instant::now() + limit);

        loop {
            let received = match deadline {
                Some(deadline) => {
                    match timeout_at(deadline, self.session.group_recvmsg(true)).await {
                        Ok(received) => received?,
                        Err(_) => {
                            warn!(module = %module_name, "Timed out waiting for config_update answer");
                            return Ok(None);
                        }
                    }
                }
                None => self.session.group_recvmsg(true).await?,
            };

            let Some((msg, envelope)) = received else {
                return Ok(None);
            };
            if Answer::parse(&msg).is_ok() {
                return Ok(Some(msg));
            }

            debug!(group = %envelope.group, "Deferring message received while awaiting answer");
            self.deferred.push_back((msg, envelope));
        }
    }

    /// 트리 변경 후 저장. 저장에 실패하면 메모리 상태도 되돌린다.
    fn apply<F>(&mut self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut ConfigManagerData),
    {
        let snapshot = self.config.data.clone();
        mutate(&mut self.config);

        if let Err(e) = self.write_config() {
            self.config.data = snapshot;
            return Err(e);
        }
        Ok(())
    }

    fn handle_module_spec(&mut self, spec: Value) -> Answer {
        let spec = match ModuleSpec::from_value(spec) {
            Ok(spec) => spec,
            Err(e) => return Answer::error(format!("Error in data definition: {}", e)),
        };

        let module_name = spec.module_name().to_string();
        match self.set_module_spec(spec) {
            Ok(()) => {
                info!(module = %module_name, "Registered module spec");
                Answer::ok()
            }
            Err(e) => Answer::error(format!("Error in data definition: {}", e)),
        }
    }
}

fn unknown_format(msg: &Value) -> Value {
    Answer::error(format!("Unknown message format: {}", render(msg))).into_value()
}

fn command_error(e: CommandError) -> Value {
    Answer::error(e.to_string()).into_value()
}
