//! Command - 명령 메시지 디코딩
//!
//! `{"command": [name, arg...]}`의 리스트를 검증해서 타입이 있는 `Command`로
//! 바꾼다. 디스패치는 raw 리스트를 다시 보지 않는다.

use cfgmgr_foundation::{render, VERSION_KEY};
use serde_json::{Map, Value};
use thiserror::Error;

/// 명령 메시지의 최상위 키
pub const COMMAND_KEY: &str = "command";

pub const GET_COMMANDS_SPEC: &str = "get_commands_spec";
pub const GET_MODULE_SPEC: &str = "get_module_spec";
pub const GET_CONFIG: &str = "get_config";
pub const SET_CONFIG: &str = "set_config";

const MODULE_NAME_KEY: &str = "module_name";

/// 검증된 명령
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// 명령 스키마 조회 (모듈 이름 선택)
    GetCommandsSpec(Option<String>),

    /// 설정 스키마 조회 (모듈 이름 선택)
    GetModuleSpec(Option<String>),

    /// 설정 트리 조회 (모듈 이름 선택)
    GetConfig(Option<String>),

    /// 설정 병합 (module이 None이면 최상위)
    SetConfig {
        module: Option<String>,
        value: Map<String, Value>,
    },
}

/// 명령 검증 실패 (메시지가 그대로 응답에 실린다)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Bad {0} command, argument not a dict")]
    ArgumentNotDict(&'static str),

    #[error("Bad module_name in {0} command")]
    BadModuleName(&'static str),

    #[error("Wrong number of arguments")]
    WrongArity,
}

impl Command {
    /// 명령 리스트 디코딩 (`[name, arg...]`)
    pub fn decode(command: &[Value]) -> Result<Self, CommandError> {
        let unknown = || CommandError::Unknown(render(&Value::Array(command.to_vec())));

        let (name, args) = match command.split_first() {
            Some((Value::String(name), args)) => (name.as_str(), args),
            _ => return Err(unknown()),
        };

        match name {
            GET_COMMANDS_SPEC => Ok(Command::GetCommandsSpec(module_arg(GET_COMMANDS_SPEC, args)?)),
            GET_MODULE_SPEC => Ok(Command::GetModuleSpec(module_arg(GET_MODULE_SPEC, args)?)),
            GET_CONFIG => Ok(Command::GetConfig(module_arg(GET_CONFIG, args)?)),
            SET_CONFIG => decode_set_config(args),
            _ => Err(unknown()),
        }
    }

    /// 명령 이름
    pub fn name(&self) -> &'static str {
        match self {
            Command::GetCommandsSpec(_) => GET_COMMANDS_SPEC,
            Command::GetModuleSpec(_) => GET_MODULE_SPEC,
            Command::GetConfig(_) => GET_CONFIG,
            Command::SetConfig { .. } => SET_CONFIG,
        }
    }
}

/// 선택 인자 `{"module_name": "..."}` 해석 (두 번째 이후 인자는 무시)
fn module_arg(command: &'static str, args: &[Value]) -> Result<Option<String>, CommandError> {
    let Some(arg) = args.first() else {
        return Ok(None);
    };
    let Value::Object(arg) = arg else {
        return Err(CommandError::ArgumentNotDict(command));
    };
    match arg.get(MODULE_NAME_KEY) {
        Some(Value::String(name)) => Ok(Some(name.clone())),
        _ => Err(CommandError::BadModuleName(command)),
    }
}

fn decode_set_config(args: &[Value]) -> Result<Command, CommandError> {
    match args {
        [Value::Object(value)] => Ok(Command::SetConfig {
            module: None,
            value: value.clone(),
        }),
        [_] => Err(CommandError::ArgumentNotDict(SET_CONFIG)),
        // version은 모듈이 아니라 트리 포맷 키
        [Value::String(module), _] if module == VERSION_KEY => {
            Err(CommandError::BadModuleName(SET_CONFIG))
        }
        [Value::String(module), Value::Object(value)] => Ok(Command::SetConfig {
            module: Some(module.clone()),
            value: value.clone(),
        }),
        [Value::String(_), _] => Err(CommandError::ArgumentNotDict(SET_CONFIG)),
        [_, _] => Err(CommandError::BadModuleName(SET_CONFIG)),
        _ => Err(CommandError::WrongArity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: Value) -> Result<Command, CommandError> {
        Command::decode(value.as_array().unwrap())
    }

    #[test]
    fn test_decode_lookups() {
        assert_eq!(decode(json!(["get_config"])), Ok(Command::GetConfig(None)));
        assert_eq!(
            decode(json!(["get_module_spec", {"module_name": "Auth"}])),
            Ok(Command::GetModuleSpec(Some("Auth".to_string())))
        );
        assert_eq!(
            decode(json!(["get_commands_spec"])),
            Ok(Command::GetCommandsSpec(None))
        );
    }

    #[test]
    fn test_decode_lookup_argument_errors() {
        assert_eq!(
            decode(json!(["get_module_spec", 1])).unwrap_err().to_string(),
            "Bad get_module_spec command, argument not a dict"
        );
        assert_eq!(
            decode(json!(["get_module_spec", {}])).unwrap_err().to_string(),
            "Bad module_name in get_module_spec command"
        );
        assert_eq!(
            decode(json!(["get_config", 1])).unwrap_err().to_string(),
            "Bad get_config command, argument not a dict"
        );
        assert_eq!(
            decode(json!(["get_config", {"module_name": 5}])).unwrap_err().to_string(),
            "Bad module_name in get_config command"
        );
    }

    #[test]
    fn test_decode_set_config() {
        assert_eq!(
            decode(json!(["set_config", {}])),
            Ok(Command::SetConfig {
                module: None,
                value: Map::new()
            })
        );

        let cmd = decode(json!(["set_config", "TestModule", {"test": 123}])).unwrap();
        assert_eq!(cmd.name(), "set_config");
        assert_eq!(
            cmd,
            Command::SetConfig {
                module: Some("TestModule".to_string()),
                value: json!({"test": 123}).as_object().unwrap().clone(),
            }
        );
    }

    #[test]
    fn test_decode_set_config_errors() {
        assert_eq!(decode(json!(["set_config"])), Err(CommandError::WrongArity));
        assert_eq!(
            decode(json!(["set_config", "a", {}, {}])),
            Err(CommandError::WrongArity)
        );
        assert_eq!(
            decode(json!(["set_config", "TestModule"])).unwrap_err().to_string(),
            "Bad set_config command, argument not a dict"
        );
        assert_eq!(
            decode(json!(["set_config", 1, {}])).unwrap_err().to_string(),
            "Bad module_name in set_config command"
        );
        assert_eq!(
            decode(json!(["set_config", "version", {"x": 1}])),
            Err(CommandError::BadModuleName("set_config"))
        );
    }

    #[test]
    fn test_decode_unknown() {
        assert_eq!(
            decode(json!(["badcommand"])).unwrap_err().to_string(),
            r#"Unknown command: ["badcommand"]"#
        );
        assert_eq!(
            decode(json!([1, 2])).unwrap_err().to_string(),
            "Unknown command: [1,2]"
        );
        assert!(matches!(decode(json!([])), Err(CommandError::Unknown(_))));
    }
}
