use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// 모듈 스펙 파일의 최상위 키
pub const MODULE_SPEC_KEY: &str = "module_spec";

const MODULE_NAME_KEY: &str = "module_name";
const CONFIG_DATA_KEY: &str = "config_data";
const COMMANDS_KEY: &str = "commands";

/// 모듈 스펙 (모듈이 선언한 설정/명령 스키마)
///
/// 스키마 언어 자체는 해석하지 않는다. 이름만 검증하고 나머지는
/// 원본 그대로 보관해 projection으로 돌려준다.
///
/// ```json
/// {
///   "module_name": "Spec2",
///   "config_data": [ { "item_name": "item1", "item_type": "integer" } ],
///   "commands": [ { "command_name": "shutdown", "command_args": [] } ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct ModuleSpec {
    name: String,
    spec: Map<String, Value>,
}

impl ModuleSpec {
    /// raw 스펙에서 생성
    ///
    /// mapping이 아니거나 `module_name`이 비어 있으면 `Error::ModuleSpec`.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(spec) = value else {
            return Err(Error::module_spec("module_spec is not a dict"));
        };

        let name = match spec.get(MODULE_NAME_KEY) {
            Some(Value::String(name)) if !name.is_empty() => name.clone(),
            _ => return Err(Error::module_spec("no module_name in module_spec")),
        };

        Ok(Self { name, spec })
    }

    /// 스펙 파일에서 로드 (`{"module_spec": {...}}`)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Storage(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut file: Map<String, Value> = serde_json::from_str(&content)?;

        let spec = file.remove(MODULE_SPEC_KEY).ok_or_else(|| {
            Error::module_spec(format!("no module_spec in {}", path.display()))
        })?;
        Self::from_value(spec)
    }

    /// 모듈 이름
    pub fn module_name(&self) -> &str {
        &self.name
    }

    /// 설정 스키마 (없으면 None)
    pub fn config_spec(&self) -> Option<&Value> {
        self.spec.get(CONFIG_DATA_KEY)
    }

    /// 명령 스키마 (없으면 None)
    pub fn commands_spec(&self) -> Option<&Value> {
        self.spec.get(COMMANDS_KEY)
    }

    /// 전체 스펙
    pub fn full_spec(&self) -> &Map<String, Value> {
        &self.spec
    }
}

impl TryFrom<Value> for ModuleSpec {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}

impl From<ModuleSpec> for Value {
    fn from(spec: ModuleSpec) -> Self {
        Value::Object(spec.spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn testdata() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
    }

    #[test]
    fn test_from_value() {
        let spec = ModuleSpec::from_value(json!({
            "module_name": "Auth",
            "config_data": [{"item_name": "port", "item_type": "integer"}]
        }))
        .unwrap();

        assert_eq!(spec.module_name(), "Auth");
        assert!(spec.config_spec().is_some());
        assert!(spec.commands_spec().is_none());
        assert_eq!(spec.full_spec().len(), 2);
    }

    #[test]
    fn test_missing_module_name() {
        let err = ModuleSpec::from_value(json!({"foo": 1})).unwrap_err();
        assert_eq!(err.to_string(), "no module_name in module_spec");

        let err = ModuleSpec::from_value(json!({"module_name": ""})).unwrap_err();
        assert_eq!(err.to_string(), "no module_name in module_spec");

        let err = ModuleSpec::from_value(json!({"module_name": 3})).unwrap_err();
        assert_eq!(err.to_string(), "no module_name in module_spec");

        let err = ModuleSpec::from_value(json!([1, 2])).unwrap_err();
        assert_eq!(err.to_string(), "module_spec is not a dict");
    }

    #[test]
    fn test_from_file() {
        let spec1 = ModuleSpec::from_file(testdata().join("spec1.spec")).unwrap();
        assert_eq!(spec1.module_name(), "Spec1");
        assert!(spec1.config_spec().is_none());
        assert!(spec1.commands_spec().is_none());

        let spec2 = ModuleSpec::from_file(testdata().join("spec2.spec")).unwrap();
        assert_eq!(spec2.module_name(), "Spec2");
        assert_eq!(spec2.config_spec().and_then(Value::as_array).map(Vec::len), Some(6));
        assert_eq!(spec2.commands_spec().and_then(Value::as_array).map(Vec::len), Some(2));
    }

    #[test]
    fn test_serde_roundtrip_validates_name() {
        let parsed: std::result::Result<ModuleSpec, _> =
            serde_json::from_value(json!({"config_data": []}));
        assert!(parsed.is_err());

        let spec: ModuleSpec = serde_json::from_value(json!({"module_name": "Xfrin"})).unwrap();
        assert_eq!(serde_json::to_value(&spec).unwrap(), json!({"module_name": "Xfrin"}));
    }
}
