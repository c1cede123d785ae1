use super::ModuleSpec;
use crate::{Error, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// 모듈 스펙 레지스트리 (모듈 이름 -> 스펙)
///
/// 이름당 하나만 유지한다. 같은 이름으로 다시 등록하면 교체된다.
/// 디스크에 저장하지 않으므로 새로 만들면 항상 비어 있다
/// (모듈들이 재접속하면서 다시 알린다).
#[derive(Debug, Clone, Default)]
pub struct SpecRegistry {
    specs: BTreeMap<String, ModuleSpec>,
}

impl SpecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 스펙 등록 (upsert)
    pub fn set(&mut self, spec: ModuleSpec) -> Result<()> {
        let name = spec.module_name().to_string();
        if name.is_empty() {
            return Err(Error::module_spec("no module_name in module_spec"));
        }

        let replaced = self.specs.insert(name.clone(), spec).is_some();
        debug!(module = %name, replaced, "Registered module spec");
        Ok(())
    }

    /// 스펙 제거 (없으면 아무 일도 없음)
    pub fn remove(&mut self, name: &str) -> Option<ModuleSpec> {
        let removed = self.specs.remove(name);
        if removed.is_some() {
            debug!(module = %name, "Removed module spec");
        }
        removed
    }

    /// 스펙 조회
    pub fn get(&self, name: &str) -> Option<&ModuleSpec> {
        self.specs.get(name)
    }

    /// 스펙 존재 여부
    pub fn contains(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    /// 스펙 개수
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// 비어있는지 확인
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// 등록된 모듈 이름들
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }

    /// 설정 스키마 projection (이름 -> config_data 또는 null)
    ///
    /// 이름을 주면 그 모듈만 남긴다. 모르는 이름이면 빈 mapping.
    pub fn config_specs(&self, name: Option<&str>) -> Map<String, Value> {
        self.project(name, ModuleSpec::config_spec)
    }

    /// 명령 스키마 projection (이름 -> commands 또는 null)
    pub fn commands_specs(&self, name: Option<&str>) -> Map<String, Value> {
        self.project(name, ModuleSpec::commands_spec)
    }

    fn project<F>(&self, name: Option<&str>, projection: F) -> Map<String, Value>
    where
        F: Fn(&ModuleSpec) -> Option<&Value>,
    {
        self.specs
            .iter()
            .filter(|(module_name, _)| name.map_or(true, |n| n == module_name.as_str()))
            .map(|(module_name, spec)| {
                (
                    module_name.clone(),
                    projection(spec).cloned().unwrap_or(Value::Null),
                )
            })
            .collect()
    }
}
