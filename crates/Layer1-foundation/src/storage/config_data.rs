//! ConfigManagerData - 설정 트리의 디스크 표현
//!
//! 설정 트리(모듈 이름 → 모듈 설정)와 포맷 버전을 하나의 JSON 파일로 보관한다.
//!
//! ```json
//! { "version": 1, "TestModule": { "test": 124 } }
//! ```

use super::JsonStore;
use crate::error::DataReadError;
use crate::{Error, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 지원하는 설정 DB 포맷 버전
pub const CONFIG_VERSION: i64 = 1;

/// 기본 설정 DB 파일명
pub const DB_FILENAME: &str = "b10-config.db";

/// 버전 키 (최상위 예약 키)
pub const VERSION_KEY: &str = "version";

/// 설정 트리 + 저장 위치
///
/// 동등성은 `data`만으로 정의된다. `data_path`나 `db_filename`이 달라도
/// 내용이 같으면 같은 것으로 본다.
#[derive(Debug, Clone)]
pub struct ConfigManagerData {
    /// 설정 트리 (`version` 키 항상 포함)
    pub data: Map<String, Value>,

    /// 데이터 디렉토리
    pub data_path: PathBuf,

    /// DB 파일명
    pub db_filename: String,
}

impl ConfigManagerData {
    /// 기본 트리 `{version: CONFIG_VERSION}`로 생성
    pub fn new(data_path: impl Into<PathBuf>, db_filename: impl Into<String>) -> Self {
        let mut data = Map::new();
        data.insert(VERSION_KEY.to_string(), Value::from(CONFIG_VERSION));
        Self {
            data,
            data_path: data_path.into(),
            db_filename: db_filename.into(),
        }
    }

    /// 기본 파일명으로 생성
    pub fn with_default_file(data_path: impl Into<PathBuf>) -> Self {
        Self::new(data_path, DB_FILENAME)
    }

    /// DB 파일 전체 경로
    pub fn db_path(&self) -> PathBuf {
        self.data_path.join(&self.db_filename)
    }

    fn store(&self) -> JsonStore {
        JsonStore::new(&self.data_path)
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// 파일에서 읽기
    ///
    /// - 파일 없음: `Ok(None)` (복원할 게 없음)
    /// - 파싱 실패 / mapping 아님 / 버전 불일치: `Error::DataRead`
    pub fn read_from_file(
        data_path: impl AsRef<Path>,
        db_filename: &str,
    ) -> Result<Option<Self>> {
        let data_path = data_path.as_ref();
        let store = JsonStore::new(data_path);
        let path = store.file_path(db_filename);

        let Some(content) = store.read_optional(db_filename)? else {
            debug!(path = %path.display(), "No config file found");
            return Ok(None);
        };

        // 잘못된 UTF-8도 JSON 파싱 실패로 취급
        let parsed: Value =
            serde_json::from_slice(&content).map_err(|e| DataReadError::Parse {
                path: path.clone(),
                message: e.to_string(),
            })?;

        let Value::Object(data) = parsed else {
            return Err(DataReadError::Shape { path }.into());
        };

        let found = data.get(VERSION_KEY).and_then(Value::as_i64);
        if found != Some(CONFIG_VERSION) {
            return Err(DataReadError::Version {
                path,
                found,
                expected: CONFIG_VERSION,
            }
            .into());
        }

        info!(path = %path.display(), modules = data.len() - 1, "Loaded config file");
        Ok(Some(Self {
            data,
            data_path: data_path.to_path_buf(),
            db_filename: db_filename.to_string(),
        }))
    }

    /// 현재 위치에 저장
    pub fn write_to_file(&self) -> Result<()> {
        self.write_to_file_as(&self.db_filename)
    }

    /// 같은 디렉토리의 다른 파일명으로 저장
    pub fn write_to_file_as(&self, db_filename: &str) -> Result<()> {
        // 버전은 메모리 상태와 상관없이 항상 현재 포맷으로 기록
        let mut data = self.data.clone();
        data.insert(VERSION_KEY.to_string(), Value::from(CONFIG_VERSION));

        self.store().save(db_filename, &Value::Object(data))?;
        debug!(
            path = %self.data_path.join(db_filename).display(),
            "Wrote config file"
        );
        Ok(())
    }

    // ========================================================================
    // 트리 접근
    // ========================================================================

    /// 모듈 설정 조회
    pub fn module(&self, module_name: &str) -> Option<&Value> {
        self.data.get(module_name)
    }

    /// 모듈 설정 병합
    ///
    /// 양쪽이 모두 mapping인 곳은 키 단위로 재귀 병합하고, 그 외에는 새 값으로
    /// 교체한다. 병합된 모듈 설정을 반환한다.
    pub fn merge_module(&mut self, module_name: &str, value: Map<String, Value>) -> &Value {
        let entry = self
            .data
            .entry(module_name.to_string())
            .or_insert_with(|| Value::Object(Map::new()));

        merge_value(entry, Value::Object(value));
        entry
    }

    /// 최상위 병합 (`version`은 건드리지 않음)
    ///
    /// 값이 바뀐 최상위 키(모듈 이름) 목록을 반환한다.
    pub fn merge_root(&mut self, value: Map<String, Value>) -> Vec<String> {
        let mut updated = Vec::with_capacity(value.len());
        for (key, item) in value {
            if key == VERSION_KEY {
                debug!("Ignoring version key in root config update");
                continue;
            }
            match self.data.get_mut(&key) {
                Some(slot) => merge_value(slot, item),
                None => {
                    self.data.insert(key.clone(), item);
                }
            }
            updated.push(key);
        }
        updated
    }

    /// 현재 포맷 버전
    pub fn version(&self) -> Option<i64> {
        self.data.get(VERSION_KEY).and_then(Value::as_i64)
    }
}

/// `update`를 `target`에 병합
fn merge_value(target: &mut Value, update: Value) {
    match (target, update) {
        (Value::Object(existing), Value::Object(update)) => {
            for (key, item) in update {
                match existing.get_mut(&key) {
                    Some(slot) => merge_value(slot, item),
                    None => {
                        existing.insert(key, item);
                    }
                }
            }
        }
        (target, update) => *target = update,
    }
}

impl PartialEq for ConfigManagerData {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for ConfigManagerData {}

impl TryFrom<&Path> for ConfigManagerData {
    type Error = Error;

    /// 기본 파일명으로 읽되, 파일이 없으면 기본 트리
    fn try_from(data_path: &Path) -> Result<Self> {
        Ok(Self::read_from_file(data_path, DB_FILENAME)?
            .unwrap_or_else(|| Self::with_default_file(data_path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn testdata() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
    }

    #[test]
    fn test_init() {
        let data = ConfigManagerData::with_default_file(testdata());
        assert_eq!(data.version(), Some(CONFIG_VERSION));
        assert_eq!(data.data_path, testdata());
        assert_eq!(data.db_path(), testdata().join("b10-config.db"));
    }

    #[test]
    fn test_read_from_file() {
        let loaded = ConfigManagerData::read_from_file(testdata(), DB_FILENAME)
            .unwrap()
            .expect("testdata config should exist");
        assert_eq!(
            Value::Object(loaded.data),
            json!({"version": 1, "TestModule": {"test": 124}})
        );

        assert!(ConfigManagerData::read_from_file("doesnotexist", DB_FILENAME)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_read_errors_are_distinct() {
        let bad1 = ConfigManagerData::read_from_file(testdata(), "b10-config-bad1.db");
        assert!(matches!(
            bad1,
            Err(Error::DataRead(DataReadError::Parse { .. }))
        ));

        let bad2 = ConfigManagerData::read_from_file(testdata(), "b10-config-bad2.db");
        assert!(matches!(
            bad2,
            Err(Error::DataRead(DataReadError::Version { found: None, .. }))
        ));

        let bad3 = ConfigManagerData::read_from_file(testdata(), "b10-config-bad3.db");
        assert!(matches!(
            bad3,
            Err(Error::DataRead(DataReadError::Version {
                found: Some(0),
                ..
            }))
        ));

        let bad4 = ConfigManagerData::read_from_file(testdata(), "b10-config-bad4.db");
        assert!(matches!(
            bad4,
            Err(Error::DataRead(DataReadError::Shape { .. }))
        ));

        let bad5 = ConfigManagerData::read_from_file(testdata(), "b10-config-bad5.db");
        let err = bad5.unwrap_err();
        assert!(matches!(err, Error::DataRead(DataReadError::Parse { .. })));
        assert!(err.is_fatal_at_startup());
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempdir().unwrap();
        let mut data = ConfigManagerData::with_default_file(dir.path());
        data.merge_module("TestModule", json!({"test": 125}).as_object().unwrap().clone());

        data.write_to_file_as("b10-config-write-test").unwrap();

        let loaded = ConfigManagerData::read_from_file(dir.path(), "b10-config-write-test")
            .unwrap()
            .unwrap();
        assert_eq!(data, loaded);
        assert!(!dir.path().join("b10-config-write-test.tmp").exists());
    }

    #[test]
    fn test_equality() {
        let cfd1 = ConfigManagerData::with_default_file(testdata());
        let mut cfd2 = ConfigManagerData::with_default_file(testdata());
        assert_eq!(cfd1, cfd2);

        cfd2.data_path = PathBuf::from("some/unknown/path");
        assert_eq!(cfd1, cfd2);

        cfd2.db_filename = "bad_file.name".to_string();
        assert_eq!(cfd1, cfd2);

        cfd2.data.insert("test".to_string(), json!({"a": [1, 2, 3]}));
        assert_ne!(cfd1, cfd2);
    }

    #[test]
    fn test_merge_module() {
        let mut data = ConfigManagerData::with_default_file(".");

        data.merge_module("Mod", json!({"a": 1, "b": 2}).as_object().unwrap().clone());
        let merged = data
            .merge_module("Mod", json!({"b": 3}).as_object().unwrap().clone())
            .clone();
        assert_eq!(merged, json!({"a": 1, "b": 3}));

        data.data.insert("Scalar".to_string(), json!(5));
        data.merge_module("Scalar", json!({"x": true}).as_object().unwrap().clone());
        assert_eq!(data.module("Scalar"), Some(&json!({"x": true})));
    }

    #[test]
    fn test_merge_module_nested() {
        let mut data = ConfigManagerData::with_default_file(".");

        data.merge_module(
            "Auth",
            json!({"zone": {"a": 1, "b": 2}, "port": 53}).as_object().unwrap().clone(),
        );
        data.merge_module("Auth", json!({"zone": {"b": 3}}).as_object().unwrap().clone());
        assert_eq!(
            data.module("Auth"),
            Some(&json!({"zone": {"a": 1, "b": 3}, "port": 53}))
        );

        // mapping이 아닌 값은 통째로 교체
        data.merge_module("Auth", json!({"zone": [1, 2]}).as_object().unwrap().clone());
        assert_eq!(data.module("Auth"), Some(&json!({"zone": [1, 2], "port": 53})));
    }

    #[test]
    fn test_merge_root_keeps_version() {
        let mut data = ConfigManagerData::with_default_file(".");
        data.merge_module("Auth", json!({"zone": {"a": 1}}).as_object().unwrap().clone());

        let updated = data.merge_root(
            json!({"version": 7, "Other": {}, "Auth": {"zone": {"b": 2}}})
                .as_object()
                .unwrap()
                .clone(),
        );

        assert_eq!(updated, vec!["Auth".to_string(), "Other".to_string()]);
        assert_eq!(data.version(), Some(CONFIG_VERSION));
        assert_eq!(data.module("Other"), Some(&json!({})));
        assert_eq!(data.module("Auth"), Some(&json!({"zone": {"a": 1, "b": 2}})));
    }

    #[test]
    fn test_try_from_missing_path_defaults() {
        let dir = tempdir().unwrap();
        let data = ConfigManagerData::try_from(dir.path()).unwrap();
        assert_eq!(Value::Object(data.data), json!({"version": 1}));
    }
}
