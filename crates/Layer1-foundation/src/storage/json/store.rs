//! JSON 파일 저장소

use crate::{Error, Result};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::trace;

/// 임시 파일 접미사 (원자적 저장용)
const TMP_SUFFIX: &str = ".tmp";

/// JSON 파일 저장소
///
/// 한 디렉토리 아래의 JSON 파일들을 읽고 쓴다.
/// 저장은 항상 `<file>.tmp`에 쓴 뒤 rename 하므로, 동시에 읽는 쪽이
/// 반쯤 쓰인 파일을 보는 일은 없다.
#[derive(Debug, Clone)]
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// 기본 데이터 디렉토리 (~/.local/share/bind10 등)
    pub fn data_dir() -> Result<Self> {
        let dir = dirs::data_dir()
            .ok_or_else(|| Error::Config("Cannot find data directory".to_string()))?
            .join("bind10");
        Ok(Self::new(dir))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.base_dir.join(filename)
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.base_dir.exists() {
            std::fs::create_dir_all(&self.base_dir)
                .map_err(|e| Error::Storage(format!("Failed to create directory: {}", e)))?;
        }
        Ok(())
    }

    /// 파일 내용 읽기 (없으면 None)
    ///
    /// 디렉토리 자체가 없는 경우도 "없음"으로 본다. 내용 해석(UTF-8, JSON)은
    /// 호출하는 쪽의 몫이다.
    pub fn read_optional(&self, filename: &str) -> Result<Option<Vec<u8>>> {
        let path = self.file_path(filename);
        match std::fs::read(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                trace!(path = %path.display(), "No file to read");
                Ok(None)
            }
            Err(e) => Err(Error::Storage(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// JSON 저장 (임시 파일 + rename)
    pub fn save<T: Serialize>(&self, filename: &str, data: &T) -> Result<()> {
        self.ensure_dir()?;
        let path = self.file_path(filename);
        let tmp_path = self.file_path(&format!("{}{}", filename, TMP_SUFFIX));
        let content = serde_json::to_string_pretty(data)
            .map_err(|e| Error::Storage(format!("Failed to serialize: {}", e)))?;

        std::fs::write(&tmp_path, content).map_err(|e| {
            Error::Storage(format!("Failed to write {}: {}", tmp_path.display(), e))
        })?;
        std::fs::rename(&tmp_path, &path).map_err(|e| {
            Error::Storage(format!(
                "Failed to rename {} to {}: {}",
                tmp_path.display(),
                path.display(),
                e
            ))
        })?;

        trace!(path = %path.display(), "Saved JSON file");
        Ok(())
    }
}
