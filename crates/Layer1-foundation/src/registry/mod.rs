//! Registry - 등록/관리
//!
//! - `spec/` - 모듈 스펙 레지스트리 (메모리 전용, 저장하지 않음)

pub mod spec;

// Spec
pub use spec::{ModuleSpec, SpecRegistry, MODULE_SPEC_KEY};
