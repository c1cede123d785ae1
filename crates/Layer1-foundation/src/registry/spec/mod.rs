//! Spec Registry - 모듈 스펙 관리
//!
//! 각 모듈이 알려온 설정/명령 스키마를 이름별로 보관합니다.

mod module_spec;
mod registry;

pub use module_spec::{ModuleSpec, MODULE_SPEC_KEY};
pub use registry::SpecRegistry;
