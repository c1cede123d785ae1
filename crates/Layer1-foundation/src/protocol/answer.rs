//! Answer - 응답 봉투
//!
//! ```text
//! 성공 (값 없음)  {"result": [0]}
//! 성공 (값 있음)  {"result": [0, <payload>]}
//! 실패            {"result": [1, "<message>"]}
//! ```

use crate::{Error, Result};
use serde_json::{json, Value};

/// 응답 봉투의 최상위 키
pub const RESULT_KEY: &str = "result";

/// 성공 코드
pub const RCODE_OK: i64 = 0;

/// 실패 코드
pub const RCODE_ERROR: i64 = 1;

/// 명령 처리 결과
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// 성공 (payload는 선택)
    Success(Option<Value>),
    /// 실패 (사람이 읽을 메시지)
    Failure(String),
}

impl Answer {
    /// payload 없는 성공
    pub fn ok() -> Self {
        Answer::Success(None)
    }

    /// payload 있는 성공
    pub fn with(payload: impl Into<Value>) -> Self {
        Answer::Success(Some(payload.into()))
    }

    /// 실패
    pub fn error(message: impl Into<String>) -> Self {
        Answer::Failure(message.into())
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Answer::Success(_))
    }

    /// wire 형식으로 변환
    pub fn into_value(self) -> Value {
        match self {
            Answer::Success(None) => json!({ RESULT_KEY: [RCODE_OK] }),
            Answer::Success(Some(payload)) => json!({ RESULT_KEY: [RCODE_OK, payload] }),
            Answer::Failure(message) => json!({ RESULT_KEY: [RCODE_ERROR, message] }),
        }
    }

    /// wire 형식 해석
    ///
    /// `result`가 없거나 코드가 정수가 아니면 `Error::Session`.
    /// 0이 아닌 코드는 모두 실패로 본다.
    pub fn parse(value: &Value) -> Result<Self> {
        let result = value
            .get(RESULT_KEY)
            .and_then(Value::as_array)
            .filter(|items| !items.is_empty())
            .ok_or_else(|| Error::Session(format!("Malformed answer: {}", render(value))))?;

        let rcode = result[0]
            .as_i64()
            .ok_or_else(|| Error::Session(format!("Malformed answer code: {}", result[0])))?;

        Ok(match (rcode, result.get(1)) {
            (RCODE_OK, payload) => Answer::Success(payload.cloned()),
            (_, Some(message)) => Answer::Failure(render(message)),
            (code, None) => Answer::Failure(format!("error code {}", code)),
        })
    }
}

impl From<Answer> for Value {
    fn from(answer: Answer) -> Self {
        answer.into_value()
    }
}

/// 에러 메시지용 값 표현
///
/// 문자열은 따옴표 없이, 나머지는 compact JSON으로 출력한다.
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
