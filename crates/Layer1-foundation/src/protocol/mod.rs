//! Protocol - 메시지 채널 위의 wire 형식
//!
//! - `answer.rs` - 응답 봉투 (`{"result": [rcode, payload?]}`)

mod answer;

pub use answer::{render, Answer, RCODE_ERROR, RCODE_OK, RESULT_KEY};
