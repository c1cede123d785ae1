//! b10-cfgmgr 프로세스 테스트
//!
//! stdin에 프레임을 넣고 stdin을 닫으면 매니저는 남은 프레임을 처리한 뒤 종료한다.

use serde_json::{json, Value};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

fn run_cfgmgr(data_path: &Path, frames: &[Value]) -> Vec<Value> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_b10-cfgmgr"))
        .arg("--data-path")
        .arg(data_path)
        .arg("--ack-timeout")
        .arg("5")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to start b10-cfgmgr");

    {
        let mut stdin = child.stdin.take().unwrap();
        for frame in frames {
            writeln!(stdin, "{}", frame).unwrap();
        }
    }

    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "b10-cfgmgr exited with {}", output.status);

    String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_boss_notified_and_commands_answered() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_cfgmgr(
        dir.path(),
        &[
            json!({"group": "ConfigManager", "from": "bindctl", "seq": 1, "msg": {"command": ["get_config"]}}),
            json!({"group": "Xfrin", "msg": {"command": ["get_config"]}}),
            "not json".into(),
            json!({"group": "ConfigManager", "from": "bindctl", "seq": 2, "msg": {"command": ["badcommand"]}}),
        ],
    );

    assert_eq!(
        out,
        vec![
            json!({"group": "Boss", "msg": {"running": "configmanager"}}),
            json!({"group": "ConfigManager", "to": "bindctl", "reply": 1, "msg": {"result": [0, {"version": 1}]}}),
            json!({"group": "ConfigManager", "to": "bindctl", "reply": 2, "msg": {"result": [1, "Unknown command: [\"badcommand\"]"]}}),
        ]
    );
}

#[test]
fn test_module_set_config_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_cfgmgr(
        dir.path(),
        &[
            json!({"group": "ConfigManager", "from": "bindctl", "seq": 7, "msg": {"command": ["set_config", "Auth", {"port": 5300}]}}),
            json!({"group": "ConfigManager", "from": "Auth", "msg": {"result": [0]}}),
        ],
    );

    assert_eq!(out.len(), 3);
    assert_eq!(out[1], json!({"group": "Auth", "msg": {"config_update": {"port": 5300}}}));
    assert_eq!(
        out[2],
        json!({"group": "ConfigManager", "to": "bindctl", "reply": 7, "msg": {"result": [0]}})
    );

    let stored: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("b10-config.db")).unwrap())
            .unwrap();
    assert_eq!(stored, json!({"version": 1, "Auth": {"port": 5300}}));
}

#[test]
fn test_corrupt_database_fails_startup() {
    let contents: [&[u8]; 2] = [b"{\"version\": 1", b"{\"version\": 1, \"x\": \"\xff\xfe\"}"];

    for content in contents {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b10-config.db"), content).unwrap();

        let output = Command::new(env!("CARGO_BIN_EXE_b10-cfgmgr"))
            .arg("--data-path")
            .arg(dir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .unwrap();

        assert!(!output.status.success());
        // 감독 프로세스에 기동 알림을 보내기 전에 멈춘다
        assert!(output.stdout.is_empty());
        assert!(String::from_utf8_lossy(&output.stderr).contains("Config database is corrupt"));
    }
}
