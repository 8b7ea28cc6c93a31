use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut dir = std::env::temp_dir();
    dir.push(format!("switchport-tests-{}-{}", prefix, nonce));
    std::fs::create_dir_all(&dir).expect("Failed to create temp dir");
    dir
}

fn switchport() -> Command {
    Command::new(env!("CARGO_BIN_EXE_switchport"))
}

/// ARM ELF32 whose only file-backed PT_LOAD holds 8 bytes at LMA 0.
fn thumb_elf() -> Vec<u8> {
    let mut elf = vec![0x7f, b'E', b'L', b'F', 1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0];
    for half in [2u16, 40] {
        elf.extend_from_slice(&half.to_le_bytes());
    }
    for word in [1u32, 0x101, 52, 0, 0x0500_0200] {
        elf.extend_from_slice(&word.to_le_bytes());
    }
    for half in [52u16, 32, 2, 40, 0, 0] {
        elf.extend_from_slice(&half.to_le_bytes());
    }
    let text = [1u32, 116, 0x2000_0000, 0, 8, 8, 5, 4];
    let bss = [1u32, 0, 0x2000_0000, 0x2000_0000, 0, 0x100, 6, 4];
    for word in text.into_iter().chain(bss) {
        elf.extend_from_slice(&word.to_le_bytes());
    }
    elf.extend_from_slice(&[0x00, 0x01, 0x00, 0x20, 0x41, 0x00, 0x00, 0x00]);
    elf
}

#[test]
fn test_cli_help() {
    let output = switchport()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("SwitchPort"));
    assert!(stdout.contains("hex2v"));
}

#[test]
fn test_cli_missing_script() {
    let output = switchport()
        .args(["run", "--script", "non_existent_script.yaml"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_cli_run_writes_result() {
    let dir = temp_dir("run");
    let script_path = dir.join("scenario.yaml");
    std::fs::write(
        &script_path,
        r#"
schema_version: "1.0"
limits:
  max_steps: 200
stimulus:
  - switches: 1
    expect_output: 1
  - switches: 5
    expect_output: 120
  - switches: 9
    expect_output: 4294967295
assertions:
  - expected_stop_reason: settled
"#,
    )
    .unwrap();
    let output_dir = dir.join("artifacts");

    let output = switchport()
        .args([
            "run",
            "--script",
            script_path.to_str().unwrap(),
            "--output-dir",
            output_dir.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let result_content = std::fs::read_to_string(output_dir.join("result.json")).unwrap();
    let result: serde_json::Value = serde_json::from_str(&result_content).unwrap();

    assert_eq!(result["status"], "pass");
    assert_eq!(result["stop_reason"], "settled");
    assert_eq!(result["script_hash"].as_str().unwrap().len(), 64);
    assert_eq!(result["board"]["name"], "switchport-soc");
    assert_eq!(result["stimulus"][1]["output"], 120);
    assert_eq!(result["snapshot"]["controller"]["phase"], "watch");
    assert_eq!(result["snapshot"]["devices"]["oport"]["value"], 4294967295u32);
    assert!(result["metrics"]["polls"].as_u64().unwrap() > 0);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_run_failing_expectation() {
    let dir = temp_dir("fail");
    let script_path = dir.join("scenario.yaml");
    std::fs::write(
        &script_path,
        r#"
schema_version: "1.0"
limits:
  max_steps: 200
stimulus:
  - switches: 1
  - switches: 3
    expect_output: 5
"#,
    )
    .unwrap();

    let output = switchport()
        .args(["run", "--script", script_path.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_run_with_relative_board_and_uart() {
    let dir = temp_dir("board");
    std::fs::write(
        dir.join("board.yaml"),
        r#"
name: "relocated"
devices:
  - id: "sw"
    type: input_port
    base_address: 4096
  - id: "leds"
    type: output_port
    base_address: 8192
  - id: "tx"
    type: uart
    base_address: 12288
    config:
      tx_latency: 4
"#,
    )
    .unwrap();
    let script_path = dir.join("scenario.yaml");
    std::fs::write(
        &script_path,
        r#"
schema_version: "1.0"
board: "board.yaml"
limits:
  max_steps: 200
stimulus:
  - switches: 1
  - switches: 4
    expect_output: 24
    uart_send: "ok"
assertions:
  - uart_contains: "ok"
"#,
    )
    .unwrap();
    let output_dir = dir.join("artifacts");

    let output = switchport()
        .args([
            "run",
            "-s",
            script_path.to_str().unwrap(),
            "--output-dir",
            output_dir.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let result: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(output_dir.join("result.json")).unwrap())
            .unwrap();
    assert_eq!(result["board"]["name"], "relocated");
    assert_eq!(result["snapshot"]["devices"]["tx"]["tx"], "ok");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_hex2v() {
    let dir = temp_dir("hex2v");
    let hex_path = dir.join("image.hex");
    std::fs::write(
        &hex_path,
        ":0800000000010020410000002E\n:00000001FF\n",
    )
    .unwrap();

    let output = switchport()
        .args(["hex2v", hex_path.to_str().unwrap(), "4"])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout, "00010020\n41000000\n");

    let output = switchport()
        .args(["hex2v", hex_path.to_str().unwrap(), "4", "--memory"])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        stdout,
        "memory[0] = 32'h00010020;\nmemory[1] = 32'h41000000;\n"
    );

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_rejects_board_past_end_of_address_space() {
    let dir = temp_dir("wrap");
    std::fs::write(
        dir.join("board.yaml"),
        r#"
name: "wrap"
devices:
  - id: "sw"
    type: input_port
    base_address: 18446744073709551612
"#,
    )
    .unwrap();
    let script_path = dir.join("scenario.yaml");
    std::fs::write(
        &script_path,
        r#"
schema_version: "1.0"
board: "board.yaml"
limits:
  max_steps: 10
"#,
    )
    .unwrap();

    let output = switchport()
        .args(["run", "--script", script_path.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_hex2v_elf() {
    let dir = temp_dir("hex2v-elf");
    let elf_path = dir.join("image.elf");
    std::fs::write(&elf_path, thumb_elf()).unwrap();

    let output = switchport()
        .args(["hex2v", elf_path.to_str().unwrap(), "4"])
        .output()
        .expect("Failed to execute command");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "00010020\n41000000\n");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_hex2v_missing_file() {
    let output = switchport()
        .args(["hex2v", "missing.hex", "4"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
}
