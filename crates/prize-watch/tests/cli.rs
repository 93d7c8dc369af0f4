use std::process::Command;

#[test]
fn missing_machine_id_prints_help_and_exits_nonzero() {
    let output = Command::new(env!("CARGO_BIN_EXE_prize-watch"))
        .output()
        .expect("binary runs");
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--machine-id"));
}

#[test]
fn list_backends_exits_zero() {
    let output = Command::new(env!("CARGO_BIN_EXE_prize-watch"))
        .arg("--list-backends")
        .output()
        .expect("binary runs");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("available backends"));
}
