use std::{fs, path::PathBuf, process::Command};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("sunfield_cli_{name}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

#[test]
fn bundled_farm_runs_and_saves() {
    let dir = scratch_dir("bundled");
    let output = Command::new(env!("CARGO_BIN_EXE_sunfield"))
        .args(["--turns", "3", "--seed", "9", "--save", "--save-dir"])
        .arg(&dir)
        .output()
        .expect("failed to run sunfield");

    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("saved to slot 0"), "got: {stdout}");
    assert!(stdout.contains("turn 3"), "got: {stdout}");
    assert!(dir.join("game_save_0.sav").exists());
    assert!(dir.join("game_autosave.sav").exists());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn invalid_config_exits_with_failure() {
    let dir = scratch_dir("invalid");
    let config = dir.join("farm.txt");
    fs::write(&config, "0\n4\n2\n0.5\n10\n").expect("write config");

    let output = Command::new(env!("CARGO_BIN_EXE_sunfield"))
        .arg("--config")
        .arg(&config)
        .arg("--save-dir")
        .arg(&dir)
        .output()
        .expect("failed to run sunfield");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid startup configuration"), "got: {stderr}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn empty_slot_is_reported() {
    let dir = scratch_dir("empty_slot");
    let output = Command::new(env!("CARGO_BIN_EXE_sunfield"))
        .args(["--load-slot", "4", "--save-dir"])
        .arg(&dir)
        .output()
        .expect("failed to run sunfield");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("slot 4 is empty"));

    let _ = fs::remove_dir_all(&dir);
}
