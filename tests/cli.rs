use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Duration;

use assert_cmd::cargo::cargo_bin;

#[test]
fn missing_config_file_exits_with_failure() {
    let mut child = Command::new(cargo_bin("taskmaster"))
        .arg("--config")
        .arg("/no/such/taskmaster.yaml")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    let status = child.wait().unwrap();
    assert!(!status.success());
}

#[test]
fn valid_config_with_closed_stdin_shuts_down_cleanly() {
    let mut config = tempfile::NamedTempFile::new().unwrap();
    write!(config, "programs: {{}}\n").unwrap();

    let mut child = Command::new(cargo_bin("taskmaster"))
        .arg("--config")
        .arg(config.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    // Closing stdin immediately trips the shell's EOF branch, which runs
    // `shutdown()` and cancels the monitor loop.
    drop(child.stdin.take());

    let start = std::time::Instant::now();
    loop {
        if let Some(status) = child.try_wait().unwrap() {
            assert!(status.success());
            return;
        }
        if start.elapsed() > Duration::from_secs(5) {
            let _ = child.kill();
            panic!("taskmaster did not exit within 5s of stdin EOF");
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}
