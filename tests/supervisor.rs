use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use taskmaster::process::TaskState;
use taskmaster::supervisor::context::SupervisorContext;
use taskmaster::Supervisor;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn spawn_monitor(supervisor: Arc<Supervisor>) -> (SupervisorContext, std::thread::JoinHandle<()>) {
    let stop_event = SupervisorContext::new();
    let handle = {
        let supervisor = Arc::clone(&supervisor);
        let stop_event = stop_event.clone();
        std::thread::spawn(move || supervisor.supervise(&stop_event))
    };
    (stop_event, handle)
}

fn shutdown_monitor(stop_event: SupervisorContext, handle: std::thread::JoinHandle<()>) {
    let _ = stop_event.cancel_all();
    let _ = handle.join();
}

/// Scenario 1: happy start, monitor transitions web to RUNNING.
#[test]
fn happy_start_reaches_running() {
    let config = write_config(
        r#"
programs:
  web:
    cmd: "/bin/sleep 60"
    autostart: false
    numprocs: 1
    starttime: 1
"#,
    );

    let supervisor = Arc::new(Supervisor::load_config(config.path()));
    let (stop_event, handle) = spawn_monitor(Arc::clone(&supervisor));

    supervisor.start(&["web".to_string()]);
    assert_eq!(supervisor.task_state("web"), Some(TaskState::Running));

    supervisor.stop(&["web".to_string()]);
    assert_eq!(supervisor.task_state("web"), Some(TaskState::Stopped));

    shutdown_monitor(stop_event, handle);
}

/// Scenario 3: graceful stop escalates to kill once stoptime elapses.
#[test]
fn stop_escalates_to_kill_after_stoptime() {
    let config = write_config(
        r#"
programs:
  slow:
    cmd: "/bin/sh -c 'trap : TERM; sleep 100'"
    autostart: false
    stopsignal: TERM
    stoptime: 1
    starttime: 0
"#,
    );

    let supervisor = Arc::new(Supervisor::load_config(config.path()));
    let (stop_event, handle) = spawn_monitor(Arc::clone(&supervisor));

    supervisor.start(&["slow".to_string()]);
    assert_eq!(supervisor.task_state("slow"), Some(TaskState::Running));

    supervisor.stop(&["slow".to_string()]);
    assert_eq!(supervisor.task_state("slow"), Some(TaskState::Stopped));

    shutdown_monitor(stop_event, handle);
}

/// Scenario 5: replica addressing — stopping one replica leaves others
/// running.
#[test]
fn replica_addressing_targets_one_task() {
    let config = write_config(
        r#"
programs:
  w:
    cmd: "/bin/sleep 60"
    autostart: false
    numprocs: 3
    starttime: 0
"#,
    );

    let supervisor = Arc::new(Supervisor::load_config(config.path()));
    let (stop_event, handle) = spawn_monitor(Arc::clone(&supervisor));

    assert_eq!(
        supervisor.replica_names("w"),
        vec!["w:0".to_string(), "w:1".to_string(), "w:2".to_string()]
    );

    supervisor.start(&["all".to_string()]);
    std::thread::sleep(Duration::from_millis(200));
    for name in ["w:0", "w:1", "w:2"] {
        assert_eq!(supervisor.task_state(name), Some(TaskState::Running));
    }

    supervisor.stop(&["w:1".to_string()]);
    assert_eq!(supervisor.task_state("w:1"), Some(TaskState::Stopped));
    assert_eq!(supervisor.task_state("w:0"), Some(TaskState::Running));
    assert_eq!(supervisor.task_state("w:2"), Some(TaskState::Running));

    shutdown_monitor(stop_event, handle);
}

/// P3: autorestart=never and an unexpected exit code reaches FATAL and
/// stays there until an explicit start.
#[test]
fn never_restart_reaches_fatal_and_stays() {
    let config = write_config(
        r#"
programs:
  bad:
    cmd: "/bin/false"
    autostart: false
    autorestart: never
    startretries: 0
    starttime: 0
"#,
    );

    let supervisor = Arc::new(Supervisor::load_config(config.path()));
    let (stop_event, handle) = spawn_monitor(Arc::clone(&supervisor));

    supervisor.start(&["bad".to_string()]);
    std::thread::sleep(Duration::from_millis(700));
    assert_eq!(supervisor.task_state("bad"), Some(TaskState::Fatal));

    shutdown_monitor(stop_event, handle);
}
