use std::io::Write;

use taskmaster::config::loader::ConfigLoaderFile;
use taskmaster::config::ConfigError;

fn load(contents: &str) -> Result<std::collections::HashMap<String, taskmaster::ProgramSpec>, ConfigError> {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    ConfigLoaderFile::new(file.path()).load()
}

#[test]
fn rejects_numprocs_zero() {
    let err = load(
        r#"
programs:
  web:
    cmd: "/bin/true"
    numprocs: 0
"#,
    );
    assert!(matches!(err, Err(ConfigError::Validation { .. })));
}

#[test]
fn rejects_reserved_name_all_at_document_level() {
    let err = load(
        r#"
programs:
  all:
    cmd: "/bin/true"
"#,
    );
    assert!(matches!(err, Err(ConfigError::Validation { .. })));
}

#[test]
fn rejects_colon_in_name_at_document_level() {
    let err = load(
        r#"
programs:
  "web:0":
    cmd: "/bin/true"
"#,
    );
    assert!(matches!(err, Err(ConfigError::Validation { .. })));
}

#[test]
fn env_entries_are_carried_into_the_validated_spec() {
    let programs = load(
        r#"
programs:
  web:
    cmd: "/bin/true"
    env:
      FOO: bar
      BAZ: qux
"#,
    )
    .unwrap();
    let web = &programs["web"];
    assert_eq!(web.env.get("FOO"), Some(&"bar".to_string()));
    assert_eq!(web.env.get("BAZ"), Some(&"qux".to_string()));
}

#[test]
fn multiple_programs_validate_independently() {
    let programs = load(
        r#"
programs:
  web:
    cmd: "/bin/sleep 60"
    numprocs: 2
  worker:
    cmd: "/bin/true"
    autorestart: always
"#,
    )
    .unwrap();
    assert_eq!(programs["web"].numprocs, 2);
    assert_eq!(programs["worker"].autorestart, taskmaster::config::AutoRestart::Always);
}

#[test]
fn empty_document_without_programs_section_is_rejected() {
    let err = load("foo: 1\n");
    assert!(matches!(err, Err(ConfigError::MissingProgramsSection)));
}
