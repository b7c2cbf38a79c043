//! Normalizes a [`RawProgramSpec`] into a validated [`ProgramSpec`], the way
//! the original `validate.py` walks each declared field in turn, applying
//! documented defaults and rejecting malformed values before any process is
//! ever spawned.

use std::collections::HashMap;
use std::path::Path;

use super::{AutoRestart, ConfigError, ProgramSpec, RawProgramSpec, Sink, StopSignal};

const RESERVED_NAME: &str = "all";

pub fn validate_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::validation(name, "name must not be empty"));
    }
    if name == RESERVED_NAME {
        return Err(ConfigError::validation(
            name,
            "'all' is a reserved name and cannot be used for a program",
        ));
    }
    if name.contains(':') {
        return Err(ConfigError::validation(
            name,
            "name must not contain ':'",
        ));
    }
    Ok(())
}

pub fn validate(name: &str, raw: RawProgramSpec) -> Result<ProgramSpec, ConfigError> {
    validate_name(name)?;

    let argv = validate_cmd(name, raw.cmd)?;
    let numprocs = raw.numprocs.unwrap_or(1);
    if numprocs < 1 {
        return Err(ConfigError::validation(name, "numprocs must be >= 1"));
    }

    let umask = validate_umask(name, raw.umask.unwrap_or_else(|| "022".to_string()))?;
    let workingdir = validate_workingdir(name, raw.workingdir)?;
    let autostart = raw.autostart.unwrap_or(true);
    let autorestart = validate_autorestart(name, raw.autorestart)?;
    let exitcodes = validate_exitcodes(name, raw.exitcodes.unwrap_or_else(|| vec![0]))?;
    let startretries = raw.startretries.unwrap_or(3);
    let starttime = raw.starttime.unwrap_or(1);
    let stopsignal = validate_stopsignal(name, raw.stopsignal.unwrap_or_else(|| "TERM".to_string()))?;
    let stoptime = raw.stoptime.unwrap_or(10);
    let stdout = validate_sink(name, raw.stdout)?;
    let stderr = validate_sink(name, raw.stderr)?;
    let env = raw.env.unwrap_or_default();

    Ok(ProgramSpec {
        name: name.to_string(),
        argv,
        numprocs,
        umask,
        workingdir,
        autostart,
        autorestart,
        exitcodes,
        startretries,
        starttime,
        stopsignal,
        stoptime,
        stdout,
        stderr,
        env,
    })
}

fn validate_cmd(name: &str, cmd: Option<String>) -> Result<Vec<String>, ConfigError> {
    let cmd = cmd.ok_or_else(|| ConfigError::validation(name, "'cmd' is required"))?;
    let argv = shlex::split(&cmd)
        .ok_or_else(|| ConfigError::validation(name, "'cmd' is not a valid shell command line"))?;
    if argv.is_empty() {
        return Err(ConfigError::validation(name, "'cmd' must not be empty"));
    }
    Ok(argv)
}

fn validate_umask(name: &str, umask: String) -> Result<String, ConfigError> {
    if umask.is_empty() || umask.len() > 3 || !umask.chars().all(|c| ('0'..='7').contains(&c)) {
        return Err(ConfigError::validation(
            name,
            "'umask' must be 1-3 octal digits (0-7)",
        ));
    }
    let value = u32::from_str_radix(&umask, 8)
        .map_err(|_| ConfigError::validation(name, "'umask' is not valid octal"))?;
    if value > 0o777 {
        return Err(ConfigError::validation(name, "'umask' out of range"));
    }
    Ok(umask)
}

fn validate_workingdir(name: &str, workingdir: Option<String>) -> Result<String, ConfigError> {
    let workingdir = match workingdir {
        Some(dir) => dir,
        None => std::env::current_dir()
            .map_err(|e| ConfigError::validation(name, format!("cannot resolve $PWD: {e}")))?
            .to_string_lossy()
            .into_owned(),
    };

    let path = Path::new(&workingdir);
    let metadata = std::fs::metadata(path).map_err(|_| {
        ConfigError::validation(
            name,
            format!("'workingdir' {workingdir} does not exist"),
        )
    })?;
    if !metadata.is_dir() {
        return Err(ConfigError::validation(
            name,
            format!("'workingdir' {workingdir} is not a directory"),
        ));
    }
    if metadata.permissions().readonly() {
        return Err(ConfigError::validation(
            name,
            format!("'workingdir' {workingdir} is not writable"),
        ));
    }
    Ok(workingdir)
}

fn validate_autorestart(name: &str, value: Option<String>) -> Result<AutoRestart, ConfigError> {
    match value.as_deref().unwrap_or("never") {
        "never" => Ok(AutoRestart::Never),
        "always" => Ok(AutoRestart::Always),
        "unexpected" => Ok(AutoRestart::Unexpected),
        other => Err(ConfigError::validation(
            name,
            format!("'autorestart' must be one of never/always/unexpected, got '{other}'"),
        )),
    }
}

fn validate_exitcodes(name: &str, codes: Vec<i32>) -> Result<Vec<i32>, ConfigError> {
    for &code in &codes {
        if !(0..=255).contains(&code) {
            return Err(ConfigError::validation(
                name,
                format!("'exitcodes' entry {code} out of range 0..255"),
            ));
        }
    }
    Ok(codes)
}

fn validate_stopsignal(name: &str, value: String) -> Result<StopSignal, ConfigError> {
    match value.to_uppercase().as_str() {
        "TERM" => Ok(StopSignal::Term),
        "INT" => Ok(StopSignal::Int),
        "HUP" => Ok(StopSignal::Hup),
        "KILL" => Ok(StopSignal::Kill),
        "USR1" => Ok(StopSignal::Usr1),
        "USR2" => Ok(StopSignal::Usr2),
        "QUIT" => Ok(StopSignal::Quit),
        other => Err(ConfigError::validation(
            name,
            format!("'stopsignal' unknown signal name '{other}'"),
        )),
    }
}

fn validate_sink(name: &str, path: Option<String>) -> Result<Sink, ConfigError> {
    match path {
        None => Ok(Sink::Discard),
        Some(path) => {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| {
                    ConfigError::validation(name, format!("cannot open '{path}' for append: {e}"))
                })?;
            Ok(Sink::Path(path))
        }
    }
}

/// Validates every entry of a parsed config document, collecting the full
/// program table. Mirrors `Supervisor.load_config`'s "refuse names
/// containing ':' or equal to 'all'" pass plus per-entry validation.
pub fn validate_all(
    raw: HashMap<String, RawProgramSpec>,
) -> Result<HashMap<String, ProgramSpec>, ConfigError> {
    let mut programs = HashMap::with_capacity(raw.len());
    for (name, raw_spec) in raw {
        let spec = validate(&name, raw_spec)?;
        programs.insert(name, spec);
    }
    Ok(programs)
}
