use std::path::PathBuf;

use clap::Parser;

/// `taskmaster -c <path.yml>`: the single supported invocation (§6).
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(short, long, default_value_t = String::from("/etc/taskmaster/taskmaster.yaml"))]
    config: String,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn config_path(&self) -> PathBuf {
        PathBuf::from(&self.config)
    }
}
