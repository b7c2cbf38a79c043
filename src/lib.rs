pub mod cli;
pub mod config;
pub mod logging;
pub mod process;
pub mod shell;
pub mod supervisor;

pub use config::ProgramSpec;
pub use process::{Program, Task, TaskState};
pub use supervisor::Supervisor;
