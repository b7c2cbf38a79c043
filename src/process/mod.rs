pub mod backoff;
pub mod error;
pub mod group;
pub mod handle;
pub mod state;
pub mod task;

pub use error::ProcessError;
pub use group::{merge_all, OpResult, Program};
pub use state::TaskState;
pub use task::{StartError, StopError, Task};
