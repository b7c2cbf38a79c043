use std::sync::Arc;

use taskmaster::cli::Cli;
use taskmaster::logging::Logging;
use taskmaster::shell;
use taskmaster::supervisor::context::SupervisorContext;
use taskmaster::supervisor::Supervisor;

fn main() {
    let cli = Cli::parse_args();

    let _log_guard = match Logging::try_init() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let supervisor = Arc::new(Supervisor::load_config(cli.config_path()));
    let stop_event = SupervisorContext::new();

    let monitor = {
        let supervisor = Arc::clone(&supervisor);
        let stop_event = stop_event.clone();
        std::thread::spawn(move || supervisor.supervise(&stop_event))
    };

    if let Err(e) = shell::run(Arc::clone(&supervisor), stop_event.clone()) {
        eprintln!("{e}");
    }

    let _ = stop_event.cancel_all();
    let _ = monitor.join();
}
