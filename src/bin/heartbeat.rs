// src/bin/heartbeat.rs

use el_listen::cli::{self, HeartbeatArgs};
use el_listen::{logging, report_error, run_heartbeat};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: HeartbeatArgs = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("heartbeat: {err:?}");
    }

    if let Err(err) = run_heartbeat(args).await {
        report_error("heartbeat", &err);
        std::process::exit(err.exit_code());
    }
}
