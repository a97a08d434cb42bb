// src/bin/poll.rs

use el_listen::cli::{self, PollArgs};
use el_listen::{logging, report_error, run_poll};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: PollArgs = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("poll: {err:?}");
    }

    if let Err(err) = run_poll(args).await {
        report_error("poll", &err);
        std::process::exit(err.exit_code());
    }
}
