// src/bin/file_change.rs

use el_listen::cli::{self, FileChangeArgs};
use el_listen::{logging, report_error, run_file_change};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: FileChangeArgs = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("file-change: {err:?}");
    }

    if let Err(err) = run_file_change(args).await {
        report_error("file-change", &err);
        std::process::exit(err.exit_code());
    }
}
