// src/bin/dispatch.rs

use el_listen::cli::{self, DispatchArgs};
use el_listen::{logging, report_error, run_dispatch};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: DispatchArgs = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("dispatch: {err:?}");
    }

    match run_dispatch(args).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            report_error("dispatch", &err);
            std::process::exit(err.exit_code());
        }
    }
}
