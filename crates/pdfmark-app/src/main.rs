//! Main application entry point (native).

#[cfg(feature = "native")]
fn main() -> std::process::ExitCode {
    use pdfmark_app::{App, AppError};
    use std::process::ExitCode;

    env_logger::init();
    log::debug!("Starting pdfmark");

    match App::run(std::env::args_os()) {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        // Prints help or the usage error and exits with clap's status.
        Err(AppError::Cli(e)) => e.exit(),
        Err(e) => {
            log::error!("{e}");
            eprintln!("pdfmark: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(feature = "native"))]
fn main() {
    panic!("Native feature not enabled. Use `cargo run --features native`");
}
