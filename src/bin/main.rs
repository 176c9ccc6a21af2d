//! Entry point: parse the backend executable path, initialize logging,
//! hand off to the supervisor (§6, §4.7).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use oclsp_proxy::env::Env;
use oclsp_proxy::{logging, supervisor};

/// Bridges a classical LSP host to a cpptools-dialect C/C++ language
/// server backend, reusing the backend's IntelliSense for a related
/// C-like language.
#[derive(Parser)]
#[command(name = "oclsp-proxy")]
#[command(version)]
struct Cli {
    /// Path to the backend language-server executable.
    backend_exe: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let env = Env::from_process();
    logging::init(&env);

    match supervisor::run(env, &cli.backend_exe) {
        Ok(Some(status)) => {
            log::info!(target: "oclsp_proxy::main", "backend exited with {status}");
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!(target: "oclsp_proxy::main", "{e}");
            eprintln!("oclsp-proxy: {e}");
            ExitCode::FAILURE
        }
    }
}
