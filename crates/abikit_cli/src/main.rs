use std::process::ExitCode;

use abikit_cli::{ArgsUpdateAbi, derive_exit_code, init_logging, run};
use anyhow::Context;
use clap::Parser;

/// Setup errors (bad config, unusable log filter) exit with this status.
const N_EXIT_SETUP_ERROR: u8 = 2;

fn main() -> ExitCode {
    let args = ArgsUpdateAbi::parse();
    match try_main(&args) {
        Ok(n_exit) => ExitCode::from(n_exit),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(N_EXIT_SETUP_ERROR)
        }
    }
}

fn try_main(args: &ArgsUpdateAbi) -> anyhow::Result<u8> {
    init_logging(args.log_level.as_deref())?;
    let path_dir_cwd = std::env::current_dir().context("Failed to resolve working directory")?;

    let mut stdout = std::io::stdout().lock();
    let report = run(args, &path_dir_cwd, &mut stdout)?;
    Ok(derive_exit_code(&report, args.strict))
}
