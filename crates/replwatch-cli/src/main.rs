use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use replwatch_cli::{Cli, app, logging};
use replwatch_core::Verdict;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => {
                    println!("Unknown - invalid invocation, see --help");
                    ExitCode::from(Verdict::Unknown.exit_code())
                }
            };
        }
    };

    logging::init(cli.verbose, cli.debug);

    match app::run(&cli) {
        Ok(report) => {
            println!("{report}");
            ExitCode::from(report.exit_code())
        }
        Err(err) => {
            println!("Unknown - {err:#}");
            ExitCode::from(Verdict::Unknown.exit_code())
        }
    }
}
