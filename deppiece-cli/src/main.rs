use std::io::stdout;

use anyhow::{Context, Result};
use clap::{crate_version, value_parser, Arg, Command};
use clap_complete::{generate, Shell};

pub mod io;

pub mod progress;

mod subcommands;

pub mod traits;
use traits::DepPieceApp;

fn main() -> Result<()> {
    // Known subapplications.
    let apps = vec![
        subcommands::AlignApp::app(),
        subcommands::FilterLenApp::app(),
    ];

    env_logger::init();

    let cli = Command::new("deppiece")
        .dont_collapse_args_in_usage(true)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .about("Align dependency annotations with subword pieces")
        .version(crate_version!())
        .subcommands(apps)
        .subcommand(
            Command::new("completions")
                .about("Generate completion scripts for your shell")
                .arg_required_else_help(true)
                .arg(Arg::new("shell").value_parser(value_parser!(Shell))),
        );
    let matches = cli.clone().get_matches();

    match matches.subcommand() {
        Some(("align", matches)) => subcommands::AlignApp::parse(matches)?.run(),
        Some(("completions", matches)) => {
            let shell = matches
                .get_one::<Shell>("shell")
                .copied()
                .context("No shell given")?;
            write_completion_script(cli, shell);
            Ok(())
        }
        Some(("filter-len", matches)) => subcommands::FilterLenApp::parse(matches)?.run(),
        _unknown => unreachable!(),
    }
}

fn write_completion_script(mut cli: Command, shell: Shell) {
    generate(shell, &mut cli, "deppiece", &mut stdout());
}
