use clap::{Arg, ArgAction, Command};
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use std::process::exit;

mod dump;
mod stat;
mod sum;

fn verbosity(occurrences: u8) -> Option<LevelFilter> {
    match occurrences {
        0 => None,
        1 => Some(LevelFilter::Info),
        2 => Some(LevelFilter::Debug),
        3 => Some(LevelFilter::Trace),
        _ => {
            eprintln!("using more than -vvv does not affect verbosity level");
            Some(LevelFilter::Trace)
        }
    }
}

fn try_to_initialize_logging(level: Option<LevelFilter>) {
    if let Some(level) = level {
        let config = ConfigBuilder::new().set_time_level(LevelFilter::Off).build();
        if let Err(e) = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto) {
            eprintln!("Failed to initialize logging: {}", e);
        }
    }
}

fn main() {
    let matches = Command::new("contents_dump")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Utility to read and write SVR4 package contents(4) files")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .global(true)
                .help("-v - info, -vv - debug, -vvv - trace."),
        )
        .subcommand(dump::command())
        .subcommand(stat::command())
        .subcommand(sum::command())
        .get_matches();

    try_to_initialize_logging(verbosity(matches.get_count("verbose")));

    let result = match matches.subcommand() {
        Some(("dump", sub)) => dump::run(sub),
        Some(("stat", sub)) => stat::run(sub),
        Some(("sum", sub)) => sum::run(sub),
        _ => unreachable!("a subcommand is required"),
    };

    if let Err(e) = result {
        eprintln!("{:#}", e);
        exit(1);
    }
}
