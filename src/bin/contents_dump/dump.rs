use std::io::{self, BufRead, BufWriter, Write};

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use indoc::indoc;
use svr4_contents::{ContentsEntry, ContentsParser, DEFAULT_CONTENTS_PATH, ParserSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Line,
    Json,
    Jsonl,
    Long,
}

impl OutputFormat {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "line" => Some(OutputFormat::Line),
            "json" => Some(OutputFormat::Json),
            "jsonl" => Some(OutputFormat::Jsonl),
            "long" => Some(OutputFormat::Long),
            _ => None,
        }
    }
}

pub fn command() -> Command {
    Command::new("dump")
        .about("Print the entries of a contents file")
        .arg(
            Arg::new("input")
                .value_name("INPUT")
                .default_value(DEFAULT_CONTENTS_PATH)
                .help("Contents file to read, `-` reads from stdin."),
        )
        .arg(
            Arg::new("format")
                .short('o')
                .long("format")
                .value_parser(["line", "json", "jsonl", "long"])
                .default_value("line")
                .help("Sets the output format")
                .long_help(indoc!(r#"
                    Sets the output format:
                        "line"  - re-serialized contents(4) lines.
                        "json"  - a single JSON array of entries.
                        "jsonl" - one JSON object per line.
                        "long"  - a human readable listing.
                "#)),
        )
        .arg(
            Arg::new("package")
                .short('p')
                .long("package")
                .value_name("NAME")
                .action(ArgAction::Append)
                .help("Only print entries owned by this package. Can be passed multiple times."),
        )
        .arg(
            Arg::new("skip-invalid")
                .long("skip-invalid")
                .action(ArgAction::SetTrue)
                .help("Log and skip lines that fail to parse instead of aborting."),
        )
}

pub fn run(matches: &ArgMatches) -> Result<()> {
    let input = matches
        .get_one::<String>("input")
        .expect("has a default value");
    let format = matches
        .get_one::<String>("format")
        .and_then(|name| OutputFormat::from_name(name))
        .expect("possible values are restricted");
    let packages: Vec<String> = matches
        .get_many::<String>("package")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let settings = ParserSettings::new().skip_invalid(matches.get_flag("skip-invalid"));

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if input == "-" {
        let parser = ContentsParser::from_reader(io::stdin().lock()).with_configuration(settings);
        dump_entries(parser, format, &packages, &mut out)
    } else {
        let parser = ContentsParser::from_path(input)
            .with_context(|| format!("Failed to read contents file {}", input))?
            .with_configuration(settings);
        dump_entries(parser, format, &packages, &mut out)
    }
}

fn dump_entries<R: BufRead, W: Write>(
    parser: ContentsParser<R>,
    format: OutputFormat,
    packages: &[String],
    out: &mut W,
) -> Result<()> {
    let mut collected = vec![];

    for entry in parser.entries() {
        let entry = entry?;
        if !packages.is_empty() && !packages.iter().any(|name| entry.package(name).is_some()) {
            continue;
        }

        match format {
            OutputFormat::Line => writeln!(out, "{}", entry)?,
            OutputFormat::Jsonl => {
                serde_json::to_writer(&mut *out, &entry)?;
                writeln!(out)?;
            }
            OutputFormat::Long => writeln!(out, "{}", long_listing(&entry)?)?,
            OutputFormat::Json => collected.push(entry),
        }
    }

    if format == OutputFormat::Json {
        serde_json::to_writer_pretty(&mut *out, &collected)?;
        writeln!(out)?;
    }

    out.flush()?;
    Ok(())
}

/// `ls -l` style rendering of an entry.
fn long_listing(entry: &ContentsEntry) -> Result<String> {
    let mode = entry
        .mode()
        .map(|m| format!("{:04o}", m))
        .unwrap_or_else(|| "-".to_owned());
    let size = entry
        .size()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_owned());
    let mtime = match entry.mtime() {
        Some(secs) => jiff::Timestamp::from_second(secs)
            .with_context(|| format!("Invalid modification time for {}", entry.path))?
            .to_string(),
        None => "-".to_owned(),
    };

    let mut name = entry.path.clone();
    if let Some(target) = entry.link_target() {
        name.push_str(" -> ");
        name.push_str(target);
    }

    let packages: Vec<String> = entry.packages.iter().map(ToString::to_string).collect();

    Ok(format!(
        "{} {:>4} {:<8} {:<8} {:>10} {:<20} {} [{}]",
        entry.file_type(),
        mode,
        entry.owner().unwrap_or("-"),
        entry.group().unwrap_or("-"),
        size,
        mtime,
        name,
        packages.join(" ")
    ))
}
