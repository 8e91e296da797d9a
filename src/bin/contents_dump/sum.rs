use std::fs::File;
use std::io;

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use indoc::indoc;
use svr4_contents::LegacySum;

const BLOCK_SIZE: u64 = 512;

pub fn command() -> Command {
    Command::new("sum")
        .about("Print the legacy checksum and block count of files")
        .long_about(indoc!(r#"
            Print the legacy checksum and block count of files.

            This is the value recorded in the checksum column of `e`, `f` and
            `v` entries. Each output line holds the checksum, the number of
            512-byte blocks and the file name. The checksum keeps the low 16
            bits of the byte total, so it differs from SysV sum(1) once the
            total exceeds 0xffff.
        "#))
        .arg(
            Arg::new("files")
                .value_name("FILE")
                .num_args(1..)
                .default_value("-")
                .help("Files to sum, `-` reads from stdin."),
        )
}

pub fn run(matches: &ArgMatches) -> Result<()> {
    for name in matches.get_many::<String>("files").expect("has a default value") {
        let mut hasher = LegacySum::new();
        let read = if name == "-" {
            hasher.update_from_reader(io::stdin().lock())
        } else {
            File::open(name).and_then(|f| hasher.update_from_reader(f))
        };
        let len = read.with_context(|| format!("Failed to read {}", name))?;

        let blocks = len.div_ceil(BLOCK_SIZE);
        if name == "-" {
            println!("{} {}", hasher.finalize(), blocks);
        } else {
            println!("{} {} {}", hasher.finalize(), blocks, name);
        }
    }

    Ok(())
}
