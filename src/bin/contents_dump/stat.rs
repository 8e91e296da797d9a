use anyhow::{Result, bail};
use clap::{Arg, ArgAction, ArgMatches, Command};
use svr4_contents::{DEFAULT_INSTALL_CLASS, PackageRef};

pub fn command() -> Command {
    Command::new("stat")
        .about("Print contents lines describing objects on the local filesystem")
        .arg(
            Arg::new("paths")
                .value_name("PATH")
                .required(true)
                .num_args(1..)
                .help("Filesystem objects to describe. Symlinks are not followed."),
        )
        .arg(
            Arg::new("install-class")
                .short('c')
                .long("install-class")
                .value_name("CLASS")
                .default_value(DEFAULT_INSTALL_CLASS)
                .help("Install class recorded in the entries."),
        )
        .arg(
            Arg::new("display-path")
                .long("display-path")
                .value_name("PATH")
                .help("Path recorded in the entry instead of PATH. Requires a single PATH."),
        )
        .arg(
            Arg::new("package")
                .short('p')
                .long("package")
                .value_name("NAME")
                .action(ArgAction::Append)
                .help(
                    "Package owning the entries, optionally with a status prefix. \
                     Can be passed multiple times.",
                ),
        )
}

pub fn run(matches: &ArgMatches) -> Result<()> {
    let paths: Vec<&String> = matches
        .get_many::<String>("paths")
        .expect("this is a required argument")
        .collect();
    let display_path = matches.get_one::<String>("display-path");

    if display_path.is_some() && paths.len() > 1 {
        bail!("`--display-path` can only be used with a single PATH");
    }

    imp::run(matches, &paths, display_path)
}

#[cfg(unix)]
mod imp {
    use super::*;
    use anyhow::Context;
    use log::warn;
    use svr4_contents::{ContentsEntry, EntryOptions, FsMetadataProvider};

    pub(super) fn run(
        matches: &ArgMatches,
        paths: &[&String],
        display_path: Option<&String>,
    ) -> Result<()> {
        let install_class = matches
            .get_one::<String>("install-class")
            .expect("has a default value");
        let packages: Vec<PackageRef> = matches
            .get_many::<String>("package")
            .map(|values| values.map(|token| PackageRef::decode(token)).collect())
            .unwrap_or_default();

        let provider = FsMetadataProvider::new();

        for path in paths {
            let mut options = EntryOptions::new()
                .install_class(install_class.as_str())
                .packages(packages.iter().cloned());
            if let Some(display_path) = display_path {
                options = options.display_path(display_path.as_str());
            }

            let entry = ContentsEntry::from_metadata(&provider, path.as_str(), options)
                .with_context(|| format!("Failed to describe {}", path))?;

            if !entry.is_valid() {
                warn!("Entry for {} does not form a valid contents line", entry.path);
            }
            println!("{}", entry);
        }

        Ok(())
    }
}

#[cfg(not(unix))]
mod imp {
    use super::*;

    pub(super) fn run(
        _matches: &ArgMatches,
        _paths: &[&String],
        _display_path: Option<&String>,
    ) -> Result<()> {
        bail!("Reading filesystem metadata is only supported on unix platforms");
    }
}
