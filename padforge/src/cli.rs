use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

/// Source tree readers.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Format {
    Yaml,
    Json,
}

/// CLI options for the padforge binary.
#[derive(Parser, Debug)]
#[command(author, about, version)]
pub struct Options {
    /// Source document [default: stdin]
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Output VDF file [default: stdout]
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Expected format of the source document
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub format: Format,

    /// Parse and compile, but discard the output
    #[arg(long)]
    pub check: bool,

    /// Reduces the level of verbosity (the min level is -qq)
    #[arg(short, conflicts_with = "verbose", action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Increases the level of verbosity (the max level is -vvv)
    #[arg(short, conflicts_with = "quiet", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Options {
    pub fn log_level(&self) -> LevelFilter {
        match (self.quiet, self.verbose) {
            (1, _) => LevelFilter::Error,
            (q, _) if q >= 2 => LevelFilter::Off,
            (_, 0) => LevelFilter::Warn,
            (_, 1) => LevelFilter::Info,
            (_, 2) => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(Options::parse_from(["padforge"]).log_level(), LevelFilter::Warn);
        assert_eq!(Options::parse_from(["padforge", "-v"]).log_level(), LevelFilter::Info);
        assert_eq!(
            Options::parse_from(["padforge", "-vvv"]).log_level(),
            LevelFilter::Trace
        );
        assert_eq!(Options::parse_from(["padforge", "-q"]).log_level(), LevelFilter::Error);
        assert_eq!(Options::parse_from(["padforge", "-qq"]).log_level(), LevelFilter::Off);
    }

    #[test]
    fn format_defaults_to_yaml() {
        let options = Options::parse_from(["padforge"]);
        assert_eq!(options.format, Format::Yaml);
        let options = Options::parse_from(["padforge", "--format", "json"]);
        assert_eq!(options.format, Format::Json);
    }
}
