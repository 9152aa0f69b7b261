use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Split a packed key-value column of a CSV file into several columns",
    long_about = "Takes every file matching the source pattern and splits the target column.\n\
                  Discovered sub-columns are appended, sorted by name, after the last column."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Split the target column of every matching file into new columns
    Split(SplitArgs),
    /// Show the resolved configuration or freeze it into the config file
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct SplitArgs {
    #[command(flatten)]
    pub options: SplitOptions,
    /// Only process the first matching file
    #[arg(long = "first-only")]
    pub first_only: bool,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub options: SplitOptions,
    /// Print the resolved configuration as YAML (default when no action is given)
    #[arg(short = 's', long)]
    pub show: bool,
    /// Write the resolved configuration to the config file
    #[arg(short = 'f', long)]
    pub freeze: bool,
}

/// Options shared by every command. Each one is optional so values from the
/// config file only get overridden by flags that were actually passed.
#[derive(Debug, Clone, Default, Args)]
pub struct SplitOptions {
    /// Config file (defaults to csv-col-splitter.yaml in the current directory)
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Directory searched for input files (defaults to the current directory)
    #[arg(short = 'w', long = "work-dir")]
    pub work_dir: Option<PathBuf>,
    /// File name pattern to process (defaults to *.csv)
    #[arg(short = 'p', long = "source-pattern")]
    pub source_pattern: Option<String>,
    /// Treat the first line as headers (defaults to true)
    #[arg(long = "with-headers")]
    pub with_headers: Option<bool>,
    /// Column holding the packed values, counted from 1
    #[arg(short = 't', long = "target-col")]
    pub target_col: Option<i64>,
    /// Column separator (supports ';', ',', 'tab', '|')
    #[arg(long = "col-separator", value_parser = parse_delimiter)]
    pub col_separator: Option<u8>,
    /// Delimiter between sub-columns inside the target column
    #[arg(short = 'd', long = "subcol-delimiter")]
    pub subcol_delimiter: Option<String>,
    /// Delimiter between key and value inside a sub-column
    #[arg(short = 'k', long = "keyvalue-delimiter")]
    pub keyvalue_delimiter: Option<String>,
    /// Position of the key inside a pair: 0 (key first) or 1 (key after the value)
    #[arg(long = "key-position")]
    pub key_position: Option<i64>,
    /// Suffix added to the name of every processed file
    #[arg(short = 'r', long = "result-file-sfx")]
    pub result_file_sfx: Option<String>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_delimiter_accepts_aliases_and_single_chars() {
        assert_eq!(parse_delimiter("semicolon"), Ok(b';'));
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("#"), Ok(b'#'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("é").is_err());
    }

    #[test]
    fn split_command_parses_short_flags() {
        let cli = Cli::try_parse_from([
            "csv-col-splitter",
            "split",
            "-t",
            "2",
            "-d",
            "&",
            "-k",
            "@",
            "--key-position",
            "0",
            "--with-headers",
            "false",
            "--first-only",
        ])
        .expect("parse");
        match cli.command {
            Commands::Split(args) => {
                assert!(args.first_only);
                assert_eq!(args.options.target_col, Some(2));
                assert_eq!(args.options.key_position, Some(0));
                assert_eq!(args.options.with_headers, Some(false));
                assert_eq!(args.options.work_dir, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
