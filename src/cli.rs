use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::pipeline::CleanOptions;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Infer metadata column dtypes and detect values that encode missing data",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a metadata table and print inferred column dtypes
    Probe(ProbeArgs),
    /// List candidate missing-value factors and which ones recur enough to be confirmed
    Factors(FactorsArgs),
    /// Replace confirmed missing factors and rewrite every column to one consistent dtype
    Clean(CleanArgs),
}

/// Options shared by every command that runs the dtype stages.
#[derive(Debug, Clone, Default, Args)]
pub struct InferenceArgs {
    /// YAML file providing defaults for pattern, threshold, identifier columns and NA tokens
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Regex flagging values that read as missing (case-insensitive)
    #[arg(long)]
    pub pattern: Option<String>,
    /// Confirm a factor once it appears in more than this many columns
    #[arg(long)]
    pub threshold: Option<usize>,
    /// Identifier column, never typed numeric (repeatable; replaces the defaults)
    #[arg(long = "sample-id", action = clap::ArgAction::Append)]
    pub sample_ids: Vec<String>,
    /// Cell spelling loaded as a native missing value (repeatable; replaces the defaults)
    #[arg(long = "na-token", action = clap::ArgAction::Append)]
    pub na_tokens: Vec<String>,
}

impl InferenceArgs {
    /// Config file values first, then any flag given on the command line.
    pub fn resolve(&self) -> Result<CleanOptions> {
        let mut options = match &self.config {
            Some(path) => CleanOptions::load(path)?,
            None => CleanOptions::default(),
        };
        if let Some(pattern) = &self.pattern {
            options.pattern = pattern.clone();
        }
        if let Some(threshold) = self.threshold {
            options.threshold = threshold;
        }
        if !self.sample_ids.is_empty() {
            options.identifier_columns = Some(self.sample_ids.clone());
        }
        if !self.na_tokens.is_empty() {
            options.na_tokens = self.na_tokens.clone();
        }
        Ok(options)
    }
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Input metadata table (CSV/TSV, '-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Write a dtype report (.yml/.yaml for YAML, JSON otherwise)
    #[arg(short = 'r', long = "report")]
    pub report: Option<PathBuf>,
    /// Delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    #[command(flatten)]
    pub inference: InferenceArgs,
}

#[derive(Debug, Args)]
pub struct FactorsArgs {
    /// Input metadata table (CSV/TSV, '-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Also list every value that matched the missing pattern
    #[arg(long = "show-matches")]
    pub show_matches: bool,
    /// Delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    #[command(flatten)]
    pub inference: InferenceArgs,
}

#[derive(Debug, Args)]
pub struct CleanArgs {
    /// Input metadata table (CSV/TSV, '-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output table (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Write a dtype report (.yml/.yaml for YAML, JSON otherwise)
    #[arg(short = 'r', long = "report")]
    pub report: Option<PathBuf>,
    /// Delimiter character for reading input
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Delimiter to use for output (defaults to input delimiter)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Character encoding for the output file/stdout (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
    #[command(flatten)]
    pub inference: InferenceArgs,
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
    use crate::frequency::DEFAULT_CONFIRM_THRESHOLD;

    #[test]
    fn parse_delimiter_accepts_names_and_single_chars() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("pipe"), Ok(b'|'));
        assert_eq!(parse_delimiter(":"), Ok(b':'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("é").is_err());
    }

    #[test]
    fn resolve_applies_flag_overrides() {
        let args = InferenceArgs {
            threshold: Some(2),
            sample_ids: vec!["host_subject_id".to_string()],
            ..InferenceArgs::default()
        };
        let options = args.resolve().expect("resolve");
        assert_eq!(options.threshold, 2);
        assert_eq!(
            options.identifier_columns,
            Some(vec!["host_subject_id".to_string()])
        );

        let defaults = InferenceArgs::default().resolve().expect("resolve");
        assert_eq!(defaults.threshold, DEFAULT_CONFIRM_THRESHOLD);
        assert_eq!(defaults.identifier_columns, None);
    }

    #[test]
    fn cli_parses_clean_command() {
        let cli = Cli::try_parse_from([
            "md-dtypes",
            "clean",
            "-i",
            "md.tsv",
            "--threshold",
            "5",
            "--sample-id",
            "#SampleID",
        ])
        .expect("parse");
        match cli.command {
            Commands::Clean(args) => {
                assert_eq!(args.input, PathBuf::from("md.tsv"));
                assert_eq!(args.inference.threshold, Some(5));
                assert_eq!(args.inference.sample_ids, vec!["#SampleID"]);
            }
            other => panic!("Expected clean command, got {other:?}"),
        }
    }
}
