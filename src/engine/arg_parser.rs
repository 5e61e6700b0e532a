use clap::Parser;
use std::path::PathBuf;

/// Generate MSTest skeletons for C# sources.
#[derive(Clone, Debug, Parser)]
#[command(name = "stubsmith")]
#[command(
    about = "Generate MSTest skeletons for C# sources",
    long_about = "Generate MSTest skeletons for C# sources. Reads, transforms and writes run \
                  in bounded parallel stages."
)]
pub struct Cli {
    /// C# files or directories (directories are searched for files with --ext).
    #[arg(value_name = "INPUTS", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory for generated files. Falls back to the current directory if it does not exist.
    #[arg(long, short = 'o', value_name = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Max files read at once.
    #[arg(long, value_parser = clap::value_parser!(usize))]
    pub read: Option<usize>,

    /// Max documents transformed at once.
    #[arg(long, value_parser = clap::value_parser!(usize))]
    pub transform: Option<usize>,

    /// Max files written at once.
    #[arg(long, value_parser = clap::value_parser!(usize))]
    pub write: Option<usize>,

    /// Retries for transient read/write errors (0 = single attempt).
    #[arg(long, value_parser = clap::value_parser!(u32))]
    pub retries: Option<u32>,

    /// Extension matched when expanding directories. Default: cs.
    #[arg(long)]
    pub ext: Option<String>,

    /// Config file. Default: `.stubsmith.toml` in the current directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the outcome as JSON on stdout.
    #[arg(long)]
    pub json: bool,

    /// Strict mode: exit with an error if any input failed.
    #[arg(
        long,
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = clap::value_parser!(bool)
    )]
    pub strict: Option<bool>,

    /// Verbose output (debug logs and a progress bar).
    #[arg(
        long,
        short = 'v',
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = clap::value_parser!(bool)
    )]
    pub verbose: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_budgets_and_flags() {
        let cli = Cli::try_parse_from([
            "stubsmith", "a.cs", "src", "-o", "out", "--read", "2", "--write", "1", "--strict",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.inputs, vec![PathBuf::from("a.cs"), PathBuf::from("src")]);
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
        assert_eq!((cli.read, cli.transform, cli.write), (Some(2), None, Some(1)));
        assert_eq!(cli.strict, Some(true));
        assert_eq!(cli.verbose, Some(true));
        assert!(!cli.json);
    }

    #[test]
    fn inputs_are_required() {
        assert!(Cli::try_parse_from(["stubsmith"]).is_err());
        let cli = Cli::try_parse_from(["stubsmith", "x.cs", "--strict", "false"]).unwrap();
        assert_eq!(cli.strict, Some(false));
    }
}
