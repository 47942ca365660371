use clap::Parser;
use std::path::PathBuf;

/// Automatically detect and fix image orientation in a directory.
#[derive(Debug, Parser)]
#[command(name = "rotator", version)]
pub struct Cli {
    /// Directory containing the images to process
    pub directory: PathBuf,

    /// Process subdirectories recursively (default)
    #[arg(short = 'r', long, overrides_with = "no_recursive")]
    recursive: bool,

    /// Only process files directly inside DIRECTORY
    #[arg(long, overrides_with = "recursive")]
    no_recursive: bool,

    /// Do not create backup files
    #[arg(long)]
    pub no_backup: bool,

    /// Show what would be done without making changes
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Show detailed output
    #[arg(short, long)]
    pub verbose: bool,

    /// Model to use for orientation detection
    #[arg(long, value_name = "NAME")]
    pub model: Option<String>,

    /// Model configuration file (default: ./rotator.toml, then .vendor/rotator.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Also process *.backup.* files left by earlier runs
    #[arg(long)]
    pub include_backups: bool,

    /// Write the run summary as JSON
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

impl Cli {
    pub fn recursive(&self) -> bool {
        self.recursive || !self.no_recursive
    }

    pub fn backup(&self) -> bool {
        !self.no_backup
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("rotator").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn parses_directory_only_with_defaults() {
        let cli = parse(&["./images"]);
        assert_eq!(cli.directory, PathBuf::from("./images"));
        assert!(cli.recursive());
        assert!(cli.backup());
        assert!(!cli.dry_run);
        assert!(!cli.verbose);
        assert!(cli.model.is_none());
        assert!(cli.report.is_none());
    }

    #[test]
    fn parses_short_flags() {
        let cli = parse(&["-r", "-n", "-v", "./images"]);
        assert!(cli.recursive());
        assert!(cli.dry_run);
        assert!(cli.verbose);
    }

    #[test]
    fn parses_long_flags() {
        let cli = parse(&[
            "./images",
            "--no-backup",
            "--dry-run",
            "--model",
            "tiny",
            "--config=./rotator.toml",
            "--report",
            "out.json",
            "--include-backups",
        ]);
        assert!(!cli.backup());
        assert!(cli.dry_run);
        assert_eq!(cli.model.as_deref(), Some("tiny"));
        assert_eq!(cli.config, Some(PathBuf::from("./rotator.toml")));
        assert_eq!(cli.report, Some(PathBuf::from("out.json")));
        assert!(cli.include_backups);
    }

    #[test]
    fn last_recursion_flag_wins() {
        assert!(!parse(&["./images", "--no-recursive"]).recursive());
        assert!(parse(&["./images", "--no-recursive", "--recursive"]).recursive());
        assert!(!parse(&["./images", "-r", "--no-recursive"]).recursive());
    }

    #[test]
    fn requires_directory() {
        assert!(Cli::try_parse_from(["rotator"]).is_err());
    }

    #[test]
    fn rejects_unknown_flag() {
        assert!(Cli::try_parse_from(["rotator", "./images", "--threads"]).is_err());
    }
}
