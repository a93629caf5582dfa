use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::locator::CARGO_LICENSE_FILE_PATTERN;
use crate::models::LicenseType;

fn after_help() -> String {
    format!(
        "Most crates ship LICENSE-MIT / LICENSE-APACHE, which the default file name\n\
         pattern does not match. For Cargo projects add to .license-bouncer.toml:\n\n    \
         license-file-pattern = '{CARGO_LICENSE_FILE_PATTERN}'"
    )
}

#[derive(Parser, Debug)]
#[command(
    name = "license-bouncer",
    about = "Find, identify and police the licenses of project dependencies",
    after_help = after_help(),
    version
)]
pub struct Cli {
    /// Policy config file [default: ./.license-bouncer.toml, fallback ~/.config/license-bouncer/config.toml]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print summaries; hide the progress bar
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every dependency with its license file and identified licenses
    List {
        #[command(flatten)]
        scan: ScanArgs,

        /// Output format
        #[arg(long, default_value = "table", value_name = "FORMAT")]
        format: ReportFormat,
    },

    /// Check dependency licenses against an allow/deny list or excluded license
    /// types (forbidden by default); exits 1 on failure
    Check {
        #[command(flatten)]
        scan: ScanArgs,

        /// Permitted license regex (repeatable; overrides config)
        #[arg(long, value_name = "PATTERN", conflicts_with = "deny")]
        allow: Vec<String>,

        /// Forbidden license regex (repeatable; overrides config)
        #[arg(long, value_name = "PATTERN")]
        deny: Vec<String>,

        /// License type to reject when no patterns are given (repeatable;
        /// overrides config) [default: forbidden]
        #[arg(long = "exclude-type", value_name = "TYPE", conflicts_with_all = ["allow", "deny"])]
        exclude_types: Vec<LicenseTypeArg>,

        /// Library name regex excluded from the check (repeatable)
        #[arg(long, value_name = "PATTERN")]
        ignore: Vec<String>,
    },

    /// Save licenses, notices and copyleft sources for redistribution
    Save {
        #[command(flatten)]
        scan: ScanArgs,

        /// Directory to save into; must not exist unless --force is given
        #[arg(long, value_name = "DIR")]
        save_path: PathBuf,

        /// Delete the save path first if it already exists
        #[arg(long)]
        force: bool,
    },

    /// Show every license file candidate from DIR up to the search root
    Candidates {
        /// Directory to start searching from
        dir: PathBuf,

        /// Upper bound for the search [default: DIR]
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,
    },
}

/// Options shared by the commands that scan a whole project.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Project path to scan
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Read modules from a "name dir version" listing instead of `cargo metadata`
    #[arg(long, value_name = "FILE")]
    pub modules: Option<PathBuf>,

    /// Shared upper bound for every module's license search
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum ReportFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, PartialEq, clap::ValueEnum)]
pub enum LicenseTypeArg {
    Forbidden,
    Notice,
    Permissive,
    Reciprocal,
    Restricted,
    Unencumbered,
    Unknown,
}

impl From<&LicenseTypeArg> for LicenseType {
    fn from(arg: &LicenseTypeArg) -> Self {
        match arg {
            LicenseTypeArg::Forbidden => LicenseType::Forbidden,
            LicenseTypeArg::Notice => LicenseType::Notice,
            LicenseTypeArg::Permissive => LicenseType::Permissive,
            LicenseTypeArg::Reciprocal => LicenseType::Reciprocal,
            LicenseTypeArg::Restricted => LicenseType::Restricted,
            LicenseTypeArg::Unencumbered => LicenseType::Unencumbered,
            LicenseTypeArg::Unknown => LicenseType::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_args() {
        let cli = Cli::parse_from([
            "license-bouncer",
            "-vv",
            "check",
            "proj",
            "--allow",
            "MIT",
            "--allow",
            "Apache-2.0",
            "--ignore",
            "^internal",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Check { scan, allow, deny, exclude_types, ignore } => {
                assert_eq!(scan.path, PathBuf::from("proj"));
                assert_eq!(allow, vec!["MIT", "Apache-2.0"]);
                assert!(deny.is_empty());
                assert!(exclude_types.is_empty());
                assert_eq!(ignore, vec!["^internal"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_allow_conflicts_with_deny() {
        let parsed = Cli::try_parse_from(["license-bouncer", "check", "--allow", "MIT", "--deny", "GPL"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_exclude_types() {
        let cli = Cli::parse_from([
            "license-bouncer",
            "check",
            "--exclude-type",
            "forbidden",
            "--exclude-type",
            "restricted",
        ]);
        match cli.command {
            Command::Check { exclude_types, .. } => {
                let types: Vec<LicenseType> = exclude_types.iter().map(Into::into).collect();
                assert_eq!(types, vec![LicenseType::Forbidden, LicenseType::Restricted]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from([
            "license-bouncer", "check", "--allow", "MIT", "--exclude-type", "notice",
        ])
        .is_err());
    }

    #[test]
    fn test_save_requires_path() {
        assert!(Cli::try_parse_from(["license-bouncer", "save"]).is_err());
        let cli = Cli::parse_from(["license-bouncer", "save", "--save-path", "out", "--force"]);
        assert!(matches!(cli.command, Command::Save { force: true, .. }));
    }

    #[test]
    fn test_help_suggests_cargo_pattern() {
        use clap::CommandFactory;
        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("LICENSE-MIT"));
        assert!(help.contains(CARGO_LICENSE_FILE_PATTERN));
    }

    #[test]
    fn test_list_defaults() {
        let cli = Cli::parse_from(["license-bouncer", "-q", "list"]);
        assert!(cli.quiet);
        match cli.command {
            Command::List { scan, format } => {
                assert_eq!(scan.path, PathBuf::from("."));
                assert!(matches!(format, ReportFormat::Table));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
