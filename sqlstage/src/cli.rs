//! Command-line argument definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Top-level command line.
#[derive(Debug, Parser)]
#[command(name = "sqlstage")]
#[command(about = "Move rows from a relational source into a staging table")]
#[command(version)]
#[command(long_about = "
SQLStage - resolve connection configuration and stage data

Connections are described in a JSON configuration file. Field values are
literals, environment references ({\"env\": \"VAR\"}) or OS credential
store entries ({\"service\": \"S\", \"user\": \"U\"}), so passwords can stay
out of the file.

SUPPORTED CONNECTIONS:
- SQL Server (plain_sql_server, named_instance_sql_server)
- Oracle (oracle) [resolution only, no bundled driver]

EXAMPLES:
  sqlstage check --config stage.json
  sqlstage check --config stage.json --probe
  sqlstage copy --config stage.json --source store --query \"SELECT * FROM sales\" \\
      --target warehouse --schema staging --table Sales
")]
pub struct Cli {
    /// Logging flags shared by every subcommand
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve every configured connection and report missing fields
    Check(CheckArgs),
    /// Extract rows from one connection and append them to a table on another
    Copy(CopyArgs),
}

/// Where connections come from.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Configuration file
    #[arg(
        short,
        long,
        env = "SQLSTAGE_CONFIG",
        value_name = "FILE",
        help = "JSON configuration file describing the connections"
    )]
    pub config: PathBuf,

    /// Prompt for absent passwords
    #[arg(
        long,
        help = "Prompt for any required password or domain_password that is not configured"
    )]
    pub prompt_password: bool,
}

/// Arguments for `sqlstage check`.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Configuration source
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Also check that each host name resolves
    #[arg(long, help = "Check DNS resolution of each resolved host")]
    pub probe: bool,
}

/// Arguments for `sqlstage copy`.
#[derive(Debug, Args)]
pub struct CopyArgs {
    /// Configuration source
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Source connection name
    #[arg(long, value_name = "NAME")]
    pub source: String,

    /// Query to run on the source
    #[arg(long, value_name = "SQL")]
    pub query: String,

    /// Target connection name
    #[arg(long, value_name = "NAME")]
    pub target: String,

    /// Target table
    #[arg(long, value_name = "TABLE")]
    pub table: String,

    /// Target schema
    #[arg(long, value_name = "SCHEMA")]
    pub schema: Option<String>,

    /// Delete existing rows before inserting
    #[arg(long, help = "Delete existing rows in the target table before inserting")]
    pub replace: bool,
}

/// Logging flags accepted anywhere on the command line.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(
        short,
        long,
        global = true,
        help = "Suppress all output except errors"
    )]
    pub quiet: bool,

    /// Also write logs to a file
    #[arg(long, global = true, value_name = "FILE", help = "Append logs to FILE")]
    pub log_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from([
            "sqlstage",
            "-vv",
            "check",
            "--config",
            "stage.json",
            "--probe",
        ])
        .unwrap();

        assert_eq!(cli.global.verbose, 2);
        match cli.command {
            Command::Check(args) => {
                assert_eq!(args.config.config, PathBuf::from("stage.json"));
                assert!(args.probe);
                assert!(!args.config.prompt_password);
            }
            Command::Copy(_) => panic!("expected check"),
        }
    }

    #[test]
    fn test_parse_copy() {
        let cli = Cli::try_parse_from([
            "sqlstage",
            "copy",
            "-c",
            "stage.json",
            "--source",
            "store",
            "--query",
            "SELECT * FROM sales",
            "--target",
            "warehouse",
            "--schema",
            "staging",
            "--table",
            "Sales",
            "--replace",
            "--log-file",
            "run.log",
        ])
        .unwrap();

        assert_eq!(cli.global.log_file, Some(PathBuf::from("run.log")));
        match cli.command {
            Command::Copy(args) => {
                assert_eq!(args.source, "store");
                assert_eq!(args.target, "warehouse");
                assert_eq!(args.schema.as_deref(), Some("staging"));
                assert!(args.replace);
            }
            Command::Check(_) => panic!("expected copy"),
        }
    }

    #[test]
    fn test_copy_requires_target() {
        let result = Cli::try_parse_from([
            "sqlstage",
            "copy",
            "--config",
            "stage.json",
            "--source",
            "store",
            "--query",
            "SELECT 1",
            "--table",
            "Sales",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
