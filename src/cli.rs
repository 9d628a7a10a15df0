//! Command-line argument parsing for chatplug

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// chatplug - plugin registry and function-call dispatch for chat agents
#[derive(Parser, Debug)]
#[command(name = "chatplug")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Print the function specs offered to the model
    Specs {
        /// Message text the exposure policy decides on
        #[arg(short, long, value_name = "TEXT")]
        query: Option<String>,
    },

    /// Print the source name of the capability owning a function
    Source {
        #[arg(value_name = "FUNCTION")]
        name: String,
    },

    /// Dispatch a function call
    Call {
        #[arg(value_name = "FUNCTION")]
        name: String,

        /// Arguments as a JSON object
        #[arg(value_name = "ARGS_JSON", default_value = "{}")]
        args: String,

        /// Write binary direct results to this file
        #[arg(short, long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specs_default() {
        let args = Args::parse_from(["chatplug", "specs"]);
        assert!(args.config.is_none());
        assert!(!args.debug);
        assert_eq!(args.command, Command::Specs { query: None });
    }

    #[test]
    fn test_call_defaults_to_empty_object() {
        let args = Args::parse_from(["chatplug", "call", "iplocation"]);
        assert_eq!(
            args.command,
            Command::Call {
                name: "iplocation".to_string(),
                args: "{}".to_string(),
                out: None,
            }
        );
    }

    #[test]
    fn test_args_with_flags() {
        let args = Args::parse_from([
            "chatplug",
            "call",
            "screenshot_website",
            r#"{"url": "rust-lang.org"}"#,
            "--out",
            "/tmp/shot.png",
            "--debug",
            "--config",
            "/tmp/config.toml",
        ]);
        assert!(args.debug);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/config.toml")));
        match args.command {
            Command::Call { name, args, out } => {
                assert_eq!(name, "screenshot_website");
                assert_eq!(args, r#"{"url": "rust-lang.org"}"#);
                assert_eq!(out, Some(PathBuf::from("/tmp/shot.png")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Args::try_parse_from(["chatplug"]).is_err());
    }
}
