//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// Static asset resolver and development server
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: assets.toml)
    #[arg(short = 'C', long, global = true, default_value = "assets.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve configured assets over HTTP
    #[command(visible_alias = "s")]
    Serve {
        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Resolve request paths and print what would be served
    #[command(visible_alias = "r")]
    Resolve {
        /// Request paths, e.g. /static/app.js
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<String>,
    },
}

impl Cli {
    pub const fn is_serve(&self) -> bool {
        matches!(self.command, Commands::Serve { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_and_verbose_flags_differ() {
        let cli = Cli::try_parse_from(["tola-assets", "-v", "resolve", "/a"]).unwrap();
        assert!(cli.verbose);

        let err = Cli::try_parse_from(["tola-assets", "-V"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["tola-assets", "serve", "-i", "0.0.0.0", "-p", "8080"]).unwrap();
        assert!(cli.is_serve());
        assert_eq!(cli.config, PathBuf::from("assets.toml"));
        match cli.command {
            Commands::Serve { interface, port } => {
                assert_eq!(interface, Some(IpAddr::V4(Ipv4Addr::UNSPECIFIED)));
                assert_eq!(port, Some(8080));
            }
            Commands::Resolve { .. } => panic!("expected serve"),
        }
    }

    #[test]
    fn test_parse_resolve_with_globals() {
        let cli = Cli::try_parse_from([
            "tola-assets",
            "resolve",
            "/static/app.js",
            "/help/",
            "--config",
            "site/assets.toml",
            "-v",
        ])
        .unwrap();
        assert!(!cli.is_serve());
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("site/assets.toml"));
        match cli.command {
            Commands::Resolve { paths } => assert_eq!(paths, ["/static/app.js", "/help/"]),
            Commands::Serve { .. } => panic!("expected resolve"),
        }
    }

    #[test]
    fn test_resolve_requires_path() {
        assert!(Cli::try_parse_from(["tola-assets", "resolve"]).is_err());
    }
}
