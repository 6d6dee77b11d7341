// server/src/cli/commands.rs

// Command-line arguments and subcommands for the `carebridge` binary.
use std::path::PathBuf;

use carebridge_lib::config::{AppConfig, StorageEngineType, DEFAULT_CONFIG_PATH};
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[clap(name = "carebridge", version, about = "Care coordination server for doctors and patients")]
pub struct CliArgs {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand, PartialEq)]
pub enum Commands {
    /// Start the REST API server.
    Serve(ServeArgs),
    /// Print the effective configuration as YAML.
    ShowConfig {
        #[clap(long, short = 'c', value_hint = clap::ValueHint::FilePath, env = "CAREBRIDGE_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
    /// List the client routes.
    Routes,
}

#[derive(Debug, Args, PartialEq)]
pub struct ServeArgs {
    #[clap(long, short = 'c', value_hint = clap::ValueHint::FilePath, env = "CAREBRIDGE_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
    #[clap(long)]
    pub host: Option<String>,
    #[clap(long, short = 'p')]
    pub port: Option<u16>,
    /// `inmemory` or `sled`.
    #[clap(long)]
    pub engine: Option<StorageEngineType>,
    #[clap(long, value_hint = clap::ValueHint::DirPath)]
    pub data_directory: Option<PathBuf>,
}

impl ServeArgs {
    /// Command-line flags win over the file and the environment.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.rest.host = host.clone();
        }
        if let Some(port) = self.port {
            config.rest.port = port;
        }
        if let Some(engine) = self.engine {
            config.storage.storage_engine_type = engine;
        }
        if let Some(dir) = &self.data_directory {
            config.storage.data_directory = dir.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_flags_override_the_config() {
        let args = CliArgs::parse_from([
            "carebridge", "serve", "--port", "9000", "--engine", "sled", "--data-directory", "/tmp/cb",
        ]);
        let Commands::Serve(serve) = args.command else {
            panic!("expected serve");
        };
        let mut config = AppConfig::default();
        serve.apply(&mut config);
        assert_eq!(config.rest.port, 9000);
        assert_eq!(config.rest.host, "127.0.0.1");
        assert_eq!(config.storage.storage_engine_type, StorageEngineType::Sled);
        assert_eq!(config.storage.data_directory, PathBuf::from("/tmp/cb"));
    }

    #[test]
    fn unknown_engine_is_rejected() {
        assert!(CliArgs::try_parse_from(["carebridge", "serve", "--engine", "rocks"]).is_err());
    }

    #[test]
    fn routes_takes_no_arguments() {
        let args = CliArgs::parse_from(["carebridge", "routes"]);
        assert_eq!(args.command, Commands::Routes);
    }
}
