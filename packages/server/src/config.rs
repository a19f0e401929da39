use std::path::PathBuf;

use clap::Parser;

use dirstore_http::ServerConfig;
use dirstore_mutation::EngineOptions;

/// dirstore - serve a directory with conditional PUT and DELETE
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "dirstore")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to serve and edit
    #[arg(long, env = "DIRSTORE_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Interface to bind
    #[arg(long, env = "DIRSTORE_HOST", default_value = "localhost")]
    pub host: String,

    /// Port to bind
    #[arg(long, env = "DIRSTORE_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Let concurrent mutations of one file interleave
    #[arg(long, env = "DIRSTORE_NO_PATH_LOCKS")]
    pub no_path_locks: bool,

    /// Answer directory URLs with 404 instead of an HTML listing
    #[arg(long, env = "DIRSTORE_NO_LISTING")]
    pub no_listing: bool,
}

impl Cli {
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            path_locks: !self.no_path_locks,
        }
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            listing: !self.no_listing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["dirstore"]).unwrap();
        assert_eq!(cli.root, PathBuf::from("."));
        assert_eq!(cli.host, "localhost");
        assert_eq!(cli.port, 3000);
        assert!(cli.engine_options().path_locks);
        assert!(cli.server_config().listing);
    }

    #[test]
    fn flags() {
        let cli = Cli::try_parse_from([
            "dirstore",
            "--root",
            "/srv/www",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
            "--no-path-locks",
            "--no-listing",
        ])
        .unwrap();
        assert_eq!(cli.root, PathBuf::from("/srv/www"));
        assert_eq!(cli.host, "0.0.0.0");
        assert_eq!(cli.port, 8080);
        assert!(!cli.engine_options().path_locks);
        assert!(!cli.server_config().listing);
    }

    #[test]
    fn rejects_bad_port() {
        assert!(Cli::try_parse_from(["dirstore", "--port", "70000"]).is_err());
    }
}
