use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fragment-index")]
#[command(about = "Stores and serves pre-rendered HTML snapshots for crawlers")]
#[command(version)]
pub struct Args {
    /// Path to JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory (overrides the configuration file)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Environment to operate on (defaults to the configured default environment)
    #[arg(short, long, global = true)]
    pub env: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage environments
    #[command(subcommand)]
    Env(EnvCommand),

    /// Store a single page
    Put(PutArgs),

    /// Apply a JSON upsert body (single page or {"pages": [...]})
    Post {
        /// File containing the request body
        body: PathBuf,
    },

    /// Print the stored HTML for a path
    Get {
        /// Page path, e.g. "/#!about" or "/?_escaped_fragment_=about"
        #[arg(required_unless_present = "url")]
        path: Option<String>,

        /// Full lookup request URL carrying a `path` query parameter
        #[arg(long, conflicts_with = "path")]
        url: Option<String>,
    },

    /// Delete a page, or every page under a pattern
    Delete {
        /// Page path or prefix pattern; a trailing /* also removes the subtree root
        path: String,

        /// Treat the path as a prefix pattern
        #[arg(short, long)]
        pattern: bool,
    },

    /// Report that the service is alive
    Ping,
}

#[derive(Subcommand, Debug)]
pub enum EnvCommand {
    /// Register an environment
    Add {
        /// Environment name
        name: String,
    },
}

#[derive(ClapArgs, Debug)]
pub struct PutArgs {
    /// Page path
    #[arg(long)]
    pub path: String,

    /// HTML content
    #[arg(long, conflicts_with = "content_file", required_unless_present = "content_file")]
    pub content: Option<String>,

    /// File containing the HTML content
    #[arg(long)]
    pub content_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_with_pattern() {
        let args = Args::parse_from(["fragment-index", "--env", "staging", "delete", "/#!test/*", "-p"]);
        assert_eq!(args.env.as_deref(), Some("staging"));
        assert!(matches!(
            args.command,
            Command::Delete { ref path, pattern: true } if path == "/#!test/*"
        ));
    }

    #[test]
    fn test_get_requires_path_or_url() {
        assert!(Args::try_parse_from(["fragment-index", "get"]).is_err());
        let args = Args::try_parse_from(["fragment-index", "get", "--url", "/index?path=/"]).unwrap();
        assert!(matches!(args.command, Command::Get { path: None, url: Some(_) }));
    }

    #[test]
    fn test_put_requires_content() {
        assert!(Args::try_parse_from(["fragment-index", "put", "--path", "/#!a"]).is_err());
        assert!(
            Args::try_parse_from(["fragment-index", "put", "--path", "/#!a", "--content", "x"])
                .is_ok()
        );
    }
}
