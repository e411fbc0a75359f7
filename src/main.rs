use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use oura_mcp::catalog::{EndpointCatalog, TokenMode};
use oura_mcp::client::{OuraApi, TokenBinding};
use oura_mcp::config::{find_config_file, get_config, load_config, Config, LogFormat};
use oura_mcp::mcp::{McpServer, SearchOuraDataHandler};
use oura_mcp::models::DateRange;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Oura MCP - Serve the Oura Ring v2 API to MCP clients
#[derive(Parser, Debug)]
#[command(name = "oura-mcp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Serve the Oura Ring v2 API as MCP resources and tools", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format (logs always go to stderr)
    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the MCP server
    Serve {
        /// Run in stdio mode (for MCP clients like Claude Desktop)
        #[arg(long, conflicts_with = "http")]
        stdio: bool,

        /// Run in HTTP mode, serving POST /mcp
        #[arg(long)]
        http: bool,

        /// Port for HTTP mode (defaults to $PORT, then 3000)
        #[arg(long, short)]
        port: Option<u16>,

        /// Host to bind to for HTTP mode
        #[arg(long)]
        host: Option<String>,

        /// Take the bearer token from each resource URI instead of OURA_API_TOKEN
        #[arg(long)]
        token_in_path: bool,
    },

    /// List the Oura endpoints exposed as resources
    #[command(alias = "ls")]
    Endpoints {
        /// Show upstream paths and URI templates
        #[arg(long, short)]
        detailed: bool,

        /// Show templates for token-in-path mode
        #[arg(long)]
        token_in_path: bool,
    },

    /// Fetch one endpoint with the configured token and print the JSON body
    Fetch {
        /// Endpoint name (e.g. daily-sleep)
        name: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,
    },

    /// Run search-oura-data locally and print the results
    #[command(alias = "s")]
    Search {
        /// Text matched against endpoint names (case-insensitive)
        query: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,
    },
}

/// Build the `EnvFilter` directive. `RUST_LOG` is handled by the caller.
fn log_directive(verbose: u8, quiet: bool, configured: Option<&str>) -> String {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => configured.unwrap_or("info"),
            1 => "debug",
            _ => "trace",
        }
    };
    format!("oura_mcp={}", level)
}

fn init_tracing(directive: String, format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or(directive),
    );
    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries the stdio transport, so logs go to stderr
    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn load(cli: &Cli) -> Result<(Config, Option<PathBuf>)> {
    let path = cli.config.clone().or_else(find_config_file);
    let config = match &path {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => get_config().context("Failed to load configuration")?,
    };
    Ok((config, path))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (mut config, config_path) = load(&cli)?;

    init_tracing(
        log_directive(cli.verbose, cli.quiet, config.logging.level.as_deref()),
        cli.log_format.unwrap_or(config.logging.format),
    );

    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    let command = cli.command.unwrap_or(Commands::Serve {
        stdio: true,
        http: false,
        port: None,
        host: None,
        token_in_path: false,
    });

    match command {
        Commands::Serve {
            stdio: _,
            http,
            port,
            host,
            token_in_path,
        } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            if token_in_path {
                config.api.token_mode = TokenMode::Path;
            }

            let server = McpServer::from_config(&config)?;

            if http {
                let addr = config.bind_address();
                tracing::info!("Running MCP server in HTTP mode on {}", addr);
                server.run_http(&addr).await?;
            } else {
                tracing::info!("Running MCP server in stdio mode");
                server.run_stdio().await?;
            }
        }

        Commands::Endpoints {
            detailed,
            token_in_path,
        } => {
            let mode = if token_in_path {
                TokenMode::Path
            } else {
                config.api.token_mode
            };

            for endpoint in EndpointCatalog::new(mode).all() {
                if detailed {
                    println!("{} ({})", endpoint.display_name, endpoint.name);
                    println!("  Upstream: {}", endpoint.upstream_path);
                    println!("  URI:      {}", endpoint.uri_template);
                    println!("  {}", endpoint.description);
                } else {
                    println!("{} - {}", endpoint.name, endpoint.display_name);
                }
            }
        }

        Commands::Fetch {
            name,
            start_date,
            end_date,
        } => {
            let catalog = EndpointCatalog::new(TokenMode::Env);
            let endpoint = catalog.get_required(&name)?;
            let client = OuraApi::new()?.client(config.require_token()?);

            let dates = if endpoint.accepts_date_range() {
                DateRange::new(start_date, end_date)
            } else {
                if start_date.is_some() || end_date.is_some() {
                    tracing::warn!(endpoint = endpoint.name, "Endpoint takes no dates; ignoring them");
                }
                DateRange::unbounded()
            };
            let response = client.get(endpoint.upstream_path, &dates).await?;
            println!("{}", response.into_text());
        }

        Commands::Search {
            query,
            start_date,
            end_date,
        } => {
            let client = OuraApi::new()?.client(config.require_token()?);
            let handler = SearchOuraDataHandler {
                catalog: Arc::new(EndpointCatalog::new(TokenMode::Env)),
                binding: Arc::new(TokenBinding::Process(client)),
            };

            let dates = DateRange::new(start_date, end_date);
            let results = handler.search(&query, &dates, None).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["oura-mcp"]);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        assert!(cli.config.is_none());
        assert!(cli.log_format.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::parse_from(["oura-mcp", "-v"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["oura-mcp", "-vv"]);
        assert_eq!(cli.verbose, 2);

        let cli = Cli::parse_from(["oura-mcp", "serve", "--verbose"]);
        assert_eq!(cli.verbose, 1);
    }

    #[test]
    fn test_cli_log_format() {
        let cli = Cli::parse_from(["oura-mcp", "--log-format", "json"]);
        assert_eq!(cli.log_format, Some(LogFormat::Json));

        let cli = Cli::parse_from(["oura-mcp", "--config", "/path/to/config.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/config.toml")));
    }

    #[test]
    fn test_cli_serve_command() {
        let cli = Cli::parse_from(["oura-mcp", "serve"]);
        match &cli.command {
            Some(Commands::Serve {
                http,
                port,
                host,
                token_in_path,
                ..
            }) => {
                assert!(!*http);
                assert!(port.is_none());
                assert!(host.is_none());
                assert!(!*token_in_path);
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_serve_http_mode() {
        let cli = Cli::parse_from([
            "oura-mcp",
            "serve",
            "--http",
            "--port",
            "8080",
            "--host",
            "0.0.0.0",
            "--token-in-path",
        ]);
        match &cli.command {
            Some(Commands::Serve {
                http,
                port,
                host,
                token_in_path,
                ..
            }) => {
                assert!(*http);
                assert_eq!(*port, Some(8080));
                assert_eq!(host.as_deref(), Some("0.0.0.0"));
                assert!(*token_in_path);
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_stdio_conflicts_with_http() {
        assert!(Cli::try_parse_from(["oura-mcp", "serve", "--stdio", "--http"]).is_err());
    }

    #[test]
    fn test_cli_endpoints_command() {
        let cli = Cli::parse_from(["oura-mcp", "endpoints", "--detailed"]);
        match &cli.command {
            Some(Commands::Endpoints { detailed, .. }) => assert!(*detailed),
            _ => panic!("Expected Endpoints command"),
        }
    }

    #[test]
    fn test_cli_fetch_command() {
        let cli = Cli::parse_from([
            "oura-mcp",
            "fetch",
            "daily-sleep",
            "--start-date",
            "2024-01-01",
        ]);
        match &cli.command {
            Some(Commands::Fetch {
                name,
                start_date,
                end_date,
            }) => {
                assert_eq!(name, "daily-sleep");
                assert_eq!(start_date.as_deref(), Some("2024-01-01"));
                assert!(end_date.is_none());
            }
            _ => panic!("Expected Fetch command"),
        }
    }

    #[test]
    fn test_cli_search_command() {
        let cli = Cli::parse_from(["oura-mcp", "s", "sleep"]);
        match &cli.command {
            Some(Commands::Search { query, .. }) => assert_eq!(query, "sleep"),
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_log_directive() {
        assert_eq!(log_directive(0, false, None), "oura_mcp=info");
        assert_eq!(log_directive(0, false, Some("warn")), "oura_mcp=warn");
        assert_eq!(log_directive(1, false, Some("warn")), "oura_mcp=debug");
        assert_eq!(log_directive(3, false, None), "oura_mcp=trace");
        assert_eq!(log_directive(2, true, None), "oura_mcp=error");
    }
}
