//! FeatherHTTP - A Bare-Socket HTTP/1.1 Server
//!
//! This is the main entry point for the FeatherHTTP server.
//! It parses the command line, sets up logging and the TCP listener, wires
//! the shutdown signal, and runs the server to completion.

use featherhttp::router::Router;
use featherhttp::server::Server;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Server configuration
struct Config {
    /// Host to bind to
    host: String,
    /// Port to listen on
    port: u16,
    /// Directory served by the /files routes
    directory: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: featherhttp::DEFAULT_HOST.to_string(),
            port: featherhttp::DEFAULT_PORT,
            directory: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args() -> Self {
        let mut config = Config::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    if i + 1 < args.len() {
                        config.host = args[i + 1].clone();
                        i += 2;
                    } else {
                        eprintln!("Error: --host requires a value");
                        std::process::exit(1);
                    }
                }
                "--port" | "-p" => {
                    if i + 1 < args.len() {
                        config.port = args[i + 1].parse().unwrap_or_else(|_| {
                            eprintln!("Error: invalid port number");
                            std::process::exit(1);
                        });
                        i += 2;
                    } else {
                        eprintln!("Error: --port requires a value");
                        std::process::exit(1);
                    }
                }
                "--directory" | "-d" => {
                    if i + 1 < args.len() {
                        config.directory = PathBuf::from(&args[i + 1]);
                        i += 2;
                    } else {
                        eprintln!("Error: --directory requires a value");
                        std::process::exit(1);
                    }
                }
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("FeatherHTTP version {}", featherhttp::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                    print_help();
                    std::process::exit(1);
                }
            }
        }

        config
    }

    /// Returns the bind address as a string
    fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn print_help() {
    println!(
        r#"
FeatherHTTP - A Bare-Socket HTTP/1.1 Server

USAGE:
    featherhttp [OPTIONS]

OPTIONS:
    -h, --host <HOST>        Host to bind to (default: 127.0.0.1)
    -p, --port <PORT>        Port to listen on (default: 4221)
    -d, --directory <DIR>    Directory served by /files (default: .)
    -v, --version            Print version information
        --help               Print this help message

EXAMPLES:
    featherhttp                          # Start on 127.0.0.1:4221
    featherhttp --port 8080              # Start on port 8080
    featherhttp --directory /tmp/files   # Serve files from /tmp/files

CONNECTING:
    $ curl http://localhost:4221/echo/hello
    hello
    $ curl -H "User-Agent: curl/7.1" http://localhost:4221/user-agent
    curl/7.1
    $ curl --data-binary @notes.txt -X POST http://localhost:4221/files/notes.txt
"#
    );
}

fn print_banner(config: &Config) {
    println!(
        r#"
        ███████╗███████╗ █████╗ ████████╗██╗  ██╗███████╗██████╗
        ██╔════╝██╔════╝██╔══██╗╚══██╔══╝██║  ██║██╔════╝██╔══██╗
        █████╗  █████╗  ███████║   ██║   ███████║█████╗  ██████╔╝
        ██╔══╝  ██╔══╝  ██╔══██║   ██║   ██╔══██║██╔══╝  ██╔══██╗
        ██║     ███████╗██║  ██║   ██║   ██║  ██║███████╗██║  ██║
        ╚═╝     ╚══════╝╚═╝  ╚═╝   ╚═╝   ╚═╝  ╚═╝╚══════╝╚═╝  ╚═╝

FeatherHTTP v{} - Bare-Socket HTTP/1.1 Server
──────────────────────────────────────────────────────────────
Server started on {}
Serving files from {}
Ready to accept connections.

Use Ctrl+C to shutdown gracefully.
"#,
        featherhttp::VERSION,
        config.bind_address(),
        config.directory.display()
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = Config::from_args();

    // Set up logging
    let _subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    // Print the banner
    print_banner(&config);

    if !config.directory.is_dir() {
        anyhow::bail!("directory {} does not exist", config.directory.display());
    }

    // Bind the TCP listener
    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("Listening on {}", config.bind_address());
    info!("Serving files from {}", config.directory.display());

    // Set up graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, stopping server...");
        let _ = shutdown_tx.send(true);
    });

    // Run the server to completion
    let server = Server::new(listener, Router::new(config.directory));
    server.run(shutdown_rx).await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves when a termination signal arrives (Ctrl+C, or SIGTERM on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
