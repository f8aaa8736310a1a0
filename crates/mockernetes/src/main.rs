use axum_server::Handle;
use clap::{Args, Parser, Subcommand, ValueEnum};
use mockernetes_apiserver::tls::DEFAULT_CERT_DIR;
use mockernetes_apiserver::{pki, ApiServer, AppState, Config as ApiConfig, TlsPaths};
use mockernetes_storage::ResourceStore;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "mockernetes",
    about = "In-memory Kubernetes API server mock with mutual TLS",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    serve: ServeArgs,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API server (default)
    Serve(ServeArgs),
    /// Write a CA, server and client certificate into the cert directory
    GenerateCerts {
        /// Directory to write the certificates to
        #[arg(long, env = "MOCKERNETES_CERT_DIR", default_value = DEFAULT_CERT_DIR)]
        cert_dir: PathBuf,
    },
}

#[derive(Args, Clone)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "MOCKERNETES_BIND", default_value = "127.0.0.1:8443")]
    bind: String,
    /// Directory holding server.crt, server.key and ca.crt
    #[arg(long, env = "MOCKERNETES_CERT_DIR", default_value = DEFAULT_CERT_DIR)]
    cert_dir: PathBuf,
    /// Server certificate (overrides <cert-dir>/server.crt)
    #[arg(long, env = "MOCKERNETES_TLS_CERT")]
    tls_cert: Option<PathBuf>,
    /// Server private key (overrides <cert-dir>/server.key)
    #[arg(long, env = "MOCKERNETES_TLS_KEY")]
    tls_key: Option<PathBuf>,
    /// CA bundle for client certificates (overrides <cert-dir>/ca.crt)
    #[arg(long, env = "MOCKERNETES_CLIENT_CA")]
    client_ca: Option<PathBuf>,
    /// Generate certificates into the cert directory if they are missing
    #[arg(long)]
    generate_certs: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_format);

    match cli.command {
        Some(Commands::GenerateCerts { cert_dir }) => {
            let paths = pki::generate_certs(&cert_dir)?;
            info!(
                "Start the server with: mockernetes serve --cert-dir {}",
                cert_dir.display()
            );
            info!("Client CA bundle: {}", paths.ca_path.display());
            Ok(())
        }
        Some(Commands::Serve(args)) => run_serve(args).await,
        None => run_serve(cli.serve).await,
    }
}

/// Initialize tracing
fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

/// Run the API server until ctrl-c
async fn run_serve(args: ServeArgs) -> miette::Result<()> {
    info!("Starting mockernetes API server");

    let listen_addr: SocketAddr = args
        .bind
        .parse()
        .map_err(|e| miette::miette!("Invalid bind address '{}': {}", args.bind, e))?;

    if args.generate_certs {
        pki::ensure_certs(&args.cert_dir)?;
    }

    let config = ApiConfig {
        listen_addr,
        tls: tls_paths(&args),
    };

    let state = Arc::new(AppState::new(Arc::new(ResourceStore::new())));
    let server = ApiServer::new(config, state);

    let handle = Handle::new();
    let mut server_task = tokio::spawn(server.run_with_handle(handle.clone()));

    tokio::select! {
        result = &mut server_task => {
            return match result {
                Ok(result) => result.map_err(Into::into),
                Err(e) => Err(miette::miette!("API server task failed: {}", e)),
            };
        }
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(|e| miette::miette!("Failed to listen for ctrl-c: {}", e))?;
        }
    }

    info!("Shutting down gracefully...");
    handle.graceful_shutdown(Some(Duration::from_secs(5)));

    match server_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("API server error: {}", e),
        Err(e) => error!("API server task failed: {}", e),
    }

    info!("Shutdown complete");

    Ok(())
}

/// Cert directory defaults with any per-file overrides applied
fn tls_paths(args: &ServeArgs) -> TlsPaths {
    let mut paths = TlsPaths::in_dir(&args.cert_dir);
    if let Some(cert) = &args.tls_cert {
        paths.cert_path = cert.clone();
    }
    if let Some(key) = &args.tls_key {
        paths.key_path = key.clone();
    }
    if let Some(ca) = &args.client_ca {
        paths.ca_path = ca.clone();
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_is_default() {
        let cli = Cli::try_parse_from(["mockernetes"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.serve.bind, "127.0.0.1:8443");
        assert_eq!(tls_paths(&cli.serve), TlsPaths::default());
    }

    #[test]
    fn test_tls_overrides() {
        let cli = Cli::try_parse_from([
            "mockernetes",
            "serve",
            "--cert-dir",
            "/etc/mockernetes",
            "--client-ca",
            "/etc/pki/clients.crt",
        ])
        .unwrap();

        let Some(Commands::Serve(args)) = cli.command else {
            panic!("expected serve subcommand");
        };
        let paths = tls_paths(&args);
        assert_eq!(paths.cert_path, PathBuf::from("/etc/mockernetes/server.crt"));
        assert_eq!(paths.ca_path, PathBuf::from("/etc/pki/clients.crt"));
    }
}
