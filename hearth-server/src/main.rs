mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use hearth_core::Config;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hearth", about = "Personal site server", version)]
struct Cli {
    /// Path for the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
    /// Address to bind, overrides the config file
    #[arg(long)]
    addr: Option<String>,
    /// Enable TLS
    #[arg(long)]
    tls: bool,
    /// Path for the TLS certificate file
    #[arg(long)]
    cert_file: Option<String>,
    /// Path for the TLS private key file
    #[arg(long)]
    key_file: Option<String>,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(addr) = self.addr {
            config.http.addr = addr;
        }
        if self.tls {
            config.http.tls = true;
        }
        if let Some(path) = self.cert_file {
            config.http.cert_file = path;
        }
        if let Some(path) = self.key_file {
            config.http.key_file = path;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = Config::read(&cli.config)
        .with_context(|| format!("failed to read configuration from {}", cli.config))?;
    cli.apply(&mut config);

    let addr: SocketAddr = config
        .http
        .addr
        .parse()
        .with_context(|| format!("invalid listen address '{}'", config.http.addr))?;

    let state = Arc::new(state::AppState::build(config)?);
    let tls = state.config.http.tls;
    let cert_file = state.config.http.cert_file.clone();
    let key_file = state.config.http.key_file.clone();
    let app = routes::router(state);

    if tls {
        let rustls = axum_server::tls_rustls::RustlsConfig::from_pem_file(&cert_file, &key_file)
            .await
            .context("failed to load TLS certificate or key")?;
        tracing::info!("listening https on {}", addr);
        axum_server::bind_rustls(addr, rustls)
            .serve(app.into_make_service())
            .await?;
    } else {
        tracing::info!("listening http on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;
    }

    Ok(())
}
