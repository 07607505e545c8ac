//! DTP server entry point

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dtp_core::{frame_tagged, ServerBuilder, ServerConfig};
use dtp_transport::{client, DtpServer};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dtp")]
#[command(about = "Data Transmission Protocol server", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", env = "DTP_LOG", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve requests until Ctrl-C
    Serve {
        /// Path to a TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Overrides the configured port
        #[arg(short, long)]
        port: Option<u16>,

        /// Service identifier used in logs
        #[arg(long, default_value = "dtp")]
        service: String,
    },

    /// Send one packet and print the returned status
    Send {
        #[arg(short, long, default_value = "127.0.0.1:9090")]
        addr: SocketAddr,

        /// Prefix the packet with this tag (for servers using prefixed framing)
        #[arg(short, long)]
        tag: Option<u32>,

        message: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(&cli.log_level) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }

    let outcome = match cli.command {
        Commands::Serve { config, port, service } => serve(config, port, service).await,
        Commands::Send { addr, tag, message } => send(addr, tag, message).await,
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

async fn serve(config: Option<PathBuf>, port: Option<u16>, service: String) -> Result<ExitCode> {
    let mut config = match config {
        Some(path) => ServerConfig::load(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(port) = port {
        config.port = port;
    }

    let mut server = DtpServer::new(service);
    if let Err(e) = server.init(Some(ServerBuilder::new().with_config(config))) {
        tracing::error!("Init failed with status {:?}: {}", e.status(), e);
        return Ok(ExitCode::from(1));
    }

    let stop = server.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received, stopping");
            let _ = stop.stop();
        }
    });

    tokio::task::spawn_blocking(move || -> Result<()> {
        server.run()?;
        server.join();
        Ok(())
    })
    .await
    .context("server thread failed")??;

    Ok(ExitCode::SUCCESS)
}

async fn send(addr: SocketAddr, tag: Option<u32>, message: String) -> Result<ExitCode> {
    let packet = match tag {
        Some(tag) => frame_tagged(tag, message.as_bytes()),
        None => bytes::Bytes::from(message),
    };

    let transmission = tokio::task::spawn_blocking(move || {
        client::transmit_with_timeout(addr, &packet, Some(std::time::Duration::from_secs(10)))
    })
    .await
    .context("client thread failed")?
    .with_context(|| format!("sending to {}", addr))?;

    if !transmission.preamble.is_empty() {
        println!("{}", String::from_utf8_lossy(&transmission.preamble));
    }
    println!("{:?}", transmission.status);

    Ok(if transmission.status.is_failure() {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    })
}
