use anyhow::Result;
use axum::Router;
use clap::Parser;
use kbcore::persist::{DataPaths, DEFAULT_BUNDLE_FILE, DEFAULT_DATA_FILE};
use server::build_app;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Directory holding the dataset and the bundle
    #[arg(long, default_value = "./data")]
    data_dir: String,
    /// Dataset file name
    #[arg(long, default_value = DEFAULT_DATA_FILE)]
    data_file: String,
    /// Bundle file name
    #[arg(long, default_value = DEFAULT_BUNDLE_FILE)]
    bundle_file: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let paths = DataPaths::new(&args.data_dir)
        .with_data_file(args.data_file)
        .with_bundle_file(args.bundle_file);
    let app: Router = build_app(&paths)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
