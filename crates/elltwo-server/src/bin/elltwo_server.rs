use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;
use elltwo_server::{ServerConfig, TelemetryConfig, telemetry};

#[derive(Parser)]
#[command(name = "elltwo-server")]
#[command(about = "Serve markdown documents to elltwo editing clients")]
struct Args {
    /// Path for markdown files
    #[arg(long, env = "ELLTWO_PATH", default_value = "testing")]
    path: PathBuf,

    /// IP address to listen on
    #[arg(long, env = "ELLTWO_IP", default_value = "127.0.0.1")]
    ip: IpAddr,

    /// Port to serve on
    #[arg(long, env = "ELLTWO_PORT", default_value_t = 8500)]
    port: u16,

    /// Serve documents locked and ignore edits
    #[arg(long)]
    readonly: bool,

    /// Directory for exported documents
    #[arg(long, env = "ELLTWO_EXPORT_DIR", default_value = "temp/export")]
    export_dir: PathBuf,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init(TelemetryConfig::from_env("elltwo-server"));

    let args = Args::parse();
    let config = ServerConfig::default()
        .with_root(args.path)
        .with_ip(args.ip)
        .with_port(args.port)
        .with_readonly(args.readonly)
        .with_export_dir(args.export_dir);

    elltwo_server::run(config).await?;
    Ok(())
}
