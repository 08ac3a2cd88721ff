use std::time::Duration;

use clap::Parser;
use elltwo_client::{
    ChannelEvent, ChannelSink, ClientConfig, ClientError, Command, ConnectionKeeper,
    TerminalDisplay, parse_line,
};
use elltwo_core::Session;
use elltwo_core::telemetry::{self, TelemetryConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "elltwo")]
#[command(about = "Edit an elltwo document from the terminal, one key per line on stdin")]
struct Args {
    /// Document path relative to the server's root
    document: String,

    /// WebSocket address of the document server
    #[arg(long, env = "ELLTWO_SERVER", default_value = "ws://127.0.0.1:8500")]
    server: String,

    /// Liveness check interval; a closed channel is reopened on the next check
    #[arg(long, env = "ELLTWO_RECONNECT_MS", default_value_t = 5000)]
    reconnect_interval_ms: u64,

    /// Request a full load on every reconnect, not just the first
    #[arg(long)]
    refetch_on_reconnect: bool,

    /// Treat `mod` in key scripts as Cmd instead of Ctrl
    #[arg(long)]
    platform_mac: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init(TelemetryConfig::from_env("elltwo"));

    let args = Args::parse();
    let server = ClientConfig::parse_server(&args.server).map_err(ClientError::from)?;
    let config = ClientConfig::new(server, args.document)
        .with_reconnect_interval(Duration::from_millis(args.reconnect_interval_ms))
        .with_refetch_on_reconnect(args.refetch_on_reconnect)
        .with_platform_mac(args.platform_mac);

    run(config).await?;
    Ok(())
}

async fn run(config: ClientConfig) -> Result<(), ClientError> {
    info!(endpoint = %config.endpoint(), "opening document");
    let mut connection = ConnectionKeeper::new(&config).spawn();
    let sink = ChannelSink::new(connection.outbound.clone(), connection.state.clone());
    let mut session = Session::new(TerminalDisplay::new(std::io::stdout()), sink)
        .with_refetch_on_reconnect(config.refetch_on_reconnect);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            event = connection.events.recv() => match event {
                Some(ChannelEvent::Opened) => session.on_connected(),
                Some(ChannelEvent::Frame(raw)) => session.handle_frame(&raw),
                Some(ChannelEvent::Closed) => warn!("connection lost, waiting to reconnect"),
                None => break,
            },
            // Input waits for the first load so scripted keys act on a document.
            line = lines.next_line(), if session.is_opened() => match line? {
                Some(line) => match parse_line(&line, config.platform_mac) {
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(command)) => command.apply(&mut session),
                    Ok(None) => continue,
                    Err(e) => {
                        warn!(error = %e, line = %line, "skipping input");
                        continue;
                    }
                },
                None => break,
            },
        }
        session.display_mut().draw()?;
    }

    info!("closing");
    // Release the sink's sender so the keeper can flush and close.
    drop(session);
    connection.shutdown().await;
    Ok(())
}
