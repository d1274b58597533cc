use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use nightcast_core::{
    list_apps, pair_check, Connection, ConsoleListener, HeadlessEngine, SessionContext,
};
use nightcast_gamestream::{GameStreamClient, HostCatalog};
use nightcast_models::{Platform, ServerData};
use nightcast_platform::DefaultPlatform;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;

use cli::{Args, Command, StreamArgs};
use config::Config;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let debug_level = match &args.command {
        Command::Stream(opts) => opts.debug,
        _ => 0,
    };
    let default_filter = if debug_level > 0 {
        "nightcast=debug"
    } else {
        "nightcast=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run(args).await {
        let code = report_failure(&err, &mut io::stderr());
        std::process::exit(code);
    }
}

/// Print a fatal error for the user and pick the exit status.
fn report_failure(err: &anyhow::Error, out: &mut impl Write) -> i32 {
    tracing::debug!("{err:?}");
    let _ = writeln!(out, "{err}");
    1
}

async fn run(args: Args) -> Result<()> {
    let mut config = Config::load(&args.config)?;
    if let Some(address) = args.address {
        config.host.address = address;
    }
    if config.host.address.is_empty() {
        bail!(
            "No host address given; pass --address or set host.address in {}",
            args.config
        );
    }

    let client = GameStreamClient::new(config.client_config()?)?;
    let server = client
        .fetch_server(&config.host.address)
        .await
        .with_context(|| format!("Can't connect to {}", config.host.address))?;

    match args.command {
        Command::List => list(&client, &server, &mut io::stdout(), &mut io::stderr()).await,
        Command::Stream(opts) => stream(&client, server, config, opts).await,
        Command::Quit => quit(&client, &server).await,
    }
}

/// Print the host's catalog. A failed query is reported but not fatal.
async fn list<C: HostCatalog>(
    catalog: &C,
    server: &ServerData,
    out: &mut impl Write,
    diag: &mut impl Write,
) -> Result<()> {
    pair_check(server)?;
    match list_apps(catalog, server).await {
        Ok(apps) => {
            for (i, app) in apps.iter().enumerate() {
                writeln!(out, "{}. {}", i + 1, app.name)?;
            }
        }
        Err(err) => {
            tracing::debug!("{err:?}");
            writeln!(diag, "{err}")?;
        }
    }
    Ok(())
}

async fn quit(client: &GameStreamClient, server: &ServerData) -> Result<()> {
    pair_check(server)?;
    client.quit_app(server).await.context("Failed to quit app")?;
    tracing::info!(host = %server.hostname, "app quit");
    Ok(())
}

async fn stream(
    client: &GameStreamClient,
    mut server: ServerData,
    mut config: Config,
    opts: StreamArgs,
) -> Result<()> {
    pair_check(&server)?;

    config.stream.merge(&opts);
    server.unsupported = config.stream.unsupported;
    let platform: Platform = config.stream.platform.parse()?;
    let session = config.stream.session(opts.debug);

    for device in &opts.input {
        tracing::debug!(device = %device, "forwarding input device");
    }

    let runtime = match &config.stream.dump_dir {
        Some(dir) => DefaultPlatform::with_dump_dir(dir),
        None => DefaultPlatform::new(),
    };
    let stats = runtime.stats();
    let context = Arc::new(SessionContext::new());
    let listener = Arc::new(ConsoleListener::new(Arc::clone(&context)));
    let mut connection = Connection::new(platform, HeadlessEngine::new(), runtime, listener, context);
    connection.set_input_devices(opts.input.len());

    connection.start(client, &server, &session).await?;

    let interrupted = tokio::signal::ctrl_c().await;
    connection.stop();
    interrupted.context("failed to wait for Ctrl-C")?;

    tracing::info!(
        video_bytes = stats.video_bytes(),
        audio_bytes = stats.audio_bytes(),
        "session finished"
    );
    Ok(())
}
