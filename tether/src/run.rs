use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use config::{AgentConfig, MessageIdentity, Settings, SettingsBuilder};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::runtime::Handle;
use transport::{Transport, HTTP};

use crate::feed;
use crate::liveness::{LivenessIndicator, LogIndicator, StatusFile};
use crate::platform::local::LocalPlatform;
use crate::supervisor::{Host, Supervisor};
use crate::version::VERSION;

pub fn cli() -> Command<'static> {
    Command::new("tether")
        .version(VERSION)
        .about("Forwards location fixes and inbound messages to a collector")
        .arg(
            Arg::new("status-file")
                .long("status-file")
                .takes_value(true)
                .global(true)
                .help("Where to publish the liveness notice"),
        )
        .arg(
            Arg::new("no-status-file")
                .long("no-status-file")
                .global(true)
                .conflicts_with("status-file")
                .help("Only log the liveness notice"),
        )
        .arg(
            Arg::new("message-identity")
                .long("message-identity")
                .takes_value(true)
                .global(true)
                .possible_values(["hardware", "configured"])
                .help("Device id carried by sms envelopes"),
        )
        .arg(
            Arg::new("serial-sources")
                .long("serial-sources")
                .takes_value(true)
                .global(true)
                .help("JSON list of device serial selectors"),
        )
        .arg(
            Arg::new("queue-depth")
                .long("queue-depth")
                .takes_value(true)
                .global(true),
        )
        .arg(
            Arg::new("max-in-flight")
                .long("max-in-flight")
                .takes_value(true)
                .global(true),
        )
        .subcommand(Command::new("boot").about("Start with the boot-time configuration"))
        .subcommand(
            Command::new("start")
                .about("Start with an explicit device id and collector")
                .arg(
                    Arg::new("device-id")
                        .long("device-id")
                        .takes_value(true)
                        .required(true),
                )
                .arg(
                    Arg::new("server-url")
                        .long("server-url")
                        .takes_value(true)
                        .required(true),
                ),
        )
}

pub fn settings_from(matches: &ArgMatches) -> Result<Settings> {
    let mut builder = SettingsBuilder::new();
    if let Some(identity) = matches.value_of("message-identity") {
        builder = builder.message_identity(identity.parse::<MessageIdentity>()?);
    }
    if let Some(depth) = matches.value_of("queue-depth") {
        builder = builder.queue_depth(depth.parse().context("invalid --queue-depth")?);
    }
    if let Some(max) = matches.value_of("max-in-flight") {
        builder = builder.max_in_flight(max.parse().context("invalid --max-in-flight")?);
    }
    builder.build()
}

/// The config requested on the command line. No subcommand behaves like `boot`.
pub fn config_from(matches: &ArgMatches, serial: &str) -> Result<AgentConfig> {
    match matches.subcommand() {
        Some(("start", sub)) => AgentConfig::new(
            sub.value_of("device-id").unwrap_or_default(),
            sub.value_of("server-url").unwrap_or_default(),
        ),
        _ => AgentConfig::cold_start(serial),
    }
}

pub async fn run_agent() -> Result<()> {
    init_logger();

    let matches = cli().get_matches();
    let settings = settings_from(&matches)?;
    let serial = host_unique::device_serial(matches.value_of("serial-sources"))?;
    let config = config_from(&matches, &serial)?;

    #[cfg(debug_assertions)]
    log::info!("Loaded settings: {settings:#?}");

    let liveness: Arc<dyn LivenessIndicator> = if matches.is_present("no-status-file") {
        Arc::new(LogIndicator)
    } else {
        let path = matches
            .value_of("status-file")
            .map(PathBuf::from)
            .unwrap_or_else(StatusFile::default_path);
        Arc::new(StatusFile::new(path))
    };

    let transport = HTTP::new(settings.proxy_uri.clone(), settings.request_timeout)
        .context("Failed to initialize transport")?;

    let platform = LocalPlatform::new();
    let host = Host {
        location: Arc::new(platform.clone()),
        messages: Arc::new(platform.clone()),
        liveness,
        serial,
    };
    let supervisor = Supervisor::new(host, transport, settings, &Handle::current());

    supervisor
        .start(config.device_id(), config.server_url())
        .context("agent start failed")?;

    // The feed may close early; the agent keeps running until it is told to stop
    tokio::spawn(async move {
        if let Err(err) = feed::pump(BufReader::new(tokio::io::stdin()), platform).await {
            log::error!("feed stopped: {:#}", err);
        }
    });

    wait_for_shutdown().await;

    log::info!("Agent shutting down");
    supervisor.shutdown().await;
    Ok(())
}

async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
                return;
            }
            Err(_err) => {
                #[cfg(debug_assertions)]
                log::error!("failed to install SIGTERM handler: {_err}");
            }
        }
    }
    if let Err(_err) = tokio::signal::ctrl_c().await {
        #[cfg(debug_assertions)]
        log::error!("failed to listen for ctrl-c: {_err}");
        std::future::pending::<()>().await;
    }
}

pub fn init_logger() {
    let _ = pretty_env_logger::formatted_timed_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_env("TETHER_LOG")
        .try_init();
    log::info!("Starting tether agent v{}", VERSION);
}
