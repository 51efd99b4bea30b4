// Framework bootstrap for the flight client: logging, then the frame loop.

use crate::domain::ports::InputSource;
use crate::frameworks::config;
use crate::interface_adapters::input::ScriptedInput;
use crate::interface_adapters::net::{self, ClientError, LinkEvent};
use crate::use_cases::{FlightSession, SessionTuning};

use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

// Frames between two telemetry log lines.
const TELEMETRY_EVERY: u64 = 60;

pub fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Flies the local craft until `shutdown` resolves or the relay goes away.
///
/// Everything runs on the calling task: frames, replication sends and
/// inbound messages interleave through one `select!`, so the session is
/// never shared.
pub async fn run(
    relay_url: &str,
    mut input: impl InputSource,
    shutdown: impl Future<Output = ()>,
) -> Result<FlightSession, ClientError> {
    let mut session = FlightSession::new(SessionTuning::default())?;
    let mut link = net::connect(
        relay_url,
        config::OUTBOUND_CHANNEL_CAPACITY,
        config::INBOUND_CHANNEL_CAPACITY,
    )
    .await
    .inspect_err(|e| error!(%relay_url, error = %e, "failed to connect"))?;

    let started = Instant::now();
    let mut frames = tokio::time::interval(config::FRAME_INTERVAL);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut replication = tokio::time::interval(config::REPLICATION_INTERVAL);
    replication.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut link_open = true;
    while link_open {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown requested");
                break;
            }

            _ = frames.tick() => {
                let report = session.tick(input.poll(), started.elapsed());
                for event in &report.collisions {
                    info!(other = %event.other, normal = ?event.normal, "collision");
                }
                if session.ticks() % TELEMETRY_EVERY == 0 {
                    let t = session.flight().telemetry();
                    debug!(
                        speed = t.speed,
                        altitude = t.altitude,
                        latitude = t.latitude,
                        longitude = t.longitude,
                        hour = session.orbit().hour_of_day(),
                        peers = session.replication().len(),
                        "telemetry"
                    );
                }
            }

            _ = replication.tick() => {
                link.send(session.outbound());
            }

            event = link.recv() => match event {
                Some(LinkEvent::Message(msg)) => session.apply_server_message(msg),
                Some(LinkEvent::Closed) | None => {
                    warn!("relay connection lost");
                    session.connection_lost();
                    link_open = false;
                }
            },
        }
    }

    link.close().await;
    info!(ticks = session.ticks(), "flight ended");
    Ok(session)
}

pub async fn run_with_config() -> Result<(), ClientError> {
    init_runtime();

    let input = ScriptedInput::parse(&config::flight_input());
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    run(&config::relay_url(), input, shutdown).await.map(|_| ())
}
