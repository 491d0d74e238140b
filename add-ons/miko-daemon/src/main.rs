//! Miko Session Daemon
//!
//! A long-running process that hosts the behavior scheduler against the
//! local host and drives the requested mode from stdin lines for bring-up.
//! With `MIKO_LOOPBACK_BRIDGE=true` it also runs the call audio bridge
//! against the loopback transport and the default audio devices, so the
//! whole uplink/downlink path can be exercised without a real call.

use anyhow::Context;
use miko_bridge::{
    open_input, open_output, AudioBridge, BridgeConfig, DeviceConfig, InputStreamGuard,
    LoopbackTransport, OutputStreamGuard,
};
use miko_core::{relay_channel, CoreConfig, Mode, RelayProducer, SessionHandle};
use miko_motion::{AlsaMic, BehaviorScheduler, MicControl, NullBus, NullMic, SchedulerConfig};
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before any env::var calls)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[miko-daemon] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CoreConfig::from_env();
    tracing::info!(robot = %config.robot_name, "miko daemon starting");

    let session = SessionHandle::new();
    let (producer, consumer) = relay_channel(config.relay_capacity);
    let stop = Arc::new(AtomicBool::new(false));

    // ALSA capture control only when asked for; most dev hosts have no
    // Capture switch to drive.
    let mic: Box<dyn MicControl> = if env_flag("MIKO_ALSA_MIC") {
        Box::new(AlsaMic::default())
    } else {
        Box::new(NullMic::new())
    };

    // NullBus stands in until a pub/sub middleware binding is configured
    // for the host.
    let mut scheduler = BehaviorScheduler::new(
        session.clone(),
        consumer,
        Arc::new(NullBus),
        mic,
        SchedulerConfig::from_core(&config),
    );
    let scheduler_stop = Arc::clone(&stop);
    let scheduler_thread = std::thread::Builder::new()
        .name("miko-behavior".into())
        .spawn(move || scheduler.run(&scheduler_stop))
        .context("spawn behavior thread")?;

    let stdin_session = session.clone();
    std::thread::Builder::new()
        .name("miko-stdin".into())
        .spawn(move || mode_driver(stdin_session))
        .context("spawn stdin driver")?;

    let bridge = if env_flag("MIKO_LOOPBACK_BRIDGE") {
        Some(start_loopback_bridge(&config, producer)?)
    } else {
        None
    };

    tokio::signal::ctrl_c().await.context("install ctrl-c handler")?;
    tracing::info!("CTRL-C received; shutting down");

    stop.store(true, Ordering::Relaxed);
    if scheduler_thread.join().is_err() {
        tracing::warn!("behavior thread panicked during shutdown");
    }

    if let Some((mut bridge, guards)) = bridge {
        if let Err(e) = bridge.leave() {
            tracing::warn!(error = %e, "bridge leave failed");
        }
        // Streams stay alive until the loops have joined.
        drop(guards);
    }

    tracing::info!("miko daemon stopped");
    Ok(())
}

/// Keyboard control path: one mode name per line (`happy`, `sad`, `idle`,
/// `speaking`, `listening`), plus `agent on`/`agent off` to toggle the
/// agent-speaking override.
fn mode_driver(session: SessionHandle) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::debug!(error = %e, "stdin closed");
                return;
            }
        };
        match line.trim() {
            "" => {}
            "agent on" => session.set_agent_speaking(true),
            "agent off" => session.set_agent_speaking(false),
            word => match word.parse::<Mode>() {
                Ok(mode) => {
                    tracing::info!(%mode, "mode requested from stdin");
                    session.set_requested_mode(mode);
                }
                Err(e) => tracing::warn!(error = %e, "ignoring stdin line"),
            },
        }
    }
}

/// Bring the bridge up against the loopback transport and the host's
/// default capture/playback devices. The returned guards own the device
/// streams and must outlive the bridge loops.
fn start_loopback_bridge(
    config: &CoreConfig,
    producer: RelayProducer,
) -> anyhow::Result<(AudioBridge, (InputStreamGuard, OutputStreamGuard))> {
    let (input_guard, reader) = open_input(DeviceConfig::default()).context("open capture")?;
    let (output_guard, writer) = open_output(DeviceConfig::default()).context("open playback")?;

    let mut bridge = AudioBridge::new(
        Arc::new(LoopbackTransport::new(16)),
        BridgeConfig {
            speaker_name: config.speaker_name.clone(),
            gain: config.downlink_gain,
            ..BridgeConfig::default()
        },
    );
    let url = config
        .room_url
        .clone()
        .unwrap_or_else(|| "loopback://local".to_string());
    bridge
        .start(Box::new(reader), Box::new(writer), Some(producer), &url)
        .context("start bridge")?;
    for event in LoopbackTransport::startup_events() {
        bridge.handle_event(event);
    }
    tracing::info!("loopback bridge running");
    Ok((bridge, (input_guard, output_guard)))
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
