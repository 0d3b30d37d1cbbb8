mod config;
mod debug_view;

use anyhow::Context;
use buttons::{Buttons, UserEvent};
use clock::{Clock, SystemClock};
use config::{Config, SimulationMode};
use debug_view::PngDebugView;
use env_logger::Env;
use log::*;
use motion::{StepOutcome, Supervisor};
use network::{Gateway, HttpGateway, HttpTransport, RecordingGateway, ReplayGateway, ResilientClient};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;

    let clock = SystemClock::new(config.get_timezone_offset());
    info!(
        "Local time {}",
        clock.local_time().format("%d/%m/%Y %H:%M:%S")
    );

    let gateway = open_gateway(&config, &clock)?;
    let view = PngDebugView::new(
        &config.storage.debug_dir,
        config.storage.snapshot_dir.as_deref(),
        clock.clone(),
    )
    .context("preparing the debug view folders")?;

    let mut supervisor = Supervisor::new(
        gateway,
        clock,
        view,
        config.tracking,
        config.supervisor,
    );
    let mut buttons = Buttons::from_stdin();
    info!("Commands: corner X Y, reset, pause, next, up/down/left/right/up-left/.../stop, quit");

    let mut outcome = supervisor.start();
    loop {
        if let StepOutcome::Fatal(reason) = &outcome {
            error!("Supervisor halted: {}", reason);
            error!("The mirror is left as is, restart once the rig has been checked");
            return Ok(ExitCode::FAILURE);
        }

        let event = buttons.tick(config.supervisor.input_poll());
        if event == Some(UserEvent::Exit) {
            info!("Exit requested in state {}", supervisor.state());
            break;
        }

        outcome = supervisor.step(event);
        if outcome == StepOutcome::Paused {
            debug!("Paused, waiting for next");
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn open_gateway(config: &Config, clock: &SystemClock) -> anyhow::Result<Box<dyn Gateway>> {
    let simulation = &config.simulation;
    if simulation.mode == SimulationMode::Replay {
        info!("Replaying captures from {}", simulation.replay_folder.display());
        return Ok(Box::new(ReplayGateway::new(&simulation.replay_folder)?));
    }

    let policy = config.gateway.retry_policy();
    let transport = HttpTransport::new(policy.timeout)?;
    let client = ResilientClient::new(config.get_gateway_url(), transport, clock.clone(), policy);
    info!("Gateway at {}", client.base_url());
    let gateway = HttpGateway::new(client);

    match simulation.mode {
        SimulationMode::Record => {
            info!("Recording captures to {}", simulation.record_folder.display());
            Ok(Box::new(RecordingGateway::new(
                gateway,
                &simulation.record_folder,
                clock.clone(),
            )?))
        }
        _ => Ok(Box::new(gateway)),
    }
}
