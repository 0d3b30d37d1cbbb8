// The tracking state machine. It owns every piece of mutable state (area, session, frames)
// and is advanced one tick at a time by the caller's loop, with at most one operator event per
// tick. Anything it cannot handle halts it for good: the motors are then never commanded again.

use crate::direction::{best_motors_direction, BorderSet};
use crate::error::{StepOutcome, SupervisorError};
use crate::observer::{Annotations, Observer};
use crate::planner::{borders_to_move_away, move_had_effect, SunMove, TrackingConfig};
use crate::session::TrackingSession;
use crate::states::SupervisorState;
use buttons::UserEvent;
use clock::Clock;
use log::*;
use network::{Gateway, MotorsDirection, MotorsStatus};
use serde::{Deserialize, Serialize};
use spot::{blur3x3, border_baseline, locate_spot, paste_area, Frame, Rectangle};
use std::collections::VecDeque;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Frame refresh period while no area is defined
    pub area_refresh_s: u64,
    pub sun_move_wait_s: u64,
    pub status_poll_s: u64,
    pub input_poll_ms: u64,
    pub pause_after_step: bool,
    /// Capture only the area and merge it into the last full frame
    pub capture_area_only: bool,
    pub blur: bool,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            area_refresh_s: 10,
            sun_move_wait_s: 60,
            status_poll_s: 1,
            input_poll_ms: 50,
            pause_after_step: false,
            capture_area_only: false,
            blur: true,
        }
    }
}

impl SupervisorConfig {
    pub fn area_refresh(&self) -> Duration {
        Duration::from_secs(self.area_refresh_s)
    }

    pub fn sun_move_wait(&self) -> Duration {
        Duration::from_secs(self.sun_move_wait_s)
    }

    pub fn status_poll(&self) -> Duration {
        Duration::from_secs(self.status_poll_s)
    }

    pub fn input_poll(&self) -> Duration {
        Duration::from_millis(self.input_poll_ms)
    }
}

pub struct Supervisor<G: Gateway, C: Clock, O: Observer> {
    gateway: G,
    clock: C,
    observer: O,
    tracking: TrackingConfig,
    config: SupervisorConfig,
    pause_after_step: bool,

    state: SupervisorState,
    state_entered_at: Duration,
    last_status_poll_at: Duration,

    corners: VecDeque<(u32, u32)>,
    area: Option<Rectangle>,
    /// Last full capture, never blurred nor merged
    last_full_frame: Option<Frame>,
    /// Last analysed frame
    current_frame: Option<Frame>,
    /// Spot the sun drift is measured from while waiting
    reference_spot: Option<Rectangle>,
    session: Option<TrackingSession>,
    annotations: Annotations,
    fatal: Option<SupervisorError>,
}

impl<G: Gateway, C: Clock, O: Observer> Supervisor<G, C, O> {
    pub fn new(
        gateway: G,
        clock: C,
        observer: O,
        tracking: TrackingConfig,
        config: SupervisorConfig,
    ) -> Self {
        let now = clock.now();
        let state = SupervisorState::WaitingAreaDefinition;
        Self {
            gateway,
            clock,
            observer,
            tracking,
            config,
            pause_after_step: config.pause_after_step,
            state,
            state_entered_at: now,
            last_status_poll_at: now,
            corners: VecDeque::new(),
            area: None,
            last_full_frame: None,
            current_frame: None,
            reference_spot: None,
            session: None,
            annotations: Annotations::new(state),
            fatal: None,
        }
    }

    /// Takes the first frame, on which the operator defines the area
    pub fn start(&mut self) -> StepOutcome {
        info!("Supervisor starting, waiting for the area definition");
        let result = self.refresh_frame();
        self.outcome(result)
    }

    /// One tick of the loop
    pub fn step(&mut self, event: Option<UserEvent>) -> StepOutcome {
        if let Some(reason) = &self.fatal {
            return StepOutcome::Fatal(reason.clone());
        }
        let result = self.tick(event);
        self.outcome(result)
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn area(&self) -> Option<Rectangle> {
        self.area
    }

    pub fn session(&self) -> Option<&TrackingSession> {
        self.session.as_ref()
    }

    pub fn pause_after_step(&self) -> bool {
        self.pause_after_step
    }

    pub fn is_halted(&self) -> bool {
        self.fatal.is_some()
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    fn outcome(&mut self, result: Result<(), SupervisorError>) -> StepOutcome {
        match result {
            Ok(()) if self.state == SupervisorState::TrackingPaused => StepOutcome::Paused,
            Ok(()) => StepOutcome::Continue,
            Err(reason) => self.halt(reason),
        }
    }

    fn halt(&mut self, reason: SupervisorError) -> StepOutcome {
        error!("Fatal: {}. Motors will not be commanded until restart", reason);
        self.observer
            .freeze(self.current_frame.as_ref(), &self.annotations, &reason);
        self.fatal = Some(reason.clone());
        StepOutcome::Fatal(reason)
    }

    fn tick(&mut self, event: Option<UserEvent>) -> Result<(), SupervisorError> {
        let mut skip_wait = false;
        match event {
            None => {}
            Some(UserEvent::Exit) => debug!("Exit is left to the caller"),
            Some(UserEvent::TogglePause) => {
                self.pause_after_step = !self.pause_after_step;
                info!("Pause after each tracking step: {}", self.pause_after_step);
            }
            Some(UserEvent::AreaCorner { x, y }) => self.add_corner(x, y)?,
            Some(UserEvent::ResetArea) => self.reset_area()?,
            Some(UserEvent::Manual(direction)) => self.manual_override(direction)?,
            Some(UserEvent::SkipWait) => skip_wait = true,
        }

        let in_state = self.clock.elapsed_since(self.state_entered_at);
        match self.state {
            SupervisorState::WaitingAreaDefinition => {
                if skip_wait || in_state >= self.config.area_refresh() {
                    self.refresh_frame()?;
                }
            }
            SupervisorState::WaitingSunMove => {
                if skip_wait || in_state >= self.config.sun_move_wait() {
                    self.check_sun_move()?;
                }
            }
            SupervisorState::Tracking => {
                if self.clock.elapsed_since(self.last_status_poll_at) >= self.config.status_poll() {
                    self.poll_tracking()?;
                }
            }
            SupervisorState::TrackingPaused => {
                if skip_wait {
                    info!("Tracking resumed by the operator");
                    self.enter(SupervisorState::Tracking);
                }
            }
        }
        Ok(())
    }

    fn enter(&mut self, state: SupervisorState) {
        let now = self.clock.now();
        if state != self.state {
            info!("{} -> {} at {:.1}s", self.state, state, now.as_secs_f64());
        } else {
            debug!("{} restarted at {:.1}s", state, now.as_secs_f64());
        }
        self.state = state;
        self.state_entered_at = now;
        self.last_status_poll_at = now;
        self.annotations.state = state;
    }

    fn enter_after_move(&mut self) {
        if self.pause_after_step {
            info!("Paused after the step, send next to continue");
            self.enter(SupervisorState::TrackingPaused);
        } else {
            self.enter(SupervisorState::Tracking);
        }
    }

    fn analysed(&mut self, frame: Frame) -> Frame {
        let frame = if self.config.blur { blur3x3(&frame) } else { frame };
        self.current_frame = Some(frame.clone());
        frame
    }

    fn capture_full(&mut self) -> Result<Frame, SupervisorError> {
        let frame = self.gateway.capture()?;
        self.last_full_frame = Some(frame.clone());
        Ok(self.analysed(frame))
    }

    /// Frame to analyse: a full capture, or the area merged into the last full capture
    fn capture_for_analysis(&mut self) -> Result<Frame, SupervisorError> {
        if self.config.capture_area_only {
            if let (Some(area), Some(last_full)) = (self.area, self.last_full_frame.as_ref()) {
                let area_image = self.gateway.capture_area(&area)?;
                let merged = paste_area(last_full, &area, &area_image)?;
                return Ok(self.analysed(merged));
            }
        }
        self.capture_full()
    }

    fn locate(&self, frame: &Frame, area: &Rectangle) -> Result<Option<Rectangle>, SupervisorError> {
        if log_enabled!(Level::Debug) {
            debug!("Border baseline {}", border_baseline(frame, area)?);
        }
        let spot = locate_spot(frame, area, &self.tracking.detector())?;
        match spot {
            Some(spot) => info!("Spot {}", spot),
            None => info!("No spot in area {}", area),
        }
        Ok(spot)
    }

    fn clear_analysis(&mut self) {
        self.annotations.spot = None;
        self.annotations.spot_before_move = None;
        self.annotations.frame_before_move = None;
        self.annotations.borders = BorderSet::new();
        self.annotations.sun_move = None;
        self.annotations.step_count = None;
    }

    fn refresh_frame(&mut self) -> Result<(), SupervisorError> {
        let frame = self.capture_full()?;
        self.clear_analysis();
        self.observer.show(&frame, &self.annotations);
        self.enter(SupervisorState::WaitingAreaDefinition);
        Ok(())
    }

    fn add_corner(&mut self, x: u32, y: u32) -> Result<(), SupervisorError> {
        if !self.state.accepts_area_events() {
            warn!("Ignoring area corner ({}, {}) while {}", x, y, self.state);
            return Ok(());
        }
        if self.corners.len() == 2 {
            self.corners.pop_front();
        }
        self.corners.push_back((x, y));
        self.annotations.corners = self.corners.iter().copied().collect();
        info!("Area corner ({}, {})", x, y);
        if self.corners.len() < 2 {
            return Ok(());
        }

        let area = Rectangle::from_corners(self.corners[0], self.corners[1]);
        let Some((width, height)) = self.current_frame.as_ref().map(|frame| frame.dimensions()) else {
            warn!("No frame to check area {} against", area);
            return Ok(());
        };
        if !area.fits_in(width, height) {
            warn!("Area {} does not fit in the {}x{} frame", area, width, height);
            return Ok(());
        }

        info!("Area defined: {}", area);
        self.area = Some(area);
        self.annotations.area = Some(area);
        self.watch_sun_from_now(area)
    }

    /// Captures the frame the sun drift will be measured from, then waits for the sun
    fn watch_sun_from_now(&mut self, area: Rectangle) -> Result<(), SupervisorError> {
        let frame = self.capture_for_analysis()?;
        let spot = self.locate(&frame, &area)?;
        self.reference_spot = spot;
        self.clear_analysis();
        self.annotations.spot = spot;
        self.observer.show(&frame, &self.annotations);
        self.enter(SupervisorState::WaitingSunMove);
        Ok(())
    }

    fn reset_area(&mut self) -> Result<(), SupervisorError> {
        if !self.state.accepts_area_events() {
            warn!("Ignoring area reset while {}", self.state);
            return Ok(());
        }
        info!("Area reset");
        self.corners.clear();
        self.area = None;
        self.reference_spot = None;
        self.session = None;
        self.annotations.corners.clear();
        self.annotations.area = None;
        self.refresh_frame()
    }

    fn check_sun_move(&mut self) -> Result<(), SupervisorError> {
        let area = self
            .area
            .ok_or_else(|| SupervisorError::InvalidState("waiting for the sun without an area".into()))?;
        let frame = self.capture_for_analysis()?;
        let spot = self.locate(&frame, &area)?;
        self.clear_analysis();
        self.annotations.spot = spot;

        let started = match (self.reference_spot, spot) {
            (_, None) => false,
            (None, Some(spot)) => {
                info!("Sun drift now measured from spot {}", spot);
                self.reference_spot = Some(spot);
                false
            }
            (Some(reference), Some(spot)) => self.try_start_tracking(&frame, &area, &reference, spot)?,
        };

        if !started {
            self.observer.show(&frame, &self.annotations);
            self.enter(SupervisorState::WaitingSunMove);
        }
        Ok(())
    }

    /// Starts an episode when the sun moved enough to push the spot towards a border
    fn try_start_tracking(
        &mut self,
        frame: &Frame,
        area: &Rectangle,
        reference: &Rectangle,
        spot: Rectangle,
    ) -> Result<bool, SupervisorError> {
        let sun_move = SunMove::between(reference, &spot);
        self.annotations.sun_move = Some(sun_move);
        info!(
            "Sun move ({:.1}, {:.1}), {:.1} px",
            sun_move.dx,
            sun_move.dy,
            sun_move.magnitude()
        );
        if sun_move.magnitude() < self.tracking.min_sun_move_px {
            info!("Sun move too small, waiting longer");
            return Ok(false);
        }

        let borders = borders_to_move_away(&spot, area, &sun_move, &self.tracking);
        self.annotations.borders = borders;
        if borders.is_empty() {
            info!("Spot is away from the borders, nothing to correct");
            return Ok(false);
        }

        let direction = best_motors_direction(&borders)?;
        let session = TrackingSession::start(
            direction,
            spot,
            frame.clone(),
            sun_move,
            self.tracking.panels_count,
        );
        info!("Tracking starts: moving {} away from {}", direction, borders);
        self.gateway.move_one_step(direction, session.panels.panel())?;

        self.annotations.spot_before_move = Some(spot);
        self.annotations.step_count = Some(session.step_count);
        self.observer.show(frame, &self.annotations);
        self.session = Some(session);
        self.reference_spot = None;
        self.enter_after_move();
        Ok(true)
    }

    fn poll_tracking(&mut self) -> Result<(), SupervisorError> {
        self.last_status_poll_at = self.clock.now();
        match self.gateway.motors_status()? {
            MotorsStatus::MovingOneStep => {
                debug!("Motors still moving");
                Ok(())
            }
            MotorsStatus::Locked => self.evaluate_tracking(),
            status => Err(SupervisorError::UnexpectedMotorsStatus {
                status,
                context: "tracking",
            }),
        }
    }

    /// Looks at the spot after a move and issues the next one, or ends the episode
    fn evaluate_tracking(&mut self) -> Result<(), SupervisorError> {
        let area = self
            .area
            .ok_or_else(|| SupervisorError::InvalidState("tracking without an area".into()))?;
        let mut session = self
            .session
            .take()
            .ok_or_else(|| SupervisorError::InvalidState("tracking without a session".into()))?;

        let frame = self.capture_for_analysis()?;
        let spot = self.locate(&frame, &area)?;
        self.clear_analysis();
        self.annotations.spot = spot;
        self.annotations.spot_before_move = Some(session.spot_before_move);
        self.annotations.frame_before_move = Some(session.frame_before_move.clone());
        self.annotations.sun_move = Some(session.sun_move);
        self.annotations.step_count = Some(session.step_count);

        let Some(spot) = spot else {
            warn!(
                "Spot lost during tracking, episode ends after {} steps",
                session.step_count
            );
            self.observer.show(&frame, &self.annotations);
            self.enter(SupervisorState::WaitingSunMove);
            return Ok(());
        };

        let borders = borders_to_move_away(&spot, &area, &session.sun_move, &self.tracking);
        self.annotations.borders = borders;
        self.observer.show(&frame, &self.annotations);

        if borders.is_empty() {
            info!("Tracking episode complete after {} steps", session.step_count);
            self.observer.episode_complete(&frame, &self.annotations);
            self.reference_spot = Some(spot);
            self.enter(SupervisorState::WaitingSunMove);
            return Ok(());
        }

        if session.step_count > self.tracking.max_tracking_steps {
            return Err(SupervisorError::NonConvergence {
                steps: session.step_count,
            });
        }

        let had_effect = move_had_effect(
            &session.spot_before_move,
            &spot,
            session.current_direction,
            self.tracking.min_spot_overrun_px,
        );
        session.panels.after_move(had_effect);

        let direction = best_motors_direction(&borders)?;
        session.next_move(direction, spot, frame);
        info!(
            "Tracking step {}: moving {} away from {}",
            session.step_count, direction, borders
        );
        self.gateway.move_one_step(direction, session.panels.panel())?;

        self.annotations.step_count = Some(session.step_count);
        self.session = Some(session);
        self.enter_after_move();
        Ok(())
    }

    /// One operator step, outside of the state machine
    fn manual_override(&mut self, direction: MotorsDirection) -> Result<(), SupervisorError> {
        if direction == MotorsDirection::Stop {
            info!("Manual stop");
            self.gateway.stop()?;
            return Ok(());
        }

        info!("Manual move {}", direction);
        self.wait_for_locked("waiting to move manually")?;
        let panel = self.session.as_ref().and_then(|session| session.panels.panel());
        self.gateway.move_one_step(direction, panel)?;
        self.wait_for_locked("moving manually")?;

        // The hand move is not sun drift
        match (self.state, self.area) {
            (SupervisorState::WaitingSunMove, Some(area)) => {
                info!("Sun drift measured again after the manual move");
                self.watch_sun_from_now(area)
            }
            _ => Ok(()),
        }
    }

    fn wait_for_locked(&mut self, context: &'static str) -> Result<(), SupervisorError> {
        loop {
            match self.gateway.motors_status()? {
                MotorsStatus::Locked => return Ok(()),
                MotorsStatus::MovingOneStep => self.clock.sleep(self.config.status_poll()),
                status => return Err(SupervisorError::UnexpectedMotorsStatus { status, context }),
            }
        }
    }
}
