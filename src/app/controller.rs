//! Controller lifecycle — start-up, wiring and bounded shutdown.
//!
//! ```text
//!              ┌──────────────┐  edge   ┌─────────────┐  wake  ┌────────────────┐
//!  button ───▶ │ HardwarePort │ ──────▶ │ EdgeHandler │ ─────▶ │ ActuationTask  │ ──▶ LED1..3
//!              └──────────────┘         └─────────────┘        └────────────────┘
//!                     ▲                        │ stats                 ▲ mode/timing
//!                     │ debounce               ▼                       │
//!                     └──────────────── ConfigSurface ◀──▶ ControlState
//! ```
//!
//! Start-up acquires resources in a fixed order and, on any failure,
//! gives back everything already acquired in reverse.  The edge
//! callback is registered last, after the task exists, so the first
//! press always has a task to wake.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};

use crate::config::ControllerConfig;
use crate::drivers::led_bank::LedBank;
use crate::error::{Error, Resource, Result};

use super::actuator::{ActuationTask, ActuatorHandle};
use super::attributes::ConfigSurface;
use super::edge::EdgeHandler;
use super::ports::{ClockPort, EdgeSource, HardwarePort, LineId, LineMode};
use super::signal::ActuatorSignal;
use super::state::ControlState;

pub struct Controller {
    config: ControllerConfig,
    hw: Arc<dyn HardwarePort>,
    state: Arc<ControlState>,
    surface: ConfigSurface,
    leds: LedBank,
    source: Option<EdgeSource>,
    task: Option<ActuatorHandle>,
    released: bool,
}

impl Controller {
    /// Validate `config`, claim the lines, start the actuation task and
    /// hook the button.
    pub fn start(
        config: ControllerConfig,
        hw: Arc<dyn HardwarePort>,
        clock: Arc<dyn ClockPort>,
    ) -> Result<Self> {
        config.validate()?;
        info!(
            "Starting controller: LEDs {:?}, button {} ({:?}), mode {}",
            config.led_lines, config.button_line, config.edge, config.mode
        );

        let state = Arc::new(ControlState::new(&config, clock.now()));
        let signal = Arc::new(ActuatorSignal::new());
        let button = config.button_line;
        let mut claims = Claims::new(hw.clone());

        for &line in &config.led_lines {
            hw.request_line(line, LineMode::Output { initial: false })
                .map_err(|e| Resource::Line(line, e))?;
            claims.push(line);
        }
        hw.request_line(button, LineMode::Input)
            .map_err(|e| Resource::Line(button, e))?;
        claims.push(button);

        hw.set_debounce(button, state.effective_debounce_ms())
            .map_err(|e| {
                error!("Debounce setup on line {} failed: {}", button, e);
                Error::HardwareWriteFailure(button)
            })?;
        let source = hw
            .map_to_edge_source(button)
            .map_err(|e| Resource::EdgeSource(button, e))?;

        let mut task = ActuationTask::new(
            state.clone(),
            signal.clone(),
            LedBank::new(hw.clone(), config.led_lines),
            config.burst_trigger,
            config.burst_retrigger,
        )
        .spawn(config.task_stack_kb)?;

        let handler = EdgeHandler::new(state.clone(), signal.clone(), clock);
        if let Err(e) = hw.register_edge_callback(source, config.edge, handler.into_callback()) {
            error!("Edge callback registration on line {} failed: {}", button, e);
            if task.stop(stop_timeout(&config, &state)).is_err() {
                // The task may still drive the LEDs; keep them claimed.
                claims.disarm();
            }
            return Err(Resource::EdgeCallback(button, e).into());
        }

        claims.disarm();
        info!("Controller started");

        let surface = ConfigSurface::new(state.clone(), signal, hw.clone(), button);
        let leds = LedBank::new(hw.clone(), config.led_lines);
        Ok(Self {
            config,
            hw,
            state,
            surface,
            leds,
            source: Some(source),
            task: Some(task),
            released: false,
        })
    }

    /// The configuration surface.  Clone it to hand to other contexts.
    pub fn surface(&self) -> &ConfigSurface {
        &self.surface
    }

    pub fn state(&self) -> &Arc<ControlState> {
        &self.state
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(ActuatorHandle::is_running)
    }

    /// Stop the controller: detach the button, stop the task, switch the
    /// LEDs off and release every line.
    ///
    /// The task gets one blink period plus the configured grace to exit.
    /// If it does not, [`Error::ShutdownTimeout`] is returned, the lines
    /// stay claimed and a later call may retry.  Calling again after a
    /// successful shutdown is a no-op.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        info!("Shutting down controller");

        if let Some(source) = self.source.take() {
            self.hw.unregister_edge_callback(source);
        }

        if let Some(task) = self.task.as_mut() {
            task.stop(stop_timeout(&self.config, &self.state))?;
        }
        self.task = None;

        let failed = self.leds.set_all(false);
        if failed > 0 {
            warn!("{} LED line(s) could not be switched off", failed);
        }

        for &line in self.leds.lines().iter().rev() {
            self.hw.release_line(line);
        }
        self.hw.release_line(self.config.button_line);
        self.released = true;
        info!("Controller stopped");
        Ok(())
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!("Shutdown on drop failed: {}", e);
        }
    }
}

/// One blink period (current value) plus the configured grace.
fn stop_timeout(config: &ControllerConfig, state: &ControlState) -> Duration {
    Duration::from_millis(
        u64::from(state.blink_period_ms()) + u64::from(config.shutdown_grace_ms),
    )
}

/// Lines claimed so far during start-up.  Released in reverse order on
/// drop unless disarmed.
struct Claims {
    hw: Arc<dyn HardwarePort>,
    lines: Vec<LineId>,
}

impl Claims {
    fn new(hw: Arc<dyn HardwarePort>) -> Self {
        Self {
            hw,
            lines: Vec::with_capacity(4),
        }
    }

    fn push(&mut self, line: LineId) {
        self.lines.push(line);
    }

    fn disarm(&mut self) {
        self.lines.clear();
    }
}

impl Drop for Claims {
    fn drop(&mut self) {
        for &line in self.lines.iter().rev() {
            warn!("Start-up unwinding: releasing line {}", line);
            self.hw.release_line(line);
        }
    }
}
