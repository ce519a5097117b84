//! GPIO adapter over `embedded-hal` 1.0 pins.
//!
//! Wraps three output pins and one input pin that the board layer has
//! already configured (e.g. esp-idf-hal `PinDriver`s), and presents them
//! as a [`HardwarePort`] keyed by GPIO number.
//!
//! The input has no interrupt here: a poller calls [`HalGpio::poll`] at
//! a fixed rate (see [`crate::pins::BUTTON_POLL_MS`]) and edges are found
//! by the software [`EdgeDetector`], which also applies the debounce
//! window.  The registered callback therefore runs on the poller thread,
//! never in interrupt context.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, warn};

use crate::app::ports::{
    ClockPort, EdgeCallback, EdgePolarity, EdgeSource, HardwarePort, LineId, LineMode, PortError,
};
use crate::drivers::edge_detect::EdgeDetector;

struct OutputSlot<O> {
    id: LineId,
    pin: O,
    claimed: bool,
    level: bool,
}

struct InputSlot<I> {
    id: LineId,
    pin: I,
    claimed: bool,
    debounce_ms: u32,
    edge: Option<(EdgeDetector, EdgeCallback)>,
}

pub struct HalGpio<O, I> {
    clock: Arc<dyn ClockPort>,
    outputs: Mutex<Vec<OutputSlot<O>>>,
    input: Mutex<InputSlot<I>>,
}

fn relock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<O, I> HalGpio<O, I>
where
    O: OutputPin + Send,
    I: InputPin + Send,
{
    pub fn new(
        clock: Arc<dyn ClockPort>,
        outputs: impl IntoIterator<Item = (LineId, O)>,
        input: (LineId, I),
    ) -> Self {
        let outputs = outputs
            .into_iter()
            .map(|(id, pin)| OutputSlot {
                id,
                pin,
                claimed: false,
                level: false,
            })
            .collect();
        Self {
            clock,
            outputs: Mutex::new(outputs),
            input: Mutex::new(InputSlot {
                id: input.0,
                pin: input.1,
                claimed: false,
                debounce_ms: 0,
                edge: None,
            }),
        }
    }

    /// Sample the input once and dispatch a qualifying edge.  Cheap when
    /// no callback is registered.
    pub fn poll(&self) {
        let now = self.clock.now();
        let fire = {
            let mut input = relock(&self.input);
            let InputSlot { pin, edge, id, .. } = &mut *input;
            let Some((detector, callback)) = edge.as_mut() else {
                return;
            };
            match pin.is_high() {
                Ok(level) => detector.sample(level, now).then(|| callback.clone()),
                Err(_) => {
                    warn!("Input line {} read failed", id);
                    None
                }
            }
        };
        if let Some(callback) = fire {
            callback();
        }
    }

    fn with_output<R>(
        &self,
        id: LineId,
        f: impl FnOnce(&mut OutputSlot<O>) -> Result<R, PortError>,
    ) -> Result<R, PortError> {
        let mut outputs = relock(&self.outputs);
        match outputs.iter_mut().find(|slot| slot.id == id) {
            Some(slot) => f(slot),
            None => Err(PortError::UnknownLine(id)),
        }
    }

    /// Run `f` on the input slot if `id` names it and it is claimed.
    fn with_input<R>(
        &self,
        id: LineId,
        f: impl FnOnce(&mut InputSlot<I>) -> Result<R, PortError>,
    ) -> Result<R, PortError> {
        let mut input = relock(&self.input);
        if input.id != id {
            return Err(if self.is_output(id) {
                PortError::WrongDirection(id)
            } else {
                PortError::UnknownLine(id)
            });
        }
        if !input.claimed {
            return Err(PortError::NotClaimed(id));
        }
        f(&mut *input)
    }

    fn is_output(&self, id: LineId) -> bool {
        relock(&self.outputs).iter().any(|slot| slot.id == id)
    }
}

fn write_pin<O: OutputPin>(slot: &mut OutputSlot<O>, high: bool) -> Result<(), PortError> {
    let res = if high {
        slot.pin.set_high()
    } else {
        slot.pin.set_low()
    };
    res.map_err(|_| PortError::Io(slot.id))?;
    slot.level = high;
    Ok(())
}

impl<O, I> HardwarePort for HalGpio<O, I>
where
    O: OutputPin + Send,
    I: InputPin + Send,
{
    fn request_line(&self, id: LineId, mode: LineMode) -> Result<(), PortError> {
        match mode {
            LineMode::Output { initial } => self.with_output(id, |slot| {
                if slot.claimed {
                    return Err(PortError::Busy(id));
                }
                write_pin(slot, initial)?;
                slot.claimed = true;
                debug!("Line {} claimed as output", id);
                Ok(())
            }),
            LineMode::Input => {
                let mut input = relock(&self.input);
                if input.id != id {
                    return Err(if self.is_output(id) {
                        PortError::WrongDirection(id)
                    } else {
                        PortError::UnknownLine(id)
                    });
                }
                if input.claimed {
                    return Err(PortError::Busy(id));
                }
                input.claimed = true;
                debug!("Line {} claimed as input", id);
                Ok(())
            }
        }
    }

    fn release_line(&self, id: LineId) {
        if let Some(slot) = relock(&self.outputs).iter_mut().find(|s| s.id == id) {
            slot.claimed = false;
            return;
        }
        let mut input = relock(&self.input);
        if input.id == id {
            input.claimed = false;
            input.edge = None;
            input.debounce_ms = 0;
        }
    }

    fn set_line(&self, id: LineId, high: bool) -> Result<(), PortError> {
        if relock(&self.input).id == id {
            return Err(PortError::WrongDirection(id));
        }
        self.with_output(id, |slot| {
            if !slot.claimed {
                return Err(PortError::NotClaimed(id));
            }
            write_pin(slot, high)
        })
    }

    fn get_line(&self, id: LineId) -> Result<bool, PortError> {
        if self.is_output(id) {
            return self.with_output(id, |slot| {
                if slot.claimed {
                    Ok(slot.level)
                } else {
                    Err(PortError::NotClaimed(id))
                }
            });
        }
        self.with_input(id, |input| input.pin.is_high().map_err(|_| PortError::Io(id)))
    }

    fn set_debounce(&self, id: LineId, window_ms: u32) -> Result<(), PortError> {
        self.with_input(id, |input| {
            input.debounce_ms = window_ms;
            if let Some((detector, _)) = input.edge.as_mut() {
                detector.set_window(window_ms);
            }
            Ok(())
        })
    }

    fn map_to_edge_source(&self, id: LineId) -> Result<EdgeSource, PortError> {
        self.with_input(id, |_| Ok(EdgeSource(id)))
    }

    fn register_edge_callback(
        &self,
        source: EdgeSource,
        polarity: EdgePolarity,
        callback: EdgeCallback,
    ) -> Result<(), PortError> {
        let id = source.0;
        self.with_input(id, |input| {
            if input.edge.is_some() {
                return Err(PortError::Busy(id));
            }
            let level = input.pin.is_high().map_err(|_| PortError::Io(id))?;
            let detector = EdgeDetector::new(polarity, level, input.debounce_ms);
            input.edge = Some((detector, callback));
            Ok(())
        })
    }

    fn unregister_edge_callback(&self, source: EdgeSource) {
        let mut input = relock(&self.input);
        if input.id == source.0 {
            input.edge = None;
        }
    }
}
