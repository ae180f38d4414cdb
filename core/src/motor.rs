//! Motor identities, the driver seam, and the lock-serialized motor bus.
//!
//! The controller board is not safe for concurrent register writes, so
//! every physical access goes through [`MotorBus`], which serializes all
//! callers behind one lock. Drivers implement [`MotorDriver`] and never
//! need their own locking.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::event::MotorEvent;
use crate::Result;

/// One physical motor channel on the rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Motor {
    Head,
    Mouth,
    Tail,
}

impl Motor {
    /// Every channel the bus knows about.
    pub const ALL: [Motor; 3] = [Motor::Head, Motor::Mouth, Motor::Tail];
}

/// Run directive for a motor channel. `Release` de-energizes the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
    Release,
}

/// Register-level backend for a motor controller board.
///
/// The bus guarantees calls arrive from one thread at a time.
pub trait MotorDriver: Send {
    /// Set the PWM speed for a channel, 0 (stopped) to 255 (full).
    fn set_speed(&mut self, motor: Motor, speed: u8) -> Result<()>;

    /// Apply a run directive to a channel.
    fn run(&mut self, motor: Motor, dir: Direction) -> Result<()>;
}

/// Driver for machines without the physical controller: every register
/// write is logged at debug level and otherwise dropped.
pub struct LogDriver;

impl MotorDriver for LogDriver {
    fn set_speed(&mut self, motor: Motor, speed: u8) -> Result<()> {
        debug!(target: "motor", ?motor, speed, "set_speed");
        Ok(())
    }

    fn run(&mut self, motor: Motor, dir: Direction) -> Result<()> {
        debug!(target: "motor", ?motor, ?dir, "run");
        Ok(())
    }
}

/// Serializes all access to the motor controller behind one lock.
///
/// Owned by the scheduler; producers never touch the bus directly.
pub struct MotorBus {
    driver: Mutex<Box<dyn MotorDriver>>,
}

impl MotorBus {
    /// Wraps a driver and issues a safety release to every channel, so the
    /// rig never starts with a motor left energized by a previous run.
    pub fn new(driver: Box<dyn MotorDriver>) -> Self {
        let bus = Self {
            driver: Mutex::new(driver),
        };
        if let Err(e) = bus.release_all() {
            warn!(target: "motor", error = %e, "startup release failed");
        }
        bus
    }

    /// Runs `f` inside the bus critical section.
    pub fn with_lock<T>(&self, f: impl FnOnce(&mut dyn MotorDriver) -> T) -> T {
        let mut driver = self.driver.lock();
        f(driver.as_mut())
    }

    /// Applies one event under a single lock hold: speed first, then the
    /// run directive. An event with neither field set is a no-op.
    pub fn apply(&self, event: &MotorEvent) -> Result<()> {
        self.with_lock(|drv| {
            if let Some(speed) = event.speed {
                drv.set_speed(event.motor, speed)?;
            }
            if let Some(dir) = event.run {
                drv.run(event.motor, dir)?;
            }
            Ok(())
        })
    }

    /// Issues `Release` to every known channel. Every channel is
    /// attempted even if one fails; the first error is returned.
    pub fn release_all(&self) -> Result<()> {
        self.with_lock(|drv| {
            let mut first_err = None;
            for motor in Motor::ALL {
                if let Err(e) = drv.run(motor, Direction::Release) {
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
            match first_err {
                Some(e) => Err(e),
                None => Ok(()),
            }
        })
    }
}


#[cfg(test)]
mod tests {
    use super::testutil::{Call, CallLog, RecordingDriver};
    use super::*;

    #[test]
    fn new_bus_releases_every_channel() {
        let log = CallLog::default();
        let _bus = MotorBus::new(Box::new(RecordingDriver::new(log.clone())));

        let calls = log.calls();
        assert_eq!(calls.len(), 3);
        for motor in Motor::ALL {
            assert!(calls.contains(&Call::Run(motor, Direction::Release)));
        }
    }

    #[test]
    fn apply_orders_speed_before_run() {
        let log = CallLog::default();
        let bus = MotorBus::new(Box::new(RecordingDriver::new(log.clone())));
        log.clear();

        let event = MotorEvent::speed_and_run(Motor::Mouth, 200, Direction::Forward);
        bus.apply(&event).unwrap();

        assert_eq!(
            log.calls(),
            vec![
                Call::Speed(Motor::Mouth, 200),
                Call::Run(Motor::Mouth, Direction::Forward),
            ]
        );
    }

    #[test]
    fn apply_empty_event_is_noop() {
        let log = CallLog::default();
        let bus = MotorBus::new(Box::new(RecordingDriver::new(log.clone())));
        log.clear();

        let event = MotorEvent {
            motor: Motor::Tail,
            speed: None,
            run: None,
        };
        bus.apply(&event).unwrap();
        assert!(log.calls().is_empty());
    }
}
