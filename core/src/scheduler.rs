//! The scheduler loop thread and its lifecycle.
//!
//! One dedicated thread drains the event queue and drives the motor bus;
//! producers on any thread push future-timestamped events. An event due at
//! instant `T` is applied no later than `T` plus the idle tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::event::{EventQueue, MotorEvent, ScheduledEvent};
use crate::gesture::{self, ExerciseParams, FlapParams, HeadParams};
use crate::motor::{Motor, MotorBus};
use crate::{BasslineError, Result};

/// Scheduler tuning.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Idle sleep between queue checks; bounds worst-case dispatch latency
    /// when the queue is quiet.
    pub tick: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(1),
        }
    }
}

/// Owns the motor bus and the loop thread that applies scheduled events.
///
/// Producers push through [`Scheduler::push`] or the gesture methods; the
/// loop thread is the only consumer of the queue and the only caller of
/// per-motor bus operations while it runs. [`Scheduler::stop`] joins the
/// thread and releases every motor; it also runs on drop, so a scheduler
/// going out of scope never leaves a channel energized.
pub struct Scheduler {
    queue: Arc<EventQueue>,
    bus: Arc<MotorBus>,
    active: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    /// Starts the loop thread with default tuning.
    pub fn start(bus: MotorBus) -> Result<Self> {
        Self::with_config(bus, SchedulerConfig::default())
    }

    pub fn with_config(bus: MotorBus, cfg: SchedulerConfig) -> Result<Self> {
        let bus = Arc::new(bus);
        let queue = Arc::new(EventQueue::new());
        let active = Arc::new(AtomicBool::new(true));

        let worker = {
            let queue = Arc::clone(&queue);
            let bus = Arc::clone(&bus);
            let active = Arc::clone(&active);
            thread::Builder::new()
                .name("motor-sched".into())
                .spawn(move || run_loop(queue, bus, active, cfg.tick))
                .map_err(|e| {
                    BasslineError::SchedulerError(format!("failed to spawn loop thread: {e}"))
                })?
        };

        Ok(Self {
            queue,
            bus,
            active,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Schedules one event. Accepted even after [`Scheduler::stop`] has
    /// been requested, in which case it may never execute.
    pub fn push(&self, at: Instant, event: MotorEvent) {
        self.queue.push(at, event);
    }

    /// Schedules a batch, preserving its order for same-instant entries.
    pub fn push_all(&self, events: impl IntoIterator<Item = ScheduledEvent>) {
        self.queue.push_all(events);
    }

    /// Drops every pending event. Used between utterances so a stale
    /// timeline never plays over a new one.
    pub fn clear_pending(&self) {
        self.queue.clear();
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Schedules a head swing starting now; returns its final instant.
    pub fn move_head(&self, p: &HeadParams) -> Instant {
        self.move_head_at(Instant::now(), p)
    }

    pub fn move_head_at(&self, t0: Instant, p: &HeadParams) -> Instant {
        let (events, end) = gesture::head_move(t0, p);
        self.queue.push_all(events);
        end
    }

    /// Schedules a mouth flap starting now; returns its final instant.
    pub fn move_mouth(&self, p: &FlapParams) -> Instant {
        self.move_mouth_at(Instant::now(), p)
    }

    pub fn move_mouth_at(&self, t0: Instant, p: &FlapParams) -> Instant {
        let (events, end) = gesture::mouth_flap(t0, p);
        self.queue.push_all(events);
        end
    }

    /// Schedules a tail flap starting now; returns its final instant.
    pub fn move_tail(&self, p: &FlapParams) -> Instant {
        self.move_tail_at(Instant::now(), p)
    }

    pub fn move_tail_at(&self, t0: Instant, p: &FlapParams) -> Instant {
        let (events, end) = gesture::tail_flap(t0, p);
        self.queue.push_all(events);
        end
    }

    /// Schedules the manual exercise sequence for one channel starting
    /// now; returns its final instant.
    pub fn exercise(&self, motor: Motor, p: &ExerciseParams) -> Instant {
        let (events, end) = gesture::exercise(motor, Instant::now(), p);
        self.queue.push_all(events);
        end
    }

    /// Blocks the calling thread until `instant` has passed. Combined with
    /// a gesture method's return value this turns any schedule into a
    /// synchronous call.
    pub fn wait_until(&self, instant: Instant) {
        let now = Instant::now();
        if instant > now {
            thread::sleep(instant - now);
        }
    }

    /// Stops the loop, joins its thread, drops pending events, and
    /// releases every motor. Idempotent; later calls return immediately.
    pub fn stop(&self) {
        let handle = self.worker.lock().take();
        let Some(handle) = handle else {
            return;
        };

        self.active.store(false, Ordering::SeqCst);
        if handle.join().is_err() {
            warn!(target: "sched", "loop thread panicked before shutdown");
        }
        self.queue.clear();
        if let Err(e) = self.bus.release_all() {
            warn!(target: "sched", error = %e, "release-all failed during shutdown");
        }
        info!(target: "sched", "scheduler stopped");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(queue: Arc<EventQueue>, bus: Arc<MotorBus>, active: Arc<AtomicBool>, tick: Duration) {
    info!(target: "sched", "scheduler loop started");
    while active.load(Ordering::SeqCst) {
        let now = Instant::now();
        match queue.pop_due(now) {
            Some(event) => {
                // A failed actuation skips one motion; the timeline keeps
                // going.
                if let Err(e) = bus.apply(&event) {
                    warn!(target: "sched", error = %e, "event application failed");
                }
            }
            None => thread::sleep(tick),
        }
    }
    info!(target: "sched", "scheduler loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::testutil::{Call, CallLog, HeadFaultDriver, RecordingDriver};
    use crate::motor::Direction;

    fn recording_scheduler() -> (Scheduler, CallLog) {
        let log = CallLog::default();
        let bus = MotorBus::new(Box::new(RecordingDriver::new(log.clone())));
        let sched = Scheduler::start(bus).unwrap();
        log.clear(); // drop the startup release
        (sched, log)
    }

    fn wait_for<F: Fn() -> bool>(cond: F, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        cond()
    }

    #[test]
    fn applies_each_pushed_event_exactly_once() {
        let (sched, log) = recording_scheduler();
        let now = Instant::now();
        for speed in 0..50u8 {
            sched.push(now, MotorEvent::speed(Motor::Mouth, speed));
        }

        assert!(wait_for(
            || log.calls().len() >= 50,
            Duration::from_secs(2)
        ));
        thread::sleep(Duration::from_millis(20));

        let calls = log.calls();
        assert_eq!(calls.len(), 50);
        for speed in 0..50u8 {
            let hits = calls
                .iter()
                .filter(|c| **c == Call::Speed(Motor::Mouth, speed))
                .count();
            assert_eq!(hits, 1, "event {speed} delivered {hits} times");
        }
        sched.stop();
    }

    #[test]
    fn applies_events_in_instant_order() {
        let (sched, log) = recording_scheduler();
        let base = Instant::now() + Duration::from_millis(50);
        sched.push(base + Duration::from_millis(20), MotorEvent::speed(Motor::Tail, 3));
        sched.push(base, MotorEvent::speed(Motor::Tail, 1));
        sched.push(base + Duration::from_millis(10), MotorEvent::speed(Motor::Tail, 2));

        assert!(wait_for(|| log.calls().len() == 3, Duration::from_secs(2)));
        assert_eq!(
            log.calls(),
            vec![
                Call::Speed(Motor::Tail, 1),
                Call::Speed(Motor::Tail, 2),
                Call::Speed(Motor::Tail, 3),
            ]
        );
        sched.stop();
    }

    #[test]
    fn due_event_applied_within_latency_bound() {
        let (sched, log) = recording_scheduler();
        let due = Instant::now() + Duration::from_millis(100);
        sched.push(due, MotorEvent::speed(Motor::Head, 9));

        assert!(wait_for(|| !log.calls().is_empty(), Duration::from_secs(2)));
        // 1ms tick plus generous slack for a loaded test machine.
        assert!(Instant::now() < due + Duration::from_millis(100));
        sched.stop();
    }

    #[test]
    fn stop_releases_every_motor_and_drops_pending() {
        let (sched, log) = recording_scheduler();
        let far = Instant::now() + Duration::from_secs(3600);
        for speed in 0..10u8 {
            sched.push(far, MotorEvent::speed(Motor::Mouth, speed));
        }

        sched.stop();

        let calls = log.calls();
        assert_eq!(log.releases(), 3);
        for motor in Motor::ALL {
            assert!(calls.contains(&Call::Run(motor, Direction::Release)));
        }
        assert!(calls
            .iter()
            .all(|c| !matches!(c, Call::Speed(Motor::Mouth, _))));
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn stop_is_idempotent() {
        let (sched, log) = recording_scheduler();
        sched.stop();
        let after_first = log.calls().len();
        sched.stop();
        assert_eq!(log.calls().len(), after_first);
    }

    #[test]
    fn push_after_stop_is_accepted() {
        let (sched, _log) = recording_scheduler();
        sched.stop();
        sched.push(Instant::now(), MotorEvent::speed(Motor::Tail, 1));
        assert_eq!(sched.pending(), 1);
    }

    #[test]
    fn bus_error_does_not_stall_the_loop() {
        let log = CallLog::default();
        let driver = HeadFaultDriver {
            inner: RecordingDriver::new(log.clone()),
        };
        let bus = MotorBus::new(Box::new(driver));
        let sched = Scheduler::start(bus).unwrap();
        log.clear();

        let now = Instant::now();
        sched.push(now, MotorEvent::speed(Motor::Head, 200));
        sched.push(now + Duration::from_millis(5), MotorEvent::speed(Motor::Mouth, 150));

        assert!(wait_for(
            || log.calls().contains(&Call::Speed(Motor::Mouth, 150)),
            Duration::from_secs(2)
        ));
        drop(sched);
    }

    #[test]
    fn drop_stops_and_releases() {
        let log = CallLog::default();
        {
            let bus = MotorBus::new(Box::new(RecordingDriver::new(log.clone())));
            let sched = Scheduler::start(bus).unwrap();
            log.clear();
            sched.push(
                Instant::now() + Duration::from_secs(3600),
                MotorEvent::speed(Motor::Tail, 4),
            );
        }
        assert_eq!(log.releases(), 3);
    }

    #[test]
    fn move_head_returns_chainable_instant() {
        let (sched, _log) = recording_scheduler();
        let t0 = Instant::now() + Duration::from_millis(200);
        let p = HeadParams {
            travel: Duration::from_millis(300),
            ..HeadParams::default()
        };
        let end = sched.move_head_at(t0, &p);
        assert_eq!(end, t0 + Duration::from_millis(300));
        sched.stop();
    }
}
