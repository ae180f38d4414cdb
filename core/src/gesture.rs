//! Gesture composition: pure functions that expand one semantic motion
//! into a short ordered list of scheduled motor events.
//!
//! Builders never touch hardware. Each returns the event list plus the
//! instant of its last scheduled state change, so callers can chain
//! gestures back-to-back without overlap.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::event::{MotorEvent, ScheduledEvent};
use crate::motor::{Direction, Motor};

pub const FULL_SPEED: u8 = 255;

/// Parameters for a single head swing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HeadParams {
    pub speed: u8,
    /// Time the channel stays energized while the head travels.
    pub travel: Duration,
    /// `true` swings the head out, `false` swings it back in.
    pub open: bool,
    /// Release the channel at the end of the swing.
    pub release: bool,
}

impl Default for HeadParams {
    fn default() -> Self {
        Self {
            speed: FULL_SPEED,
            travel: Duration::from_millis(300),
            open: true,
            release: true,
        }
    }
}

/// Parameters for one mouth or tail flap: out, dwell, back.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FlapParams {
    pub speed: u8,
    /// Outward (and return) stroke time.
    pub travel: Duration,
    /// Dwell between the outward and return strokes.
    pub hold: Duration,
    pub release: bool,
}

impl FlapParams {
    pub fn mouth() -> Self {
        Self {
            speed: FULL_SPEED,
            travel: Duration::from_millis(120),
            hold: Duration::from_millis(150),
            release: true,
        }
    }

    pub fn tail() -> Self {
        Self {
            speed: FULL_SPEED,
            travel: Duration::from_millis(120),
            hold: Duration::from_millis(100),
            release: true,
        }
    }
}

/// Parameters for the manual exercise sequence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExerciseParams {
    pub speed: u8,
    /// Time per stroke and per pause between strokes.
    pub dwell: Duration,
    pub cycles: u32,
    /// Start with the backward stroke instead of the forward one.
    pub reverse_first: bool,
}

impl Default for ExerciseParams {
    fn default() -> Self {
        Self {
            speed: FULL_SPEED,
            dwell: Duration::from_millis(300),
            cycles: 3,
            reverse_first: false,
        }
    }
}

fn se(at: Instant, event: MotorEvent) -> ScheduledEvent {
    ScheduledEvent { at, event }
}

/// One head swing starting at `t0`. Backward opens the head, forward
/// closes it. Returns the final instant, `t0 + travel`.
pub fn head_move(t0: Instant, p: &HeadParams) -> (Vec<ScheduledEvent>, Instant) {
    let dir = if p.open {
        Direction::Backward
    } else {
        Direction::Forward
    };
    let end = t0 + p.travel;
    let mut events = vec![
        se(t0, MotorEvent::speed_and_run(Motor::Head, p.speed, dir)),
        se(end, MotorEvent::speed(Motor::Head, 0)),
    ];
    if p.release {
        events.push(se(end, MotorEvent::run(Motor::Head, Direction::Release)));
    }
    (events, end)
}

/// One mouth flap starting at `t0`. Final instant: `t0 + 2*travel + hold`.
pub fn mouth_flap(t0: Instant, p: &FlapParams) -> (Vec<ScheduledEvent>, Instant) {
    flap(Motor::Mouth, t0, p)
}

/// One tail flap starting at `t0`. Final instant: `t0 + 2*travel + hold`.
pub fn tail_flap(t0: Instant, p: &FlapParams) -> (Vec<ScheduledEvent>, Instant) {
    flap(Motor::Tail, t0, p)
}

fn flap(motor: Motor, t0: Instant, p: &FlapParams) -> (Vec<ScheduledEvent>, Instant) {
    let mut events = Vec::with_capacity(5);
    let mut t = t0;
    events.push(se(
        t,
        MotorEvent::speed_and_run(motor, p.speed, Direction::Forward),
    ));
    t += p.travel;
    events.push(se(t, MotorEvent::speed(motor, 0)));
    t += p.hold;
    events.push(se(
        t,
        MotorEvent::speed_and_run(motor, p.speed, Direction::Backward),
    ));
    t += p.travel;
    events.push(se(t, MotorEvent::speed(motor, 0)));
    if p.release {
        events.push(se(t, MotorEvent::run(motor, Direction::Release)));
    }
    (events, t)
}

/// Manual test sequence: `cycles` repetitions of stroke / stop / reverse
/// stroke / stop, then a release. Used to verify a channel end to end.
pub fn exercise(motor: Motor, t0: Instant, p: &ExerciseParams) -> (Vec<ScheduledEvent>, Instant) {
    let (first, second) = if p.reverse_first {
        (Direction::Backward, Direction::Forward)
    } else {
        (Direction::Forward, Direction::Backward)
    };

    let mut events = Vec::with_capacity(p.cycles as usize * 4 + 1);
    let mut t = t0;
    for _ in 0..p.cycles {
        events.push(se(t, MotorEvent::speed_and_run(motor, p.speed, first)));
        t += p.dwell;
        events.push(se(t, MotorEvent::speed(motor, 0)));
        t += p.dwell;
        events.push(se(t, MotorEvent::speed_and_run(motor, p.speed, second)));
        t += p.dwell;
        events.push(se(t, MotorEvent::speed(motor, 0)));
        t += p.dwell;
    }
    events.push(se(t, MotorEvent::run(motor, Direction::Release)));
    (events, t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_move_returns_travel_end() {
        let t0 = Instant::now();
        let p = HeadParams {
            travel: Duration::from_millis(300),
            release: false,
            ..HeadParams::default()
        };
        let (events, end) = head_move(t0, &p);

        assert_eq!(end, t0 + Duration::from_millis(300));
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].at, t0);
        assert_eq!(
            events[0].event,
            MotorEvent::speed_and_run(Motor::Head, FULL_SPEED, Direction::Backward)
        );
        assert_eq!(events[1].at, end);
        assert_eq!(events[1].event, MotorEvent::speed(Motor::Head, 0));
    }

    #[test]
    fn head_close_runs_forward_and_releases() {
        let t0 = Instant::now();
        let p = HeadParams {
            open: false,
            ..HeadParams::default()
        };
        let (events, end) = head_move(t0, &p);

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].event.run, Some(Direction::Forward));
        assert_eq!(
            events[2].event,
            MotorEvent::run(Motor::Head, Direction::Release)
        );
        assert_eq!(events[2].at, end);
    }

    #[test]
    fn flap_shape_and_final_instant() {
        let t0 = Instant::now();
        let p = FlapParams::mouth();
        let (events, end) = mouth_flap(t0, &p);

        assert_eq!(end, t0 + p.travel * 2 + p.hold);
        assert_eq!(events.len(), 5);
        assert_eq!(events[0].event.run, Some(Direction::Forward));
        assert_eq!(events[1].event, MotorEvent::speed(Motor::Mouth, 0));
        assert_eq!(events[1].at, t0 + p.travel);
        assert_eq!(events[2].event.run, Some(Direction::Backward));
        assert_eq!(events[2].at, t0 + p.travel + p.hold);
        assert_eq!(events[4].event.run, Some(Direction::Release));
    }

    #[test]
    fn chained_gestures_do_not_overlap() {
        let t0 = Instant::now();
        let p = FlapParams {
            release: false,
            ..FlapParams::tail()
        };
        let (first, mid) = tail_flap(t0, &p);
        let (second, _) = tail_flap(mid, &p);

        let first_last = first.last().unwrap().at;
        let second_first = second.first().unwrap().at;
        assert!(second_first >= first_last);
    }

    #[test]
    fn exercise_runs_every_cycle() {
        let t0 = Instant::now();
        let p = ExerciseParams {
            cycles: 3,
            ..ExerciseParams::default()
        };
        let (events, end) = exercise(Motor::Tail, t0, &p);

        assert_eq!(events.len(), 3 * 4 + 1);
        assert_eq!(end, t0 + p.dwell * 12);
        assert_eq!(
            events.last().unwrap().event,
            MotorEvent::run(Motor::Tail, Direction::Release)
        );
    }

    #[test]
    fn exercise_reverse_first_flips_strokes() {
        let t0 = Instant::now();
        let p = ExerciseParams {
            reverse_first: true,
            cycles: 1,
            ..ExerciseParams::default()
        };
        let (events, _) = exercise(Motor::Head, t0, &p);

        assert_eq!(events[0].event.run, Some(Direction::Backward));
        assert_eq!(events[2].event.run, Some(Direction::Forward));
    }
}
