//! # Telemetry Replay Example
//!
//! Replays a recorded detector output through the telemetry layer and prints
//! every frame that would reach the bus:
//! - Lane channel (0x105): lane visibility and drift
//! - Sign channel (0x104): speed limits, stop sign, traffic lights
//!
//! No hardware is needed: frames go to a console sink, and time advances
//! 10 ms per camera frame.
//!
//! ```bash
//! cargo run --example telemetry_replay
//! ```

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

use canspi_telemetry::protocol::controller::transmit::{TxBuffer, TxOutcome};
use canspi_telemetry::protocol::frame::CanFrame;
use canspi_telemetry::protocol::traits::clock::Clock;
use canspi_telemetry::protocol::traits::frame_sink::FrameSink;
use canspi_telemetry::telemetry::perception::{
    Classifier, FrameSource, Observation, PerceptionLoop, StepOutcome,
};
use canspi_telemetry::telemetry::publisher::{PublishOutcome, TelemetryPublisher};
use canspi_telemetry::telemetry::report::{LaneReport, TelemetryPayload};
use canspi_telemetry::telemetry::status::{DriftStatus, LaneStatus, TrafficSign};
use embassy_time::Instant;

const FRAME_PERIOD_MS: u64 = 10;

/// Replay clock shared between the source and the loop.
#[derive(Clone, Default)]
struct ReplayClock(Rc<Cell<u64>>);

impl Clock for ReplayClock {
    fn now(&self) -> Instant {
        Instant::from_millis(self.0.get())
    }
}

/// Recorded detector output, one entry per camera frame.
struct Recording<T: Copy> {
    frames: Vec<T>,
    next: usize,
    clock: ReplayClock,
}

impl<T: Copy> FrameSource for Recording<T> {
    type Frame = T;
    type Error = &'static str;

    fn pull(&mut self) -> Result<T, &'static str> {
        let frame = *self.frames.get(self.next).ok_or("end of recording")?;
        self.clock.0.set(self.next as u64 * FRAME_PERIOD_MS);
        self.next += 1;
        Ok(frame)
    }
}

/// Detector output is already the classification result.
struct Passthrough;

impl<R: TelemetryPayload> Classifier<Option<R>> for Passthrough {
    type Report = R;

    fn classify(&mut self, frame: &Option<R>) -> Observation<R> {
        match frame {
            Some(report) => Observation::Detected(*report),
            None => Observation::Nothing,
        }
    }
}

/// Prints frames instead of driving a chip.
struct ConsoleBus {
    clock: ReplayClock,
}

impl FrameSink for ConsoleBus {
    type Error = Infallible;

    fn send_frame(&mut self, frame: &CanFrame) -> Result<TxOutcome, Infallible> {
        print!("   t={:>4} ms  id=0x{:03X}  data:", self.clock.0.get(), frame.raw_id());
        for byte in frame.payload() {
            print!(" {:02}", byte);
        }
        if let Some(sign) = TrafficSign::from_frame(frame) {
            println!("  ({})", sign);
        } else if let Some(lane) = LaneReport::from_frame(frame) {
            println!("  ({} / {})", lane.lane(), lane.drift());
        } else {
            println!();
        }
        Ok(TxOutcome::Queued(TxBuffer::Txb0))
    }
}

fn replay<R: TelemetryPayload>(frames: Vec<Option<R>>) {
    let clock = ReplayClock::default();
    let source = Recording {
        frames,
        next: 0,
        clock: clock.clone(),
    };
    let mut bus = ConsoleBus {
        clock: clock.clone(),
    };
    let mut perception = PerceptionLoop::new(source, Passthrough, clock, TelemetryPublisher::new());

    let mut sent = 0;
    let mut held = 0;
    loop {
        match perception.step(&mut bus) {
            Ok(StepOutcome::Evaluated(PublishOutcome::Sent { .. })) => sent += 1,
            Ok(_) => held += 1,
            Err(_) => break,
        }
    }
    println!("   {} frames sent, {} ticks held\n", sent, held);
}

fn main() {
    println!("=== canspi-telemetry replay ===\n");

    // ======================================================================
    // 1. Lane channel: centered, slight drift, full drift
    // ======================================================================
    println!("1. Lane channel (0x105)");

    let centered = LaneReport::new(LaneStatus::LeftAndRight, DriftStatus::Centered);
    let slightly = LaneReport::new(LaneStatus::LeftAndRight, DriftStatus::SlightlyLeft);
    // Full drift overrides the lane status with an error.
    let drifting = LaneReport::new(LaneStatus::LeftOnly, DriftStatus::DriftLeft);

    let mut lanes = vec![Some(centered); 60];
    lanes.extend(vec![Some(slightly); 20]);
    lanes.extend(vec![Some(drifting); 30]);
    replay(lanes);

    // ======================================================================
    // 2. Sign channel: nothing, stop sign, green light
    // ======================================================================
    println!("2. Sign channel (0x104)");

    let mut signs = vec![None; 30];
    signs.extend(vec![Some(TrafficSign::Stop); 30]);
    signs.extend(vec![Some(TrafficSign::GreenLight); 10]);
    signs.extend(vec![None; 5]);
    signs.extend(vec![Some(TrafficSign::Speed50); 10]);
    replay(signs);

    // ======================================================================
    // 3. Label mapping
    // ======================================================================
    println!("3. Detector labels");

    for label in ["Speed Limit 120", "stop", "Traffic Light Red", "pedestrian"] {
        match TrafficSign::from_label(label) {
            Some(sign) => println!("   {:<20} -> {} (code {})", label, sign, sign.code()),
            None => println!("   {:<20} -> ignored", label),
        }
    }
}
