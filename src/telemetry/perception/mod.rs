//! Perception loop: pull a camera frame, classify it, publish the result.
//!
//! Video transport and the classifiers (lane color-density heuristic, sign
//! detector) live outside this crate. They plug in through [`FrameSource`]
//! and [`Classifier`]; the loop only owns the publication state of its
//! channel, so two loops (lanes and signs) can share one controller through
//! [`SharedController`](crate::protocol::shared::SharedController).
use core::convert::Infallible;
use core::fmt::Debug;

use crate::error::PerceptionError;
use crate::protocol::traits::{clock::Clock, frame_sink::FrameSink};
use crate::telemetry::publisher::{PublishOutcome, TelemetryPublisher, TelemetryState};
use crate::telemetry::report::TelemetryPayload;

/// Blocking producer of camera frames.
pub trait FrameSource {
    type Frame;
    type Error: Debug;
    /// Wait for and return the next frame.
    fn pull(&mut self) -> Result<Self::Frame, Self::Error>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// What a classifier made of one frame.
pub enum Observation<R> {
    /// The frame could not be decoded; the tick is skipped entirely.
    Undecodable,
    /// Decoded, but nothing relevant detected.
    Nothing,
    /// Detected status value.
    Detected(R),
}

/// Turns a camera frame into a status value.
pub trait Classifier<F> {
    type Report: TelemetryPayload;
    fn classify(&mut self, frame: &F) -> Observation<Self::Report>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Result of one loop iteration.
pub enum StepOutcome {
    /// The frame was undecodable; nothing evaluated.
    Skipped,
    /// The publisher ran on this frame.
    Evaluated(PublishOutcome),
}

/// One perception channel: source, classifier, clock, and publication state.
pub struct PerceptionLoop<Src, Cls, Clk>
where
    Src: FrameSource,
    Cls: Classifier<Src::Frame>,
    Clk: Clock,
{
    source: Src,
    classifier: Cls,
    clock: Clk,
    publisher: TelemetryPublisher,
    state: TelemetryState<Cls::Report>,
}

impl<Src, Cls, Clk> PerceptionLoop<Src, Cls, Clk>
where
    Src: FrameSource,
    Cls: Classifier<Src::Frame>,
    Clk: Clock,
{
    /// Assemble a loop. The heartbeat clock starts now.
    pub fn new(source: Src, classifier: Cls, clock: Clk, publisher: TelemetryPublisher) -> Self {
        let state = TelemetryState::new(clock.now());
        Self {
            source,
            classifier,
            clock,
            publisher,
            state,
        }
    }

    /// Pull one frame, classify it, and run the publisher.
    ///
    /// The timestamp is taken after classification, when the value is known.
    pub fn step<S: FrameSink>(
        &mut self,
        sink: &mut S,
    ) -> Result<StepOutcome, PerceptionError<Src::Error, S::Error>> {
        let frame = self.source.pull().map_err(PerceptionError::Source)?;

        let value = match self.classifier.classify(&frame) {
            Observation::Undecodable => {
                #[cfg(feature = "defmt")]
                defmt::debug!("Undecodable camera frame skipped");
                return Ok(StepOutcome::Skipped);
            }
            Observation::Nothing => None,
            Observation::Detected(report) => Some(report),
        };

        let now = self.clock.now();
        self.publisher
            .publish(sink, &mut self.state, value, now)
            .map(StepOutcome::Evaluated)
            .map_err(PerceptionError::Sink)
    }

    /// Step forever. Only returns on a source or transport error.
    pub fn run<S: FrameSink>(
        &mut self,
        sink: &mut S,
    ) -> Result<Infallible, PerceptionError<Src::Error, S::Error>> {
        loop {
            self.step(sink)?;
        }
    }

    /// Publication state of the channel.
    pub fn state(&self) -> &TelemetryState<Cls::Report> {
        &self.state
    }

    /// Tear the loop down into its collaborators.
    pub fn into_parts(self) -> (Src, Cls, Clk) {
        (self.source, self.classifier, self.clock)
    }
}
