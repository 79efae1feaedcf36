//! Perception telemetry: status codes, their CAN payloads, the
//! change-or-heartbeat publication policy, and the perception loop driving it.
pub mod perception;
pub mod publisher;
pub mod report;
pub mod status;
