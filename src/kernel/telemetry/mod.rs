//! Workbench telemetry.
//!
//! # SAFETY INVARIANT
//! Telemetry is a read-only side channel. Nothing in the kernel, the
//! planner or the executor may branch on it.
//!
//! # PRIVACY INVARIANT
//! Events carry ids, origins and counts only. Never message text or
//! document content.

pub mod event;
pub mod metrics;
pub mod recorder;

pub use event::TelemetryEvent;
pub use metrics::TelemetrySnapshot;
pub use recorder::TelemetryRecorder;
