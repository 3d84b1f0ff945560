//! Test doubles for exercising the protocols without an engine.
//!
//! Enabled by the `test-utils` feature. These are reference-quality
//! probes for downstream crates' tests, not production handlers.

mod recording;

pub use recording::{RecordingHandler, StubHandler};
