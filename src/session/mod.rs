//! Session lifecycle: configuration, the setup/playback controller, and host wiring.
//!
//! A session runs `manifest → surface size → frames → audio → clock` once, then ticks until it
//! ends or is stopped. Teardown runs exactly once per session, when its handle is stopped or
//! dropped.

pub mod config;
pub mod controller;
pub mod host;
