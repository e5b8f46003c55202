pub mod beacon;
pub mod command;
pub mod constants;
pub mod dispatch;
pub mod engine;
pub mod locator;
pub mod morse;
pub mod ook48;
pub mod settings;
pub mod simulation;
pub mod spectrum;
pub mod telemetry;
pub mod timing;
pub mod tone_cache;
pub mod tracing_init;

pub use dispatch::{BeaconReport, Event};
pub use engine::Engine;
pub use settings::{AppMode, DecodeMode, Settings};
