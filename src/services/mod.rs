pub mod revalidate;
pub mod telemetry;

pub use revalidate::Revalidator;
pub use telemetry::{Telemetry, TelemetryEvent};
