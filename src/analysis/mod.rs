mod health;

pub use health::{Alert, AlertKind, AlertSink, HealthMonitor};
