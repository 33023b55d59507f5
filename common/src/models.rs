pub mod health;
pub mod recovery;
pub mod snapshot;

pub use health::{HealthState, ServiceHealth};
pub use recovery::{RecoveryAttempt, StepReport, StepStatus, TriggerReason};
pub use snapshot::{ConfigurationMode, NetworkSnapshot};
