mod domain;
mod nats;
mod postgres;

pub mod garde;
pub mod telemetry;

pub use domain::*;
pub use nats::*;
pub use postgres::*;

// Re-export mocks when testing feature is enabled
#[cfg(any(test, feature = "testing"))]
pub use domain::MockApplicationRepository;
#[cfg(any(test, feature = "testing"))]
pub use domain::MockMaintenanceTask;
#[cfg(any(test, feature = "testing"))]
pub use domain::MockTaskQueue;
#[cfg(any(test, feature = "testing"))]
pub use nats::MockJetStreamConsumer;
#[cfg(any(test, feature = "testing"))]
pub use nats::MockJetStreamPublisher;
#[cfg(any(test, feature = "testing"))]
pub use nats::MockPullConsumer;
