pub mod domain;
pub mod maintenance_worker;
pub mod nats;
