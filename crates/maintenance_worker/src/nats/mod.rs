mod task_consumer;

pub use task_consumer::*;
