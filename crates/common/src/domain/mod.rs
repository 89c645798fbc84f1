mod application;
mod result;
mod task;

pub use application::*;
pub use result::*;
pub use task::*;
