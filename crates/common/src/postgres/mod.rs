mod application_repository;
mod client;
mod config;
mod sql;

pub use application_repository::*;
pub use client::*;
pub use config::*;
pub use sql::*;
