pub mod api;
pub mod application;
pub mod bot;
pub mod cli;
pub mod domain;
pub mod storage;

pub use domain::*;
pub use storage::Repository;
