pub mod authz;
pub mod config;
pub mod error;
pub mod resource;
pub mod storage;

pub use error::{AppError, AppResult};
