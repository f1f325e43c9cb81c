pub mod cli;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod test_utils;
pub mod utils;

pub use db::*;
pub use models::*;
pub use services::*;
