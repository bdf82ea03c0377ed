pub mod db;
pub mod models;
pub mod seed;

pub use db::Store;
pub use models::*;
