pub mod config;
pub mod firebase;
pub mod records;
pub mod store;
pub mod viewer;
