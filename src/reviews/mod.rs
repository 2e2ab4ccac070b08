pub mod models;
pub mod client;
pub mod tree;
pub mod store;

pub use models::*;
pub use client::*;
pub use store::*;
