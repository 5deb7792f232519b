pub mod admin;
pub mod health;
pub mod members;

pub use health::*;
