// Chamber of Commerce membership API core
//
// Member registration, password and OTP sign-in, admin verification of
// membership receipts. Domains live in domains/*, infrastructure seams in
// kernel/, the axum surface in server/.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
