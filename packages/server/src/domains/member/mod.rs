//! Member domain - registration records and their verification lifecycle
//!
//! Responsibilities:
//! - Registration with validation before any write
//! - Admin verification decisions and dashboard messages
//! - Admin password resets and member listings

pub mod activities;
pub mod data;
pub mod machines;
pub mod models;

pub use data::{MemberDashboard, MemberData, StatusView};
