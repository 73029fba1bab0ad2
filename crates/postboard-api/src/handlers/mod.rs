//! API handlers
//!
//! Author: hephaex@gmail.com

pub mod auth;
pub mod feed;
pub mod health;
