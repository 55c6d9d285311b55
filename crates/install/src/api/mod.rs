//! Public configuration and result types

pub mod config;
pub mod result;
