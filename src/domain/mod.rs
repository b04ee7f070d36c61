//! Domain layer for the testbench bootstrap
//!
//! This module contains the schema definition, document models and the
//! store port.

pub mod models;
pub mod ports;

pub use ports::StoreError;
