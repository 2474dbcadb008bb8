//! # CAUCE Core
//!
//! Core types and utilities for the CAUCE open-channel hydraulics system.
//! This crate is domain-agnostic and contains no hydraulic computations.
//!
//! ## Modules
//!
//! - [`id`] - Unique identifier types
//! - [`units`] - SI constants and quantity formatting

pub mod id;
pub mod units;

pub use id::*;
pub use units::*;
