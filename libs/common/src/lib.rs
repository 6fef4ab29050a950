//! Common library for the Rollbook services
//!
//! This crate provides shared functionality used across the Rollbook
//! services, including database connectivity and error handling.

pub mod database;
pub mod error;
