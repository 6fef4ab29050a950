//! Class attendance service
//!
//! Username/password authentication with signed session tokens, a
//! deny-by-default role policy, and an attendance ledger that keeps at
//! most one record per (class, student, date).

pub mod auth;
pub mod checkin;
pub mod classes;
pub mod error;
pub mod jwt;
pub mod marking;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod password;
pub mod policy;
pub mod routes;
pub mod state;
pub mod store;
pub mod throttle;
pub mod validation;
