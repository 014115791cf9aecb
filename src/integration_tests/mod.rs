//! Live scenarios against a deployed backend.
//!
//! Only compiled with the `integration-tests` feature. Every scenario owns
//! its own [`LoginCache`](crate::LoginCache), so scenarios never share test
//! users.

pub mod core;
pub mod registry;
pub mod scenarios;
pub mod test_cases;
