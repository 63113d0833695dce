//! Pipeline Tests
//!
//! Deferred and transactional execution against a scripted connection.

mod script;
