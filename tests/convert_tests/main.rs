//! Convert Tests
//!
//! Raw replies into typed values, and the command → shape table.

mod conversion_tests;
