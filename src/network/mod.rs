//! Network Module
//!
//! Transport the protocol engine consumes.
//!
//! ## Architecture
//! - `Connection` trait: write / read one reply / close
//! - `TcpConnection`: blocking std::net implementation with buffered halves

mod connection;

pub use connection::{Connection, TcpConnection};
