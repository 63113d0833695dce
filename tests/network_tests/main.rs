//! Network Tests
//!
//! Client and TcpConnection against a fake server on a loopback socket.

mod fake_server;
