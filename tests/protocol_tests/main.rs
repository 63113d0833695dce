//! Protocol Tests
//!
//! Wire encoding of requests and decoding of replies.

mod codec_tests;
