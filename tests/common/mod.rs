//! Integration test common infrastructure.
//!
//! Spawns microircd instances and drives them over raw TCP.

pub mod client;
pub mod server;

#[allow(unused_imports)]
pub use client::TestClient;
#[allow(unused_imports)]
pub use server::TestServer;
