//! Request signing: the hash provider contract, the signing-service client, and the shared
//! quota state it coordinates through.

pub mod client;
pub mod observer;
pub mod profile;
pub mod provider;
pub mod rate_limit;

mod wire;

pub use client::*;
pub use observer::*;
pub use profile::*;
pub use provider::*;
pub use rate_limit::*;
