//! Session credentials: the provider contract, token models, and the PTC implementation.

pub mod credential;
pub mod ptc;
pub mod token;

pub use credential::*;
pub use ptc::*;
pub use token::{secret::*, *};
