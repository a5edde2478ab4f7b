//! Asymmetric keys used to witness transactions

pub mod ed25519;
