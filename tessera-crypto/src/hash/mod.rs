//! Cryptographic Hash for ledger entities
//!
//! we expose three helpers:
//!
//! * [`Hasher`] to help streaming objects or bytes into a hasher and computing
//!   a hash without allocating extra memory for the **CBOR** encoding of the
//!   hashed entity
//! * [`struct@Hash`] a conveniently strongly typed byte array
//! * [`hash_kind!`](crate::hash_kind) to declare distinct newtypes per kind
//!   of hashed thing
//!
//! The algorithm exposed here is `Blake2b`, with 160, 224 and 256 bit
//! digests.
//!
//! # Example
//!
//! ```
//! use tessera_crypto::hash::Hasher;
//!
//! let mut hasher = Hasher::<224>::new();
//! hasher.input(b"my key");
//!
//! let digest = hasher.finalize();
//! # assert_eq!(
//! #   "276fd18711931e2c0e21430192dbeac0e458093cd9d1fcd7210f64b3",
//! #   hex::encode(digest)
//! # );
//! ```

#[allow(clippy::module_inception)]
mod hash;
mod hasher;
mod kind;
mod serde;

pub use self::{
    hash::{Hash, HashSizeError},
    hasher::Hasher,
};
