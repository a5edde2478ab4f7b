//! Building blocks for working with ledger transactions
//!
//! Tessera decodes transactions from the ledger wire format and writes them
//! back byte for byte, converts what scripts can see into the on-chain data
//! tree, and validates transactions before they are submitted. This crate
//! only re-exports the member crates under one roof.

#![warn(missing_docs)]

#[doc(inline)]
pub use tessera_codec as codec;

#[doc(inline)]
pub use tessera_crypto as crypto;

pub mod ledger {
    //! Ledger entities and the rules they are checked against

    #[doc(inline)]
    pub use tessera_addresses as addresses;

    #[doc(inline)]
    pub use tessera_primitives as primitives;

    #[doc(inline)]
    pub use tessera_validate as validate;
}
