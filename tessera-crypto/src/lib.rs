pub mod hash;
pub mod key;

#[doc(hidden)]
pub mod __private {
    pub use serde;
    pub use tessera_codec::minicbor;
    pub use tessera_codec::plutus;
}
