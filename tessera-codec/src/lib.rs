/// Shared re-export of minicbor lib across all Tessera crates
pub use minicbor;

/// Round-trip friendly common helper structs
pub mod utils;

/// The tagged data tree handed to on-chain scripts
pub mod plutus;

pub trait Fragment: Sized + for<'b> minicbor::Decode<'b, ()> + minicbor::Encode<()> {
    /// Encodes the fragment into a fresh buffer
    fn encode_fragment(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        let result = minicbor::encode(self, &mut buf);
        // a Vec<u8> writer can't fail, only an encoder raising its own error can
        debug_assert!(result.is_ok(), "fragment encoder raised an error");
        buf
    }

    fn decode_fragment(bytes: &[u8]) -> Result<Self, minicbor::decode::Error> {
        minicbor::decode(bytes)
    }
}

impl<T> Fragment for T where T: for<'b> minicbor::Decode<'b, ()> + minicbor::Encode<()> + Sized {}

/// Implements minicbor for an enum whose variants are told apart only by the
/// cbor datatype of the value
#[macro_export]
macro_rules! codec_by_datatype {
    (
        $enum_name:ident $( < $lifetime:lifetime > )?,
        $( $( $cbortype:ident )|* => $one_f:ident ),*
    ) => {
        impl<$( $lifetime, )? '__b $(:$lifetime)?,  C> $crate::minicbor::decode::Decode<'__b, C> for $enum_name $(<$lifetime>)? {
            fn decode(d: &mut $crate::minicbor::Decoder<'__b>, ctx: &mut C) -> Result<Self, $crate::minicbor::decode::Error> {
                let position = d.position();
                match d.datatype()? {
                    $( $( $crate::minicbor::data::Type::$cbortype )|* => Ok($enum_name::$one_f(d.decode_with(ctx)?)), )*
                    other => Err($crate::utils::unexpected_type(
                        stringify!($( $( $cbortype )|* )|*),
                        other,
                        position,
                    )),
                }
            }
        }

        impl< $( $lifetime, )? C> $crate::minicbor::encode::Encode<C> for $enum_name $(<$lifetime>)?  {
            fn encode<W: $crate::minicbor::encode::Write>(
                &self,
                e: &mut $crate::minicbor::Encoder<W>,
                ctx: &mut C,
            ) -> Result<(), $crate::minicbor::encode::Error<W::Error>> {
                match self {
                    $( $enum_name::$one_f(__x666) => {
                        e.encode_with(__x666, ctx)?;
                    } )*
                };

                Ok(())
            }
        }
    }
}
