//! Multi-signature and timelock scripts evaluated by the ledger itself

use crate::{hashes::ScriptHash, Error, Slot};
use std::collections::BTreeSet;
use tessera_addresses::PubKeyHash;
use tessera_codec::{minicbor, utils::MaybeIndefArray};
use tessera_crypto::hash::Hasher;

/// What a native script can ask about the transaction it guards
pub trait NativeScriptContext {
    /// A vkey witness for `key` is present
    fn is_signed_by(&self, key: &PubKeyHash) -> bool;

    /// The validity interval ends at or before `slot`
    fn is_before(&self, slot: Slot) -> bool;

    /// The validity interval starts at or after `slot`
    fn is_after(&self, slot: Slot) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeScript {
    Sig(PubKeyHash),
    All(MaybeIndefArray<NativeScript>),
    Any(MaybeIndefArray<NativeScript>),
    AtLeast(AtLeast),
    /// Only valid before the slot ("invalid hereafter")
    Before(Slot),
    /// Only valid from the slot on ("invalid before")
    After(Slot),
}

/// An `n` out of `k` threshold. Can only be built with `1 <= n <= k`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtLeast {
    n: u64,
    scripts: MaybeIndefArray<NativeScript>,
}

impl AtLeast {
    pub fn n(&self) -> u64 {
        self.n
    }

    pub fn scripts(&self) -> &[NativeScript] {
        &self.scripts
    }
}

impl NativeScript {
    pub fn at_least(
        n: u64,
        scripts: impl Into<MaybeIndefArray<NativeScript>>,
    ) -> Result<Self, Error> {
        let scripts = scripts.into();

        if n < 1 || n > scripts.len() as u64 {
            return Err(Error::InvalidAtLeast {
                n,
                len: scripts.len(),
            });
        }

        Ok(NativeScript::AtLeast(AtLeast { n, scripts }))
    }

    pub fn eval<T>(&self, ctx: &T) -> bool
    where
        T: NativeScriptContext + ?Sized,
    {
        match self {
            NativeScript::Sig(key) => ctx.is_signed_by(key),
            NativeScript::All(scripts) => scripts.iter().all(|x| x.eval(ctx)),
            NativeScript::Any(scripts) => scripts.iter().any(|x| x.eval(ctx)),
            NativeScript::AtLeast(x) => {
                let passing = x.scripts.iter().filter(|s| s.eval(ctx)).count();
                passing as u64 >= x.n
            }
            NativeScript::Before(slot) => ctx.is_before(*slot),
            NativeScript::After(slot) => ctx.is_after(*slot),
        }
    }

    /// `blake2b_224(0x00 ++ cbor(script))`, the zero byte keeps native and
    /// Plutus scripts apart in the shared hash namespace. Lists keep the
    /// framing they were decoded with, so this is the hash of the wire bytes.
    pub fn hash(&self) -> ScriptHash {
        Hasher::<224>::hash_tagged_cbor(self, 0)
    }

    /// Every key hash mentioned anywhere in the script
    pub fn required_signers(&self) -> BTreeSet<PubKeyHash> {
        let mut out = BTreeSet::new();
        self.collect_signers(&mut out);
        out
    }

    fn collect_signers(&self, out: &mut BTreeSet<PubKeyHash>) {
        match self {
            NativeScript::Sig(key) => {
                out.insert(*key);
            }
            NativeScript::All(xs) | NativeScript::Any(xs) => {
                xs.iter().for_each(|x| x.collect_signers(out));
            }
            NativeScript::AtLeast(x) => {
                x.scripts.iter().for_each(|x| x.collect_signers(out));
            }
            NativeScript::Before(_) | NativeScript::After(_) => (),
        }
    }
}

impl<C> minicbor::Encode<C> for NativeScript {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        match self {
            NativeScript::Sig(key) => {
                e.array(2)?;
                e.u8(0)?;
                e.encode_with(key, ctx)?;
            }
            NativeScript::All(scripts) => {
                e.array(2)?;
                e.u8(1)?;
                e.encode_with(scripts, ctx)?;
            }
            NativeScript::Any(scripts) => {
                e.array(2)?;
                e.u8(2)?;
                e.encode_with(scripts, ctx)?;
            }
            NativeScript::AtLeast(x) => {
                e.array(3)?;
                e.u8(3)?;
                e.u64(x.n)?;
                e.encode_with(&x.scripts, ctx)?;
            }
            NativeScript::After(slot) => {
                e.array(2)?;
                e.u8(4)?;
                e.u64(*slot)?;
            }
            NativeScript::Before(slot) => {
                e.array(2)?;
                e.u8(5)?;
                e.u64(*slot)?;
            }
        }

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for NativeScript {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let position = d.position();
        let len = d.array()?;
        let variant = d.u8()?;

        let expected = match variant {
            3 => 3,
            0..=5 => 2,
            x => {
                return Err(minicbor::decode::Error::message(format!(
                    "unknown native script kind {x} at offset {position}"
                )))
            }
        };

        if len != Some(expected) {
            return Err(tessera_codec::utils::unexpected_len(
                "native script",
                expected,
                len,
                position,
            ));
        }

        match variant {
            0 => Ok(NativeScript::Sig(d.decode_with(ctx)?)),
            1 => Ok(NativeScript::All(d.decode_with(ctx)?)),
            2 => Ok(NativeScript::Any(d.decode_with(ctx)?)),
            3 => {
                let n = d.u64()?;
                let scripts: MaybeIndefArray<NativeScript> = d.decode_with(ctx)?;

                NativeScript::at_least(n, scripts).map_err(|err| {
                    minicbor::decode::Error::message(format!("{err} at offset {position}"))
                })
            }
            4 => Ok(NativeScript::After(d.u64()?)),
            _ => Ok(NativeScript::Before(d.u64()?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ctx {
        signers: Vec<PubKeyHash>,
        from: Option<Slot>,
        until: Option<Slot>,
    }

    impl NativeScriptContext for Ctx {
        fn is_signed_by(&self, key: &PubKeyHash) -> bool {
            self.signers.contains(key)
        }

        fn is_before(&self, slot: Slot) -> bool {
            self.until.is_some_and(|x| x <= slot)
        }

        fn is_after(&self, slot: Slot) -> bool {
            self.from.is_some_and(|x| x >= slot)
        }
    }

    fn key(b: u8) -> PubKeyHash {
        PubKeyHash::new([b; 28])
    }

    #[test]
    fn at_least_rejects_bad_thresholds() {
        let scripts = vec![NativeScript::Sig(key(1)), NativeScript::Sig(key(2))];

        assert!(matches!(
            NativeScript::at_least(0, scripts.clone()),
            Err(Error::InvalidAtLeast { n: 0, len: 2 })
        ));
        assert!(matches!(
            NativeScript::at_least(3, scripts.clone()),
            Err(Error::InvalidAtLeast { n: 3, len: 2 })
        ));
        assert!(NativeScript::at_least(2, scripts).is_ok());
    }

    #[test]
    fn decoding_checks_threshold_too() {
        // [3, 0, []]
        let bytes = hex::decode("830300 80".replace(' ', "")).unwrap();
        let err = minicbor::decode::<NativeScript>(&bytes).unwrap_err();

        assert!(err.to_string().contains("at-least"));
    }

    #[test]
    fn eval_folds_the_tree() {
        let script = NativeScript::All(MaybeIndefArray::Def(vec![
            NativeScript::at_least(
                2,
                vec![
                    NativeScript::Sig(key(1)),
                    NativeScript::Sig(key(2)),
                    NativeScript::Sig(key(3)),
                ],
            )
            .unwrap(),
            NativeScript::Any(vec![NativeScript::After(100), NativeScript::Before(50)].into()),
        ]));

        let mut ctx = Ctx {
            signers: vec![key(1), key(3)],
            from: Some(120),
            until: None,
        };
        assert!(script.eval(&ctx));

        ctx.signers.pop();
        assert!(!script.eval(&ctx));

        ctx.signers.push(key(2));
        ctx.from = Some(10);
        assert!(!script.eval(&ctx));

        ctx.until = Some(40);
        assert!(script.eval(&ctx));
    }

    #[test]
    fn cbor_round_trip_and_hash() {
        let script = NativeScript::Any(
            vec![NativeScript::Sig(key(7)), NativeScript::Before(4_000_000)].into(),
        );

        let bytes = minicbor::to_vec(&script).unwrap();
        assert_eq!(&bytes[..3], &[0x82, 0x02, 0x82]);

        let back: NativeScript = minicbor::decode(&bytes).unwrap();
        assert_eq!(back, script);

        assert_eq!(script.hash(), Hasher::<224>::hash_tagged(&bytes, 0));
        assert_ne!(script.hash(), Hasher::<224>::hash(&bytes));
    }

    #[test]
    fn indefinite_lists_hash_as_written() {
        // [1, [_ [0, h'07..07']]]
        let bytes = hex::decode(format!("82019f8200581c{}ff", "07".repeat(28))).unwrap();
        let script: NativeScript = minicbor::decode(&bytes).unwrap();

        assert!(matches!(&script, NativeScript::All(xs) if xs.is_indef()));
        assert_eq!(minicbor::to_vec(&script).unwrap(), bytes);
        assert_eq!(script.hash(), Hasher::<224>::hash_tagged(&bytes, 0));

        let definite = NativeScript::All(vec![NativeScript::Sig(key(7))].into());
        assert_ne!(definite.hash(), script.hash());
    }

    #[test]
    fn timelock_tags() {
        let after = minicbor::to_vec(NativeScript::After(1)).unwrap();
        let before = minicbor::to_vec(NativeScript::Before(1)).unwrap();

        assert_eq!(hex::encode(after), "820401");
        assert_eq!(hex::encode(before), "820501");
    }

    #[test]
    fn required_signers_are_collected() {
        let script = NativeScript::All(
            vec![
                NativeScript::Sig(key(2)),
                NativeScript::Any(vec![NativeScript::Sig(key(1)), NativeScript::Sig(key(2))].into()),
            ]
            .into(),
        );

        let signers: Vec<_> = script.required_signers().into_iter().collect();
        assert_eq!(signers, vec![key(1), key(2)]);
    }
}
