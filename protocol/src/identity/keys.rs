//! # Key Management
//!
//! Student key pairs in the Schnorr group: a private exponent `x` in
//! `[1, q-1]` and the public element `y = g^x mod p`.
//!
//! ## Security considerations
//!
//! - `PrivateKey` does not implement `Serialize`, `Clone` or a revealing
//!   `Debug`. Writing a key to disk goes through [`KeyFile`] on purpose.
//! - Key generation uses `OsRng` through [`random_in_range`].
//! - Out-of-range private keys are rejected, never reduced. Silently
//!   wrapping `x = q + 1` to `1` would hand a student somebody else's key.

use std::fmt;
use std::sync::Arc;

use num_bigint::BigUint;
use num_traits::One;
use serde::{Deserialize, Serialize};

use crate::crypto::codec::{self, decimal, decimal_string};
use crate::crypto::{mod_exp, parse_decimal, random_in_range, DomainParameters};
use crate::zkp::ZkpError;

// ---------------------------------------------------------------------------
// Key Types
// ---------------------------------------------------------------------------

/// A student's secret exponent `x`.
pub struct PrivateKey(BigUint);

impl PrivateKey {
    /// Wrap a raw exponent. Range is checked when the key is used.
    pub fn from_biguint(x: BigUint) -> Self {
        Self(x)
    }

    /// Parse a decimal exponent, e.g. from a key file.
    pub fn from_decimal(s: &str) -> Result<Self, ZkpError> {
        parse_decimal(s)
            .map(Self)
            .map_err(|_| ZkpError::InvalidRange("private key is not a decimal integer".into()))
    }

    /// Decimal export. Only [`KeyFile`] should need this.
    pub fn to_decimal(&self) -> String {
        self.0.to_str_radix(10)
    }

    pub(crate) fn expose(&self) -> &BigUint {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// The public element `y = g^x mod p`. Serialized as a decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicKey(#[serde(with = "decimal_string")] BigUint);

impl PublicKey {
    pub fn from_biguint(y: BigUint) -> Self {
        Self(y)
    }

    pub fn from_decimal(s: &str) -> Result<Self, ZkpError> {
        parse_decimal(s).map(Self)
    }

    pub fn value(&self) -> &BigUint {
        &self.0
    }

    pub fn to_decimal(&self) -> String {
        self.0.to_str_radix(10)
    }

    /// Base64 of the fixed-width (`byte_len(p)`) big-endian encoding.
    pub fn to_base64(&self, params: &DomainParameters) -> Result<String, ZkpError> {
        codec::to_base64_fixed(&self.0, params.byte_len())
    }

    /// Inverse of [`to_base64`](Self::to_base64).
    pub fn from_base64(params: &DomainParameters, encoded: &str) -> Result<Self, ZkpError> {
        codec::from_base64_fixed(encoded, params.byte_len()).map(Self)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A private key together with its public element.
#[derive(Debug)]
pub struct KeyPair {
    private: PrivateKey,
    public: PublicKey,
}

impl KeyPair {
    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub fn into_parts(self) -> (PrivateKey, PublicKey) {
        (self.private, self.public)
    }
}

/// Public key plus the group it belongs to, all as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedPublicKey {
    #[serde(with = "decimal")]
    pub public_key: BigUint,
    #[serde(with = "decimal")]
    pub p: BigUint,
    #[serde(with = "decimal")]
    pub g: BigUint,
    #[serde(with = "decimal")]
    pub q: BigUint,
}

/// On-disk key file: `{"private_key": "...", "public_key": "..."}`.
#[derive(Serialize, Deserialize)]
pub struct KeyFile {
    pub private_key: String,
    pub public_key: String,
}

impl KeyFile {
    pub fn from_key_pair(pair: &KeyPair) -> Self {
        Self {
            private_key: pair.private.to_decimal(),
            public_key: pair.public.to_decimal(),
        }
    }

    /// Load a key pair, refusing files whose halves don't match.
    pub fn into_key_pair(self, manager: &KeyManager) -> Result<KeyPair, ZkpError> {
        let private = PrivateKey::from_decimal(&self.private_key)?;
        let public = PublicKey::from_decimal(&self.public_key)
            .map_err(|_| ZkpError::InvalidRange("public key is not a decimal integer".into()))?;
        if !manager.verify_key_pair(&private, &public) {
            return Err(ZkpError::InvalidRange(
                "key file halves do not match".into(),
            ));
        }
        Ok(KeyPair { private, public })
    }
}

impl fmt::Debug for KeyFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyFile")
            .field("private_key", &"<redacted>")
            .field("public_key", &self.public_key)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// KeyManager
// ---------------------------------------------------------------------------

/// Generates, derives and validates keys for one group.
#[derive(Debug, Clone)]
pub struct KeyManager {
    params: Arc<DomainParameters>,
}

impl KeyManager {
    pub fn new(params: Arc<DomainParameters>) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &Arc<DomainParameters> {
        &self.params
    }

    /// Fresh key pair with `x` uniform in `[1, q-1]`.
    pub fn generate_key_pair(&self) -> KeyPair {
        let x = random_in_range(self.params.q());
        let y = mod_exp(self.params.g(), &x, self.params.p());
        KeyPair {
            private: PrivateKey(x),
            public: PublicKey(y),
        }
    }

    /// `y = g^x mod p`. Fails with `InvalidRange` unless `1 <= x <= q-1`.
    pub fn derive_public_key(&self, private_key: &PrivateKey) -> Result<PublicKey, ZkpError> {
        if !self.params.is_secret_scalar(private_key.expose()) {
            return Err(ZkpError::InvalidRange(
                "private key must lie in [1, q-1]".into(),
            ));
        }
        Ok(PublicKey(mod_exp(
            self.params.g(),
            private_key.expose(),
            self.params.p(),
        )))
    }

    /// `true` iff `private_key` is in range and derives exactly `public_key`.
    pub fn verify_key_pair(&self, private_key: &PrivateKey, public_key: &PublicKey) -> bool {
        match self.derive_public_key(private_key) {
            Ok(derived) => derived == *public_key,
            Err(_) => false,
        }
    }

    /// Range and subgroup check: `2 <= y <= p-1` and `y^q mod p == 1`.
    ///
    /// `y = 1` is refused as well, since it corresponds to `x = 0`.
    pub fn validate_public_key(&self, public_key: &PublicKey) -> bool {
        let y = public_key.value();
        if !self.params.is_group_element(y) || y.is_one() {
            return false;
        }
        mod_exp(y, self.params.q(), self.params.p()).is_one()
    }

    /// Export the key together with this manager's group.
    pub fn export_public_key(&self, public_key: &PublicKey) -> ExportedPublicKey {
        ExportedPublicKey {
            public_key: public_key.value().clone(),
            p: self.params.p().clone(),
            g: self.params.g().clone(),
            q: self.params.q().clone(),
        }
    }

    /// Import an exported key. The group must match ours and the key must
    /// pass [`validate_public_key`](Self::validate_public_key).
    pub fn import_public_key(&self, exported: &ExportedPublicKey) -> Result<PublicKey, ZkpError> {
        if &exported.p != self.params.p()
            || &exported.g != self.params.g()
            || &exported.q != self.params.q()
        {
            return Err(ZkpError::InvalidParameters(
                "exported key belongs to a different group".into(),
            ));
        }
        let key = PublicKey(exported.public_key.clone());
        if !self.validate_public_key(&key) {
            return Err(ZkpError::InvalidRange(
                "public key is not a subgroup element".into(),
            ));
        }
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::params::toy_group;
    use num_bigint::BigUint;

    fn toy_manager() -> KeyManager {
        KeyManager::new(toy_group())
    }

    #[test]
    fn test_generate_key_pair_consistent() {
        let km = KeyManager::new(DomainParameters::standard());
        let pair = km.generate_key_pair();
        assert!(km.verify_key_pair(pair.private_key(), pair.public_key()));
        assert!(km.validate_public_key(pair.public_key()));
    }

    #[test]
    fn test_toy_group_derivation() {
        // g = 4, x = 3: 4^3 = 64 = 18 mod 23.
        let km = toy_manager();
        let y = km
            .derive_public_key(&PrivateKey::from_biguint(BigUint::from(3u32)))
            .unwrap();
        assert_eq!(y.value(), &BigUint::from(18u32));
    }

    #[test]
    fn test_derive_rejects_out_of_range() {
        let km = toy_manager();
        for x in [0u32, 11, 12, 100] {
            let err = km
                .derive_public_key(&PrivateKey::from_biguint(BigUint::from(x)))
                .unwrap_err();
            assert!(matches!(err, ZkpError::InvalidRange(_)), "x = {x}");
        }
    }

    #[test]
    fn test_verify_key_pair_mismatch() {
        let km = toy_manager();
        let x = PrivateKey::from_biguint(BigUint::from(3u32));
        assert!(!km.verify_key_pair(&x, &PublicKey::from_biguint(BigUint::from(2u32))));
        // q + 3 would wrap to the same public key if we reduced silently.
        let wrapped = PrivateKey::from_biguint(BigUint::from(14u32));
        assert!(!km.verify_key_pair(&wrapped, &PublicKey::from_biguint(BigUint::from(18u32))));
    }

    #[test]
    fn test_validate_public_key() {
        let km = toy_manager();
        assert!(km.validate_public_key(&PublicKey::from_biguint(BigUint::from(18u32))));
        // 5 is not in the order-11 subgroup.
        assert!(!km.validate_public_key(&PublicKey::from_biguint(BigUint::from(5u32))));
        assert!(!km.validate_public_key(&PublicKey::from_biguint(BigUint::from(0u32))));
        assert!(!km.validate_public_key(&PublicKey::from_biguint(BigUint::from(1u32))));
        assert!(!km.validate_public_key(&PublicKey::from_biguint(BigUint::from(23u32))));
    }

    #[test]
    fn test_private_key_debug_is_redacted() {
        let km = KeyManager::new(DomainParameters::standard());
        let pair = km.generate_key_pair();
        let secret = pair.private_key().to_decimal();
        let rendered = format!("{:?}", pair);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains(&secret));
    }

    #[test]
    fn test_public_key_json_is_decimal() {
        let pk = PublicKey::from_biguint(BigUint::from(18u32));
        assert_eq!(serde_json::to_string(&pk).unwrap(), r#""18""#);
        let back: PublicKey = serde_json::from_str(r#""18""#).unwrap();
        assert_eq!(back, pk);
    }

    #[test]
    fn test_public_key_base64_fixed_width() {
        let params = DomainParameters::standard();
        let pk = PublicKey::from_biguint(BigUint::from(5u32));
        let encoded = pk.to_base64(&params).unwrap();
        // 256 bytes -> 344 base64 characters.
        assert_eq!(encoded.len(), 344);
        assert_eq!(PublicKey::from_base64(&params, &encoded).unwrap(), pk);
    }

    #[test]
    fn test_export_import() {
        let km = toy_manager();
        let pk = PublicKey::from_biguint(BigUint::from(18u32));
        let exported = km.export_public_key(&pk);
        let json = serde_json::to_value(&exported).unwrap();
        assert_eq!(json["p"], "23");
        assert_eq!(json["q"], "11");
        assert_eq!(km.import_public_key(&exported).unwrap(), pk);

        let other = KeyManager::new(DomainParameters::standard());
        assert!(matches!(
            other.import_public_key(&exported),
            Err(ZkpError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_key_file() {
        let km = toy_manager();
        let pair = km.generate_key_pair();
        let file = KeyFile::from_key_pair(&pair);
        let json = serde_json::to_string(&file).unwrap();
        let loaded: KeyFile = serde_json::from_str(&json).unwrap();
        let restored = loaded.into_key_pair(&km).unwrap();
        assert_eq!(restored.public_key(), pair.public_key());

        let tampered = KeyFile {
            private_key: "3".into(),
            public_key: "2".into(),
        };
        assert!(tampered.into_key_pair(&km).is_err());
        assert!(format!("{:?}", KeyFile::from_key_pair(&pair)).contains("<redacted>"));
    }
}
