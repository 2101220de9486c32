//! # Delegation Signatures (secp256k1)
//!
//! Pure domain logic for the offline activation protocol: building the
//! signed payload and recovering who signed it.
//!
//! ## Signed Payload
//!
//! ```text
//! digest  = keccak256(nonce as 32-byte big-endian || hot as 20 bytes)
//! message = keccak256("\x19Ethereum Signed Message:\n32" || digest)
//! ```
//!
//! The cold wallet is deliberately absent from the payload: it is
//! authenticated only by being the recovered signer.
//!
//! ## Security Notes
//!
//! - **Malleability Prevention (EIP-2)**: S must be STRICTLY LESS THAN SECP256K1_HALF_ORDER
//! - **Scalar Range Validation**: R and S must be in [1, n-1]
//! - **Constant-Time Operations**: Uses `subtle` crate for side-channel resistance

use super::entities::EcdsaSignature;
use super::value_objects::{Address, Hash, U256};
use crate::errors::SignatureError;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sha3::{Digest, Keccak256};
use subtle::{Choice, ConstantTimeEq};

/// Prefix of a personal message wrapping a 32-byte digest.
pub const PERSONAL_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Length of the packed `(nonce, hot)` payload.
pub const DELEGATION_PAYLOAD_LENGTH: usize = 32 + 20;

/// secp256k1 curve order n
/// n = 0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141
const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// n/2, the largest S a non-malleable signature may carry is one below this.
const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

// =============================================================================
// RECOVERY POLICY
// =============================================================================

/// Which signature encodings the recovery step accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryPolicy {
    /// Reject high-S signatures instead of normalizing them.
    pub reject_malleable: bool,
    /// Accept `v` of 0/1 as well as 27/28.
    pub accept_raw_recovery_ids: bool,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            reject_malleable: true,
            accept_raw_recovery_ids: true,
        }
    }
}

// =============================================================================
// PAYLOAD ENCODING
// =============================================================================

/// Pack `(nonce, hot)` into the fixed-width byte string that gets signed.
#[must_use]
pub fn delegation_payload(nonce: U256, hot: Address) -> [u8; DELEGATION_PAYLOAD_LENGTH] {
    let mut payload = [0u8; DELEGATION_PAYLOAD_LENGTH];
    nonce.to_big_endian(&mut payload[..32]);
    payload[32..].copy_from_slice(hot.as_bytes());
    payload
}

/// Keccak-256 of the packed payload.
#[must_use]
pub fn delegation_digest(nonce: U256, hot: Address) -> Hash {
    keccak256(&delegation_payload(nonce, hot))
}

/// Wrap a digest as a personal message.
#[must_use]
pub fn personal_message_hash(digest: &Hash) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_MESSAGE_PREFIX);
    hasher.update(digest);
    hasher.finalize().into()
}

/// The prehash a cold wallet signs to delegate to `hot` under `nonce`.
#[must_use]
pub fn delegation_message_hash(nonce: U256, hot: Address) -> Hash {
    personal_message_hash(&delegation_digest(nonce, hot))
}

// =============================================================================
// SIGNER RECOVERY
// =============================================================================

/// Recover the signer under `policy`.
///
/// High-S signatures are either rejected or folded to their low-S twin,
/// depending on `policy.reject_malleable`.
pub fn recover_with_policy(
    message_hash: &Hash,
    signature: &EcdsaSignature,
    policy: RecoveryPolicy,
) -> Result<Address, SignatureError> {
    if !is_valid_scalar(&signature.r) || !is_valid_scalar(&signature.s) {
        return Err(SignatureError::InvalidFormat);
    }

    if !policy.accept_raw_recovery_ids && signature.v < 27 {
        return Err(SignatureError::InvalidRecoveryId(signature.v));
    }

    if is_low_s(&signature.s) {
        return recover_address(message_hash, signature);
    }

    if policy.reject_malleable {
        return Err(SignatureError::MalleableSignature);
    }

    recover_address(message_hash, &normalize_s(signature)?)
}

/// Recover the signer's address from a low-S signature.
pub fn recover_address(
    message_hash: &Hash,
    signature: &EcdsaSignature,
) -> Result<Address, SignatureError> {
    use zeroize::Zeroize;

    let recovery_id = parse_recovery_id(signature.v)?;

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&signature.r);
    sig_bytes[32..].copy_from_slice(&signature.s);

    let parsed = Signature::from_slice(&sig_bytes);
    sig_bytes.zeroize();
    let sig = parsed.map_err(|_| SignatureError::InvalidFormat)?;

    let recovered_key = VerifyingKey::recover_from_prehash(message_hash, &sig, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;

    Ok(address_from_pubkey(&recovered_key))
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Keccak256 hash function.
#[must_use]
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Derive the address of a public key.
#[must_use]
pub fn address_from_pubkey(public_key: &VerifyingKey) -> Address {
    let pubkey_bytes = public_key.to_encoded_point(false);

    // Skip the 0x04 uncompressed-point tag
    let hash = keccak256(&pubkey_bytes.as_bytes()[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    Address::new(address)
}

/// Fold a high-S signature onto its low-S twin: `s' = n - s`, flip parity.
fn normalize_s(signature: &EcdsaSignature) -> Result<EcdsaSignature, SignatureError> {
    let parity = parse_recovery_id(signature.v)?.is_y_odd();
    let v = if signature.v >= 27 {
        27 + u8::from(!parity)
    } else {
        u8::from(!parity)
    };

    Ok(EcdsaSignature {
        r: signature.r,
        s: invert_s(&signature.s),
        v,
    })
}

/// Check if S value is in lower half of curve order (EIP-2).
///
/// Per EIP-2: S must be STRICTLY LESS THAN half_order (not equal).
/// Runs in fixed time regardless of input.
pub(crate) fn is_low_s(s: &[u8; 32]) -> bool {
    ct_less_than(s, &SECP256K1_HALF_ORDER)
}

/// Check if a scalar value is in valid range [1, n-1].
fn is_valid_scalar(scalar: &[u8; 32]) -> bool {
    let mut is_zero = Choice::from(1u8);
    for &byte in scalar {
        is_zero &= byte.ct_eq(&0u8);
    }

    !bool::from(is_zero) && ct_less_than(scalar, &SECP256K1_ORDER)
}

/// Constant-time big-endian `a < b`.
fn ct_less_than(a: &[u8; 32], b: &[u8; 32]) -> bool {
    let mut less = Choice::from(0u8);
    let mut greater = Choice::from(0u8);

    for (a_byte, b_byte) in a.iter().zip(b.iter()) {
        let not_decided = !(less | greater);
        less |= not_decided & Choice::from(u8::from(a_byte < b_byte));
        greater |= not_decided & Choice::from(u8::from(a_byte > b_byte));
    }

    less.into()
}

/// Parse recovery ID from v value.
///
/// Valid v values: 0, 1, 27, 28
fn parse_recovery_id(v: u8) -> Result<RecoveryId, SignatureError> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return Err(SignatureError::InvalidRecoveryId(v)),
    };

    RecoveryId::try_from(id).map_err(|_| SignatureError::InvalidRecoveryId(v))
}

/// Invert S value: s' = n - s
#[must_use]
pub fn invert_s(s: &[u8; 32]) -> [u8; 32] {
    let mut result = [0u8; 32];
    let mut borrow: i32 = 0;

    for i in (0..32).rev() {
        let diff = i32::from(SECP256K1_ORDER[i]) - i32::from(s[i]) - borrow;
        if diff < 0 {
            result[i] = (diff + 256) as u8;
            borrow = 1;
        } else {
            result[i] = diff as u8;
            borrow = 0;
        }
    }

    result
}

// =============================================================================
// TEST HELPERS
// =============================================================================


// =============================================================================
// UNIT TESTS
// =============================================================================
