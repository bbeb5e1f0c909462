//! Order signature verification and signing
//!
//! Makers sign the Ethereum personal-message digest of the order hash:
//! `keccak256("\x19Ethereum Signed Message:\n32" ++ order_hash)`.
//! Verification recovers the secp256k1 public key from `(r, s, v - 27)` and
//! derives the signer address from it. A signature that fails to recover is
//! simply not valid; it is never an error.

use ethers::core::k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey};
use ethers::core::types::H256;
use ethers::signers::{LocalWallet, WalletError};

use super::hashing::keccak256;
use super::types::{Address, Signature};

/// Prefix of an Ethereum signed message over a 32-byte payload
pub const ETH_SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Digest actually signed for a given order hash
pub fn eth_signed_message_digest(order_hash: &[u8; 32]) -> [u8; 32] {
    let mut data = Vec::with_capacity(ETH_SIGNED_MESSAGE_PREFIX.len() + 32);
    data.extend_from_slice(ETH_SIGNED_MESSAGE_PREFIX);
    data.extend_from_slice(order_hash);
    keccak256(&data)
}

/// Derive the address for an uncompressed SEC1 public key (`0x04 || x || y`)
pub fn address_from_public_key(uncompressed: &[u8]) -> Option<Address> {
    if uncompressed.len() != 65 || uncompressed[0] != 0x04 {
        return None;
    }
    let digest = keccak256(&uncompressed[1..]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[12..]);
    Some(Address::from_bytes(bytes))
}

/// Recover the address that produced `signature` over `order_hash`
pub fn recover_signer(signature: &Signature, order_hash: &[u8; 32]) -> Option<Address> {
    let recovery_id = RecoveryId::from_byte(signature.recovery_id()?)?;

    let mut rs = [0u8; 64];
    rs[..32].copy_from_slice(signature.r());
    rs[32..].copy_from_slice(signature.s());
    let ecdsa = match EcdsaSignature::from_slice(&rs) {
        Ok(sig) => sig,
        Err(e) => {
            tracing::debug!(error = %e, "Malformed signature scalars");
            return None;
        }
    };

    // k256 only recovers low-S signatures; (r, n - s) with the opposite y parity
    // identifies the same key.
    let (ecdsa, recovery_id) = match ecdsa.normalize_s() {
        Some(low_s) => (
            low_s,
            RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced()),
        ),
        None => (ecdsa, recovery_id),
    };

    let digest = eth_signed_message_digest(order_hash);
    let key = match VerifyingKey::recover_from_prehash(&digest, &ecdsa, recovery_id) {
        Ok(key) => key,
        Err(e) => {
            tracing::debug!(error = %e, "Public key recovery failed");
            return None;
        }
    };

    address_from_public_key(key.to_encoded_point(false).as_bytes())
}

/// True when `claimed_signer` signed `order_hash`
pub fn verify(signature: &Signature, order_hash: &[u8; 32], claimed_signer: &Address) -> bool {
    match recover_signer(signature, order_hash) {
        Some(recovered) => recovered == *claimed_signer,
        None => {
            tracing::debug!(
                v = signature.v(),
                signer = %claimed_signer,
                "Signature recovery failed"
            );
            false
        }
    }
}

/// Sign an order hash the way makers do, returning a 27/28 signature
pub fn sign_order_hash(
    wallet: &LocalWallet,
    order_hash: &[u8; 32],
) -> Result<Signature, WalletError> {
    let digest = eth_signed_message_digest(order_hash);
    let signed = wallet.sign_hash(H256::from(digest))?;

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    signed.r.to_big_endian(&mut r);
    signed.s.to_big_endian(&mut s);

    // sign_hash already reports v as 27/28; normalize in case a signer returns 0/1
    let v = match signed.v {
        0 | 1 => signed.v as u8 + 27,
        other => other as u8,
    };

    Ok(Signature::new(v, r, s))
}
