// ====
// Local Signer
// ====
// secp256k1 key held in memory. Derives the account address and produces
// personal_sign (EIP-191) signatures for the push-server handshake.
// ====

use anyhow::{Context, Result};
use k256::ecdsa::SigningKey;
use k256::SecretKey;
use sha3::{Digest, Keccak256};

pub struct LocalSigner {
    signing_key: SigningKey,
    /// Public address (0x..., lowercase)
    pub address: String,
}

impl LocalSigner {
    /// Create signer from private key hex string, with or without `0x`
    pub fn from_private_key(private_key_hex: &str) -> Result<Self> {
        let key_hex = private_key_hex.trim().trim_start_matches("0x");
        let key_bytes = hex::decode(key_hex).context("Failed to decode private key hex")?;
        let secret_key = SecretKey::from_slice(&key_bytes).context("Invalid private key")?;
        let signing_key = SigningKey::from(secret_key);
        let address = derive_address(&signing_key);

        Ok(Self {
            signing_key,
            address,
        })
    }

    /// personal_sign: keccak256("\x19Ethereum Signed Message:\n" ‖ len ‖ message),
    /// returned as 0x ‖ r ‖ s ‖ v with v in {27, 28}
    pub fn sign_message(&self, message: &str) -> Result<String> {
        let hash = personal_message_hash(message);
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(&hash)
            .context("Failed to sign message")?;

        let mut full_sig = Vec::with_capacity(65);
        full_sig.extend_from_slice(&signature.to_bytes());
        full_sig.push(27 + recovery_id.to_byte());

        Ok(format!("0x{}", hex::encode(full_sig)))
    }
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

fn derive_address(signing_key: &SigningKey) -> String {
    let public_key = signing_key.verifying_key().to_encoded_point(false);
    // Skip the 0x04 uncompressed-point prefix
    let hash = keccak256(&public_key.as_bytes()[1..]);
    format!("0x{}", hex::encode(&hash[12..]))
}

pub(crate) fn personal_message_hash(message: &str) -> [u8; 32] {
    let prefixed = format!("\x19Ethereum Signed Message:\n{}{}", message.len(), message);
    keccak256(prefixed.as_bytes())
}

pub(crate) fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

    // Widely published test key, never funded
    const TEST_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[test]
    fn test_address_derivation() {
        let signer = LocalSigner::from_private_key(TEST_KEY).unwrap();
        assert_eq!(signer.address, "0x2c7536e3605d9c16a7a3d7b1898e529396a65c23");
    }

    #[test]
    fn test_rejects_bad_keys() {
        assert!(LocalSigner::from_private_key("0xnothex").is_err());
        assert!(LocalSigner::from_private_key("0x00").is_err());
    }

    #[test]
    fn test_signature_recovers_signer() {
        let signer = LocalSigner::from_private_key(TEST_KEY).unwrap();
        let signature = signer.sign_message("copytrade-auth:0xabc").unwrap();
        assert!(signature.starts_with("0x"));
        assert_eq!(signature.len(), 132);

        let bytes = hex::decode(&signature[2..]).unwrap();
        let sig = Signature::from_slice(&bytes[..64]).unwrap();
        let recovery_id = RecoveryId::from_byte(bytes[64] - 27).unwrap();
        let hash = personal_message_hash("copytrade-auth:0xabc");
        let recovered = VerifyingKey::recover_from_prehash(&hash, &sig, recovery_id).unwrap();

        assert_eq!(&recovered, signer.signing_key.verifying_key());
    }

    #[test]
    fn test_debug_hides_key() {
        let signer = LocalSigner::from_private_key(TEST_KEY).unwrap();
        let printed = format!("{:?}", signer);
        assert!(printed.contains("0x2c7536e3"));
        assert!(!printed.contains("4c0883a6"));
    }
}
