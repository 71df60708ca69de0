use crate::PublicKey;
use ed25519_dalek::{Signer, Verifier, VerifyingKey};

/// Checks that `signature` over `message` was produced by the owner of `public_key`.
///
/// Settlement only ever calls this, so any signature scheme can be plugged in as long as the
/// outputs in the pool carry keys it understands.
pub trait SignatureVerifier {
    fn verify(&self, public_key: &PublicKey, message: &[u8], signature: &[u8]) -> bool;
}

/// Ed25519 signatures, as implemented by `ed25519-dalek`.
#[derive(Debug, Default, Copy, Clone)]
pub struct Ed25519;

impl SignatureVerifier for Ed25519 {
    fn verify(&self, public_key: &PublicKey, message: &[u8], signature: &[u8]) -> bool {
        // A key that is not a valid curve point can't own anything.
        let verifying_key = match VerifyingKey::from_bytes(public_key.as_bytes()) {
            Ok(key) => key,
            Err(_) => return false,
        };
        let signature = match ed25519_dalek::Signature::from_slice(signature) {
            Ok(signature) => signature,
            Err(_) => return false,
        };
        verifying_key.verify(message, &signature).is_ok()
    }
}

impl<V: SignatureVerifier + ?Sized> SignatureVerifier for &V {
    fn verify(&self, public_key: &PublicKey, message: &[u8], signature: &[u8]) -> bool {
        (**self).verify(public_key, message, signature)
    }
}

/// Produces a detached Ed25519 signature over the message.
pub fn sign(signing_key: &ed25519_dalek::SigningKey, message: &[u8]) -> Vec<u8> {
    signing_key.sign(message).to_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::signing_key;

    #[test]
    fn verifies_own_signature() {
        let key = signing_key(1);
        let signature = sign(&key, b"pay bob");
        assert!(Ed25519.verify(&PublicKey::from(&key.verifying_key()), b"pay bob", &signature));
    }

    #[test]
    fn rejects_signature_over_another_message() {
        let key = signing_key(1);
        let signature = sign(&key, b"pay bob");
        assert!(!Ed25519.verify(&PublicKey::from(&key.verifying_key()), b"pay eve", &signature));
    }

    #[test]
    fn rejects_signature_from_another_key() {
        let alice = signing_key(1);
        let bob = signing_key(2);
        let signature = sign(&bob, b"pay bob");
        assert!(!Ed25519.verify(&PublicKey::from(&alice.verifying_key()), b"pay bob", &signature));
    }

    #[test]
    fn malformed_signature_is_not_a_panic() {
        let key = signing_key(1);
        let public_key = PublicKey::from(&key.verifying_key());
        assert!(!Ed25519.verify(&public_key, b"pay bob", &[]));
        assert!(!Ed25519.verify(&public_key, b"pay bob", &[7; 12]));
    }
}
