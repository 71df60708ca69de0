//! Fixtures shared by the unit tests.

use crate::{
    OutputIndex, PublicKey, Sha256, Transaction, TransactionId, TransactionInput,
    TransactionOutput, UtxoId, UtxoPool,
};
use ed25519_dalek::SigningKey;

/// Deterministic key, so that tests are reproducible.
pub fn signing_key(seed: u8) -> SigningKey {
    SigningKey::from_bytes(&[seed; 32])
}

pub fn public_key(seed: u8) -> PublicKey {
    PublicKey::from(&signing_key(seed).verifying_key())
}

/// An output of a made-up transaction that precedes everything in the test.
pub fn genesis_utxo(index: i32) -> UtxoId {
    UtxoId::new(
        TransactionId::new(Sha256::digest(b"genesis")),
        OutputIndex::new(index),
    )
}

/// A pool with the given (index, amount, owner seed) genesis outputs.
pub fn genesis_pool(outputs: &[(i32, i64, u8)]) -> UtxoPool {
    outputs
        .iter()
        .map(|(index, amount, owner)| {
            (
                genesis_utxo(*index),
                TransactionOutput::new(*amount, public_key(*owner)),
            )
        })
        .collect()
}

/// Builds a transaction spending each utxo with the key of the given seed, and paying each
/// (amount, owner seed).
pub fn signed_transaction(inputs: &[(UtxoId, u8)], outputs: &[(i64, u8)]) -> Transaction {
    let mut transaction = Transaction::new(
        inputs
            .iter()
            .map(|(utxo, _)| TransactionInput::new(*utxo))
            .collect(),
        outputs
            .iter()
            .map(|(amount, owner)| TransactionOutput::new(*amount, public_key(*owner)))
            .collect(),
    )
    .unwrap();
    for (index, (_, owner)) in inputs.iter().enumerate() {
        transaction.sign_input(index, &signing_key(*owner)).unwrap();
    }
    transaction
}

/// The output reference the transaction's output at `index` gets once accepted.
pub fn output_of(transaction: &Transaction, index: i32) -> UtxoId {
    UtxoId::new(*transaction.id(), OutputIndex::new(index))
}
