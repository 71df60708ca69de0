use crate::{Transaction, TransactionOutput, UtxoId};
use std::collections::HashMap;
use std::iter::FromIterator;

/// A pool of confirmed and unspent transaction outputs.
///
/// Cloning the pool produces an independent copy, which is how the settlement engine keeps
/// its own state apart from the snapshot it was created from.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct UtxoPool {
    // Unspent transaction outputs, indexed by their transaction ID and their index in the
    // transaction.
    utxos: HashMap<UtxoId, TransactionOutput>,
}

impl UtxoPool {
    pub fn new() -> Self {
        Self {
            utxos: HashMap::new(),
        }
    }

    pub fn contains(&self, utxo: &UtxoId) -> bool {
        self.utxos.contains_key(utxo)
    }

    pub fn get(&self, utxo: &UtxoId) -> Option<&TransactionOutput> {
        self.utxos.get(utxo)
    }

    /// Ensures the output is spendable, replacing any output stored under the same reference.
    pub fn insert(&mut self, utxo: UtxoId, output: TransactionOutput) {
        self.utxos.insert(utxo, output);
    }

    /// Removes the output if it is present; removing a missing output is not an error.
    pub fn remove(&mut self, utxo: &UtxoId) -> Option<TransactionOutput> {
        self.utxos.remove(utxo)
    }

    /// Makes every output of the transaction spendable, without consuming its inputs.
    /// This is how an initial snapshot is seeded from genesis transactions.
    pub fn add_transaction_outputs(&mut self, transaction: &Transaction) {
        for (utxo, output) in transaction.produced_utxos() {
            self.insert(utxo, output.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    pub fn all_utxos(&self) -> Vec<UtxoId> {
        self.utxos.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UtxoId, &TransactionOutput)> {
        self.utxos.iter()
    }

    /// Sum of all unspent amounts, or None if it doesn't fit into an i64.
    pub fn total_value(&self) -> Option<i64> {
        self.utxos
            .values()
            .try_fold(0i64, |total, output| total.checked_add(output.amount()))
    }
}

impl FromIterator<(UtxoId, TransactionOutput)> for UtxoPool {
    fn from_iter<I: IntoIterator<Item = (UtxoId, TransactionOutput)>>(iter: I) -> Self {
        Self {
            utxos: iter.into_iter().collect(),
        }
    }
}
