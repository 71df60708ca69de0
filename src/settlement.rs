use crate::{
    Ed25519, SignatureVerifier, Transaction, TransactionId, TransactionValidator, UtxoId,
    UtxoPool, ValidationError,
};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use tracing::{debug, info, trace};

/// Why a transaction of a batch was left out of the accepted set.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum RejectionReason {
    Invalid(ValidationError),
    // Another transaction of the same batch was accepted first with a claim on this output.
    // Accepting a transaction removes its claims from the pool, so this only happens when a
    // later acceptance puts a claimed output back, i.e. when the initial snapshot holds the
    // outputs of a transaction whose inputs are unspent as well.
    ConflictingClaim(UtxoId),
}

impl Display for RejectionReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionReason::Invalid(e) => write!(f, "{}", e),
            RejectionReason::ConflictingClaim(utxo) => {
                write!(f, "Output: {} is already claimed in this batch", utxo)
            }
        }
    }
}

/// The outcome of settling one batch.
#[derive(Debug, Clone)]
pub struct Settlement {
    // Accepted transactions, in the order they were accepted.
    pub accepted: Vec<Transaction>,
    // Transactions that never became valid, with the reason of their last rejection.
    pub rejected: Vec<(TransactionId, RejectionReason)>,
    // Number of passes over the transactions still pending.
    pub passes: usize,
}

/// Settles unordered batches of transactions against its own copy of the UTXO pool.
///
/// The engine owns its pool, so settling requires exclusive access; embedders that share an
/// engine between threads must serialize the calls.
pub struct SettlementEngine<V = Ed25519> {
    pool: UtxoPool,
    verifier: V,
}

impl SettlementEngine<Ed25519> {
    pub fn with_ed25519(pool: &UtxoPool) -> Self {
        Self::new(pool, Ed25519)
    }
}

impl<V: SignatureVerifier> SettlementEngine<V> {
    /// Creates an engine whose state starts as a copy of the given pool.
    /// The given pool is never modified.
    pub fn new(pool: &UtxoPool, verifier: V) -> Self {
        Self {
            pool: pool.clone(),
            verifier,
        }
    }

    pub fn pool(&self) -> &UtxoPool {
        &self.pool
    }

    pub fn into_pool(self) -> UtxoPool {
        self.pool
    }

    /// Returns whether the transaction could be accepted against the current pool.
    pub fn is_valid(&self, transaction: &Transaction) -> bool {
        TransactionValidator::is_valid(&self.pool, transaction, &self.verifier)
    }

    pub fn validate(&self, transaction: &Transaction) -> Result<(), ValidationError> {
        TransactionValidator::validate(&self.pool, transaction, &self.verifier)
    }

    /// Accepts a mutually valid subset of the batch, updates the pool and returns the accepted
    /// transactions in the order of acceptance.
    pub fn settle(&mut self, batch: &[Transaction]) -> Vec<Transaction> {
        self.settle_with_report(batch).accepted
    }

    /// Same as `settle`, but also reports what was rejected and how many passes it took.
    ///
    /// Transactions may spend outputs of other transactions of the same batch, in any order.
    /// The batch is scanned repeatedly, and every pass re-validates the transactions rejected so
    /// far against the pool left by the previous pass, until a pass accepts nothing.
    /// When transactions race for the same output, the first one to become valid in scan order
    /// wins, and the others stay rejected because the output is gone.
    pub fn settle_with_report(&mut self, batch: &[Transaction]) -> Settlement {
        let mut accepted = Vec::with_capacity(batch.len());
        let mut claimed = HashSet::new();
        let mut pending = batch.iter().collect::<Vec<&Transaction>>();
        let mut rejected = Vec::new();
        let mut passes = 0;

        // Every pass but the last one accepts at least one transaction, and the last one either
        // accepts nothing out of a non-empty rest or empties it, so this runs at most
        // `batch.len()` times, and once for an empty batch.
        loop {
            passes += 1;
            trace!("Settlement pass: {} over {} transactions", passes, pending.len());
            let accepted_before = accepted.len();
            rejected.clear();
            let mut retry = Vec::with_capacity(pending.len());

            for transaction in pending {
                match self.try_accept(transaction, &mut claimed) {
                    Ok(()) => {
                        debug!("Accepted transaction: {}", transaction.id());
                        accepted.push(transaction.clone());
                    }
                    Err(reason) => {
                        trace!("Deferred transaction: {}: {}", transaction.id(), reason);
                        rejected.push((*transaction.id(), reason));
                        retry.push(transaction);
                    }
                }
            }

            pending = retry;
            if accepted.len() == accepted_before || pending.is_empty() {
                break;
            }
        }

        for (id, reason) in &rejected {
            debug!("Rejected transaction: {}: {}", id, reason);
        }
        info!(
            "Settled batch of {} transactions: {} accepted, {} rejected in {} passes",
            batch.len(),
            accepted.len(),
            rejected.len(),
            passes
        );
        Settlement {
            accepted,
            rejected,
            passes,
        }
    }

    /// Validates the transaction and, if it's valid, commits it.
    /// Nothing is modified unless the transaction is accepted.
    fn try_accept(
        &mut self,
        transaction: &Transaction,
        claimed: &mut HashSet<UtxoId>,
    ) -> Result<(), RejectionReason> {
        self.validate(transaction)
            .map_err(RejectionReason::Invalid)?;
        if let Some(input) = transaction
            .inputs()
            .iter()
            .find(|input| claimed.contains(input.utxo()))
        {
            return Err(RejectionReason::ConflictingClaim(*input.utxo()));
        }
        claimed.extend(transaction.inputs().iter().map(|input| *input.utxo()));
        self.commit(transaction);
        Ok(())
    }

    fn commit(&mut self, transaction: &Transaction) {
        for input in transaction.inputs() {
            self.pool.remove(input.utxo());
        }
        self.pool.add_transaction_outputs(transaction);
    }
}
