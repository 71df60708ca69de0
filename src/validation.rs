use crate::{SignatureVerifier, Transaction, UtxoId, UtxoPool};
use std::collections::HashSet;
use thiserror::Error;

/// The first check a transaction failed.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum ValidationError {
    #[error("Transaction has no inputs")]
    NoInputs,

    #[error("Input: {0} claims an output with a negative index")]
    NegativeOutputIndex(UtxoId),

    #[error("Input: {0} claims an output that is not in the UTXO pool")]
    MissingUtxo(UtxoId),

    #[error("No data to sign for input at index: {0}")]
    MissingRawData(usize),

    #[error("Input at index: {0} is not signed")]
    EmptySignature(usize),

    #[error("Signature of input at index: {0} doesn't match the owner of the claimed output")]
    InvalidSignature(usize),

    #[error("Output: {0} is claimed more than once")]
    DuplicateClaim(UtxoId),

    #[error("Output at index: {index} has a negative amount: {amount}")]
    NegativeOutput { index: usize, amount: i64 },

    #[error("Transaction values overflow")]
    ValueOverflow,

    #[error("Outputs: {outputs} exceed inputs: {inputs}")]
    InsufficientInputValue { inputs: i64, outputs: i64 },
}

/// Decides whether a transaction may be accepted against a UTXO pool.
///
/// A transaction is valid if:
///   - it spends at least one output,
///   - all outputs claimed by its inputs are in the pool,
///   - the signature on each input is valid,
///   - no output is claimed more than once,
///   - all of its output values are non-negative,
///   - the sum of its input values is greater than or equal to the sum of its output values.
/// The pool is only read.
pub struct TransactionValidator {}

impl TransactionValidator {
    pub fn is_valid<V: SignatureVerifier>(
        pool: &UtxoPool,
        transaction: &Transaction,
        verifier: &V,
    ) -> bool {
        Self::validate(pool, transaction, verifier).is_ok()
    }

    pub fn validate<V: SignatureVerifier>(
        pool: &UtxoPool,
        transaction: &Transaction,
        verifier: &V,
    ) -> Result<(), ValidationError> {
        Self::validate_has_inputs(transaction)?;
        Self::validate_claimed_outputs_exist(pool, transaction)?;
        Self::validate_signatures(pool, transaction, verifier)?;
        Self::validate_no_output_claimed_twice(transaction)?;
        Self::validate_outputs_non_negative(transaction)?;
        Self::validate_value_is_conserved(pool, transaction)
    }

    /// A transaction without inputs consumes nothing, so accepting it twice would bring back
    /// its outputs after they were spent. Genesis outputs are seeded into the pool directly.
    fn validate_has_inputs(transaction: &Transaction) -> Result<(), ValidationError> {
        if transaction.inputs().is_empty() {
            Err(ValidationError::NoInputs)
        } else {
            Ok(())
        }
    }

    fn validate_claimed_outputs_exist(
        pool: &UtxoPool,
        transaction: &Transaction,
    ) -> Result<(), ValidationError> {
        for input in transaction.inputs() {
            let utxo = input.utxo();
            if utxo.output_index().is_negative() {
                return Err(ValidationError::NegativeOutputIndex(*utxo));
            }
            if !pool.contains(utxo) {
                return Err(ValidationError::MissingUtxo(*utxo));
            }
        }
        Ok(())
    }

    /// Each input is signed at its own position, by the owner of the output it claims.
    fn validate_signatures<V: SignatureVerifier>(
        pool: &UtxoPool,
        transaction: &Transaction,
        verifier: &V,
    ) -> Result<(), ValidationError> {
        for (index, input) in transaction.inputs().iter().enumerate() {
            let owner = pool
                .get(input.utxo())
                .ok_or(ValidationError::MissingUtxo(*input.utxo()))?
                .public_key();
            let message = match transaction.raw_data_to_sign(index) {
                Some(message) if !message.is_empty() => message,
                _ => return Err(ValidationError::MissingRawData(index)),
            };
            if input.signature().is_empty() {
                return Err(ValidationError::EmptySignature(index));
            }
            if !verifier.verify(owner, &message, input.signature()) {
                return Err(ValidationError::InvalidSignature(index));
            }
        }
        Ok(())
    }

    fn validate_no_output_claimed_twice(transaction: &Transaction) -> Result<(), ValidationError> {
        let mut claimed = HashSet::with_capacity(transaction.inputs().len());
        for input in transaction.inputs() {
            if !claimed.insert(input.utxo()) {
                return Err(ValidationError::DuplicateClaim(*input.utxo()));
            }
        }
        Ok(())
    }

    fn validate_outputs_non_negative(transaction: &Transaction) -> Result<(), ValidationError> {
        match transaction
            .outputs()
            .iter()
            .enumerate()
            .find(|(_, output)| output.amount() < 0)
        {
            Some((index, output)) => Err(ValidationError::NegativeOutput {
                index,
                amount: output.amount(),
            }),
            None => Ok(()),
        }
    }

    /// Value may be destroyed, never created.
    fn validate_value_is_conserved(
        pool: &UtxoPool,
        transaction: &Transaction,
    ) -> Result<(), ValidationError> {
        let mut inputs = 0i64;
        for input in transaction.inputs() {
            let amount = pool
                .get(input.utxo())
                .ok_or(ValidationError::MissingUtxo(*input.utxo()))?
                .amount();
            inputs = inputs
                .checked_add(amount)
                .ok_or(ValidationError::ValueOverflow)?;
        }
        let outputs = transaction
            .outputs()
            .iter()
            .try_fold(0i64, |total, output| total.checked_add(output.amount()))
            .ok_or(ValidationError::ValueOverflow)?;
        if inputs >= outputs {
            Ok(())
        } else {
            Err(ValidationError::InsufficientInputValue { inputs, outputs })
        }
    }
}
