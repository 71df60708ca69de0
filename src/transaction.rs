use crate::{signature, PublicKey, Sha256};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// A double SHA-256 hash of the transaction data, signatures included.
#[derive(Debug, Hash, Ord, PartialOrd, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct TransactionId(Sha256);

impl Display for TransactionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TransactionId {
    pub fn new(data: Sha256) -> Self {
        Self(data)
    }

    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }
}

/// The index of the transaction output.
/// It is signed because inputs arrive from untrusted sources, and a negative index is a claim
/// that can never be satisfied rather than a decoding failure.
#[derive(Debug, Hash, Ord, PartialOrd, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct OutputIndex(i32);

impl Display for OutputIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OutputIndex {
    pub const fn new(index: i32) -> Self {
        Self(index)
    }

    pub fn value(&self) -> i32 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

/// Identifies a single output of a past transaction.
#[derive(Debug, Hash, Ord, PartialOrd, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct UtxoId {
    transaction_id: TransactionId,
    output_index: OutputIndex,
}

impl Display for UtxoId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.transaction_id, self.output_index)
    }
}

impl UtxoId {
    pub fn new(transaction_id: TransactionId, output_index: OutputIndex) -> Self {
        Self {
            transaction_id,
            output_index,
        }
    }

    pub fn transaction_id(&self) -> &TransactionId {
        &self.transaction_id
    }

    pub fn output_index(&self) -> OutputIndex {
        self.output_index
    }
}

#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("Input index: {index} is out of range, the transaction has {len} inputs")]
    InputIndexOutOfRange { index: usize, len: usize },

    #[error("Transaction declares {0} outputs, which can't all be addressed by an output index")]
    TooManyOutputs(usize),

    #[error("Failed to encode the transaction: {0}")]
    Encoding(#[from] bincode::Error),
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransactionInput {
    // The output being spent.
    utxo: UtxoId,
    // Signature over `Transaction::raw_data_to_sign` at this input's position, made by the
    // owner of the spent output. Empty until the input is signed.
    signature: Vec<u8>,
}

impl Display for TransactionInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.utxo)
    }
}

impl TransactionInput {
    pub fn new(utxo: UtxoId) -> Self {
        Self {
            utxo,
            signature: vec![],
        }
    }

    pub fn with_signature(utxo: UtxoId, signature: Vec<u8>) -> Self {
        Self { utxo, signature }
    }

    pub fn utxo(&self) -> &UtxoId {
        &self.utxo
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransactionOutput {
    amount: i64,
    // The only key that can spend this output.
    public_key: PublicKey,
}

impl Display for TransactionOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.amount, self.public_key)
    }
}

impl TransactionOutput {
    pub fn new(amount: i64, public_key: PublicKey) -> Self {
        Self { amount, public_key }
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Transaction {
    id: TransactionId,
    inputs: Vec<TransactionInput>,
    outputs: Vec<TransactionOutput>,
}

impl Transaction {
    pub fn new(
        inputs: Vec<TransactionInput>,
        outputs: Vec<TransactionOutput>,
    ) -> Result<Self, TransactionError> {
        Self::validate_format(&outputs)?;
        let id = Self::hash_transaction_data(&inputs, &outputs)?;
        Ok(Self {
            id,
            inputs,
            outputs,
        })
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn inputs(&self) -> &Vec<TransactionInput> {
        &self.inputs
    }

    pub fn outputs(&self) -> &Vec<TransactionOutput> {
        &self.outputs
    }

    /// Returns the output references this transaction produces once accepted, in output order.
    pub fn produced_utxos(&self) -> impl Iterator<Item = (UtxoId, &TransactionOutput)> + '_ {
        let id = self.id;
        self.outputs.iter().enumerate().map(move |(index, output)| {
            // `validate_format` guarantees the index fits.
            (UtxoId::new(id, OutputIndex::new(index as i32)), output)
        })
    }

    /// Returns the bytes the owner of the output claimed by the input at `input_index` signs:
    /// the claimed output reference followed by every output of this transaction.
    /// Other inputs and all signatures are excluded, so inputs can be signed in any order.
    ///
    /// Returns None if there is no input at the given index.
    pub fn raw_data_to_sign(&self, input_index: usize) -> Option<Vec<u8>> {
        let input = self.inputs.get(input_index)?;
        bincode::serialize(&(input.utxo(), &self.outputs)).ok()
    }

    /// Replaces the signature of the input at `input_index` and recomputes the transaction id.
    pub fn add_signature(
        &mut self,
        input_index: usize,
        signature: Vec<u8>,
    ) -> Result<(), TransactionError> {
        let len = self.inputs.len();
        let input = self
            .inputs
            .get_mut(input_index)
            .ok_or(TransactionError::InputIndexOutOfRange {
                index: input_index,
                len,
            })?;
        input.signature = signature;
        self.id = Self::hash_transaction_data(&self.inputs, &self.outputs)?;
        Ok(())
    }

    /// Signs the input at `input_index` with the given Ed25519 key.
    pub fn sign_input(
        &mut self,
        input_index: usize,
        signing_key: &ed25519_dalek::SigningKey,
    ) -> Result<(), TransactionError> {
        let message = self
            .raw_data_to_sign(input_index)
            .ok_or(TransactionError::InputIndexOutOfRange {
                index: input_index,
                len: self.inputs.len(),
            })?;
        self.add_signature(input_index, signature::sign(signing_key, &message))
    }

    fn hash_transaction_data(
        inputs: &Vec<TransactionInput>,
        outputs: &Vec<TransactionOutput>,
    ) -> Result<TransactionId, TransactionError> {
        let data = bincode::serialize(&(inputs, outputs))?;
        Ok(TransactionId(Sha256::double_digest(&data)))
    }

    /// Every produced output must be addressable by a non-negative output index.
    fn validate_format(outputs: &Vec<TransactionOutput>) -> Result<(), TransactionError> {
        if i32::try_from(outputs.len()).is_err() {
            Err(TransactionError::TooManyOutputs(outputs.len()))
        } else {
            Ok(())
        }
    }
}
