pub mod hash;
pub mod public_key;
pub mod settlement;
pub mod signature;
pub mod transaction;
pub mod utxo_pool;
pub mod validation;

#[cfg(test)]
mod test_utils;

pub use self::{
    hash::*, public_key::*, settlement::*, signature::*, transaction::*, utxo_pool::*,
    validation::*,
};
