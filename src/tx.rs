//! Signed simulation transactions.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coins::Coins;
use crate::msgs::StakingMsg;

/// Gas limit attached to generated transactions unless configured otherwise.
pub const DEFAULT_GEN_TX_GAS: u64 = 1_000_000;

/// Transaction construction and verification failures.
#[derive(Debug, Error)]
pub enum TxError {
    /// Sign bytes could not be encoded.
    #[error("sign bytes encoding failed: {0}")]
    Encoding(#[from] bincode::Error),
    /// Public key bytes are not a valid ed25519 key.
    #[error("malformed public key")]
    MalformedKey,
    /// Signature does not match the sign bytes.
    #[error("signature verification failed")]
    BadSignature,
}

/// Fee paid by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    /// Coins paid.
    pub amount: Coins,
    /// Gas limit.
    pub gas: u64,
}

/// Canonical document a signer commits to.
#[derive(Debug, Serialize)]
struct SignDoc<'a> {
    chain_id: &'a str,
    account_number: u64,
    sequence: u64,
    fee: &'a Fee,
    msgs: &'a [StakingMsg],
    memo: &'a str,
}

/// A signed transaction ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimTx {
    /// Messages, executed in order.
    pub msgs: Vec<StakingMsg>,
    /// Fee.
    pub fee: Fee,
    /// Memo.
    pub memo: String,
    /// Chain identifier the signature is bound to.
    pub chain_id: String,
    /// Signer account number.
    pub account_number: u64,
    /// Signer sequence.
    pub sequence: u64,
    /// Signer public key.
    pub pub_key: [u8; 32],
    /// Signature over the sign document.
    pub signature: Vec<u8>,
}

impl SimTx {
    fn sign_bytes(&self) -> Result<Vec<u8>, TxError> {
        let doc = SignDoc {
            chain_id: &self.chain_id,
            account_number: self.account_number,
            sequence: self.sequence,
            fee: &self.fee,
            msgs: &self.msgs,
            memo: &self.memo,
        };
        Ok(bincode::serialize(&doc)?)
    }

    /// Check the signature against the embedded public key.
    pub fn verify_signature(&self) -> Result<(), TxError> {
        let key = VerifyingKey::from_bytes(&self.pub_key).map_err(|_| TxError::MalformedKey)?;
        let signature =
            Signature::from_slice(&self.signature).map_err(|_| TxError::BadSignature)?;
        key.verify(&self.sign_bytes()?, &signature)
            .map_err(|_| TxError::BadSignature)
    }
}

/// Build and sign a transaction carrying `msgs`.
pub fn gen_tx(
    msgs: Vec<StakingMsg>,
    fee: Fee,
    memo: impl Into<String>,
    chain_id: &str,
    account_number: u64,
    sequence: u64,
    priv_key: &SigningKey,
) -> Result<SimTx, TxError> {
    let mut tx = SimTx {
        msgs,
        fee,
        memo: memo.into(),
        chain_id: chain_id.to_string(),
        account_number,
        sequence,
        pub_key: priv_key.verifying_key().to_bytes(),
        signature: Vec::new(),
    };
    let signature = priv_key.sign(&tx.sign_bytes()?);
    tx.signature = signature.to_bytes().to_vec();
    Ok(tx)
}

/// Result of delivering a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverResult {
    /// Zero on success.
    pub code: u32,
    /// Diagnostic log.
    pub log: String,
}

impl DeliverResult {
    /// Successful delivery.
    pub fn ok() -> Self {
        Self {
            code: 0,
            log: String::new(),
        }
    }

    /// Failed delivery with a diagnostic log.
    pub fn fail(code: u32, log: impl Into<String>) -> Self {
        Self {
            code,
            log: log.into(),
        }
    }

    /// True when the transaction was executed.
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}
