//! Transaction builder
//!
//! Assembles and signs the four transaction kinds: same-chain transfer,
//! cross-chain hop transfer, settlement, and name registration. Every
//! transaction wraps its script in allow-gas / spend-gas, expires one
//! hour after build time, and is signed with the caller-supplied signer
//! before return. The builder never retains the signer.

use crate::config::TxConfig;
use crate::error::{TransferError, TransferResult};
use crate::ledger::Token;
use crate::tx::amount;
use crate::tx::script::{self, Script, ScriptArg, ScriptOp};

use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::{Signer as _, SigningKey, VerifyingKey};
use sha3::{Digest, Sha3_256};

/// Horizon after which an unsubmitted transaction is no longer valid
const EXPIRY_HORIZON_SECS: i64 = 3600;

/// Signing capability for one principal
///
/// Wraps an Ed25519 key; supplied per call and never stored by the
/// builder or the orchestrator.
pub struct TransferSigner {
    key: SigningKey,
}

impl TransferSigner {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(&seed),
        }
    }

    pub fn from_seed_hex(seed_hex: &str) -> TransferResult<Self> {
        let bytes = hex::decode(seed_hex.trim())
            .map_err(|_| TransferError::Validation("malformed signer key".to_string()))?;
        let seed: [u8; 32] = bytes
            .try_into()
            .map_err(|_| TransferError::Validation("signer key must be 32 bytes".to_string()))?;
        Ok(Self::from_seed(seed))
    }

    pub fn generate() -> Self {
        let mut rng = rand::rngs::OsRng;
        Self {
            key: SigningKey::generate(&mut rng),
        }
    }

    /// On-chain address of this signer
    pub fn address(&self) -> String {
        format!("S{}", hex::encode(self.key.verifying_key().as_bytes()))
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        self.key.sign(payload).to_bytes().to_vec()
    }
}

/// A signed transaction ready for submission
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    /// Chain the transaction executes on
    pub chain: String,
    pub script: Script,
    pub expires_at: DateTime<Utc>,
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
    /// SHA3-256 of payload and signature, hex encoded
    pub hash: String,
}

impl SignedTransaction {
    /// Wire form for `sendRawTransaction`
    pub fn raw_hex(&self) -> String {
        let mut raw = self.payload.clone();
        raw.extend_from_slice(&self.signature);
        hex::encode(raw)
    }
}

/// Builds the four script transaction kinds
pub struct TransactionBuilder {
    gas_price: u64,
    gas_limit: u64,
    relay_fee: u64,
}

impl TransactionBuilder {
    pub fn new(config: &TxConfig) -> Self {
        Self {
            gas_price: config.gas_price,
            gas_limit: config.gas_limit,
            relay_fee: config.relay_fee,
        }
    }

    /// Transfer within a single chain
    pub fn same_chain_transfer(
        &self,
        signer: &TransferSigner,
        chain: &str,
        destination: &str,
        token: &Token,
        amount_or_id: &str,
    ) -> TransferResult<SignedTransaction> {
        let from = signer.address();
        let op = if token.fungible {
            ScriptOp::TransferTokens {
                from: from.clone(),
                to: destination.to_string(),
                symbol: token.symbol.clone(),
                units: amount::to_fixed(amount_or_id, token.decimals)?,
            }
        } else {
            ScriptOp::TransferToken {
                from: from.clone(),
                to: destination.to_string(),
                symbol: token.symbol.clone(),
                token_id: amount::parse_token_id(amount_or_id)?,
            }
        };

        let script = self.with_gas(&from, vec![op]);
        Ok(self.seal(signer, chain, script))
    }

    /// One hop of a cross-chain transfer
    ///
    /// Moves a fixed relay fee to self on the next hop's chain, then the
    /// requested value to the destination there.
    pub fn cross_chain_hop(
        &self,
        signer: &TransferSigner,
        source_chain: &str,
        next_chain_address: &str,
        destination: &str,
        token: &Token,
        amount_or_id: &str,
    ) -> TransferResult<SignedTransaction> {
        let from = signer.address();
        let value = if token.fungible {
            amount::to_fixed(amount_or_id, token.decimals)?
        } else {
            amount::parse_token_id(amount_or_id)?
        };

        let ops = vec![
            ScriptOp::CrossTransfer {
                target_chain_address: next_chain_address.to_string(),
                symbol: token.symbol.clone(),
                from: from.clone(),
                to: from.clone(),
                value: self.relay_fee as u128,
            },
            ScriptOp::CrossTransfer {
                target_chain_address: next_chain_address.to_string(),
                symbol: token.symbol.clone(),
                from: from.clone(),
                to: destination.to_string(),
                value,
            },
        ];

        let script = self.with_gas(&from, ops);
        Ok(self.seal(signer, source_chain, script))
    }

    /// Settlement anchoring a confirmed hop on the destination chain
    pub fn settlement(
        &self,
        signer: &TransferSigner,
        destination_chain: &str,
        source_chain_address: &str,
        confirmed_block_hash: &str,
    ) -> TransferResult<SignedTransaction> {
        let from = signer.address();
        let call = ScriptOp::CallContract {
            contract: "block".to_string(),
            method: "SettleBlock".to_string(),
            args: vec![
                ScriptArg::Address(source_chain_address.to_string()),
                ScriptArg::Hash(confirmed_block_hash.to_string()),
            ],
        };

        let script = self.with_gas(&from, vec![call]);
        Ok(self.seal(signer, destination_chain, script))
    }

    /// Register an address name on the naming contract
    pub fn register_name(
        &self,
        signer: &TransferSigner,
        chain: &str,
        name: &str,
    ) -> TransferResult<SignedTransaction> {
        validate_name(name)?;

        let from = signer.address();
        let call = ScriptOp::CallContract {
            contract: "account".to_string(),
            method: "Register".to_string(),
            args: vec![
                ScriptArg::Address(from.clone()),
                ScriptArg::Text(name.to_string()),
            ],
        };

        let script = self.with_gas(&from, vec![call]);
        Ok(self.seal(signer, chain, script))
    }

    fn with_gas(&self, from: &str, ops: Vec<ScriptOp>) -> Script {
        let mut script = Script::new();
        script.push(ScriptOp::AllowGas {
            from: from.to_string(),
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
        });
        for op in ops {
            script.push(op);
        }
        script.push(ScriptOp::SpendGas {
            from: from.to_string(),
        });
        script
    }

    fn seal(
        &self,
        signer: &TransferSigner,
        chain: &str,
        script: Script,
    ) -> SignedTransaction {
        let expires_at = Utc::now() + Duration::seconds(EXPIRY_HORIZON_SECS);

        let mut payload = Vec::new();
        script::write_str(&mut payload, chain);
        script::write_i64(&mut payload, expires_at.timestamp());
        script.encode_into(&mut payload);

        let signature = signer.sign(&payload);

        let mut hasher = Sha3_256::new();
        hasher.update(&payload);
        hasher.update(&signature);
        let hash = hex::encode(hasher.finalize());

        SignedTransaction {
            chain: chain.to_string(),
            script,
            expires_at,
            payload,
            signature,
            hash,
        }
    }
}

/// Validate an address name: 3 to 15 lowercase alphanumeric characters,
/// not starting with a digit
pub fn validate_name(name: &str) -> TransferResult<()> {
    let ok = (3..=15).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        && name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase());

    if ok {
        Ok(())
    } else {
        Err(TransferError::Validation(format!(
            "invalid address name '{}'",
            name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn soul() -> Token {
        Token {
            symbol: "SOUL".to_string(),
            name: "Soul".to_string(),
            decimals: 8,
            fungible: true,
        }
    }

    fn collectible() -> Token {
        Token {
            symbol: "CROWN".to_string(),
            name: "Crown".to_string(),
            decimals: 0,
            fungible: false,
        }
    }

    fn builder() -> TransactionBuilder {
        TransactionBuilder::new(&TxConfig::default())
    }

    #[test]
    fn same_chain_transfer_script_shape() {
        let signer = TransferSigner::generate();
        let tx = builder()
            .same_chain_transfer(&signer, "main", "Sdest", &soul(), "2.5")
            .unwrap();

        assert_eq!(tx.chain, "main");
        let ops = tx.script.ops();
        assert_eq!(ops.len(), 3);
        assert!(matches!(ops[0], ScriptOp::AllowGas { .. }));
        assert!(matches!(
            &ops[1],
            ScriptOp::TransferTokens { units, to, .. } if *units == 250_000_000 && to == "Sdest"
        ));
        assert!(matches!(ops[2], ScriptOp::SpendGas { .. }));
    }

    #[test]
    fn non_fungible_transfer_carries_id() {
        let signer = TransferSigner::generate();
        let tx = builder()
            .same_chain_transfer(&signer, "nft", "Sdest", &collectible(), "1553")
            .unwrap();

        assert!(matches!(
            &tx.script.ops()[1],
            ScriptOp::TransferToken { token_id, .. } if *token_id == 1553
        ));
    }

    #[test]
    fn cross_chain_hop_pays_relay_fee_first() {
        let signer = TransferSigner::generate();
        let tx = builder()
            .cross_chain_hop(&signer, "main", "chain:nft", "Sdest", &soul(), "12.345")
            .unwrap();

        assert_eq!(tx.chain, "main");
        let ops = tx.script.ops();
        assert_eq!(ops.len(), 4);

        let self_address = signer.address();
        assert!(matches!(
            &ops[1],
            ScriptOp::CrossTransfer { target_chain_address, to, value, .. }
                if target_chain_address == "chain:nft" && *to == self_address && *value == 10
        ));
        assert!(matches!(
            &ops[2],
            ScriptOp::CrossTransfer { to, value, .. }
                if to == "Sdest" && *value == 1_234_500_000
        ));
    }

    #[test]
    fn settlement_references_source_chain_and_block() {
        let signer = TransferSigner::generate();
        let tx = builder()
            .settlement(&signer, "nft", "chain:main", "0xb10c")
            .unwrap();

        assert_eq!(tx.chain, "nft");
        assert!(matches!(
            &tx.script.ops()[1],
            ScriptOp::CallContract { contract, method, args }
                if contract == "block"
                    && method == "SettleBlock"
                    && args == &vec![
                        ScriptArg::Address("chain:main".to_string()),
                        ScriptArg::Hash("0xb10c".to_string()),
                    ]
        ));
    }

    #[test]
    fn registration_calls_naming_contract() {
        let signer = TransferSigner::generate();
        let tx = builder()
            .register_name(&signer, "account", "alice")
            .unwrap();

        assert!(matches!(
            &tx.script.ops()[1],
            ScriptOp::CallContract { contract, method, .. }
                if contract == "account" && method == "Register"
        ));
    }

    #[test]
    fn signature_verifies_against_payload() {
        let signer = TransferSigner::generate();
        let tx = builder()
            .same_chain_transfer(&signer, "main", "Sdest", &soul(), "1")
            .unwrap();

        let signature = ed25519_dalek::Signature::from_slice(&tx.signature).unwrap();
        signer
            .verifying_key()
            .verify_strict(&tx.payload, &signature)
            .unwrap();
    }

    #[test]
    fn expiry_is_one_hour_out() {
        let signer = TransferSigner::generate();
        let tx = builder()
            .same_chain_transfer(&signer, "main", "Sdest", &soul(), "1")
            .unwrap();

        let horizon = tx.expires_at - Utc::now();
        assert!(horizon.num_seconds() > 3590 && horizon.num_seconds() <= 3600);
    }

    #[test]
    fn malformed_amount_fails_before_signing() {
        let signer = TransferSigner::generate();
        let err = builder()
            .same_chain_transfer(&signer, "main", "Sdest", &soul(), "1,5")
            .unwrap_err();
        assert!(matches!(err, TransferError::Validation(_)));
    }

    #[test]
    fn name_rules() {
        assert!(validate_name("alice").is_ok());
        assert!(validate_name("node7").is_ok());
        assert!(validate_name("ab").is_err());
        assert!(validate_name("7alice").is_err());
        assert!(validate_name("Alice").is_err());
        assert!(validate_name("with space").is_err());
        assert!(validate_name("averyveryverylongname").is_err());
    }
}
