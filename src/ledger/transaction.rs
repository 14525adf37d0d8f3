//! Transaction building, signing and wire codec.
//!
//! # Responsibilities
//! - Build unsigned data transactions
//! - Produce the canonical signing message
//! - Sign into a new value carrying signature and id
//! - Map to and from the gateway's JSON body

use rsa::{BigUint, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::ledger::encoding::{b64_decode, b64_encode, biguint_bytes};
use crate::ledger::types::{LedgerError, LedgerResult, Tag, TransactionJson};
use crate::ledger::wallet::{verify_pss, PssOptions, Wallet};

/// Public exponent every account key on the network uses.
pub const NETWORK_PUBLIC_EXPONENT: u32 = 65537;

/// One upload unit.
///
/// `last_tx` and `target` are held in their URL-safe base64 form, everything
/// else as raw values. `id` and `signature` are empty until signed.
#[derive(Clone, PartialEq, Eq)]
pub struct Transaction {
    id: Vec<u8>,
    last_tx: String,
    owner: BigUint,
    tags: Vec<Tag>,
    target: String,
    quantity: String,
    data: Vec<u8>,
    reward: String,
    signature: Vec<u8>,
}

impl Transaction {
    /// Build an unsigned transaction with no tags.
    ///
    /// `quantity` and `reward` are passed through as given.
    pub fn new(
        last_tx: impl Into<String>,
        owner: BigUint,
        quantity: impl Into<String>,
        target: impl Into<String>,
        data: Vec<u8>,
        reward: impl Into<String>,
    ) -> Self {
        Self {
            id: Vec::new(),
            last_tx: last_tx.into(),
            owner,
            tags: Vec::new(),
            target: target.into(),
            quantity: quantity.into(),
            data,
            reward: reward.into(),
            signature: Vec::new(),
        }
    }

    /// Append a tag. Adding a tag to a signed transaction discards the
    /// signature, since it no longer covers the contents.
    pub fn add_tag(&mut self, name: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.tags.push(Tag::new(name, value));
        self.id.clear();
        self.signature.clear();
    }

    pub fn with_tag(mut self, name: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        self.add_tag(name, value);
        self
    }

    /// The bytes whose SHA-256 digest is signed.
    ///
    /// Concatenation of owner, target, data, quantity, reward, last_tx and
    /// every tag's name followed by its value, with no separators.
    pub fn signing_message(&self) -> LedgerResult<Vec<u8>> {
        let last_tx = b64_decode(&self.last_tx).map_err(|source| LedgerError::Encoding {
            field: "last_tx".to_string(),
            source,
        })?;
        let target = b64_decode(&self.target).map_err(|source| LedgerError::Encoding {
            field: "target".to_string(),
            source,
        })?;

        let mut msg = Vec::new();
        msg.extend_from_slice(&biguint_bytes(&self.owner));
        msg.extend_from_slice(&target);
        msg.extend_from_slice(&self.data);
        msg.extend_from_slice(self.quantity.as_bytes());
        msg.extend_from_slice(self.reward.as_bytes());
        msg.extend_from_slice(&last_tx);
        for tag in &self.tags {
            msg.extend_from_slice(&tag.name);
            msg.extend_from_slice(&tag.value);
        }
        Ok(msg)
    }

    /// Sign with `wallet`, returning a new signed transaction.
    ///
    /// The signature is verified before it is accepted; `self` is untouched.
    pub fn sign(&self, wallet: &Wallet) -> LedgerResult<Transaction> {
        let digest = Sha256::digest(self.signing_message()?);
        let signature = wallet.sign(&digest)?;
        wallet.verify(&digest, &signature)?;

        let id = Sha256::digest(&signature).to_vec();
        tracing::debug!(id = %b64_encode(&id), "Transaction signed");

        Ok(Transaction {
            id,
            signature,
            ..self.clone()
        })
    }

    /// Check a received transaction: the id must be the hash of the
    /// signature and the signature must verify against the owner.
    pub fn verify(&self) -> LedgerResult<()> {
        if !self.is_signed() {
            return Err(LedgerError::InvalidSignature(
                "transaction is not signed".to_string(),
            ));
        }
        if Sha256::digest(&self.signature).as_slice() != self.id.as_slice() {
            return Err(LedgerError::InvalidSignature(
                "id does not match signature".to_string(),
            ));
        }

        let key = RsaPublicKey::new(
            self.owner.clone(),
            BigUint::from(NETWORK_PUBLIC_EXPONENT),
        )
        .map_err(|e| LedgerError::KeyFormat(format!("Invalid owner: {}", e)))?;
        let digest = Sha256::digest(self.signing_message()?);
        verify_pss(
            &key,
            PssOptions::max_salt_for(&self.owner),
            &digest,
            &self.signature,
        )
    }

    /// Serialize to the gateway's JSON body.
    pub fn marshal(&self) -> LedgerResult<Vec<u8>> {
        Ok(serde_json::to_vec(&TransactionJson::from(self))?)
    }

    /// Parse the gateway's JSON body.
    pub fn unmarshal(input: &[u8]) -> LedgerResult<Self> {
        let json: TransactionJson = serde_json::from_slice(input)?;
        Self::try_from(json)
    }

    /// URL-safe base64 id; empty until signed.
    pub fn id(&self) -> String {
        b64_encode(&self.id)
    }

    /// URL-safe base64 payload.
    pub fn data(&self) -> String {
        b64_encode(&self.data)
    }

    pub fn data_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn last_tx(&self) -> &str {
        &self.last_tx
    }

    pub fn owner(&self) -> &BigUint {
        &self.owner
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn quantity(&self) -> &str {
        &self.quantity
    }

    pub fn reward(&self) -> &str {
        &self.reward
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn is_signed(&self) -> bool {
        !self.signature.is_empty()
    }
}

impl From<&Transaction> for TransactionJson {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: b64_encode(&tx.id),
            last_tx: tx.last_tx.clone(),
            owner: b64_encode(&biguint_bytes(&tx.owner)),
            tags: tx.tags.iter().map(Tag::encode).collect(),
            target: tx.target.clone(),
            quantity: tx.quantity.clone(),
            data: b64_encode(&tx.data),
            reward: tx.reward.clone(),
            signature: b64_encode(&tx.signature),
        }
    }
}

impl TryFrom<TransactionJson> for Transaction {
    type Error = LedgerError;

    fn try_from(json: TransactionJson) -> LedgerResult<Self> {
        let id = decode_field("id", &json.id)?;
        let owner = BigUint::from_bytes_be(&decode_field("owner", &json.owner)?);
        let data = decode_field("data", &json.data)?;
        let signature = decode_field("signature", &json.signature)?;
        decode_field("last_tx", &json.last_tx)?;
        decode_field("target", &json.target)?;

        if id.is_empty() != signature.is_empty() {
            return Err(LedgerError::Decode {
                field: "id".to_string(),
                reason: "id and signature must be both present or both empty".to_string(),
            });
        }

        let tags = json
            .tags
            .iter()
            .enumerate()
            .map(|(i, tag)| Tag::decode(tag, i))
            .collect::<LedgerResult<Vec<_>>>()?;

        Ok(Self {
            id,
            last_tx: json.last_tx,
            owner,
            tags,
            target: json.target,
            quantity: json.quantity,
            data,
            reward: json.reward,
            signature,
        })
    }
}

fn decode_field(field: &str, value: &str) -> LedgerResult<Vec<u8>> {
    b64_decode(value).map_err(|e| LedgerError::Decode {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id())
            .field("last_tx", &self.last_tx)
            .field("target", &self.target)
            .field("quantity", &self.quantity)
            .field("reward", &self.reward)
            .field("data_len", &self.data.len())
            .field("tags", &self.tags)
            .finish()
    }
}
