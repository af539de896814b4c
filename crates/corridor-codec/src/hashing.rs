use corridor_types::{TemplatePayload, TransactionTemplate, TxHash};
use sha2::{Digest, Sha512};

const TEMPLATE_DIGEST_TAG: &[u8] = b"corridor.template.v1";
/// Ledger hash prefix for signed transaction blobs ("TXN\0").
const TRANSACTION_ID_PREFIX: [u8; 4] = [0x54, 0x58, 0x4E, 0x00];

/// Canonical encoding rules used by the template digest:
/// 1. Big-endian fixed-width integers: u32/u64.
/// 2. Strings are length-prefixed with u32.
/// 3. Optional fields are encoded with a one-byte presence tag (0 or 1).
/// 4. The payload starts with a one-byte kind tag (0 trust line, 1 payment).
/// 5. Memos keep their template order.
/// 6. Digests are SHA-512Half (first 32 bytes of SHA-512) over the tagged payload.
pub fn template_digest(tx: &TransactionTemplate) -> TxHash {
    let mut enc = Vec::new();
    enc.extend_from_slice(TEMPLATE_DIGEST_TAG);
    match tx.payload() {
        TemplatePayload::TrustLineGrant { .. } => put_u8(&mut enc, 0),
        TemplatePayload::ValuePayment { .. } => put_u8(&mut enc, 1),
    }
    put_string(&mut enc, tx.account().as_str());
    put_u64(&mut enc, tx.fee().get());
    put_u32(&mut enc, tx.sequence());
    put_optional_u32(&mut enc, tx.last_ledger_sequence());
    match tx.payload() {
        TemplatePayload::TrustLineGrant { limit_amount } => {
            put_string(&mut enc, limit_amount.currency.as_str());
            put_string(&mut enc, limit_amount.issuer.as_str());
            put_string(&mut enc, limit_amount.value.as_str());
        }
        TemplatePayload::ValuePayment {
            destination,
            amount,
            memos,
        } => {
            put_string(&mut enc, destination.as_str());
            put_u64(&mut enc, amount.get());
            put_u32(&mut enc, memos.len() as u32);
            for memo in memos {
                match memo.memo_type() {
                    Some(memo_type) => {
                        put_u8(&mut enc, 1);
                        put_string(&mut enc, memo_type);
                    }
                    None => put_u8(&mut enc, 0),
                }
                put_string(&mut enc, memo.memo_data());
            }
        }
    }
    TxHash::new(sha512_half(&enc))
}

/// Ledger transaction id of a signed blob.
pub fn transaction_id(signed_blob: &[u8]) -> TxHash {
    let mut enc = Vec::with_capacity(TRANSACTION_ID_PREFIX.len() + signed_blob.len());
    enc.extend_from_slice(&TRANSACTION_ID_PREFIX);
    enc.extend_from_slice(signed_blob);
    TxHash::new(sha512_half(&enc))
}

pub fn sha512_half(input: &[u8]) -> [u8; 32] {
    let digest = Sha512::digest(input);
    let mut half = [0u8; 32];
    half.copy_from_slice(&digest[..32]);
    half
}

fn put_u8(out: &mut Vec<u8>, value: u8) {
    out.push(value);
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn put_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn put_optional_u32(out: &mut Vec<u8>, value: Option<u32>) {
    match value {
        Some(value) => {
            put_u8(out, 1);
            put_u32(out, value);
        }
        None => put_u8(out, 0),
    }
}

fn put_string(out: &mut Vec<u8>, value: &str) {
    put_u32(out, value.len() as u32);
    out.extend_from_slice(value.as_bytes());
}
