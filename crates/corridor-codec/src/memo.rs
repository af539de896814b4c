//! Structured JSON metadata carried in the ledger's hex memo field.
//!
//! Encoding is compact JSON text, then uppercase hex. Object keys are emitted in
//! sorted order (`serde_json::Map` is ordered), so equal metadata always yields the
//! same memo bytes.

use corridor_types::Memo;
use serde_json::Value;

use crate::error::CodecError;

pub const LOAN_PAYMENT_MEMO_TYPE: &str = "LOAN_PAYMENT";
pub const LOAN_OFFER_MEMO_TYPE: &str = "LOAN_OFFER";

pub fn encode_memo(metadata: &Value) -> String {
    hex::encode_upper(metadata.to_string())
}

pub fn decode_memo(memo_hex: &str) -> Result<Value, CodecError> {
    let bytes = hex::decode(memo_hex)
        .map_err(|err| CodecError::MalformedMemo(format!("invalid hex: {err}")))?;
    let text = String::from_utf8(bytes)
        .map_err(|err| CodecError::MalformedMemo(format!("memo is not UTF-8: {err}")))?;
    serde_json::from_str(&text)
        .map_err(|err| CodecError::MalformedMemo(format!("memo is not JSON: {err}")))
}

pub fn decode_memo_type(memo_type_hex: &str) -> Result<String, CodecError> {
    let bytes = hex::decode(memo_type_hex)
        .map_err(|err| CodecError::MalformedMemo(format!("invalid memo type hex: {err}")))?;
    String::from_utf8(bytes)
        .map_err(|err| CodecError::MalformedMemo(format!("memo type is not UTF-8: {err}")))
}

/// Builds a ledger memo tagged with `memo_type` and carrying `metadata`.
pub fn memo_for(memo_type: &str, metadata: &Value) -> Memo {
    Memo::from_bytes(Some(memo_type.as_bytes()), metadata.to_string().as_bytes())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{decode_memo, decode_memo_type, encode_memo, memo_for, LOAN_PAYMENT_MEMO_TYPE};
    use crate::CodecError;

    #[test]
    fn loan_payment_metadata_round_trips() {
        let metadata = json!({ "loanId": "L-1", "type": "LOAN_PAYMENT" });
        let encoded = encode_memo(&metadata);
        assert_eq!(
            encoded,
            hex::encode_upper(r#"{"loanId":"L-1","type":"LOAN_PAYMENT"}"#)
        );
        let decoded = decode_memo(&encoded).unwrap();
        assert_eq!(decoded, metadata);
        let object = decoded.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert!(object["loanId"].is_string());
    }

    #[test]
    fn encoding_is_independent_of_key_order() {
        let a: serde_json::Value =
            serde_json::from_str(r#"{"b":1,"a":{"y":[1,2.5,null],"x":true}}"#).unwrap();
        let b: serde_json::Value =
            serde_json::from_str(r#"{"a":{"x":true,"y":[1,2.5,null]},"b":1}"#).unwrap();
        assert_eq!(encode_memo(&a), encode_memo(&b));
        assert_eq!(decode_memo(&encode_memo(&a)).unwrap(), a);
    }

    #[test]
    fn mixed_value_types_round_trip() {
        let metadata = json!({
            "loanId": 42,
            "paymentAmount": 125.75,
            "principalAmount": 100,
            "late": false,
            "note": "première échéance",
            "tags": ["a", "b"],
            "extra": null
        });
        assert_eq!(decode_memo(&encode_memo(&metadata)).unwrap(), metadata);
    }

    #[test]
    fn floats_round_trip_bit_exact() {
        for amount in [
            1.0715660391465826e-75,
            -1.81996730402717e-179,
            -1.603964615428183e143,
            0.1 + 0.2,
            f64::MAX,
            f64::MIN_POSITIVE,
        ] {
            let metadata = json!({ "amount": amount });
            let decoded = decode_memo(&encode_memo(&metadata)).unwrap();
            assert_eq!(decoded, metadata, "{amount:e}");
            assert_eq!(decoded["amount"].as_f64().unwrap().to_bits(), amount.to_bits());
        }
    }

    #[test]
    fn lowercase_hex_is_accepted() {
        let encoded = encode_memo(&json!({"k": "v"})).to_ascii_lowercase();
        assert_eq!(decode_memo(&encoded).unwrap(), json!({"k": "v"}));
    }

    #[test]
    fn rejects_corrupt_memos() {
        assert!(matches!(decode_memo("ZZ"), Err(CodecError::MalformedMemo(_))));
        assert!(matches!(decode_memo("7B7"), Err(CodecError::MalformedMemo(_))));
        // 0xFF is never valid UTF-8
        assert!(matches!(decode_memo("FF"), Err(CodecError::MalformedMemo(_))));
        assert!(matches!(
            decode_memo(&hex::encode_upper("{not json")),
            Err(CodecError::MalformedMemo(_))
        ));
    }

    #[test]
    fn memo_for_tags_the_type() {
        let memo = memo_for(LOAN_PAYMENT_MEMO_TYPE, &json!({}));
        assert_eq!(memo.memo_type(), Some("4C4F414E5F5041594D454E54"));
        assert_eq!(decode_memo_type(memo.memo_type().unwrap()).unwrap(), "LOAN_PAYMENT");
        assert_eq!(memo.memo_data(), encode_memo(&json!({})));
        assert_eq!(memo.memo_data(), "7B7D");
    }
}
