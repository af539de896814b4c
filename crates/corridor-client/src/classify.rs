//! Maps raw ledger and wallet failures onto [`ErrorKind`].
//!
//! Ledger result codes are checked first. Free-text messages fall back to the
//! substring heuristics wallets and ledger servers are known to emit.

use corridor_types::{ErrorKind, SubmissionResult};

const UNFUNDED_CODES: &[&str] = &["tecNO_DST", "tecNO_DST_INSUF_XRP", "terNO_ACCOUNT", "actNotFound"];
const UNFUNDED_PREFIXES: &[&str] = &["tecUNFUNDED", "tecINSUF_RESERVE"];
const SEQUENCE_CODES: &[&str] = &["tefPAST_SEQ", "terPRE_SEQ", "temBAD_SEQUENCE"];
const EXPIRED_CODES: &[&str] = &["tefMAX_LEDGER"];

/// Classifies a ledger result code. `None` means the code reports success.
pub fn classify_engine_result(code: &str) -> Option<ErrorKind> {
    if code == SubmissionResult::SUCCESS_CODE {
        return None;
    }
    let kind = if UNFUNDED_CODES.contains(&code)
        || UNFUNDED_PREFIXES.iter().any(|prefix| code.starts_with(prefix))
    {
        ErrorKind::AccountNotFunded
    } else if EXPIRED_CODES.contains(&code) {
        ErrorKind::Expired
    } else if SEQUENCE_CODES.contains(&code) {
        ErrorKind::SequenceOrPreparationError
    } else if code.starts_with("tem") {
        ErrorKind::InvalidInput
    } else {
        ErrorKind::SequenceOrPreparationError
    };
    Some(kind)
}

/// Classifies a free-text failure, preferring any result code embedded in it.
pub fn classify_message(message: &str) -> ErrorKind {
    if let Some(kind) = embedded_result_code(message).and_then(classify_engine_result) {
        return kind;
    }

    let lower = message.to_ascii_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|needle| lower.contains(needle));

    if has(&["account not found", "not funded"]) {
        ErrorKind::AccountNotFunded
    } else if has(&["lastledgersequence", "expired"]) {
        ErrorKind::Expired
    } else if has(&["sequence", "preparation"]) {
        ErrorKind::SequenceOrPreparationError
    } else if has(&["rejected", "cancelled", "canceled", "declined", "user"]) {
        ErrorKind::UserRejected
    } else {
        ErrorKind::NetworkError
    }
}

/// Failure kind of a completed submission, or `None` when it succeeded.
pub fn classify_submission(result: &SubmissionResult) -> Option<ErrorKind> {
    if result.success {
        return None;
    }
    if let Some(kind) = result.failure {
        return Some(kind);
    }
    if let Some(kind) = result.engine_result.as_deref().and_then(classify_engine_result) {
        return Some(kind);
    }
    Some(
        result
            .detail
            .as_deref()
            .map(classify_message)
            .unwrap_or(ErrorKind::NetworkError),
    )
}

fn embedded_result_code(message: &str) -> Option<&str> {
    message
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .find(|token| is_result_code(token))
}

fn is_result_code(token: &str) -> bool {
    if token == "actNotFound" {
        return true;
    }
    let Some(rest) = ["tec", "tef", "tel", "tem", "ter", "tes"]
        .iter()
        .find_map(|prefix| token.strip_prefix(prefix))
    else {
        return false;
    };
    !rest.is_empty()
        && rest
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use corridor_types::{ErrorKind, SubmissionResult};

    use super::{classify_engine_result, classify_message, classify_submission};

    #[test]
    fn result_codes() {
        assert_eq!(classify_engine_result("tesSUCCESS"), None);
        for code in [
            "tecNO_DST",
            "tecNO_DST_INSUF_XRP",
            "terNO_ACCOUNT",
            "tecUNFUNDED_PAYMENT",
            "tecINSUF_RESERVE_LINE",
            "actNotFound",
        ] {
            assert_eq!(classify_engine_result(code), Some(ErrorKind::AccountNotFunded), "{code}");
        }
        assert_eq!(classify_engine_result("tefMAX_LEDGER"), Some(ErrorKind::Expired));
        for code in ["tefPAST_SEQ", "terPRE_SEQ", "temBAD_SEQUENCE", "tecPATH_DRY", "telINSUF_FEE_P"] {
            assert_eq!(
                classify_engine_result(code),
                Some(ErrorKind::SequenceOrPreparationError),
                "{code}"
            );
        }
        assert_eq!(classify_engine_result("temMALFORMED"), Some(ErrorKind::InvalidInput));
    }

    #[test]
    fn messages() {
        assert_eq!(
            classify_message("Transaction failed: tecNO_DST_INSUF_XRP"),
            ErrorKind::AccountNotFunded
        );
        assert_eq!(classify_message("Account not found."), ErrorKind::AccountNotFunded);
        assert_eq!(
            classify_message("ledger passed LastLedgerSequence"),
            ErrorKind::Expired
        );
        assert_eq!(
            classify_message("bad sequence number"),
            ErrorKind::SequenceOrPreparationError
        );
        assert_eq!(classify_message("User rejected the request"), ErrorKind::UserRejected);
        assert_eq!(classify_message("Sign request declined"), ErrorKind::UserRejected);
        assert_eq!(classify_message("socket hang up"), ErrorKind::NetworkError);
    }

    #[test]
    fn submissions() {
        assert_eq!(classify_submission(&SubmissionResult::confirmed(corridor_types::TxHash::new([1; 32]))), None);
        let rejected = SubmissionResult::rejected(None, "tecNO_DST_INSUF_XRP", "destination unfunded");
        assert_eq!(classify_submission(&rejected), Some(ErrorKind::AccountNotFunded));
        let failed = SubmissionResult::failed(ErrorKind::WrongAccount, "mismatch");
        assert_eq!(classify_submission(&failed), Some(ErrorKind::WrongAccount));
    }
}
