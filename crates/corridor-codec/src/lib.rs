//! Wire codecs: ledger memos, shareable signing links, canonical template digests.

pub mod error;
pub mod hashing;
pub mod link;
pub mod memo;

pub use error::CodecError;
pub use hashing::{sha512_half, template_digest, transaction_id};
pub use link::{
    decode_shareable_link, encode_shareable_link, template_from_link_json, ShareableLink,
    SIGN_CREDENTIAL_PATH,
};
pub use memo::{
    decode_memo, decode_memo_type, encode_memo, memo_for,
    LOAN_OFFER_MEMO_TYPE, LOAN_PAYMENT_MEMO_TYPE,
};
