//! Authentication domain types

mod types;

pub use types::{
    OtpRequest, OtpVerification, RefreshTokenRequest, StoredValue, TokenKind, TokenPair,
    token_preview,
};
