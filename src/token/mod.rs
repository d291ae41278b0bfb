//! Token bundle state and structural token decoding.

pub mod bundle;
pub mod decode;

pub use bundle::TokenBundle;
pub use decode::{
    decode_compact_token, decode_encrypted_token, DecodeError, DecodedToken, EncryptedToken,
};
