// src/crypto/mod.rs

//! Log line encryption.
//!
//! - [`key`] loads and validates the key file placed in the working
//!   directory.
//! - [`cipher`] wraps AES-GCM (128/192/256 by key length) behind a single
//!   seal/open API with a fixed 12-byte nonce.

pub mod cipher;
pub mod key;

pub use cipher::{CipherContext, NONCE_LEN, TAG_LEN};
pub use key::{KEY_FILE_NAME, Key, load_cipher, read_key_file};
