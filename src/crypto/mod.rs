//! Session encryption
//!
//! Key generation, sealed delivery of the session key to a plugin, and
//! payload wrapping for secure-mode clients.

pub mod encrypter;

pub use encrypter::{
    Encrypter, KEY_LEN, NONCE_LEN, PluginKeyPair, PluginPublicKey, SEALED_KEY_LEN, SymmetricKey,
    TAG_LEN,
};
