// ! Session encryption
// !
// ! A client in secure mode generates one symmetric session key, seals it for
// ! the plugin with the plugin's X25519 public key, and from then on wraps
// ! every payload with ChaCha20-Poly1305 under that key.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use x25519_dalek::{EphemeralSecret, PublicKey, SharedSecret, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::core::error::{PluginError, PluginResult};

/// Session key length in bytes
pub const KEY_LEN: usize = 32;
/// Payload nonce length in bytes
pub const NONCE_LEN: usize = 12;
/// Poly1305 tag length in bytes
pub const TAG_LEN: usize = 16;
/// Length of a sealed session key: ephemeral public key, encrypted key, tag
pub const SEALED_KEY_LEN: usize = 32 + KEY_LEN + TAG_LEN;

/// Symmetric session key, wiped from memory on drop
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_LEN]);

impl SymmetricKey {
    /// Generate a fresh random key from the OS generator
    pub fn generate() -> PluginResult<Self> {
        let mut bytes = [0u8; KEY_LEN];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| PluginError::KeyGeneration(e.to_string()))?;
        Ok(Self(bytes))
    }

    /// Wrap existing key material
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw key material
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

/// X25519 public key advertised by a plugin process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginPublicKey(PublicKey);

impl PluginPublicKey {
    /// Build from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(PublicKey::from(bytes))
    }

    /// Parse a base64 encoded key as printed by the plugin on startup
    pub fn from_base64(encoded: &str) -> PluginResult<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| PluginError::config(format!("invalid public key encoding: {e}")))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            PluginError::config(format!("public key must be 32 bytes, got {}", b.len()))
        })?;
        Ok(Self::from_bytes(bytes))
    }

    /// Raw key bytes
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Base64 form of the key
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0.as_bytes())
    }
}

/// Key pair held by the plugin side of the channel.
///
/// The control plane never needs the secret half; this type exists so a
/// plugin implementation (and tests) can open the sealed session key.
pub struct PluginKeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl PluginKeyPair {
    /// Generate a new key pair
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Public half to hand to the control plane
    pub fn public_key(&self) -> PluginPublicKey {
        PluginPublicKey(self.public)
    }

    /// Open a session key sealed by [`Encrypter::encrypt_key`]
    pub fn decrypt_key(&self, sealed: &[u8]) -> PluginResult<SymmetricKey> {
        if sealed.len() != SEALED_KEY_LEN {
            return Err(PluginError::Decryption(format!(
                "sealed key must be {SEALED_KEY_LEN} bytes, got {}",
                sealed.len()
            )));
        }
        let (ephemeral, ciphertext) = sealed.split_at(32);
        let mut ephemeral_bytes = [0u8; 32];
        ephemeral_bytes.copy_from_slice(ephemeral);
        let ephemeral = PublicKey::from(ephemeral_bytes);

        let shared = self.secret.diffie_hellman(&ephemeral);
        let kek = derive_key_encryption_key(&shared, &ephemeral, &self.public)
            .map_err(|e| PluginError::Decryption(e.to_string()))?;

        let plaintext = ChaCha20Poly1305::new(&Key::from(kek))
            .decrypt(&Nonce::from([0u8; NONCE_LEN]), ciphertext)
            .map_err(|_| PluginError::Decryption("sealed key authentication failed".to_string()))?;
        let bytes: [u8; KEY_LEN] = plaintext
            .try_into()
            .map_err(|_| PluginError::Decryption("sealed key has wrong length".to_string()))?;
        Ok(SymmetricKey(bytes))
    }
}

impl std::fmt::Debug for PluginKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginKeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

/// Holds the session key bound to one plugin and applies it to payloads.
///
/// The key is fixed at construction; there is no way to replace it.
#[derive(Clone)]
pub struct Encrypter {
    public_key: PluginPublicKey,
    key: SymmetricKey,
}

impl Encrypter {
    /// Bind an existing key to a plugin public key
    pub fn new(public_key: PluginPublicKey, key: SymmetricKey) -> Self {
        Self { public_key, key }
    }

    /// Generate a session key for the given plugin
    pub fn generate(public_key: PluginPublicKey) -> PluginResult<Self> {
        Ok(Self::new(public_key, SymmetricKey::generate()?))
    }

    /// The session key
    pub fn key(&self) -> &SymmetricKey {
        &self.key
    }

    /// The plugin public key the session key is sealed for
    pub fn public_key(&self) -> &PluginPublicKey {
        &self.public_key
    }

    /// Seal the session key for delivery to the plugin.
    ///
    /// Output layout: ephemeral public key (32) | ciphertext (32) | tag (16).
    pub fn encrypt_key(&self) -> PluginResult<Vec<u8>> {
        let ephemeral = EphemeralSecret::random_from_rng(OsRng);
        let ephemeral_public = PublicKey::from(&ephemeral);
        let shared = ephemeral.diffie_hellman(&self.public_key.0);
        let kek = derive_key_encryption_key(&shared, &ephemeral_public, &self.public_key.0)?;

        // kek is unique per seal, so the zero nonce never repeats under one key
        let ciphertext = ChaCha20Poly1305::new(&Key::from(kek))
            .encrypt(&Nonce::from([0u8; NONCE_LEN]), self.key.as_bytes().as_slice())
            .map_err(|_| PluginError::Encryption("sealing session key failed".to_string()))?;

        let mut sealed = Vec::with_capacity(SEALED_KEY_LEN);
        sealed.extend_from_slice(ephemeral_public.as_bytes());
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Encrypt a payload: random nonce followed by ciphertext and tag
    pub fn wrap(&self, payload: &[u8]) -> PluginResult<Vec<u8>> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher()
            .encrypt(&Nonce::from(nonce), payload)
            .map_err(|_| PluginError::Encryption("payload encryption failed".to_string()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Decrypt a payload produced by [`Encrypter::wrap`] under the same key
    pub fn unwrap(&self, payload: &[u8]) -> PluginResult<Vec<u8>> {
        if payload.len() < NONCE_LEN + TAG_LEN {
            return Err(PluginError::Decryption(format!(
                "payload too short: {} bytes",
                payload.len()
            )));
        }
        let (nonce, ciphertext) = payload.split_at(NONCE_LEN);
        let mut nonce_bytes = [0u8; NONCE_LEN];
        nonce_bytes.copy_from_slice(nonce);

        self.cipher()
            .decrypt(&Nonce::from(nonce_bytes), ciphertext)
            .map_err(|_| PluginError::Decryption("payload authentication failed".to_string()))
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(&Key::from(*self.key.as_bytes()))
    }
}

impl std::fmt::Debug for Encrypter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encrypter")
            .field("public_key", &self.public_key)
            .field("key", &self.key)
            .finish()
    }
}

fn derive_key_encryption_key(
    shared: &SharedSecret,
    ephemeral: &PublicKey,
    recipient: &PublicKey,
) -> PluginResult<[u8; KEY_LEN]> {
    if !shared.was_contributory() {
        return Err(PluginError::Encryption(
            "plugin public key is a low-order point".to_string(),
        ));
    }
    let digest = Sha256::new()
        .chain_update(shared.as_bytes())
        .chain_update(ephemeral.as_bytes())
        .chain_update(recipient.as_bytes())
        .finalize();
    let mut kek = [0u8; KEY_LEN];
    kek.copy_from_slice(&digest);
    Ok(kek)
}
