// ! Session state
// !
// ! Secure clients start unkeyed and become keyed once the plugin accepted
// ! the session key. Data-bearing calls are refused until then.

use tokio::sync::RwLock;
use tracing::debug;

use crate::core::error::{PluginError, PluginResult};
use crate::crypto::Encrypter;

/// Channel state of one client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Secure mode is off; every call is allowed
    Plaintext,
    /// Secure mode is on and `SetKey` has not succeeded yet
    Unkeyed,
    /// The plugin holds the session key
    Keyed,
}

impl SessionState {
    /// Whether data-bearing calls may be issued
    pub fn is_established(&self) -> bool {
        !matches!(self, SessionState::Unkeyed)
    }
}

/// Session of one client: its state and, in secure mode, its encrypter
#[derive(Debug)]
pub struct Session {
    state: RwLock<SessionState>,
    encrypter: Option<Encrypter>,
}

impl Session {
    /// Start a session; a present encrypter means secure mode
    pub fn new(encrypter: Option<Encrypter>) -> Self {
        let state = if encrypter.is_some() {
            SessionState::Unkeyed
        } else {
            SessionState::Plaintext
        };
        Self {
            state: RwLock::new(state),
            encrypter,
        }
    }

    pub async fn state(&self) -> SessionState {
        *self.state.read().await
    }

    pub fn encrypter(&self) -> Option<&Encrypter> {
        self.encrypter.as_ref()
    }

    pub fn is_secure(&self) -> bool {
        self.encrypter.is_some()
    }

    /// Fail with `ChannelNotEstablished` unless `method` may be sent now
    pub async fn ensure_established(&self, method: &str) -> PluginResult<()> {
        if self.state().await.is_established() {
            Ok(())
        } else {
            Err(PluginError::ChannelNotEstablished(format!(
                "{method} requires a session key; call set_key first"
            )))
        }
    }

    /// Session key sealed under the plugin's public key
    pub fn sealed_key(&self) -> PluginResult<Vec<u8>> {
        match &self.encrypter {
            Some(encrypter) => encrypter.encrypt_key(),
            None => Err(PluginError::Encryption(
                "secure mode is not enabled".to_string(),
            )),
        }
    }

    /// Record that the plugin accepted the session key
    pub async fn mark_keyed(&self) {
        let mut state = self.state.write().await;
        if *state != SessionState::Keyed {
            debug!("Session keyed");
            *state = SessionState::Keyed;
        }
    }
}
