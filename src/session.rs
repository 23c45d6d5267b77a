//! Explicit session context threaded through clients and reconcilers.
//!
//! The authenticated user and bearer token travel as a single blob stored
//! under one entry in the OS credential store (DPAPI on Windows, Keychain on
//! macOS, Secret Service on Linux, via the `keyring` crate). This replaces
//! the browser console's one-key localStorage layout. The cached copy is the
//! working truth for the process; the keyring entry only survives restarts.

use keyring::Entry;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};
use zeroize::Zeroize;

const SERVICE_NAME: &str = "comandero";
const SESSION_KEY: &str = "usuario";

/// Grace period between surfacing a session-expired error and the forced
/// logout + redirect, so the user can read the message first.
pub const FORCED_LOGOUT_DELAY: Duration = Duration::from_secs(2);

/// The login response blob, kept verbatim as the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SesionUsuario {
    pub token: String,
    pub nombre: String,
    pub email: String,
    pub rol: String,
}

struct SessionInner {
    cached: Mutex<Option<SesionUsuario>>,
    persist: bool,
    redirect_to_login: AtomicBool,
}

/// Session store with the interface the reconcilers depend on:
/// `get_token` / `get_usuario` / `set_usuario` / `logout`. No ambient
/// global lookup — every client and view receives a handle to one store.
/// Clones share the same state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

impl SessionStore {
    /// Store backed by the OS credential store; loads any persisted session.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SessionInner {
                cached: Mutex::new(load_persisted()),
                persist: true,
                redirect_to_login: AtomicBool::new(false),
            }),
        }
    }

    /// In-memory store for tests and shells that manage their own
    /// persistence. Never touches the keyring.
    pub fn ephemeral() -> Self {
        Self {
            inner: Arc::new(SessionInner {
                cached: Mutex::new(None),
                persist: false,
                redirect_to_login: AtomicBool::new(false),
            }),
        }
    }

    pub fn set_usuario(&self, usuario: SesionUsuario) {
        if self.inner.persist {
            match serde_json::to_string(&usuario) {
                Ok(blob) => {
                    if let Err(e) = save_persisted(&blob) {
                        warn!(error = %e, "keyring: failed to persist session");
                    }
                }
                Err(e) => warn!(error = %e, "failed to serialize session"),
            }
        }
        let mut cached = self.inner.cached.lock().unwrap();
        if let Some(anterior) = cached.as_mut() {
            anterior.token.zeroize();
        }
        *cached = Some(usuario);
        self.inner.redirect_to_login.store(false, Ordering::SeqCst);
        info!("session stored");
    }

    pub fn get_usuario(&self) -> Option<SesionUsuario> {
        self.inner.cached.lock().unwrap().clone()
    }

    pub fn get_token(&self) -> Option<String> {
        self.inner
            .cached
            .lock()
            .unwrap()
            .as_ref()
            .map(|u| u.token.clone())
    }

    pub fn get_nombre(&self) -> Option<String> {
        self.inner
            .cached
            .lock()
            .unwrap()
            .as_ref()
            .map(|u| u.nombre.clone())
    }

    pub fn get_rol(&self) -> Option<String> {
        self.inner
            .cached
            .lock()
            .unwrap()
            .as_ref()
            .map(|u| u.rol.clone())
    }

    /// A session counts only when its token is non-blank.
    pub fn has_token(&self) -> bool {
        self.get_token()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false)
    }

    pub fn is_authenticated(&self) -> bool {
        self.has_token()
    }

    /// Drop the cached session (wiping the token) and delete the persisted
    /// blob. Silently succeeds when nothing was stored.
    pub fn logout(&self) {
        {
            let mut cached = self.inner.cached.lock().unwrap();
            if let Some(usuario) = cached.as_mut() {
                usuario.token.zeroize();
            }
            *cached = None;
        }
        if self.inner.persist {
            if let Err(e) = delete_persisted() {
                warn!(error = %e, "keyring: failed to delete session");
            }
        }
        info!("session logged out");
    }

    /// Schedule the forced logout + redirect that follows a session-expired
    /// error. The delay is a UX grace period, not a retry.
    pub fn schedule_forced_logout(&self) {
        let store = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(FORCED_LOGOUT_DELAY).await;
            store.logout();
            store
                .inner
                .redirect_to_login
                .store(true, Ordering::SeqCst);
            info!("forced logout applied, redirect to login pending");
        });
    }

    /// Flag for the presentation layer: the session was force-closed and the
    /// user should land on the login screen.
    pub fn redirect_pending(&self) -> bool {
        self.inner.redirect_to_login.load(Ordering::SeqCst)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Keyring plumbing
// ---------------------------------------------------------------------------

fn entry() -> Result<Entry, keyring::Error> {
    Entry::new(SERVICE_NAME, SESSION_KEY)
}

fn load_persisted() -> Option<SesionUsuario> {
    let entry = match entry() {
        Ok(e) => e,
        Err(e) => {
            warn!(error = %e, "keyring: failed to create entry");
            return None;
        }
    };
    match entry.get_password() {
        Ok(blob) => match serde_json::from_str(&blob) {
            Ok(usuario) => Some(usuario),
            Err(e) => {
                warn!(error = %e, "stored session blob is not valid JSON, ignoring");
                None
            }
        },
        Err(keyring::Error::NoEntry) => None,
        Err(e) => {
            warn!(error = %e, "keyring: failed to read session");
            None
        }
    }
}

fn save_persisted(blob: &str) -> Result<(), keyring::Error> {
    entry()?.set_password(blob)
}

fn delete_persisted() -> Result<(), keyring::Error> {
    match entry()?.delete_credential() {
        Ok(()) => Ok(()),
        Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e),
    }
}
