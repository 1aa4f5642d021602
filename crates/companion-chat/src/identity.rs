// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The signed-in identity, passed explicitly to whatever needs a credential.

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::watch;
use tracing::debug;

/// Bearer credential for the chat endpoint.
pub type Credential = SecretString;

/// Holds the current credential and notifies subscribers when it changes.
///
/// Cheap to clone; clones share the same state.
#[derive(Debug, Clone)]
pub struct IdentityContext {
    credential: Arc<watch::Sender<Option<Credential>>>,
}

impl IdentityContext {
    /// A signed-out context.
    pub fn new() -> Self {
        Self::from_credential(None)
    }

    pub fn from_credential(credential: Option<Credential>) -> Self {
        let (tx, _rx) = watch::channel(credential);
        Self {
            credential: Arc::new(tx),
        }
    }

    /// The credential right now, if signed in.
    pub fn current(&self) -> Option<Credential> {
        self.credential.borrow().clone()
    }

    /// Replaces the credential (`None` signs out) and wakes subscribers.
    pub fn set(&self, credential: Option<Credential>) {
        let signed_in = credential.is_some();
        self.credential.send_replace(credential);
        debug!(signed_in, "identity changed");
    }

    pub fn subscribe(&self) -> CredentialSubscription {
        CredentialSubscription {
            receiver: self.credential.subscribe(),
        }
    }
}

impl Default for IdentityContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A live view of credential changes. Dropping it unsubscribes.
#[derive(Debug)]
pub struct CredentialSubscription {
    receiver: watch::Receiver<Option<Credential>>,
}

impl CredentialSubscription {
    /// Waits for the next change and returns the new value.
    ///
    /// Returns `None` once every [`IdentityContext`] clone is gone.
    pub async fn changed(&mut self) -> Option<Option<Credential>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Ends the subscription.
    pub fn unsubscribe(self) {
        drop(self);
    }
}
