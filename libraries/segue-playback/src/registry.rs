//! Session registry
//!
//! One session per device binding. Bindings never share state: each has its
//! own worker, queue and history.

use crate::{
    device::PlaybackDevice,
    error::{PlaybackError, Result},
    events::Outcome,
    types::{BindingId, SessionConfig},
    worker::SessionHandle,
};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Maps device bindings to running sessions
pub struct SessionRegistry {
    config: SessionConfig,
    sessions: Mutex<HashMap<BindingId, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            sessions: Mutex::new(HashMap::new()),
        })
    }

    /// Attach `device` under `binding` and start its session
    ///
    /// Joining a binding that already has a session returns that session;
    /// the new device is dropped.
    pub fn join(
        &self,
        binding: impl Into<BindingId>,
        device: Box<dyn PlaybackDevice>,
    ) -> Result<SessionHandle> {
        let binding = binding.into();
        let mut sessions = self.lock();

        if let Some(existing) = sessions.get(&binding) {
            debug!("Already joined {}", binding);
            return Ok(existing.clone());
        }

        let handle = SessionHandle::spawn(binding.clone(), &self.config, device)?;
        info!("Joined {}", binding);
        sessions.insert(binding, handle.clone());
        Ok(handle)
    }

    /// Session bound to `binding`
    pub fn get(&self, binding: &BindingId) -> Result<SessionHandle> {
        self.lock()
            .get(binding)
            .cloned()
            .ok_or(PlaybackError::DeviceUnavailable)
    }

    /// Tear down the session for `binding`
    ///
    /// Stops playback and clears its queue. Handles still held elsewhere
    /// report `DeviceUnavailable` from then on.
    pub fn leave(&self, binding: &BindingId) -> Result<Outcome> {
        let handle = self
            .lock()
            .remove(binding)
            .ok_or(PlaybackError::DeviceUnavailable)?;

        info!("Leaving {}", binding);
        handle.shutdown()
    }

    /// Tear down every session
    pub fn leave_all(&self) {
        let handles: Vec<SessionHandle> = self.lock().drain().map(|(_, h)| h).collect();
        for handle in handles {
            if let Err(e) = handle.shutdown() {
                warn!("Session {} already gone: {}", handle.binding(), e);
            }
        }
    }

    pub fn bindings(&self) -> Vec<BindingId> {
        let mut bindings: Vec<BindingId> = self.lock().keys().cloned().collect();
        bindings.sort();
        bindings
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Map stays consistent even if a holder panicked: every update is a
    // single insert or remove.
    fn lock(&self) -> MutexGuard<'_, HashMap<BindingId, SessionHandle>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SessionRegistry {
    fn drop(&mut self) {
        self.leave_all();
    }
}
