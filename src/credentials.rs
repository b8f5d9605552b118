use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Rotating set of catalog API keys shared by every request of a session.
#[derive(Debug)]
pub struct CredentialPool {
    keys: Vec<String>,
    cursor: AtomicUsize,
}

impl CredentialPool {
    pub fn new(keys: Vec<String>) -> Result<Self> {
        if keys.is_empty() {
            anyhow::bail!("credential pool needs at least one key");
        }
        Ok(Self {
            keys,
            cursor: AtomicUsize::new(0),
        })
    }

    pub fn current(&self) -> &str {
        &self.keys[self.cursor.load(Ordering::Acquire)]
    }

    /// Advances the cursor one position (wrapping) and returns the new key.
    pub fn rotate(&self) -> &str {
        let len = self.keys.len();
        let previous = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |i| Some((i + 1) % len))
            .unwrap_or_else(|i| i);
        &self.keys[(previous + 1) % len]
    }

    pub(crate) fn position(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }
}
