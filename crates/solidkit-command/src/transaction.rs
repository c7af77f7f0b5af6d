//! Last-known-good rollback of interactive parameters.
//!
//! Some parameter ranges (a fillet distance, say) are only discovered by
//! attempting the operation. A failed attempt snaps the listed fields back to
//! the values of the last attempt that succeeded, not to the values from just
//! before the failed one.

use std::collections::HashMap;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use solidkit_core::{Error, Result};

/// Parameters with per-field last-known-good values.
#[derive(Debug, Clone)]
pub struct Transactional<P> {
    params: P,
    last_good: HashMap<String, Value>,
}

impl<P: Default> Default for Transactional<P> {
    fn default() -> Self {
        Self::new(P::default())
    }
}

impl<P> Transactional<P> {
    pub fn new(params: P) -> Self {
        Self {
            params,
            last_good: HashMap::new(),
        }
    }

    pub fn params(&self) -> &P {
        &self.params
    }

    pub fn into_inner(self) -> P {
        self.params
    }
}

fn fields<P: Serialize>(params: &P) -> Result<Map<String, Value>> {
    let value = serde_json::to_value(params).context("Failed to serialize parameters")?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::other(format!(
            "transactional parameters must serialize to a map, got {}",
            other
        ))),
    }
}

impl<P: Serialize + DeserializeOwned> Transactional<P> {
    /// Run `cb` on the parameters.
    ///
    /// On success the fields named in `keys` become the new last-known-good
    /// values. On failure those fields are restored and the error returned.
    pub fn transaction<R>(
        &mut self,
        keys: &[&str],
        cb: impl FnOnce(&mut P) -> Result<R>,
    ) -> Result<R> {
        let before = fields(&self.params)?;
        for key in keys {
            if !self.last_good.contains_key(*key) {
                let value = before.get(*key).cloned().ok_or_else(|| {
                    Error::other(format!("unknown transactional field '{}'", key))
                })?;
                self.last_good.insert((*key).to_string(), value);
            }
        }

        match cb(&mut self.params) {
            Ok(value) => {
                let after = fields(&self.params)?;
                for key in keys {
                    if let Some(v) = after.get(*key) {
                        self.last_good.insert((*key).to_string(), v.clone());
                    }
                }
                Ok(value)
            }
            Err(error) => {
                self.rollback(keys)?;
                Err(error)
            }
        }
    }

    fn rollback(&mut self, keys: &[&str]) -> Result<()> {
        let mut current = fields(&self.params)?;
        for key in keys {
            if let Some(good) = self.last_good.get(*key) {
                current.insert((*key).to_string(), good.clone());
            }
        }
        self.params = serde_json::from_value(Value::Object(current))
            .context("Failed to restore parameters")?;
        tracing::debug!("Rolled back {:?} to last known good", keys);
        Ok(())
    }
}
