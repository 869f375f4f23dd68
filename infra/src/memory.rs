use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use log::*;
use serde::{de::DeserializeOwned, Serialize};

use crate::documents::{HasMeta, Version};
use crate::ids::{key_prefix, Entity, Id};
use crate::persistence::{ConcurrencyError, Storage};

/// In-process document store. Honors the same contract as the postgres
/// `Documents` (version compare-and-swap, delete, per-kind list), so
/// services can be exercised in tests and demos without a server.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    docs: Arc<Mutex<BTreeMap<String, serde_json::Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<BTreeMap<String, serde_json::Value>>> {
        self.docs.lock().map_err(|_| anyhow!("store mutex poisoned"))
    }
}

impl Storage for MemoryStore {
    fn load<D: DeserializeOwned + Entity>(&mut self, id: &Id<D>) -> Result<Option<D>> {
        let docs = self.lock()?;
        match docs.get(&id.to_string()) {
            Some(body) => Ok(Some(serde_json::from_value(body.clone())?)),
            None => Ok(None),
        }
    }

    fn save<D: Serialize + Entity + HasMeta>(&mut self, document: &mut D) -> Result<()> {
        let prev = document.meta().version.clone();
        document.meta_mut().version = Version::fresh();

        let key = document.meta().id.to_string();
        let body = match serde_json::to_value(&*document) {
            Ok(body) => body,
            Err(e) => {
                document.meta_mut().version = prev;
                return Err(e.into());
            }
        };

        let mut docs = self.lock()?;
        let stored_version = docs
            .get(&key)
            .and_then(|body| body.get("_version"))
            .and_then(|v| v.as_str());
        let matches = match stored_version {
            None => prev.is_initial(),
            Some(stored) => stored == prev.as_str(),
        };
        if !matches {
            warn!("Version mismatch writing {}", key);
            document.meta_mut().version = prev;
            return Err(ConcurrencyError.into());
        }
        docs.insert(key, body);
        Ok(())
    }

    fn delete<D: Entity>(&mut self, id: &Id<D>) -> Result<bool> {
        let mut docs = self.lock()?;
        Ok(docs.remove(&id.to_string()).is_some())
    }

    fn list<D: DeserializeOwned + Entity>(&mut self) -> Result<Vec<D>> {
        let prefix = key_prefix::<D>();
        let docs = self.lock()?;
        docs.range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .map(|(_, body)| Ok(serde_json::from_value(body.clone())?))
            .collect()
    }
}

/// Hands pooled clones of one shared store; every connection sees the
/// same documents.
#[derive(Debug)]
pub struct MemoryConnectionManager {
    store: MemoryStore,
}

impl MemoryConnectionManager {
    pub fn new() -> Self {
        MemoryConnectionManager {
            store: MemoryStore::new(),
        }
    }
}

impl Default for MemoryConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl r2d2::ManageConnection for MemoryConnectionManager {
    type Connection = MemoryStore;
    type Error = Infallible;

    fn connect(&self) -> Result<MemoryStore, Infallible> {
        Ok(self.store.clone())
    }

    fn is_valid(&self, _conn: &mut MemoryStore) -> Result<(), Infallible> {
        Ok(())
    }

    fn has_broken(&self, _conn: &mut MemoryStore) -> bool {
        false
    }
}
