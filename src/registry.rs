//! Store Registry
//!
//! Maps store names to shared handles so that loading the same name twice
//! yields the same [`Store`] (and therefore the same cache). A registry is
//! an ordinary value: create as many as needed, e.g. one per test.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::Config;
use crate::error::Result;
use crate::store::Store;

/// Name → handle map for stores sharing one configuration
pub struct Registry {
    config: Config,
    stores: RwLock<HashMap<String, Arc<Store>>>,
}

impl Registry {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// Return the open handle for `name`, opening it on first use
    pub fn load(&self, name: &str) -> Result<Arc<Store>> {
        if let Some(store) = self.stores.read().get(name) {
            return Ok(Arc::clone(store));
        }

        let mut stores = self.stores.write();
        // Another thread may have opened it between the two locks
        if let Some(store) = stores.get(name) {
            return Ok(Arc::clone(store));
        }

        let store = Arc::new(Store::open(name, &self.config)?);
        stores.insert(name.to_string(), Arc::clone(&store));
        Ok(store)
    }

    /// Forget the handle for `name`. Outstanding `Arc`s stay usable.
    pub fn unload(&self, name: &str) -> bool {
        self.stores.write().remove(name).is_some()
    }

    /// Names of loaded stores, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stores.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
