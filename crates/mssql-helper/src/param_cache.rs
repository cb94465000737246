//! Stored procedure parameter cache.
//!
//! Discovering a procedure's parameters costs a server round-trip, so the
//! result is memoized for the lifetime of the cache, keyed by connection
//! identity and procedure name.
//!
//! ## Key format
//!
//! ```text
//! <connection identity>:<procedure name>[:include ReturnValue Parameter]
//! ```
//!
//! The suffix keeps sets with and without the leading return-value parameter
//! apart. [`ParameterCache::put`] and [`ParameterCache::try_get`] use the key
//! without the suffix, so a primed entry is what
//! [`ParameterCache::get_or_discover`] returns when the return value is
//! excluded. Keys are case-sensitive and not normalized.
//!
//! ## Copies
//!
//! Entries are never handed out. Every read returns a deep copy, so callers
//! may assign values without affecting the cache or each other. Writers
//! replace an entry wholesale.
//!
//! ## Concurrency
//!
//! By default two concurrent misses on the same key both run discovery and
//! the last store wins. With [`ParameterCacheConfig::single_flight`] the
//! second caller waits for the first caller's discovery instead. Misses on
//! different keys never wait on each other in either mode.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use tokio::sync::OnceCell;

use crate::discovery::ParameterDiscovery;
use crate::error::{Error, Result};
use crate::param::ParameterSet;

/// Key suffix for entries that keep the return-value parameter.
pub const RETURN_VALUE_KEY_SUFFIX: &str = ":include ReturnValue Parameter";

/// Build the cache key for a connection and command.
#[must_use]
pub fn cache_key(
    connection_identity: &str,
    command_text: &str,
    include_return_value: bool,
) -> String {
    let suffix = if include_return_value {
        RETURN_VALUE_KEY_SUFFIX
    } else {
        ""
    };
    format!("{connection_identity}:{command_text}{suffix}")
}

/// Configuration for the parameter cache.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct ParameterCacheConfig {
    /// Share one in-flight discovery between concurrent misses on a key.
    pub single_flight: bool,
}

impl ParameterCacheConfig {
    /// Create the default configuration (no single-flight).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable single-flight discovery.
    #[must_use]
    pub fn single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }
}

type InFlight = Arc<OnceCell<Arc<ParameterSet>>>;

/// Process-lifetime cache of discovered parameter sets.
///
/// Construct one per process (or per test) and share it by reference or
/// `Arc`; there is no global instance.
pub struct ParameterCache {
    entries: RwLock<HashMap<String, Arc<ParameterSet>>>,
    in_flight: Mutex<HashMap<String, InFlight>>,
    config: ParameterCacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ParameterCache {
    /// Create an empty cache with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ParameterCacheConfig::default())
    }

    /// Create an empty cache with the given configuration.
    #[must_use]
    pub fn with_config(config: ParameterCacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &ParameterCacheConfig {
        &self.config
    }

    /// Return a copy of the parameter set for a procedure, discovering it on
    /// a miss.
    ///
    /// `discover` runs only on a miss. Its result is stored, minus the
    /// leading return-value parameter when `include_return_value` is false,
    /// and a copy of what was stored is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if either key part is blank,
    /// before anything else happens. An error from `discover` is returned
    /// unchanged and leaves the key absent.
    pub async fn get_or_discover<F, Fut>(
        &self,
        connection_identity: &str,
        procedure_name: &str,
        include_return_value: bool,
        discover: F,
    ) -> Result<ParameterSet>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ParameterSet>>,
    {
        require("procedure name", procedure_name)?;
        require("connection identity", connection_identity)?;

        let key = cache_key(connection_identity, procedure_name, include_return_value);
        if let Some(hit) = self.lookup(&key, procedure_name) {
            return Ok(hit);
        }

        let stored = if self.config.single_flight {
            self.discover_shared(&key, procedure_name, include_return_value, discover)
                .await?
        } else {
            self.discover_and_store(&key, procedure_name, include_return_value, discover)
                .await?
        };
        Ok(ParameterSet::clone(&stored))
    }

    /// Return a copy of the parameter set for a procedure, discovering it
    /// through `connection` on a miss.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `procedure_name` is blank or
    /// `connection` is `None`; otherwise as [`get_or_discover`](Self::get_or_discover).
    pub async fn get_sp_parameter_set<D>(
        &self,
        connection: Option<&D>,
        procedure_name: &str,
        include_return_value: bool,
    ) -> Result<ParameterSet>
    where
        D: ParameterDiscovery + ?Sized,
    {
        require("procedure name", procedure_name)?;
        let connection =
            connection.ok_or_else(|| Error::invalid_argument("connection must not be None"))?;

        self.get_or_discover(
            connection.connection_identity(),
            procedure_name,
            include_return_value,
            || connection.derive_parameters(procedure_name),
        )
        .await
    }

    /// Store `parameters` under `connection_identity:command_text`,
    /// replacing any existing entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if either key part is blank.
    pub fn put(
        &self,
        connection_identity: &str,
        command_text: &str,
        parameters: ParameterSet,
    ) -> Result<()> {
        require("connection identity", connection_identity)?;
        require("command text", command_text)?;

        let key = cache_key(connection_identity, command_text, false);
        tracing::debug!(
            command = command_text,
            count = parameters.len(),
            "priming parameter cache"
        );
        self.entries.write().insert(key, Arc::new(parameters));
        Ok(())
    }

    /// Return a copy of the entry stored under
    /// `connection_identity:command_text`, if any. Never discovers.
    #[must_use]
    pub fn try_get(&self, connection_identity: &str, command_text: &str) -> Option<ParameterSet> {
        self.lookup(&cache_key(connection_identity, command_text, false), command_text)
    }

    /// Get the number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Remove every entry. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let removed = {
            let mut entries = self.entries.write();
            let removed = entries.len();
            entries.clear();
            removed
        };
        tracing::debug!(count = removed, "cleared parameter cache");
        removed
    }

    /// Get the number of cache hits.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Get the number of cache misses.
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Get the cache hit ratio (0.0 to 1.0).
    #[must_use]
    pub fn hit_ratio(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    fn peek(&self, key: &str) -> Option<Arc<ParameterSet>> {
        self.entries.read().get(key).cloned()
    }

    // Keys embed the connection identity, which may carry credentials, so
    // only the command text is logged.
    fn lookup(&self, key: &str, command_text: &str) -> Option<ParameterSet> {
        match self.peek(key) {
            Some(stored) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(command = command_text, "parameter cache hit");
                Some(ParameterSet::clone(&stored))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(command = command_text, "parameter cache miss");
                None
            }
        }
    }

    async fn discover_and_store<F, Fut>(
        &self,
        key: &str,
        procedure_name: &str,
        include_return_value: bool,
        discover: F,
    ) -> Result<Arc<ParameterSet>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ParameterSet>>,
    {
        tracing::debug!(procedure = procedure_name, "discovering procedure parameters");
        let mut parameters = match discover().await {
            Ok(parameters) => parameters,
            Err(e) => {
                tracing::warn!(
                    procedure = procedure_name,
                    error = %e,
                    "parameter discovery failed"
                );
                return Err(e);
            }
        };
        if !include_return_value {
            parameters.remove_return_value();
        }

        let stored = Arc::new(parameters);
        self.entries
            .write()
            .insert(key.to_string(), Arc::clone(&stored));
        tracing::debug!(
            procedure = procedure_name,
            include_return_value,
            count = stored.len(),
            "cached procedure parameters"
        );
        Ok(stored)
    }

    async fn discover_shared<F, Fut>(
        &self,
        key: &str,
        procedure_name: &str,
        include_return_value: bool,
        discover: F,
    ) -> Result<Arc<ParameterSet>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ParameterSet>>,
    {
        // Lock held only for the check-and-insert, never across discovery.
        let cell = {
            let mut in_flight = self.in_flight.lock();
            Arc::clone(in_flight.entry(key.to_string()).or_default())
        };

        let result = cell
            .get_or_try_init(|| async move {
                // A leader may have stored and retired its cell between our
                // lookup and joining this one.
                if let Some(stored) = self.peek(key) {
                    return Ok(stored);
                }
                self.discover_and_store(key, procedure_name, include_return_value, discover)
                    .await
            })
            .await
            .map(Arc::clone);

        {
            let mut in_flight = self.in_flight.lock();
            if in_flight
                .get(key)
                .is_some_and(|current| Arc::ptr_eq(current, &cell))
            {
                in_flight.remove(key);
            }
        }
        result
    }
}

impl Default for ParameterCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ParameterCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterCache")
            .field("len", &self.len())
            .field("single_flight", &self.config.single_flight)
            .field("hits", &self.hits())
            .field("misses", &self.misses())
            .finish()
    }
}

fn require(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::invalid_argument(format!("{what} must not be empty")));
    }
    Ok(())
}
