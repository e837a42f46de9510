//! USM user configuration and key caches.
//!
//! Configured entries are the source of truth. An entry with an engine ID
//! is localized immediately; an entry with an empty engine ID is a template
//! that is localized on first use against each observed engine ("promotion").
//! The table is rebuilt from configuration on every configuration change or
//! capture reload; there is no incremental invalidation.
//!
//! Promotion mutates shared cache state, so it runs under a single mutex:
//! promotion is one-time per (user, engine) and cheap to serialize relative
//! to lookups, and holding the lock across derivation guarantees two
//! concurrent promoters converge on one entry.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use super::auth::{LocalizedKey, MasterKey};
use super::privacy::PrivKey;
use super::{AuthProtocol, PrivProtocol};
use crate::error::{ConfigErrorKind, Error, Result};
use crate::v3::engine::{MAX_ENGINE_ID_LEN, MIN_ENGINE_ID_LEN};

/// One configured USM user.
#[derive(Debug, Clone)]
pub struct UsmUserConfig {
    /// User name (non-empty).
    pub user_name: Bytes,
    /// Engine ID this entry is bound to; empty means "any engine"
    /// (localized on first use).
    pub engine_id: Bytes,
    /// Authentication protocol.
    pub auth: AuthProtocol,
    /// Authentication password.
    pub auth_password: Bytes,
    /// Privacy protocol and password, when privacy is configured.
    pub privacy: Option<(PrivProtocol, Bytes)>,
}

impl UsmUserConfig {
    /// Authentication-only user bound to any engine.
    pub fn new(
        user_name: impl Into<Bytes>,
        auth: AuthProtocol,
        auth_password: impl Into<Bytes>,
    ) -> Self {
        Self {
            user_name: user_name.into(),
            engine_id: Bytes::new(),
            auth,
            auth_password: auth_password.into(),
            privacy: None,
        }
    }

    /// Bind this entry to a specific engine ID.
    pub fn for_engine(mut self, engine_id: impl Into<Bytes>) -> Self {
        self.engine_id = engine_id.into();
        self
    }

    /// Add a privacy protocol and password.
    pub fn with_privacy(mut self, protocol: PrivProtocol, password: impl Into<Bytes>) -> Self {
        self.privacy = Some((protocol, password.into()));
        self
    }
}

/// Derived key material for one (user, engine) association.
pub struct UserKeys {
    pub user_name: Bytes,
    pub engine_id: Bytes,
    pub auth: AuthProtocol,
    pub auth_key: LocalizedKey,
    pub priv_key: Option<PrivKey>,
}

impl std::fmt::Debug for UserKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserKeys")
            .field("user_name", &self.user_name)
            .field("engine_id", &crate::util::HexBytes(&self.engine_id))
            .field("auth", &self.auth)
            .field("has_priv", &self.priv_key.is_some())
            .finish()
    }
}

/// An unlocalized template: configuration plus cached master keys, so each
/// promotion only pays for localization, not the 1 MiB expansion.
struct Template {
    config: UsmUserConfig,
    auth_master: MasterKey,
    priv_master: Option<(PrivProtocol, MasterKey)>,
}

impl Template {
    fn build(config: UsmUserConfig) -> Self {
        let auth_master = MasterKey::from_password(config.auth, &config.auth_password);
        let priv_master = config
            .privacy
            .as_ref()
            .map(|(protocol, password)| {
                (*protocol, MasterKey::from_password(config.auth, password))
            });
        Self {
            config,
            auth_master,
            priv_master,
        }
    }

    fn localize(&self, engine_id: &[u8]) -> UserKeys {
        UserKeys {
            user_name: self.config.user_name.clone(),
            engine_id: Bytes::copy_from_slice(engine_id),
            auth: self.config.auth,
            auth_key: self.auth_master.localize(engine_id),
            priv_key: self
                .priv_master
                .as_ref()
                .map(|(protocol, master)| PrivKey::derive(master, *protocol, engine_id)),
        }
    }
}

/// The USM user table: localized cache plus unlocalized templates.
///
/// Construct at session start from configuration; rebuild on configuration
/// change; drop at session end. The table is internally synchronized and
/// safe to share across packet-decode threads.
pub struct UserTable {
    templates: Vec<Template>,
    localized: Mutex<HashMap<(Bytes, Bytes), Arc<UserKeys>>>,
}

impl std::fmt::Debug for UserTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserTable")
            .field("templates", &self.templates.len())
            .finish_non_exhaustive()
    }
}

impl UserTable {
    /// Build the table from configured entries.
    ///
    /// Validation rejects empty user names, non-empty engine IDs outside
    /// the RFC 3411 length bounds, and duplicate (userName, engineID)
    /// pairs - including duplicate "any engine" templates, which would make
    /// template matching ambiguous.
    pub fn from_configs(configs: impl IntoIterator<Item = UsmUserConfig>) -> Result<Self> {
        let mut seen: HashSet<(Bytes, Bytes)> = HashSet::new();
        let mut templates = Vec::new();
        let mut localized = HashMap::new();

        for config in configs {
            if config.user_name.is_empty() {
                return Err(Error::config(ConfigErrorKind::EmptyUserName));
            }
            if !config.engine_id.is_empty()
                && !(MIN_ENGINE_ID_LEN..=MAX_ENGINE_ID_LEN).contains(&config.engine_id.len())
            {
                return Err(Error::config(ConfigErrorKind::EngineIdLength {
                    length: config.engine_id.len(),
                }));
            }
            if !seen.insert((config.user_name.clone(), config.engine_id.clone())) {
                return Err(Error::config(ConfigErrorKind::DuplicateUser {
                    user_name: String::from_utf8_lossy(&config.user_name).into(),
                }));
            }

            let template = Template::build(config);
            if template.config.engine_id.is_empty() {
                templates.push(template);
            } else {
                let engine_id = template.config.engine_id.clone();
                let keys = template.localize(&engine_id);
                localized.insert(
                    (template.config.user_name.clone(), engine_id),
                    Arc::new(keys),
                );
            }
        }

        Ok(Self {
            templates,
            localized: Mutex::new(localized),
        })
    }

    /// An empty table (nothing configured).
    pub fn empty() -> Self {
        Self {
            templates: Vec::new(),
            localized: Mutex::new(HashMap::new()),
        }
    }

    /// True when nothing is configured at all.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
            && self
                .localized
                .lock()
                .expect("user cache lock poisoned")
                .is_empty()
    }

    /// Look up the key material for a message's (engineID, userName).
    ///
    /// Exact match against the localized cache first; otherwise the first
    /// username-matching template is promoted: keys are derived against the
    /// observed engine ID and the new association is cached for the rest of
    /// the session. `None` means the message cannot be verified or
    /// decrypted - an expected outcome when credentials are not configured,
    /// not an error.
    pub fn lookup(&self, engine_id: &[u8], user_name: &[u8]) -> Option<Arc<UserKeys>> {
        if engine_id.is_empty() || user_name.is_empty() {
            return None;
        }

        let mut localized = self.localized.lock().expect("user cache lock poisoned");
        let cache_key = (
            Bytes::copy_from_slice(user_name),
            Bytes::copy_from_slice(engine_id),
        );
        if let Some(hit) = localized.get(&cache_key) {
            return Some(Arc::clone(hit));
        }

        // First username match wins; duplicates were rejected at build time
        let template = self
            .templates
            .iter()
            .find(|t| t.config.user_name == user_name)?;

        tracing::debug!(
            target: "snmp_dissect::usm",
            user = %String::from_utf8_lossy(user_name),
            engine = %crate::util::HexBytes(engine_id),
            "localizing user template for newly observed engine"
        );
        let keys = Arc::new(template.localize(engine_id));
        localized.insert(cache_key, Arc::clone(&keys));
        Some(keys)
    }

    /// Number of localized associations currently cached.
    pub fn localized_len(&self) -> usize {
        self.localized
            .lock()
            .expect("user cache lock poisoned")
            .len()
    }
}
