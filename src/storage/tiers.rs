//! The four attribution tiers.

use super::cookiejar::CookieJar;
use super::{KeyValueStore, StorageTier, TierKind};
use crate::base::context::JsonResultExt;
use crate::base::trackererror::TrackerError;
use crate::code::RefCode;
use crate::config::TrackerConfig;
use crate::metadata::{LegacyEntry, PersistedEntry, ReferralMetadata};
use cookie::Cookie;
use std::marker::PhantomData;
use std::sync::Arc;
use time::OffsetDateTime;

/// A cookie holding the raw code.
///
/// Expiry is left to the jar: no embedded timestamp is checked here.
pub struct CookieTier {
    kind: TierKind,
    name: String,
    jar: Arc<CookieJar>,
    path: String,
    domain: Option<String>,
    same_site: cookie::SameSite,
    secure: bool,
}

impl CookieTier {
    pub fn primary(config: &TrackerConfig, jar: Arc<CookieJar>) -> Self {
        Self::new(TierKind::PrimaryCookie, &config.cookie_name, config, jar)
    }

    pub fn legacy(config: &TrackerConfig, jar: Arc<CookieJar>) -> Self {
        Self::new(TierKind::LegacyCookie, &config.legacy_cookie_name, config, jar)
    }

    fn new(kind: TierKind, name: &str, config: &TrackerConfig, jar: Arc<CookieJar>) -> Self {
        Self {
            kind,
            name: name.to_string(),
            jar,
            path: config.cookie_path.clone(),
            domain: config.cookie_domain.clone(),
            same_site: config.same_site.into(),
            secure: config.secure,
        }
    }

    fn build_cookie(&self, meta: &ReferralMetadata) -> Cookie<'static> {
        let max_age = meta.expiry - meta.set_at;
        let mut builder = Cookie::build((self.name.clone(), meta.code.to_string()))
            .path(self.path.clone())
            .same_site(self.same_site)
            .secure(self.secure)
            .max_age(max_age)
            .expires(meta.expiry);

        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }
        builder.build()
    }
}

impl StorageTier for CookieTier {
    fn kind(&self) -> TierKind {
        self.kind
    }

    fn read_code(&self, _now: OffsetDateTime) -> Result<Option<RefCode>, TrackerError> {
        let value = self.jar.get_value(&self.name)?;
        Ok(value.as_deref().and_then(RefCode::normalize))
    }

    fn write(&self, meta: &ReferralMetadata) -> Result<(), TrackerError> {
        self.jar.set_cookie(self.build_cookie(meta))
    }

    fn clear(&self) -> Result<(), TrackerError> {
        self.jar.remove(&self.name)
    }
}

/// A JSON entry duplicated into a durable and a session-scoped store.
///
/// Reads try the durable store first. A failure in one store is logged and
/// the other store is still consulted; the tier only fails when every store
/// failed.
pub struct MetadataTier<E> {
    kind: TierKind,
    key: String,
    stores: Vec<Arc<dyn KeyValueStore>>,
    _entry: PhantomData<fn() -> E>,
}

/// The `rt_ref_meta` tier.
pub type PrimaryMetadataTier = MetadataTier<ReferralMetadata>;

/// The legacy `{code, timestamp, expiry}` tier.
pub type LegacyMetadataTier = MetadataTier<LegacyEntry>;

impl PrimaryMetadataTier {
    pub fn primary(
        config: &TrackerConfig,
        durable: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
    ) -> Self {
        MetadataTier::new(TierKind::PrimaryMetadata, &config.meta_key, durable, session)
    }
}

impl LegacyMetadataTier {
    pub fn legacy(
        config: &TrackerConfig,
        durable: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
    ) -> Self {
        MetadataTier::new(
            TierKind::LegacyMetadata,
            &config.legacy_meta_key,
            durable,
            session,
        )
    }
}

impl<E: PersistedEntry> MetadataTier<E> {
    fn new(
        kind: TierKind,
        key: &str,
        durable: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            kind,
            key: key.to_string(),
            stores: vec![durable, session],
            _entry: PhantomData,
        }
    }

    /// First live entry across the stores.
    fn read_entry(&self, now: OffsetDateTime) -> Result<Option<E>, TrackerError> {
        let mut last_err = None;
        let mut any_ok = false;

        for store in &self.stores {
            match self.read_from(store.as_ref()) {
                Ok(Some(entry)) if entry.expiry() > now => return Ok(Some(entry)),
                Ok(_) => any_ok = true,
                Err(e) => {
                    tracing::debug!(
                        tier = %self.kind,
                        store = store.name(),
                        error = %e,
                        "metadata store read failed"
                    );
                    // A malformed entry is a miss, not a broken store.
                    any_ok |= matches!(e, TrackerError::MalformedEntry { .. });
                    last_err = Some(e);
                }
            }
        }

        match last_err {
            Some(e) if !any_ok => Err(e),
            _ => Ok(None),
        }
    }

    fn read_from(&self, store: &dyn KeyValueStore) -> Result<Option<E>, TrackerError> {
        match store.get_item(&self.key)? {
            Some(raw) => serde_json::from_str(&raw).entry_context(&self.key).map(Some),
            None => Ok(None),
        }
    }

    /// Apply `op` to every store, attempting all of them. Returns the first
    /// error, if any.
    fn for_each_store<F>(&self, op: F) -> Result<(), TrackerError>
    where
        F: Fn(&dyn KeyValueStore) -> Result<(), TrackerError>,
    {
        let mut first_err = None;
        for store in &self.stores {
            if let Err(e) = op(store.as_ref()) {
                tracing::debug!(
                    tier = %self.kind,
                    store = store.name(),
                    error = %e,
                    "metadata store write failed"
                );
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<E: PersistedEntry> StorageTier for MetadataTier<E> {
    fn kind(&self) -> TierKind {
        self.kind
    }

    fn read_code(&self, now: OffsetDateTime) -> Result<Option<RefCode>, TrackerError> {
        Ok(self.read_entry(now)?.map(|entry| entry.code().clone()))
    }

    fn read_metadata(&self, now: OffsetDateTime) -> Result<Option<ReferralMetadata>, TrackerError> {
        Ok(self.read_entry(now)?.and_then(E::into_metadata))
    }

    fn write(&self, meta: &ReferralMetadata) -> Result<(), TrackerError> {
        let json = serde_json::to_string(&E::from_metadata(meta)).entry_context(&self.key)?;
        self.for_each_store(|store| store.set_item(&self.key, &json))
    }

    fn clear(&self) -> Result<(), TrackerError> {
        self.for_each_store(|store| store.remove_item(&self.key))
    }
}
