//! Per-page drafts with debounced writes and bounded retention.

use crate::scheduler::Debounce;
use crate::settings::Settings;
use crate::store::KeyValueStore;
use serde::{Deserialize, Serialize};

pub const DRAFT_KEY_PREFIX: &str = "plain_composer_draft:";

/// Storage key for one logical document: origin host plus path, query and
/// fragment of the page address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DraftKey(String);

impl DraftKey {
    pub fn from_location(href: &str) -> Option<Self> {
        let url = url::Url::parse(href).ok()?;
        let host = url.host_str()?;
        let origin = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let query = url.query().map(|q| format!("?{q}")).unwrap_or_default();
        let fragment = url.fragment().map(|f| format!("#{f}")).unwrap_or_default();
        Some(Self(format!(
            "{DRAFT_KEY_PREFIX}{origin}:{}{query}{fragment}",
            url.path()
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_draft_key(key: &str) -> bool {
        key.starts_with(DRAFT_KEY_PREFIX)
    }
}

impl std::fmt::Display for DraftKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted payload, `{"text": "...", "ts": <ms>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftEntry {
    #[serde(default)]
    pub text: String,
    #[serde(rename = "ts", default)]
    pub saved_at_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftSettings {
    pub enabled: bool,
    pub debounce_ms: u64,
    pub ttl_ms: u64,
    pub max_entries: usize,
}

impl DraftSettings {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            enabled: settings.persist_drafts,
            debounce_ms: settings.draft_save_debounce_ms,
            ttl_ms: settings.draft_ttl_ms(),
            max_entries: settings.max_draft_entries,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepReport {
    pub kept: usize,
    pub expired: usize,
    pub corrupt: usize,
    pub evicted: usize,
}

/// Sole owner of the persistence medium.
///
/// Storage failures are logged and swallowed; the in-memory overlay text is
/// never touched by a failed read or write.
#[derive(Debug)]
pub struct DraftStore<S: KeyValueStore> {
    store: S,
    settings: DraftSettings,
    swept: bool,
    key: Option<DraftKey>,
    last_saved: Option<String>,
    pending: Debounce<String>,
}

impl<S: KeyValueStore> DraftStore<S> {
    pub fn new(store: S, settings: DraftSettings) -> Self {
        Self {
            store,
            settings,
            swept: false,
            key: None,
            last_saved: None,
            pending: Debounce::new(settings.debounce_ms),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn current_key(&self) -> Option<&DraftKey> {
        self.key.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    pub fn has_pending_write(&self) -> bool {
        self.pending.is_pending()
    }

    /// Remove expired, empty, corrupt and excess entries. Runs once per
    /// store; later calls return `None`.
    pub fn sweep(&mut self, now_ms: u64) -> Option<SweepReport> {
        if !self.settings.enabled || self.swept {
            return None;
        }
        self.swept = true;

        let keys = match self.store.keys() {
            Ok(keys) => keys,
            Err(err) => {
                tracing::warn!(%err, "draft sweep skipped");
                return None;
            }
        };

        let cutoff = now_ms.saturating_sub(self.settings.ttl_ms);
        let mut report = SweepReport::default();
        let mut live: Vec<(String, u64)> = Vec::new();
        for key in keys.into_iter().filter(|k| DraftKey::is_draft_key(k)) {
            let raw = match self.store.get(&key) {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(err) => {
                    tracing::debug!(%err, key = %key, "draft unreadable during sweep");
                    continue;
                }
            };
            match serde_json::from_str::<DraftEntry>(&raw) {
                Ok(entry)
                    if entry.saved_at_ms > 0
                        && entry.saved_at_ms >= cutoff
                        && !entry.text.is_empty() =>
                {
                    live.push((key, entry.saved_at_ms));
                }
                Ok(_) => {
                    report.expired += 1;
                    self.remove_quietly(&key);
                }
                Err(_) => {
                    report.corrupt += 1;
                    self.remove_quietly(&key);
                }
            }
        }

        if live.len() > self.settings.max_entries {
            live.sort_by(|a, b| b.1.cmp(&a.1));
            for (key, _) in live.split_off(self.settings.max_entries) {
                report.evicted += 1;
                self.remove_quietly(&key);
            }
        }
        report.kept = live.len();
        tracing::debug!(?report, "draft sweep finished");
        Some(report)
    }

    /// Read the draft stored under `key`, sweeping first if that has not
    /// happened yet.
    pub fn load(&mut self, key: &DraftKey, now_ms: u64) -> Option<String> {
        if !self.settings.enabled {
            return None;
        }
        self.sweep(now_ms);
        let raw = match self.store.get(key.as_str()) {
            Ok(raw) => raw?,
            Err(err) => {
                tracing::warn!(%err, "draft load failed");
                return None;
            }
        };
        match serde_json::from_str::<DraftEntry>(&raw) {
            Ok(entry) if !entry.text.is_empty() => Some(entry.text),
            Ok(_) => None,
            Err(err) => {
                tracing::debug!(%err, key = %key, "ignoring corrupt draft");
                None
            }
        }
    }

    /// Follow a navigation. Flushes the pending write for the previous key,
    /// resets the save marker, and returns the draft stored for `key`.
    pub fn switch_key(&mut self, key: DraftKey, now_ms: u64) -> Option<String> {
        if !self.settings.enabled || self.key.as_ref() == Some(&key) {
            return None;
        }
        self.flush(now_ms);
        self.last_saved = None;
        let loaded = self.load(&key, now_ms);
        if let Some(text) = &loaded {
            self.last_saved = Some(text.clone());
        }
        tracing::debug!(key = %key, restored = loaded.is_some(), "draft key changed");
        self.key = Some(key);
        loaded
    }

    /// Record the current overlay text; written after the debounce window.
    pub fn save(&mut self, text: &str, now_ms: u64) {
        if !self.settings.enabled || self.key.is_none() {
            return;
        }
        if self.last_saved.as_deref() == Some(text) {
            self.pending.cancel();
            return;
        }
        self.pending.call(now_ms, text.to_string());
    }

    pub fn poll(&mut self, now_ms: u64) {
        if let Some(text) = self.pending.poll(now_ms) {
            self.write(&text, now_ms);
        }
    }

    /// Write any pending text immediately.
    pub fn flush(&mut self, now_ms: u64) {
        if let Some(text) = self.pending.flush() {
            self.write(&text, now_ms);
        }
    }

    /// Delete the draft for the current key and drop any pending write.
    pub fn clear(&mut self) {
        self.pending.cancel();
        let Some(key) = self.key.clone() else {
            return;
        };
        match self.store.remove(key.as_str()) {
            Ok(()) => self.last_saved = Some(String::new()),
            Err(err) => tracing::warn!(%err, "draft clear failed"),
        }
    }

    fn write(&mut self, text: &str, now_ms: u64) {
        let Some(key) = self.key.clone() else {
            return;
        };
        let result = if text.is_empty() {
            self.store.remove(key.as_str())
        } else {
            let entry = DraftEntry {
                text: text.to_string(),
                saved_at_ms: now_ms,
            };
            match serde_json::to_string(&entry) {
                Ok(json) => self.store.set(key.as_str(), &json),
                Err(err) => {
                    tracing::warn!(%err, "draft encode failed");
                    return;
                }
            }
        };
        match result {
            Ok(()) => self.last_saved = Some(text.to_string()),
            Err(err) => tracing::warn!(%err, "draft save failed"),
        }
    }

    fn remove_quietly(&mut self, key: &str) {
        if let Err(err) = self.store.remove(key) {
            tracing::debug!(%err, key, "draft removal failed");
        }
    }
}
