use plain_composer::drafts::{DraftEntry, DraftKey, DraftSettings, DraftStore, DRAFT_KEY_PREFIX};
use plain_composer::store::{JsonFileStore, KeyValueStore, MemoryStore};
use tempfile::tempdir;

const DAY_MS: u64 = 24 * 60 * 60 * 1000;
const NOW: u64 = 1_700_000_000_000;

fn settings() -> DraftSettings {
    DraftSettings {
        enabled: true,
        debounce_ms: 250,
        ttl_ms: 30 * DAY_MS,
        max_entries: 200,
    }
}

fn entry(text: &str, ts: u64) -> String {
    serde_json::to_string(&DraftEntry {
        text: text.into(),
        saved_at_ms: ts,
    })
    .unwrap()
}

fn key(fragment: &str) -> DraftKey {
    DraftKey::from_location(&format!("https://www.typingmind.com/#chat={fragment}")).unwrap()
}

#[test]
fn key_covers_path_query_and_fragment() {
    let k = DraftKey::from_location("https://chat.example.com:8443/app?x=1#chat=7").unwrap();
    assert_eq!(
        k.as_str(),
        format!("{DRAFT_KEY_PREFIX}chat.example.com:8443:/app?x=1#chat=7")
    );
    assert_ne!(key("a"), key("b"));
    assert!(DraftKey::from_location("not a url").is_none());
}

#[test]
fn stored_entry_uses_short_timestamp_field() {
    let json = entry("hi", 5);
    assert_eq!(json, r#"{"text":"hi","ts":5}"#);
}

#[test]
fn sweep_removes_expired_and_corrupt_entries() {
    let mut store = MemoryStore::new();
    let prefix = DRAFT_KEY_PREFIX;
    store.set(&format!("{prefix}fresh"), &entry("keep me", NOW - DAY_MS)).unwrap();
    store.set(&format!("{prefix}old"), &entry("stale", NOW - 31 * DAY_MS)).unwrap();
    store.set(&format!("{prefix}empty"), &entry("", NOW)).unwrap();
    store.set(&format!("{prefix}broken"), "{not json").unwrap();
    store.set("unrelated", "{not json").unwrap();

    let mut drafts = DraftStore::new(store, settings());
    let report = drafts.sweep(NOW).expect("first sweep runs");
    assert_eq!(report.kept, 1);
    assert_eq!(report.expired, 2);
    assert_eq!(report.corrupt, 1);
    assert!(drafts.sweep(NOW).is_none(), "sweep runs once");

    let store = drafts.store();
    assert!(store.get(&format!("{prefix}fresh")).unwrap().is_some());
    assert!(store.get(&format!("{prefix}old")).unwrap().is_none());
    assert!(store.get(&format!("{prefix}broken")).unwrap().is_none());
    assert!(store.get("unrelated").unwrap().is_some());
}

#[test]
fn sweep_keeps_only_newest_entries_over_capacity() {
    let capacity = 10;
    let mut store = MemoryStore::new();
    for i in 0..(capacity + 5) as u64 {
        store
            .set(&format!("{DRAFT_KEY_PREFIX}k{i:02}"), &entry("text", NOW - 1000 + i))
            .unwrap();
    }
    let mut drafts = DraftStore::new(
        store,
        DraftSettings {
            max_entries: capacity,
            ..settings()
        },
    );
    let report = drafts.sweep(NOW).unwrap();
    assert_eq!(report.kept, capacity);
    assert_eq!(report.evicted, 5);
    let keys = drafts.store().keys().unwrap();
    assert_eq!(keys.len(), capacity);
    for i in 0..5 {
        assert!(!keys.contains(&format!("{DRAFT_KEY_PREFIX}k{i:02}")));
    }
    for i in 5..15 {
        assert!(keys.contains(&format!("{DRAFT_KEY_PREFIX}k{i:02}")));
    }
}

#[test]
fn save_is_debounced_and_restored_on_return() {
    let mut drafts = DraftStore::new(MemoryStore::new(), settings());
    assert_eq!(drafts.switch_key(key("a"), NOW), None);
    drafts.save("h", NOW);
    drafts.save("he", NOW + 100);
    drafts.save("hello", NOW + 200);
    drafts.poll(NOW + 300);
    assert!(drafts.store().is_empty());
    drafts.poll(NOW + 450);
    assert_eq!(drafts.store().len(), 1);

    drafts.switch_key(key("b"), NOW + 500);
    assert_eq!(drafts.switch_key(key("a"), NOW + 600).as_deref(), Some("hello"));
}

#[test]
fn switching_key_flushes_pending_write_to_previous_key() {
    let mut drafts = DraftStore::new(MemoryStore::new(), settings());
    drafts.switch_key(key("a"), NOW);
    drafts.save("unsent", NOW);
    assert_eq!(drafts.switch_key(key("b"), NOW + 10), None);
    assert!(!drafts.has_pending_write());
    let raw = drafts.store().get(key("a").as_str()).unwrap().unwrap();
    let stored: DraftEntry = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored.text, "unsent");
}

#[test]
fn clear_removes_entry_and_pending_write() {
    let mut drafts = DraftStore::new(MemoryStore::new(), settings());
    drafts.switch_key(key("a"), NOW);
    drafts.save("first", NOW);
    drafts.flush(NOW);
    drafts.save("second", NOW + 10);
    drafts.clear();
    drafts.poll(NOW + 1000);
    assert!(drafts.store().is_empty());
}

#[test]
fn saving_empty_text_removes_entry() {
    let mut drafts = DraftStore::new(MemoryStore::new(), settings());
    drafts.switch_key(key("a"), NOW);
    drafts.save("x", NOW);
    drafts.flush(NOW);
    assert_eq!(drafts.store().len(), 1);
    drafts.save("", NOW + 10);
    drafts.flush(NOW + 10);
    assert!(drafts.store().is_empty());
}

#[test]
fn unavailable_storage_degrades_silently() {
    let mut store = MemoryStore::new();
    store.set_available(false);
    let mut drafts = DraftStore::new(store, settings());
    assert!(drafts.sweep(NOW).is_none());
    assert_eq!(drafts.switch_key(key("a"), NOW), None);
    drafts.save("still typing", NOW);
    drafts.flush(NOW);
    drafts.clear();
    assert!(drafts.store().is_empty());
}

#[test]
fn quota_failure_keeps_retrying_later() {
    let mut store = MemoryStore::new();
    store.set_quota(Some(0));
    let mut drafts = DraftStore::new(store, settings());
    drafts.switch_key(key("a"), NOW);
    drafts.save("big", NOW);
    drafts.flush(NOW);
    assert!(drafts.store().is_empty());

    drafts.store_mut().set_quota(None);
    drafts.save("big", NOW + 10);
    drafts.flush(NOW + 10);
    assert_eq!(drafts.store().len(), 1);
}

#[test]
fn disabled_persistence_never_touches_storage() {
    let mut drafts = DraftStore::new(
        MemoryStore::new(),
        DraftSettings {
            enabled: false,
            ..settings()
        },
    );
    assert_eq!(drafts.switch_key(key("a"), NOW), None);
    drafts.save("text", NOW);
    drafts.flush(NOW);
    assert!(drafts.store().is_empty());
}

#[test]
fn json_file_store_persists_across_instances() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("drafts.json");

    let mut drafts = DraftStore::new(JsonFileStore::new(&path), settings());
    drafts.switch_key(key("a"), NOW);
    drafts.save("across restarts", NOW);
    drafts.flush(NOW);
    assert!(path.exists());

    let mut reopened = DraftStore::new(JsonFileStore::new(&path), settings());
    assert_eq!(
        reopened.switch_key(key("a"), NOW + 1).as_deref(),
        Some("across restarts")
    );
}

#[test]
fn json_file_store_reports_corrupt_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("drafts.json");
    std::fs::write(&path, "[1, 2").unwrap();
    let store = JsonFileStore::new(&path);
    assert!(store.keys().is_err());

    let mut drafts = DraftStore::new(store, settings());
    assert_eq!(drafts.switch_key(key("a"), NOW), None);
}

#[test]
fn unreadable_file_is_left_untouched() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("drafts.json");
    let mut original = format!(r#"{{"{DRAFT_KEY_PREFIX}a:/x": "keep me "#).into_bytes();
    original.push(0xFF);
    original.extend_from_slice(br#""}"#);
    std::fs::write(&path, &original).unwrap();

    let mut store = JsonFileStore::new(&path);
    assert!(store.keys().is_err());
    assert!(store.set(&format!("{DRAFT_KEY_PREFIX}b:/y"), "{}").is_err());
    assert!(store.remove(&format!("{DRAFT_KEY_PREFIX}a:/x")).is_err());
    assert_eq!(std::fs::read(&path).unwrap(), original);
}
