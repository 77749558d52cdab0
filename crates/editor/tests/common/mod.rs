#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use tokio::sync::Notify;

use atelier_core::assets::{validate_permutation, AssetRecord};
use atelier_core::groups::{self, GroupKind};
use atelier_core::settings::{normalize_value, Setting, SettingType, SettingUpdate};
use atelier_core::taxonomy::{Taxonomy, UNCATEGORIZED};
use atelier_core::types::DbId;
use atelier_editor::backend::{AssetStore, SettingsBackend, TaxonomyBackend, UploadFile};
use atelier_editor::error::{EditorError, EditorResult};
use atelier_editor::notify::Notification;

pub const ARTWORK: DbId = 7;

/// Holds the next backend call until the test releases it.
#[derive(Default)]
pub struct Gate {
    armed: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl Gate {
    /// Block the next gated call.
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Wait until the blocked call has started.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }
}

#[derive(Default)]
struct Store {
    next_id: DbId,
    settings: Vec<Setting>,
    images: BTreeMap<DbId, Vec<AssetRecord>>,
    categories: BTreeSet<String>,
}

impl Store {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn gallery(&mut self, artwork_id: DbId) -> &mut Vec<AssetRecord> {
        self.images.entry(artwork_id).or_default()
    }
}

/// In-memory stand-in for the server, implementing every collaborator
/// trait with the same rules the database enforces.
pub struct FakeBackend {
    store: Mutex<Store>,
    fail_next: Mutex<Option<EditorError>>,
    calls: AtomicUsize,
    /// Held before a gated call touches the store.
    pub gate: Gate,
    /// Held after a batch save is stored but before its response returns.
    pub reply_gate: Gate,
}

impl FakeBackend {
    pub fn new() -> Self {
        let store = Store {
            categories: [UNCATEGORIZED, "paintings", "prints"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            ..Store::default()
        };
        Self {
            store: Mutex::new(store),
            fail_next: Mutex::new(None),
            calls: AtomicUsize::new(0),
            gate: Gate::default(),
            reply_gate: Gate::default(),
        }
    }

    /// Add a setting to `home/about`.
    pub fn seed_setting(&self, key: &str, setting_type: SettingType, value: &str) -> DbId {
        let mut store = self.store.lock().unwrap();
        let id = store.next_id();
        store.settings.push(Setting {
            id,
            page_key: "home".into(),
            section_key: "about".into(),
            key: key.into(),
            setting_type,
            value: value.into(),
            description: None,
        });
        id
    }

    /// Add `count` images to [`ARTWORK`]; the first one is primary.
    pub fn seed_images(&self, count: usize) -> Vec<DbId> {
        let mut store = self.store.lock().unwrap();
        (0..count)
            .map(|_| {
                let id = store.next_id();
                let gallery = store.gallery(ARTWORK);
                let sort_order = gallery.len() as i32;
                gallery.push(AssetRecord {
                    id,
                    sort_order,
                    is_primary: sort_order == 0,
                    category: UNCATEGORIZED.into(),
                    rendition_urls: BTreeMap::from([(
                        "original".to_string(),
                        format!("/media/{ARTWORK}/{id}.jpg"),
                    )]),
                });
                id
            })
            .collect()
    }

    /// Flag every image of [`ARTWORK`] as primary, as a buggy server might.
    pub fn corrupt_primaries(&self) {
        let mut store = self.store.lock().unwrap();
        for r in store.gallery(ARTWORK).iter_mut() {
            r.is_primary = true;
        }
    }

    /// Make the next backend call fail with `err`.
    pub fn fail_next(&self, err: EditorError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    /// Number of backend calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn stored_value(&self, id: DbId) -> Option<String> {
        let store = self.store.lock().unwrap();
        store.settings.iter().find(|s| s.id == id).map(|s| s.value.clone())
    }

    pub fn stored_order(&self) -> Vec<DbId> {
        let mut store = self.store.lock().unwrap();
        let mut gallery = store.gallery(ARTWORK).clone();
        gallery.sort_by_key(|r| r.sort_order);
        gallery.iter().map(|r| r.id).collect()
    }

    pub fn stored_image(&self, id: DbId) -> Option<AssetRecord> {
        let mut store = self.store.lock().unwrap();
        store.gallery(ARTWORK).iter().find(|r| r.id == id).cloned()
    }

    fn begin(&self) -> EditorResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.fail_next.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn apply_batch(&self, updates: &[SettingUpdate]) -> EditorResult<Vec<Setting>> {
        let mut store = self.store.lock().unwrap();

        let mut planned = Vec::with_capacity(updates.len());
        for u in updates {
            let setting = store
                .settings
                .iter()
                .find(|s| s.id == u.id)
                .ok_or_else(|| EditorError::Validation(format!("Setting {} not found", u.id)))?;
            let value = normalize_value(setting.setting_type, &u.value).map_err(rejected)?;
            planned.push((u.id, value));
        }

        let mut saved = Vec::with_capacity(planned.len());
        for (id, value) in planned {
            if let Some(s) = store.settings.iter_mut().find(|s| s.id == id) {
                s.value = value;
                saved.push(s.clone());
            }
        }
        Ok(saved)
    }

    fn section(&self, page_key: &str, section_key: &str) -> Vec<Setting> {
        let store = self.store.lock().unwrap();
        store
            .settings
            .iter()
            .filter(|s| s.page_key == page_key && s.section_key == section_key)
            .cloned()
            .collect()
    }
}

fn rejected(err: atelier_core::error::CoreError) -> EditorError {
    EditorError::Validation(err.to_string())
}

impl SettingsBackend for FakeBackend {
    async fn list(&self, page_key: &str, section_key: &str) -> EditorResult<Vec<Setting>> {
        self.begin()?;
        Ok(self.section(page_key, section_key))
    }

    async fn batch_update(&self, updates: &[SettingUpdate]) -> EditorResult<Vec<Setting>> {
        self.gate.pass().await;
        self.begin()?;
        let result = self.apply_batch(updates);
        self.reply_gate.pass().await;
        result
    }

    async fn add_group_member(
        &self,
        page_key: &str,
        section_key: &str,
        kind: GroupKind,
    ) -> EditorResult<Vec<Setting>> {
        self.gate.pass().await;
        self.begin()?;
        let index =
            groups::next_index(&self.section(page_key, section_key), kind).map_err(rejected)?;

        let mut store = self.store.lock().unwrap();
        let mut created = Vec::new();
        for (field, setting_type) in kind.default_fields() {
            let id = store.next_id();
            let setting = Setting {
                id,
                page_key: page_key.into(),
                section_key: section_key.into(),
                key: groups::member_key(kind, index, field),
                setting_type: *setting_type,
                value: String::new(),
                description: None,
            };
            store.settings.push(setting.clone());
            created.push(setting);
        }
        Ok(created)
    }

    async fn remove_group_member(
        &self,
        page_key: &str,
        section_key: &str,
        kind: GroupKind,
        index: u32,
    ) -> EditorResult<()> {
        self.gate.pass().await;
        self.begin()?;
        let ids = groups::member_ids(&self.section(page_key, section_key), kind, index);
        self.store
            .lock()
            .unwrap()
            .settings
            .retain(|s| !ids.contains(&s.id));
        Ok(())
    }
}

impl AssetStore for FakeBackend {
    async fn list(&self, artwork_id: DbId) -> EditorResult<Vec<AssetRecord>> {
        self.begin()?;
        let mut store = self.store.lock().unwrap();
        Ok(store.gallery(artwork_id).clone())
    }

    async fn upload(&self, artwork_id: DbId, file: &UploadFile) -> EditorResult<AssetRecord> {
        self.begin()?;
        let mut store = self.store.lock().unwrap();
        let category = file.category.clone().unwrap_or_else(|| UNCATEGORIZED.into());
        if !store.categories.contains(&category) {
            return Err(EditorError::ServerRejection {
                status: 404,
                message: format!("Category '{category}' not found"),
            });
        }
        let id = store.next_id();
        let gallery = store.gallery(artwork_id);
        let sort_order = gallery.len() as i32;
        let record = AssetRecord {
            id,
            sort_order,
            is_primary: sort_order == 0,
            category,
            rendition_urls: BTreeMap::from([(
                "original".to_string(),
                format!("/media/{artwork_id}/{}", file.file_name),
            )]),
        };
        gallery.push(record.clone());
        Ok(record)
    }

    async fn delete(&self, artwork_id: DbId, id: DbId) -> EditorResult<()> {
        self.begin()?;
        let mut store = self.store.lock().unwrap();
        let gallery = store.gallery(artwork_id);
        gallery.sort_by_key(|r| r.sort_order);
        let pos = gallery
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| EditorError::ServerRejection {
                status: 404,
                message: format!("Image {id} not found"),
            })?;
        let removed = gallery.remove(pos);
        for (i, r) in gallery.iter_mut().enumerate() {
            r.sort_order = i as i32;
        }
        if removed.is_primary {
            if let Some(first) = gallery.first_mut() {
                first.is_primary = true;
            }
        }
        Ok(())
    }

    async fn set_primary(&self, artwork_id: DbId, id: DbId) -> EditorResult<()> {
        self.begin()?;
        let mut store = self.store.lock().unwrap();
        let gallery = store.gallery(artwork_id);
        if !gallery.iter().any(|r| r.id == id) {
            return Err(EditorError::ServerRejection {
                status: 404,
                message: format!("Image {id} not found"),
            });
        }
        for r in gallery.iter_mut() {
            r.is_primary = r.id == id;
        }
        Ok(())
    }

    async fn reorder(&self, artwork_id: DbId, ordered_ids: &[DbId]) -> EditorResult<()> {
        self.gate.pass().await;
        self.begin()?;
        let mut store = self.store.lock().unwrap();
        let gallery = store.gallery(artwork_id);
        let existing: Vec<DbId> = gallery.iter().map(|r| r.id).collect();
        validate_permutation(&existing, ordered_ids).map_err(rejected)?;
        for r in gallery.iter_mut() {
            if let Some(pos) = ordered_ids.iter().position(|id| *id == r.id) {
                r.sort_order = pos as i32;
            }
        }
        Ok(())
    }

    async fn assign_category(
        &self,
        artwork_id: DbId,
        id: DbId,
        category: &str,
    ) -> EditorResult<AssetRecord> {
        self.begin()?;
        let mut store = self.store.lock().unwrap();
        let category = category.trim().to_lowercase();
        if !store.categories.contains(&category) {
            return Err(EditorError::ServerRejection {
                status: 404,
                message: format!("Category '{category}' not found"),
            });
        }
        let record = store
            .gallery(artwork_id)
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| EditorError::ServerRejection {
                status: 404,
                message: format!("Image {id} not found"),
            })?;
        record.category = category;
        Ok(record.clone())
    }
}

impl TaxonomyBackend for FakeBackend {
    async fn list(&self) -> EditorResult<Vec<String>> {
        self.begin()?;
        Ok(self.store.lock().unwrap().categories.iter().cloned().collect())
    }

    async fn create(&self, name: &str) -> EditorResult<Vec<String>> {
        self.begin()?;
        let mut store = self.store.lock().unwrap();
        let mut taxonomy = Taxonomy::from_names(&store.categories);
        taxonomy.add(name).map_err(rejected)?;
        store.categories = taxonomy.names().into_iter().collect();
        Ok(taxonomy.names())
    }

    async fn rename(&self, old_name: &str, new_name: &str) -> EditorResult<Vec<String>> {
        self.begin()?;
        let mut store = self.store.lock().unwrap();
        let mut taxonomy = Taxonomy::from_names(&store.categories);
        let (old, new) = taxonomy.check_rename(old_name, new_name).map_err(rejected)?;
        taxonomy.rename(&old, &new).map_err(rejected)?;
        for gallery in store.images.values_mut() {
            for r in gallery.iter_mut().filter(|r| r.category == old) {
                r.category = new.clone();
            }
        }
        store.categories = taxonomy.names().into_iter().collect();
        Ok(taxonomy.names())
    }

    async fn delete(&self, name: &str) -> EditorResult<Vec<String>> {
        self.begin()?;
        let mut store = self.store.lock().unwrap();
        let mut taxonomy = Taxonomy::from_names(&store.categories);
        let removed = taxonomy.remove(name).map_err(rejected)?;
        for gallery in store.images.values_mut() {
            for r in gallery.iter_mut().filter(|r| r.category == removed) {
                r.category = UNCATEGORIZED.into();
            }
        }
        store.categories = taxonomy.names().into_iter().collect();
        Ok(taxonomy.names())
    }
}

pub fn upload_file(name: &str) -> UploadFile {
    UploadFile {
        file_name: name.into(),
        bytes: vec![0xFF, 0xD8, 0xFF],
        category: None,
    }
}

/// Every notification sent so far.
pub fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(n) = rx.try_recv() {
        out.push(n);
    }
    out
}
