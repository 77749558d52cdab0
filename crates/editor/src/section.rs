//! Editing session for one page section.
//!
//! Value edits are local until [`SectionEditor::save`] sends them as one
//! all-or-nothing batch. Adding or removing a group is different: it is
//! its own round trip, confirmed by the server before the section is
//! reloaded, and a second group operation is refused while one is out.
//!
//! State lives behind a mutex that is never held across a backend call,
//! so the editor can be shared by concurrently running UI tasks.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use atelier_core::change_tracker::ChangeTracker;
use atelier_core::groups::{self, Group, GroupKey, GroupKind, ParsedSection};
use atelier_core::settings::{Setting, SettingUpdate};
use atelier_core::types::DbId;
use tokio::sync::Mutex;

use crate::backend::SettingsBackend;
use crate::error::{EditorError, EditorResult};
use crate::notify::{Notifier, Operation};

struct SectionState {
    /// The section as last loaded or saved. Values here are server values;
    /// edited values live in the tracker.
    settings: Vec<Setting>,
    tracker: ChangeTracker,
    mounted_at: Instant,
    group_op_in_flight: bool,
    save_in_flight: bool,
}

impl SectionState {
    fn new(settings: Vec<Setting>, mounted_at: Instant, warmup: Duration) -> Self {
        let tracker = ChangeTracker::new(&settings, mounted_at, warmup);
        Self {
            settings,
            tracker,
            mounted_at,
            group_op_in_flight: false,
            save_in_flight: false,
        }
    }

    /// Settings with their live values.
    fn live_settings(&self) -> Vec<Setting> {
        self.settings
            .iter()
            .map(|s| Setting {
                value: self
                    .tracker
                    .value(s.id)
                    .map(str::to_string)
                    .unwrap_or_else(|| s.value.clone()),
                ..s.clone()
            })
            .collect()
    }

    /// Swap in a refreshed settings list after a group add/remove. Pending
    /// edits to settings that still exist are carried over.
    fn replace_settings(&mut self, settings: Vec<Setting>, warmup: Duration) {
        let pending: Vec<(DbId, String)> = self
            .tracker
            .changed_ids()
            .into_iter()
            .filter_map(|id| self.tracker.value(id).map(|v| (id, v.to_string())))
            .collect();

        self.tracker = ChangeTracker::new(&settings, self.mounted_at, warmup);
        for (id, value) in pending {
            // Settings removed with their group simply drop their edits.
            let _ = self.tracker.set_value(id, value);
        }
        self.settings = settings;
    }
}

/// Editing session for the settings of one `(page, section)`.
pub struct SectionEditor<B: SettingsBackend> {
    backend: Arc<B>,
    notifier: Notifier,
    page_key: String,
    section_key: String,
    warmup: Duration,
    state: Mutex<SectionState>,
}

impl<B: SettingsBackend> std::fmt::Debug for SectionEditor<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectionEditor")
            .field("page_key", &self.page_key)
            .field("section_key", &self.section_key)
            .field("warmup", &self.warmup)
            .finish_non_exhaustive()
    }
}

impl<B: SettingsBackend> SectionEditor<B> {
    /// Load a section and start tracking edits from now.
    pub async fn load(
        backend: Arc<B>,
        notifier: Notifier,
        page_key: &str,
        section_key: &str,
        warmup: Duration,
    ) -> EditorResult<Self> {
        let result = backend.list(page_key, section_key).await;
        let settings = notifier.report_failure(Operation::LoadSection, result)?;

        let duplicates = groups::duplicate_keys(&settings);
        if !duplicates.is_empty() {
            tracing::warn!(page_key, section_key, ?duplicates, "Duplicate group member keys in section");
        }
        tracing::debug!(page_key, section_key, count = settings.len(), "Section loaded");

        Ok(Self {
            backend,
            notifier,
            page_key: page_key.to_string(),
            section_key: section_key.to_string(),
            warmup,
            state: Mutex::new(SectionState::new(settings, Instant::now(), warmup)),
        })
    }

    pub fn page_key(&self) -> &str {
        &self.page_key
    }

    pub fn section_key(&self) -> &str {
        &self.section_key
    }

    /// All settings with their current (possibly unsaved) values.
    pub async fn settings(&self) -> Vec<Setting> {
        self.state.lock().await.live_settings()
    }

    /// The section projected into groups, using live values.
    pub async fn groups(&self) -> ParsedSection {
        let settings = self.state.lock().await.live_settings();
        groups::parse_section(&settings)
    }

    /// Settings that belong to no group.
    pub async fn other_settings(&self) -> Vec<Setting> {
        self.groups().await.other
    }

    pub async fn value(&self, id: DbId) -> Option<String> {
        self.state.lock().await.tracker.value(id).map(str::to_string)
    }

    /// Record a user edit. Local only; nothing is sent until `save`.
    pub async fn edit(&self, id: DbId, value: impl Into<String>) -> EditorResult<()> {
        self.state.lock().await.tracker.set_value(id, value)?;
        Ok(())
    }

    /// Feed a change callback from the rich-text surface. Callbacks inside
    /// the warm-up window after mount are ignored; returns whether the
    /// value was applied.
    pub async fn editor_changed(
        &self,
        id: DbId,
        value: impl Into<String>,
        now: Instant,
    ) -> EditorResult<bool> {
        Ok(self.state.lock().await.tracker.editor_changed(id, value, now)?)
    }

    pub async fn is_dirty(&self) -> bool {
        self.state.lock().await.tracker.is_dirty()
    }

    /// Ids of settings with unsaved edits.
    pub async fn changed_ids(&self) -> Vec<DbId> {
        self.state.lock().await.tracker.changed_ids()
    }

    /// Whether leaving the section should ask for confirmation first.
    pub async fn needs_leave_confirmation(&self) -> bool {
        self.is_dirty().await
    }

    /// Whether the save control is enabled.
    pub async fn can_save(&self) -> bool {
        let state = self.state.lock().await;
        !state.save_in_flight && state.tracker.is_dirty()
    }

    pub async fn is_saving(&self) -> bool {
        self.state.lock().await.save_in_flight
    }

    /// Whether a group add/remove is awaiting the server.
    pub async fn group_operation_pending(&self) -> bool {
        self.state.lock().await.group_op_in_flight
    }

    /// Send every setting's live value as one atomic batch.
    ///
    /// On success the stored values become the new baseline. On failure the
    /// edits stay in place and the section stays dirty.
    pub async fn save(&self) -> EditorResult<()> {
        let result = self.save_inner().await;
        self.notifier.report(Operation::SaveSettings, result, |saved| {
            if *saved == 0 {
                "No changes to save".to_string()
            } else {
                "Changes saved".to_string()
            }
        })?;
        Ok(())
    }

    async fn save_inner(&self) -> EditorResult<usize> {
        let batch = {
            let mut state = self.state.lock().await;
            if state.save_in_flight {
                return Err(EditorError::Validation("A save is already in progress".into()));
            }
            if !state.tracker.is_dirty() {
                return Ok(0);
            }
            state.save_in_flight = true;
            state.tracker.save_batch()
        };

        let result = self.backend.batch_update(&batch).await;

        let mut state = self.state.lock().await;
        state.save_in_flight = false;
        let saved = result?;
        commit_saved(&mut state, &batch, &saved);
        tracing::info!(
            page_key = %self.page_key,
            section_key = %self.section_key,
            count = saved.len(),
            "Section saved",
        );
        Ok(saved.len())
    }

    /// Throw away unsaved edits by reloading the section from the server.
    pub async fn discard(&self) -> EditorResult<()> {
        let result = self.backend.list(&self.page_key, &self.section_key).await;
        let settings = self
            .notifier
            .report(Operation::DiscardChanges, result, |_| "Changes discarded".to_string())?;

        let mut state = self.state.lock().await;
        let (group_op, saving) = (state.group_op_in_flight, state.save_in_flight);
        *state = SectionState::new(settings, Instant::now(), self.warmup);
        state.group_op_in_flight = group_op;
        state.save_in_flight = saving;
        Ok(())
    }

    /// Create the next group of `kind` on the server, then reload.
    pub async fn add_group(&self, kind: GroupKind) -> EditorResult<Group> {
        let result = self.add_group_inner(kind).await;
        self.notifier.report(Operation::AddGroup, result, |group| {
            format!("Added {} {}", group.kind, group.index)
        })
    }

    async fn add_group_inner(&self, kind: GroupKind) -> EditorResult<Group> {
        self.begin_group_op().await?;
        let result = self
            .backend
            .add_group_member(&self.page_key, &self.section_key, kind)
            .await;
        let created = match result {
            Ok(created) => created,
            Err(e) => {
                self.end_group_op().await;
                return Err(e);
            }
        };

        let index = created
            .iter()
            .find_map(|s| GroupKey::parse(&s.key))
            .filter(|k| k.kind == kind)
            .map(|k| k.index);

        let refreshed = self.backend.list(&self.page_key, &self.section_key).await;
        let mut state = self.state.lock().await;
        state.group_op_in_flight = false;
        match refreshed {
            Ok(settings) => state.replace_settings(settings, self.warmup),
            Err(e) => {
                tracing::warn!(error = %e, "Reload after group add failed; merging created settings");
                let mut settings = state.settings.clone();
                settings.extend(created.iter().cloned());
                state.replace_settings(settings, self.warmup);
            }
        }

        let index = index.ok_or_else(|| {
            EditorError::InvariantViolation(format!(
                "Server created no {kind} group member keys"
            ))
        })?;
        groups::parse_section(&state.live_settings())
            .find(kind, index)
            .cloned()
            .ok_or_else(|| {
                EditorError::InvariantViolation(format!("Group {kind} {index} missing after add"))
            })
    }

    /// Delete group `(kind, index)` on the server, then reload. Other groups
    /// keep their indices.
    pub async fn remove_group(&self, kind: GroupKind, index: u32) -> EditorResult<()> {
        let result = self.remove_group_inner(kind, index).await;
        self.notifier
            .report(Operation::RemoveGroup, result, |_| format!("Removed {kind} {index}"))
    }

    async fn remove_group_inner(&self, kind: GroupKind, index: u32) -> EditorResult<()> {
        self.begin_group_op().await?;
        let result = self
            .backend
            .remove_group_member(&self.page_key, &self.section_key, kind, index)
            .await;
        if let Err(e) = result {
            self.end_group_op().await;
            return Err(e);
        }

        let refreshed = self.backend.list(&self.page_key, &self.section_key).await;
        let mut state = self.state.lock().await;
        state.group_op_in_flight = false;
        let settings = match refreshed {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(error = %e, "Reload after group remove failed; dropping locally");
                let gone: BTreeSet<DbId> = groups::member_ids(&state.settings, kind, index)
                    .into_iter()
                    .collect();
                state
                    .settings
                    .iter()
                    .filter(|s| !gone.contains(&s.id))
                    .cloned()
                    .collect()
            }
        };
        state.replace_settings(settings, self.warmup);
        Ok(())
    }

    async fn begin_group_op(&self) -> EditorResult<()> {
        let mut state = self.state.lock().await;
        if state.group_op_in_flight {
            return Err(EditorError::Validation(
                "Another group change is still being saved".into(),
            ));
        }
        state.group_op_in_flight = true;
        Ok(())
    }

    async fn end_group_op(&self) {
        self.state.lock().await.group_op_in_flight = false;
    }
}

/// Apply a successful batch: stored values become the baseline, while
/// edits made after the batch was sent stay pending.
fn commit_saved(state: &mut SectionState, sent: &[SettingUpdate], saved: &[Setting]) {
    let newer: Vec<(DbId, String)> = sent
        .iter()
        .filter_map(|u| {
            let live = state.tracker.value(u.id)?;
            (live != u.value).then(|| (u.id, live.to_string()))
        })
        .collect();

    state.tracker.commit(saved);
    for s in saved {
        if let Some(slot) = state.settings.iter_mut().find(|x| x.id == s.id) {
            slot.value = s.value.clone();
        }
    }
    for (id, value) in newer {
        let _ = state.tracker.set_value(id, value);
    }
}
