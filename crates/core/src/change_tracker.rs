//! Unsaved-edit detection for a loaded settings section.
//!
//! A [`ChangeTracker`] holds the values as they were loaded (the
//! [`Baseline`]) next to the live, edited values. The section is dirty when
//! any live value differs from its baseline; rich-text values are compared
//! through [`normalize_markup`](crate::markup::normalize_markup) so editor
//! re-serialization noise does not count.
//!
//! The baseline is never edited in place. It is replaced wholesale after a
//! successful save ([`ChangeTracker::commit`]) or by building a new tracker
//! from a fresh load when the user discards.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::CoreError;
use crate::markup::markup_equivalent;
use crate::settings::{Setting, SettingType, SettingUpdate};
use crate::types::DbId;

/// Default period after mount during which editor callbacks are ignored.
pub const DEFAULT_WARMUP: Duration = Duration::from_millis(300);

/// Immutable snapshot of setting values captured at load time.
#[derive(Debug, Clone, Default)]
pub struct Baseline(Arc<BTreeMap<DbId, String>>);

impl Baseline {
    fn capture(values: &BTreeMap<DbId, String>) -> Self {
        Self(Arc::new(values.clone()))
    }

    pub fn get(&self, id: DbId) -> Option<&str> {
        self.0.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Tracks live edits against a load-time baseline.
#[derive(Debug, Clone)]
pub struct ChangeTracker {
    baseline: Baseline,
    types: BTreeMap<DbId, SettingType>,
    live: BTreeMap<DbId, String>,
    mounted_at: Instant,
    warmup: Duration,
}

impl ChangeTracker {
    /// Start tracking a freshly loaded section.
    pub fn new(settings: &[Setting], mounted_at: Instant, warmup: Duration) -> Self {
        let live: BTreeMap<DbId, String> =
            settings.iter().map(|s| (s.id, s.value.clone())).collect();
        let types = settings.iter().map(|s| (s.id, s.setting_type)).collect();
        Self {
            baseline: Baseline::capture(&live),
            types,
            live,
            mounted_at,
            warmup,
        }
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    /// The current (possibly edited) value of a setting.
    pub fn value(&self, id: DbId) -> Option<&str> {
        self.live.get(&id).map(String::as_str)
    }

    /// Apply a user edit.
    pub fn set_value(&mut self, id: DbId, value: impl Into<String>) -> Result<(), CoreError> {
        match self.live.get_mut(&id) {
            Some(slot) => {
                *slot = value.into();
                Ok(())
            }
            None => Err(CoreError::NotFound {
                entity: "Setting",
                id,
            }),
        }
    }

    /// Whether `now` still falls inside the post-mount warm-up window.
    pub fn in_warmup(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.mounted_at) < self.warmup
    }

    /// Apply a change reported by the rich-text surface.
    ///
    /// During the warm-up window the surface fires with the value it was
    /// just given; those callbacks are dropped. Returns whether the value
    /// was applied.
    pub fn editor_changed(
        &mut self,
        id: DbId,
        value: impl Into<String>,
        now: Instant,
    ) -> Result<bool, CoreError> {
        if self.in_warmup(now) {
            return Ok(false);
        }
        self.set_value(id, value)?;
        Ok(true)
    }

    fn differs(&self, id: DbId, live: &str) -> bool {
        let Some(base) = self.baseline.get(id) else {
            return true;
        };
        match self.types.get(&id) {
            Some(SettingType::RichText) => !markup_equivalent(base, live),
            _ => base != live,
        }
    }

    /// True iff any live value differs from its baseline.
    pub fn is_dirty(&self) -> bool {
        self.live.iter().any(|(id, v)| self.differs(*id, v))
    }

    /// Ids whose live value differs from the baseline, ascending.
    pub fn changed_ids(&self) -> Vec<DbId> {
        self.live
            .iter()
            .filter(|(id, v)| self.differs(**id, v))
            .map(|(id, _)| *id)
            .collect()
    }

    /// The full batch to send on save: every tracked setting with its live
    /// value. The save is all-or-nothing across the whole list.
    pub fn save_batch(&self) -> Vec<SettingUpdate> {
        self.live
            .iter()
            .map(|(id, value)| SettingUpdate {
                id: *id,
                value: value.clone(),
            })
            .collect()
    }

    /// Replace the baseline after a successful save.
    ///
    /// `saved` carries the values the server stored (which may differ from
    /// what was sent, e.g. normalized booleans); they become both the live
    /// values and the new baseline. Settings not in `saved` keep their
    /// current live value as baseline. Saved settings that are no longer
    /// tracked (their group was removed meanwhile) are skipped.
    pub fn commit(&mut self, saved: &[Setting]) {
        for s in saved {
            if let Some(slot) = self.live.get_mut(&s.id) {
                *slot = s.value.clone();
                self.types.insert(s.id, s.setting_type);
            }
        }
        self.baseline = Baseline::capture(&self.live);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn setting(id: DbId, setting_type: SettingType, value: &str) -> Setting {
        Setting {
            id,
            page_key: "about".into(),
            section_key: "intro".into(),
            key: format!("field_{id}"),
            setting_type,
            value: value.into(),
            description: None,
        }
    }

    fn tracker(settings: &[Setting]) -> (ChangeTracker, Instant) {
        let mounted = Instant::now();
        (ChangeTracker::new(settings, mounted, DEFAULT_WARMUP), mounted)
    }

    #[test]
    fn clean_on_load() {
        let (t, _) = tracker(&[setting(1, SettingType::RichText, "<p>Hello</p>")]);
        assert!(!t.is_dirty());
        assert_eq!(t.baseline().len(), 1);
    }

    #[test]
    fn rich_text_cosmetic_edit_stays_clean() {
        let (mut t, _) = tracker(&[setting(1, SettingType::RichText, "<p>Hello</p>")]);
        t.set_value(1, "<p>Hello </p>").unwrap();
        assert!(!t.is_dirty());
    }

    #[test]
    fn rich_text_real_edit_is_dirty_until_commit() {
        let (mut t, _) = tracker(&[setting(1, SettingType::RichText, "<p>Hello</p>")]);
        t.set_value(1, "<p>Hello!</p>").unwrap();
        assert!(t.is_dirty());
        assert_eq!(t.changed_ids(), vec![1]);

        t.commit(&[setting(1, SettingType::RichText, "<p>Hello!</p>")]);
        assert!(!t.is_dirty());
        assert_eq!(t.baseline().get(1), Some("<p>Hello!</p>"));
    }

    #[test]
    fn plain_text_whitespace_is_significant() {
        let (mut t, _) = tracker(&[setting(1, SettingType::Text, "Hello")]);
        t.set_value(1, "Hello ").unwrap();
        assert!(t.is_dirty());
    }

    #[test]
    fn reverting_an_edit_clears_dirty() {
        let (mut t, _) = tracker(&[setting(1, SettingType::Text, "a")]);
        t.set_value(1, "b").unwrap();
        assert!(t.is_dirty());
        t.set_value(1, "a").unwrap();
        assert!(!t.is_dirty());
    }

    #[test]
    fn editor_callbacks_in_warmup_are_ignored() {
        let (mut t, mounted) = tracker(&[setting(1, SettingType::RichText, "<p>a</p>")]);
        let applied = t
            .editor_changed(1, "<p class=\"x\">a</p>", mounted + Duration::from_millis(10))
            .unwrap();
        assert!(!applied);
        assert!(!t.is_dirty());

        let applied = t
            .editor_changed(1, "<p>b</p>", mounted + DEFAULT_WARMUP)
            .unwrap();
        assert!(applied);
        assert!(t.is_dirty());
    }

    #[test]
    fn unknown_setting_is_not_found() {
        let (mut t, _) = tracker(&[]);
        assert_matches!(t.set_value(9, "x"), Err(CoreError::NotFound { id: 9, .. }));
    }

    #[test]
    fn commit_takes_server_normalized_values() {
        let (mut t, _) = tracker(&[setting(1, SettingType::Boolean, "1")]);
        t.set_value(1, "false").unwrap();
        t.commit(&[setting(1, SettingType::Boolean, "0")]);
        assert_eq!(t.value(1), Some("0"));
        assert!(!t.is_dirty());
    }

    #[test]
    fn save_batch_carries_every_setting() {
        let (mut t, _) = tracker(&[
            setting(2, SettingType::Text, "b"),
            setting(1, SettingType::Text, "a"),
        ]);
        t.set_value(2, "bb").unwrap();
        let batch = t.save_batch();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].id, 1);
        assert_eq!(batch[1].value, "bb");
    }

    #[test]
    fn commit_skips_settings_no_longer_tracked() {
        let (mut t, _) = tracker(&[setting(1, SettingType::Text, "a")]);
        t.commit(&[
            setting(1, SettingType::Text, "b"),
            setting(2, SettingType::Text, "gone"),
        ]);
        assert_eq!(t.value(2), None);
        assert_eq!(t.save_batch().len(), 1);
        assert_eq!(t.baseline().get(2), None);
    }

    #[test]
    fn old_baseline_snapshot_is_unchanged_by_commit() {
        let (mut t, _) = tracker(&[setting(1, SettingType::Text, "a")]);
        let before = t.baseline().clone();
        t.set_value(1, "b").unwrap();
        t.commit(&[]);
        assert_eq!(before.get(1), Some("a"));
        assert_eq!(t.baseline().get(1), Some("b"));
    }
}
