//! Repeating content groups derived from flat settings by key convention.
//!
//! A key of the form `{kind}{index}_{field}` (e.g. `faq3_question`) belongs
//! to group `(kind, index)`. Groups are never stored; they are recomputed
//! from the section's settings on every read by [`parse_section`], which is
//! total: anything that does not match the convention lands in
//! [`ParsedSection::other`].
//!
//! Index allocation for new groups ([`next_index`]) and member lookup for
//! removal ([`member_ids`]) use the same classification, so the server and
//! the editor can never disagree about which settings form a group.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::settings::{Setting, SettingType};
use crate::types::DbId;

/// `{kind}{index}_{field}`. The index must be canonical (no leading zero).
static GROUP_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(card|faq|feature|stat|info)([1-9][0-9]*)_(.+)$").expect("valid regex")
});

/// Key prefixes that are never group members even if the rest would match.
pub const RESERVED_PREFIXES: &[&str] = &["show_", "studio_", "email_", "phone_", "social_"];

// ---------------------------------------------------------------------------
// Group kind
// ---------------------------------------------------------------------------

/// The kinds of repeating group a section may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Card,
    Faq,
    Feature,
    Stat,
    Info,
}

impl GroupKind {
    pub const ALL: [GroupKind; 5] = [
        GroupKind::Card,
        GroupKind::Faq,
        GroupKind::Feature,
        GroupKind::Stat,
        GroupKind::Info,
    ];

    /// Parse from the key prefix / URL segment form.
    pub fn parse(name: &str) -> Result<Self, CoreError> {
        match name {
            "card" => Ok(Self::Card),
            "faq" => Ok(Self::Faq),
            "feature" => Ok(Self::Feature),
            "stat" => Ok(Self::Stat),
            "info" => Ok(Self::Info),
            other => Err(CoreError::Validation(format!(
                "Invalid group kind '{other}'. Must be one of: card, faq, feature, stat, info"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Faq => "faq",
            Self::Feature => "feature",
            Self::Stat => "stat",
            Self::Info => "info",
        }
    }

    /// Whether groups of this kind are listed newest first.
    ///
    /// FAQ entries are shown newest first; every other kind keeps creation
    /// order.
    pub fn newest_first(self) -> bool {
        matches!(self, Self::Faq)
    }

    /// The minimal field set created for a new group of this kind.
    pub fn default_fields(self) -> &'static [(&'static str, SettingType)] {
        match self {
            Self::Faq => &[("question", SettingType::Text), ("answer", SettingType::RichText)],
            Self::Card => &[("title", SettingType::Text), ("description", SettingType::RichText)],
            Self::Feature => &[
                ("title", SettingType::Text),
                ("description", SettingType::RichText),
                ("icon", SettingType::Text),
            ],
            Self::Stat => &[("value", SettingType::Text), ("label", SettingType::Text)],
            Self::Info => &[("label", SettingType::Text), ("value", SettingType::Text)],
        }
    }
}

impl std::fmt::Display for GroupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Key classification
// ---------------------------------------------------------------------------

/// A key that belongs to a group: `card3_title` -> `(Card, 3, "title")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupKey {
    pub kind: GroupKind,
    pub index: u32,
    pub field: String,
}

impl GroupKey {
    /// Classify a settings key. Returns `None` for anything that is not a
    /// group member key.
    pub fn parse(key: &str) -> Option<Self> {
        if RESERVED_PREFIXES.iter().any(|p| key.starts_with(p)) {
            return None;
        }
        let caps = GROUP_KEY_RE.captures(key)?;
        let kind = GroupKind::parse(&caps[1]).ok()?;
        let index = caps[2].parse::<u32>().ok()?;
        Some(Self {
            kind,
            index,
            field: caps[3].to_string(),
        })
    }
}

/// Build the settings key for a group member field.
pub fn member_key(kind: GroupKind, index: u32, field: &str) -> String {
    format!("{}{index}_{field}", kind.as_str())
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// One projected group: every setting sharing a `(kind, index)` prefix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub kind: GroupKind,
    pub index: u32,
    /// Field name (the part after `_`) to setting.
    pub fields: BTreeMap<String, Setting>,
}

impl Group {
    /// The value of a field, if the group has it.
    pub fn value(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(|s| s.value.as_str())
    }

    /// Ids of every setting in the group.
    pub fn setting_ids(&self) -> Vec<DbId> {
        self.fields.values().map(|s| s.id).collect()
    }
}

/// The result of projecting one section's settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedSection {
    /// Groups ordered by kind, then by each kind's display policy.
    pub groups: Vec<Group>,
    /// Settings that are not group members, in input order.
    pub other: Vec<Setting>,
}

impl ParsedSection {
    /// The groups of a single kind, in display order.
    pub fn of_kind(&self, kind: GroupKind) -> impl Iterator<Item = &Group> {
        self.groups.iter().filter(move |g| g.kind == kind)
    }

    /// Find a group by identity.
    pub fn find(&self, kind: GroupKind, index: u32) -> Option<&Group> {
        self.groups
            .iter()
            .find(|g| g.kind == kind && g.index == index)
    }
}

/// Project a section's flat settings into groups plus a residual list.
///
/// Every input setting ends up in exactly one place. A setting whose
/// `(kind, index, field)` was already claimed by an earlier setting goes to
/// `other` rather than being dropped.
pub fn parse_section(settings: &[Setting]) -> ParsedSection {
    let mut by_identity: BTreeMap<(GroupKind, u32), BTreeMap<String, Setting>> = BTreeMap::new();
    let mut other = Vec::new();

    for setting in settings {
        match GroupKey::parse(&setting.key) {
            Some(gk) => {
                let fields = by_identity.entry((gk.kind, gk.index)).or_default();
                if fields.contains_key(&gk.field) {
                    other.push(setting.clone());
                } else {
                    fields.insert(gk.field, setting.clone());
                }
            }
            None => other.push(setting.clone()),
        }
    }

    let mut groups: Vec<Group> = by_identity
        .into_iter()
        .map(|((kind, index), fields)| Group {
            kind,
            index,
            fields,
        })
        .collect();

    groups.sort_by(|a, b| {
        a.kind.cmp(&b.kind).then_with(|| {
            if a.kind.newest_first() {
                b.index.cmp(&a.index)
            } else {
                a.index.cmp(&b.index)
            }
        })
    });

    ParsedSection { groups, other }
}

// ---------------------------------------------------------------------------
// Lifecycle helpers
// ---------------------------------------------------------------------------

/// The index a new group of `kind` receives: one past the highest existing
/// index, or 1 for the first group. Gaps are never refilled.
///
/// Fails with [`CoreError::Validation`] once the highest index is
/// `u32::MAX`.
pub fn next_index(settings: &[Setting], kind: GroupKind) -> Result<u32, CoreError> {
    settings
        .iter()
        .filter_map(|s| GroupKey::parse(&s.key))
        .filter(|gk| gk.kind == kind)
        .map(|gk| gk.index)
        .max()
        .unwrap_or(0)
        .checked_add(1)
        .ok_or_else(|| CoreError::Validation(format!("No {kind} group index left to allocate")))
}

/// Ids of every setting that belongs to group `(kind, index)`.
pub fn member_ids(settings: &[Setting], kind: GroupKind, index: u32) -> Vec<DbId> {
    settings
        .iter()
        .filter(|s| {
            GroupKey::parse(&s.key).is_some_and(|gk| gk.kind == kind && gk.index == index)
        })
        .map(|s| s.id)
        .collect()
}

/// Keys that appear more than once in a list. Used to sanity-check loaded
/// sections, which must have unique keys.
pub fn duplicate_keys(settings: &[Setting]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut dups = Vec::new();
    for s in settings {
        if !seen.insert(s.key.as_str()) && !dups.contains(&s.key) {
            dups.push(s.key.clone());
        }
    }
    dups
}
