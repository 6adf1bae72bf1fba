// SPDX-License-Identifier: MIT OR Apache-2.0
//! Asset references for elements.
//!
//! The timeline never loads these. A path and a little metadata are all it keeps.

use serde::{Deserialize, Serialize};

/// Leading entry of every table key list
pub const NO_TABLE_KEY: &str = "None";

/// Type of asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    /// Sprite image
    Image,
    /// Animator controller
    Animator,
    /// Localization table
    SharedTableData,
    /// Audio clip
    Audio,
}

impl AssetKind {
    /// Type tag used in documents
    pub fn code(self) -> i32 {
        match self {
            Self::Image => 0,
            Self::Animator => 1,
            Self::SharedTableData => 2,
            Self::Audio => 3,
        }
    }

    /// Look up a type tag
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Image),
            1 => Some(Self::Animator),
            2 => Some(Self::SharedTableData),
            3 => Some(Self::Audio),
            _ => None,
        }
    }
}

/// Kind-specific asset metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssetDetail {
    /// Sprite image
    Image {
        /// Sprite name inside the texture
        sprite_name: String,
    },
    /// Animator controller
    Animator {
        /// Transition condition driven by the animator param
        condition: String,
        /// Conditions offered by the controller (editor only, not persisted)
        #[serde(skip)]
        conditions: Vec<String>,
    },
    /// Localization table
    SharedTableData {
        /// Keys offered by the table (editor only, not persisted)
        #[serde(skip)]
        keys: Vec<String>,
    },
    /// Audio clip
    Audio,
}

/// Reference to an external resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Resolvable resource path (empty if unassigned)
    pub path: String,
    detail: AssetDetail,
}

impl Asset {
    /// Create an unassigned asset of a kind
    pub fn new(kind: AssetKind) -> Self {
        let detail = match kind {
            AssetKind::Image => AssetDetail::Image {
                sprite_name: String::new(),
            },
            AssetKind::Animator => AssetDetail::Animator {
                condition: String::new(),
                conditions: Vec::new(),
            },
            AssetKind::SharedTableData => AssetDetail::SharedTableData { keys: Vec::new() },
            AssetKind::Audio => AssetDetail::Audio,
        };
        Self {
            path: String::new(),
            detail,
        }
    }

    /// Asset kind
    pub fn kind(&self) -> AssetKind {
        match self.detail {
            AssetDetail::Image { .. } => AssetKind::Image,
            AssetDetail::Animator { .. } => AssetKind::Animator,
            AssetDetail::SharedTableData { .. } => AssetKind::SharedTableData,
            AssetDetail::Audio => AssetKind::Audio,
        }
    }

    /// Kind-specific metadata
    pub fn detail(&self) -> &AssetDetail {
        &self.detail
    }

    /// Whether a path has been assigned
    pub fn is_assigned(&self) -> bool {
        !self.path.is_empty()
    }

    /// Sprite name of an image asset
    pub fn sprite_name(&self) -> Option<&str> {
        match &self.detail {
            AssetDetail::Image { sprite_name } => Some(sprite_name),
            _ => None,
        }
    }

    /// Set the sprite name of an image asset. Ignored for other kinds.
    pub fn set_sprite_name(&mut self, name: impl Into<String>) -> bool {
        match &mut self.detail {
            AssetDetail::Image { sprite_name } => {
                *sprite_name = name.into();
                true
            }
            _ => false,
        }
    }

    /// Selected condition of an animator asset
    pub fn condition(&self) -> Option<&str> {
        match &self.detail {
            AssetDetail::Animator { condition, .. } => Some(condition),
            _ => None,
        }
    }

    /// Select the condition of an animator asset. Ignored for other kinds.
    pub fn select_condition(&mut self, selected: impl Into<String>) -> bool {
        match &mut self.detail {
            AssetDetail::Animator { condition, .. } => {
                *condition = selected.into();
                true
            }
            _ => false,
        }
    }

    /// Conditions offered by an animator asset
    pub fn conditions(&self) -> &[String] {
        match &self.detail {
            AssetDetail::Animator { conditions, .. } => conditions,
            _ => &[],
        }
    }

    /// Replace the conditions an animator offers.
    ///
    /// A selection missing from the new list falls back to the first entry,
    /// or to nothing when the list is empty.
    pub fn set_conditions(&mut self, list: Vec<String>) {
        let AssetDetail::Animator {
            condition,
            conditions,
        } = &mut self.detail
        else {
            return;
        };

        if !list.contains(condition) {
            *condition = list.first().cloned().unwrap_or_default();
        }
        *conditions = list;
    }

    /// Keys offered by a table asset, led by [`NO_TABLE_KEY`]
    pub fn table_keys(&self) -> &[String] {
        match &self.detail {
            AssetDetail::SharedTableData { keys } => keys,
            _ => &[],
        }
    }

    /// Replace the keys a table offers
    pub fn set_table_keys<I, S>(&mut self, entries: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let AssetDetail::SharedTableData { keys } = &mut self.detail else {
            return;
        };
        keys.clear();
        keys.push(NO_TABLE_KEY.to_string());
        keys.extend(entries.into_iter().map(Into::into));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_asset_is_unassigned() {
        let asset = Asset::new(AssetKind::Audio);
        assert_eq!(asset.kind(), AssetKind::Audio);
        assert!(!asset.is_assigned());
    }

    #[test]
    fn test_kind_specific_metadata() {
        let mut image = Asset::new(AssetKind::Image);
        assert!(image.set_sprite_name("face_01"));
        assert_eq!(image.sprite_name(), Some("face_01"));
        assert!(!image.select_condition("Jump"));
        assert_eq!(image.condition(), None);
    }

    #[test]
    fn test_condition_list_revalidates_selection() {
        let mut animator = Asset::new(AssetKind::Animator);
        animator.select_condition("Wave");
        animator.set_conditions(vec!["Idle".into(), "Wave".into()]);
        assert_eq!(animator.condition(), Some("Wave"));

        animator.set_conditions(vec!["Run".into(), "Idle".into()]);
        assert_eq!(animator.condition(), Some("Run"));

        animator.set_conditions(Vec::new());
        assert_eq!(animator.condition(), Some(""));
        assert!(animator.conditions().is_empty());
    }

    #[test]
    fn test_table_keys_lead_with_none() {
        let mut table = Asset::new(AssetKind::SharedTableData);
        table.set_table_keys(["intro_01", "intro_02"]);
        assert_eq!(table.table_keys(), ["None", "intro_01", "intro_02"]);
        table.set_table_keys(Vec::<String>::new());
        assert_eq!(table.table_keys(), ["None"]);
    }

    #[test]
    fn test_kind_codes() {
        for kind in [
            AssetKind::Image,
            AssetKind::Animator,
            AssetKind::SharedTableData,
            AssetKind::Audio,
        ] {
            assert_eq!(AssetKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(AssetKind::from_code(-1), None);
    }
}
