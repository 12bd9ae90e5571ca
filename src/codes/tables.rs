use std::collections::BTreeMap;

use crate::foundation::{
    core::Slot,
    error::{SceneError, SceneResult},
};

/// Fixed per-base-character height trait used to pick a crop ratio.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum HeightClass {
    /// Cropped most.
    Short,
    /// Cropped lightly.
    Medium,
    /// Never cropped. Also the class of any base character missing from the height table.
    #[default]
    Tall,
}

/// Base id -> [`HeightClass`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct HeightTable(pub BTreeMap<String, HeightClass>);

impl Default for HeightTable {
    fn default() -> Self {
        Self(
            [
                ("girlA", HeightClass::Short),
                ("girlB", HeightClass::Medium),
                ("girlC", HeightClass::Tall),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
        )
    }
}

impl HeightTable {
    /// Unknown bases are `Tall`, i.e. never cropped.
    pub fn class_of(&self, base_id: &str) -> HeightClass {
        self.0.get(base_id).copied().unwrap_or_default()
    }
}

/// Single-symbol code tables used by the scene decoder.
///
/// Keys are one-symbol strings so the tables serialize as plain JSON objects.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CodeTables {
    /// Symbol that explicitly marks a fragment as absent.
    pub wildcard: char,
    /// Base character symbol -> base id (`a` -> `girlA`).
    pub characters: BTreeMap<String, String>,
    /// Emotion symbol -> emotion id (`1` -> `angry`).
    pub emotions: BTreeMap<String, String>,
    /// Background symbol -> background id (`f` -> `forest`).
    pub backgrounds: BTreeMap<String, String>,
    /// Position symbol -> stage slot.
    pub positions: BTreeMap<String, Slot>,
}

impl Default for CodeTables {
    fn default() -> Self {
        fn ids(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect()
        }

        Self {
            wildcard: '*',
            characters: ids(&[("a", "girlA"), ("b", "girlB"), ("c", "girlC")]),
            emotions: ids(&[("1", "angry"), ("4", "smile"), ("7", "v")]),
            backgrounds: ids(&[("f", "forest"), ("b", "beach"), ("h", "home")]),
            positions: [("l", Slot::Left), ("c", Slot::Center), ("r", Slot::Right)]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }
}

impl CodeTables {
    /// Base id for a character symbol.
    pub fn character(&self, symbol: char) -> Option<&str> {
        lookup(&self.characters, symbol)
    }

    /// Emotion id for an emotion symbol.
    pub fn emotion(&self, symbol: char) -> Option<&str> {
        lookup(&self.emotions, symbol)
    }

    /// Background lookup by whole fragment; anything but one known symbol misses.
    pub fn background(&self, fragment: &str) -> Option<&str> {
        self.backgrounds.get(fragment).map(String::as_str)
    }

    /// Active-position lookup by whole fragment.
    pub fn position(&self, fragment: &str) -> Option<Slot> {
        self.positions.get(fragment).copied()
    }

    /// True iff `fragment` is exactly the wildcard symbol.
    pub fn is_wildcard(&self, fragment: &str) -> bool {
        let mut chars = fragment.chars();
        chars.next() == Some(self.wildcard) && chars.next().is_none()
    }

    /// Symbol that encodes `base_id`.
    pub fn character_symbol(&self, base_id: &str) -> Option<&str> {
        reverse_lookup(&self.characters, base_id)
    }

    /// Symbol that encodes `emotion_id`.
    pub fn emotion_symbol(&self, emotion_id: &str) -> Option<&str> {
        reverse_lookup(&self.emotions, emotion_id)
    }

    /// Symbol that encodes `background_id`.
    pub fn background_symbol(&self, background_id: &str) -> Option<&str> {
        reverse_lookup(&self.backgrounds, background_id)
    }

    /// Symbol that encodes `slot` as the active position.
    pub fn position_symbol(&self, slot: Slot) -> Option<&str> {
        self.positions
            .iter()
            .find(|(_, s)| **s == slot)
            .map(|(k, _)| k.as_str())
    }

    /// True iff `code` is exactly two symbols naming a known base and emotion.
    pub fn validate_character_code(&self, code: &str) -> bool {
        let mut chars = code.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(base), Some(emotion), None) => {
                self.character(base).is_some() && self.emotion(emotion).is_some()
            }
            _ => false,
        }
    }

    /// Every valid character code with its asset name, sorted by code.
    pub fn combinations(&self) -> Vec<(String, String)> {
        let mut out = Vec::with_capacity(self.characters.len() * self.emotions.len());
        for (base_sym, base_id) in &self.characters {
            for (emotion_sym, emotion_id) in &self.emotions {
                out.push((
                    format!("{base_sym}{emotion_sym}"),
                    format!("{base_id}_{emotion_id}"),
                ));
            }
        }
        out
    }

    /// Reject tables that would decode ambiguously.
    pub fn validate(&self) -> SceneResult<()> {
        check_single_symbol_keys("characters", self.characters.keys())?;
        check_single_symbol_keys("emotions", self.emotions.keys())?;
        check_single_symbol_keys("backgrounds", self.backgrounds.keys())?;
        check_single_symbol_keys("positions", self.positions.keys())?;

        let wildcard = self.wildcard.to_string();
        for (name, hit) in [
            ("characters", self.characters.contains_key(&wildcard)),
            ("backgrounds", self.backgrounds.contains_key(&wildcard)),
            ("positions", self.positions.contains_key(&wildcard)),
        ] {
            if hit {
                return Err(SceneError::validation(format!(
                    "wildcard symbol '{wildcard}' must not be a key in the {name} table"
                )));
            }
        }

        check_unique_values("characters", self.characters.values())?;
        check_unique_values("emotions", self.emotions.values())?;
        check_unique_values("backgrounds", self.backgrounds.values())?;
        let mut slots = self.positions.values().copied().collect::<Vec<_>>();
        slots.sort();
        if slots.windows(2).any(|w| w[0] == w[1]) {
            return Err(SceneError::validation(
                "positions table maps two symbols to the same slot",
            ));
        }
        Ok(())
    }
}

fn lookup(table: &BTreeMap<String, String>, symbol: char) -> Option<&str> {
    let mut buf = [0u8; 4];
    table
        .get(symbol.encode_utf8(&mut buf) as &str)
        .map(String::as_str)
}

fn reverse_lookup<'a>(table: &'a BTreeMap<String, String>, id: &str) -> Option<&'a str> {
    table
        .iter()
        .find(|(_, v)| v.as_str() == id)
        .map(|(k, _)| k.as_str())
}

fn check_single_symbol_keys<'a>(
    name: &str,
    keys: impl Iterator<Item = &'a String>,
) -> SceneResult<()> {
    for key in keys {
        if key.chars().count() != 1 {
            return Err(SceneError::validation(format!(
                "{name} table key '{key}' must be exactly one symbol"
            )));
        }
    }
    Ok(())
}

fn check_unique_values<'a>(
    name: &str,
    values: impl Iterator<Item = &'a String>,
) -> SceneResult<()> {
    let mut seen = std::collections::BTreeSet::new();
    for v in values {
        if v.is_empty() {
            return Err(SceneError::validation(format!(
                "{name} table contains an empty id"
            )));
        }
        if !seen.insert(v.as_str()) {
            return Err(SceneError::validation(format!(
                "{name} table maps two symbols to id '{v}'"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/codes/tables.rs"]
mod tests;
