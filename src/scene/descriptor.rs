use crate::{
    codes::tables::CodeTables,
    foundation::core::Slot,
    layout::resolver::{LayoutMode, select_layout_mode},
};

/// Delimiter between the five positional fragments of a scene code.
pub const FRAGMENT_DELIMITER: char = '.';

/// A present character: base identity plus emotion.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CharacterRef {
    /// Base character id, e.g. `girlA`.
    pub base_id: String,
    /// Emotion id, e.g. `smile`.
    pub emotion_id: String,
}

impl CharacterRef {
    /// Asset name used for addressing the sprite: `"{base}_{emotion}"`.
    pub fn asset_name(&self) -> String {
        format!("{}_{}", self.base_id, self.emotion_id)
    }
}

/// Canonical decoded scene request.
///
/// Constructed fresh per request; immutable afterwards. Two raw codes that decode to equal
/// descriptors are the same scene.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SceneDescriptor {
    /// Character in the left slot.
    pub left: Option<CharacterRef>,
    /// Character in the center slot.
    pub center: Option<CharacterRef>,
    /// Character in the right slot.
    pub right: Option<CharacterRef>,
    /// Background id.
    pub background: Option<String>,
    /// Highlighted slot. May name an empty slot, in which case nothing is highlighted.
    pub active: Option<Slot>,
}

impl SceneDescriptor {
    /// Decode a positional scene code (`"{left}.{center}.{right}.{bg}.{active}"`).
    ///
    /// Total: every malformed fragment degrades to an absent field, never an error.
    pub fn decode(raw: &str, tables: &CodeTables) -> Self {
        let mut fragments = raw.split(FRAGMENT_DELIMITER);
        let mut next = || fragments.next().unwrap_or("");

        let left = decode_character(next(), tables);
        let center = decode_character(next(), tables);
        let right = decode_character(next(), tables);
        let background = decode_background(next(), tables);
        let active = decode_active(next(), tables);

        Self {
            left,
            center,
            right,
            background,
            active,
        }
    }

    /// Character in `slot`, if any.
    pub fn character(&self, slot: Slot) -> Option<&CharacterRef> {
        match slot {
            Slot::Left => self.left.as_ref(),
            Slot::Center => self.center.as_ref(),
            Slot::Right => self.right.as_ref(),
        }
    }

    /// Occupied slots in left-center-right order.
    pub fn present(&self) -> impl Iterator<Item = (Slot, &CharacterRef)> {
        Slot::ALL
            .into_iter()
            .filter_map(|slot| self.character(slot).map(|c| (slot, c)))
    }

    /// Number of occupied slots.
    pub fn present_count(&self) -> usize {
        self.present().count()
    }

    /// Active slot only when it names an occupied slot.
    pub fn effective_active(&self) -> Option<Slot> {
        self.active.filter(|slot| self.character(*slot).is_some())
    }

    /// Layout mode implied by which slots are occupied.
    pub fn layout_mode(&self) -> LayoutMode {
        select_layout_mode(
            self.left.is_some(),
            self.center.is_some(),
            self.right.is_some(),
        )
    }

    /// Canonical scene code for this descriptor.
    ///
    /// Absent characters are written as the wildcard; absent background/active as empty
    /// fragments. Returns `None` if an id has no symbol in `tables`.
    pub fn to_code(&self, tables: &CodeTables) -> Option<String> {
        let mut parts = Vec::with_capacity(5);
        for slot in Slot::ALL {
            match self.character(slot) {
                Some(c) => {
                    let base = tables.character_symbol(&c.base_id)?;
                    let emotion = tables.emotion_symbol(&c.emotion_id)?;
                    parts.push(format!("{base}{emotion}"));
                }
                None => parts.push(tables.wildcard.to_string()),
            }
        }
        parts.push(match &self.background {
            Some(bg) => tables.background_symbol(bg)?.to_string(),
            None => String::new(),
        });
        parts.push(match self.active {
            Some(slot) => tables.position_symbol(slot)?.to_string(),
            None => String::new(),
        });
        Some(parts.join(&FRAGMENT_DELIMITER.to_string()))
    }
}

fn decode_character(fragment: &str, tables: &CodeTables) -> Option<CharacterRef> {
    if tables.is_wildcard(fragment) {
        return None;
    }
    let mut symbols = fragment.chars();
    let base_id = tables.character(symbols.next()?)?;
    let emotion_id = tables.emotion(symbols.next()?)?;
    Some(CharacterRef {
        base_id: base_id.to_string(),
        emotion_id: emotion_id.to_string(),
    })
}

fn decode_background(fragment: &str, tables: &CodeTables) -> Option<String> {
    if tables.is_wildcard(fragment) {
        return None;
    }
    tables.background(fragment).map(str::to_string)
}

fn decode_active(fragment: &str, tables: &CodeTables) -> Option<Slot> {
    if tables.is_wildcard(fragment) {
        return None;
    }
    tables.position(fragment)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/descriptor.rs"]
mod tests;
