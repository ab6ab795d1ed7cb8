use crate::model::{Id, post::MediaLocation};
use serde::{Deserialize, Deserializer, Serialize, de::Error, de::Unexpected};
use thiserror::Error;
use time::UtcDateTime;

pub const EMOJI_COLOR_LEN: usize = 7;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct EmojiMarker;

/// Catalog entry users react with.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct Emoji {
    pub id: Id<EmojiMarker>,
    pub name: String,
    pub shortcut: String,
    pub color: EmojiColor,
    pub icon: MediaLocation,
    created: UtcDateTime,
}

impl Emoji {
    /// Persistence-only; new catalog entries go through [`NewEmoji::compose`].
    #[must_use]
    pub fn rehydrate(
        id: Id<EmojiMarker>,
        name: String,
        shortcut: String,
        color: EmojiColor,
        icon: MediaLocation,
        created: UtcDateTime,
    ) -> Self {
        Self {
            id,
            name,
            shortcut,
            color,
            icon,
            created,
        }
    }

    #[must_use]
    pub fn created(&self) -> UtcDateTime {
        self.created
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct NewEmoji {
    pub name: String,
    pub shortcut: String,
    pub color: EmojiColor,
    pub icon: MediaLocation,
    created: UtcDateTime,
}

impl NewEmoji {
    #[must_use]
    pub fn compose(name: String, shortcut: String, color: EmojiColor, icon: MediaLocation) -> Self {
        Self {
            name,
            shortcut,
            color,
            icon,
            created: UtcDateTime::now(),
        }
    }

    #[must_use]
    pub fn created(&self) -> UtcDateTime {
        self.created
    }
}

/// Display color in strict `#RRGGBB` form: a `#` followed by exactly six
/// hexadecimal digits, seven characters total.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct EmojiColor(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The color is not a #RRGGBB hex code: {0}")]
pub struct InvalidEmojiColorError(String);

impl EmojiColor {
    pub fn new(color: String) -> Result<Self, InvalidEmojiColorError> {
        let mut chars = color.chars();
        let well_formed = color.len() == EMOJI_COLOR_LEN
            && chars.next() == Some('#')
            && chars.all(|c| c.is_ascii_hexdigit());
        if well_formed {
            Ok(EmojiColor(color))
        } else {
            Err(InvalidEmojiColorError(color))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for EmojiColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        EmojiColor::new(inner)
            .map_err(|err| Error::invalid_value(Unexpected::Str(&err.0), &"EmojiColor"))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::emoji::EmojiColor;

    #[test]
    fn accepts_strict_hex_codes() {
        for legal in ["#000000", "#FFFFFF", "#ffffff", "#1A2b3C"] {
            assert!(EmojiColor::new(legal.to_owned()).is_ok(), "{legal}");
        }
    }

    #[test]
    fn rejects_everything_else() {
        let illegal = [
            "",
            "#",
            "#FFF",
            "#FFFFF",
            "#FFFFFFF",
            "FFFFFF",
            "#GGGGGG",
            "##FFFFF",
            " #FFFFFF",
            "#FFFFF ",
            "#ÜFFFFF",
        ];
        for color in illegal {
            assert!(EmojiColor::new(color.to_owned()).is_err(), "{color}");
        }
    }
}
