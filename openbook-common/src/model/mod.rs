pub mod circle;
pub mod emoji;
pub mod invite;
pub mod post;
pub mod user;

use crate::model::{
    emoji::InvalidEmojiColorError,
    post::{EmptyAudienceError, InvalidLanguageCodeError, InvalidTextError},
};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, marker::PhantomData};
use thiserror::Error;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ModelValidationError {
    #[error(transparent)]
    Text(#[from] InvalidTextError),
    #[error(transparent)]
    Audience(#[from] EmptyAudienceError),
    #[error(transparent)]
    EmojiColor(#[from] InvalidEmojiColorError),
    #[error(transparent)]
    LanguageCode(#[from] InvalidLanguageCodeError),
}

/// Database-assigned id, tagged with a marker type so that e.g. a post id
/// cannot be passed where a circle id is expected.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Id<Marker>(u64, #[serde(skip)] PhantomData<Marker>);

impl<Marker> Id<Marker> {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id, PhantomData)
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<Marker> From<u64> for Id<Marker> {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl<Marker> From<Id<Marker>> for u64 {
    fn from(value: Id<Marker>) -> Self {
        value.get()
    }
}
