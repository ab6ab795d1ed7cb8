//! Post, comment and reaction entities.
//!
//! Creation timestamps are stamp-once: the `compose` factories set `created`
//! at construction and no update path can reach the field again. The
//! persistence layer rebuilds entities with their stored stamp through
//! [`Post::rehydrate`] and friends.

use crate::model::{Id, circle::CircleMarker, emoji::EmojiMarker, user::UserMarker};
use serde::{Deserialize, Deserializer, Serialize, de::Error, de::Unexpected};
use thiserror::Error;
use time::UtcDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CommentMarker;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct ReactionMarker;

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
pub enum InvalidTextError {
    #[default]
    #[error("The text must not be empty.")]
    Empty,
    #[error("The text is {len} characters long, the maximum is {max}.")]
    TooLong { len: usize, max: usize },
}

/// Post body, bounded by the configured `post_max_length`.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct PostText(String);

impl PostText {
    pub fn new(text: String, max_chars: usize) -> Result<Self, InvalidTextError> {
        validate_text(&text, max_chars)?;
        Ok(PostText(text))
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Comment body, bounded by the configured `post_comment_max_length`.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct CommentText(String);

impl CommentText {
    pub fn new(text: String, max_chars: usize) -> Result<Self, InvalidTextError> {
        validate_text(&text, max_chars)?;
        Ok(CommentText(text))
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

fn validate_text(text: &str, max_chars: usize) -> Result<(), InvalidTextError> {
    if text.is_empty() {
        return Err(InvalidTextError::Empty);
    }
    let len = text.chars().count();
    if len > max_chars {
        return Err(InvalidTextError::TooLong {
            len,
            max: max_chars,
        });
    }
    Ok(())
}

pub const LANGUAGE_CODE_MAX_LEN: usize = 10;

/// BCP 47 style language tag, e.g. `en` or `pt-br`.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct LanguageCode(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The language code is invalid: {0}")]
pub struct InvalidLanguageCodeError(String);

impl LanguageCode {
    pub fn new(code: String) -> Result<Self, InvalidLanguageCodeError> {
        let well_formed = !code.is_empty()
            && code.len() <= LANGUAGE_CODE_MAX_LEN
            && code
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if well_formed {
            Ok(LanguageCode(code))
        } else {
            Err(InvalidLanguageCodeError(code))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for LanguageCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        LanguageCode::new(inner)
            .map_err(|err| Error::invalid_value(Unexpected::Str(&err.0), &"LanguageCode"))
    }
}

/// Non-empty set of circles a post is shared with.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct AudienceCircles(Vec<Id<CircleMarker>>);

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("A post must be shared with at least one circle.")]
pub struct EmptyAudienceError;

impl AudienceCircles {
    pub fn new(mut circles: Vec<Id<CircleMarker>>) -> Result<Self, EmptyAudienceError> {
        circles.sort_unstable();
        circles.dedup();
        if circles.is_empty() {
            Err(EmptyAudienceError)
        } else {
            Ok(AudienceCircles(circles))
        }
    }

    #[must_use]
    pub fn get(&self) -> &[Id<CircleMarker>] {
        &self.0
    }
}

/// Where uploaded media bytes ended up: a filesystem path or an object key,
/// opaque to everything but the storage backend that produced it.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaLocation(pub String);

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct PostImage {
    pub location: MediaLocation,
    pub content_type: String,
}

/// A post as composed by its creator, before it has a database id.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct NewPost {
    pub creator: Id<UserMarker>,
    pub text: PostText,
    pub language: Option<LanguageCode>,
    pub audience: AudienceCircles,
    created: UtcDateTime,
}

impl NewPost {
    /// Stamps `created` exactly once. There is no other way to obtain one.
    #[must_use]
    pub fn compose(
        creator: Id<UserMarker>,
        text: PostText,
        language: Option<LanguageCode>,
        audience: AudienceCircles,
    ) -> Self {
        Self {
            creator,
            text,
            language,
            audience,
            created: UtcDateTime::now(),
        }
    }

    #[must_use]
    pub fn created(&self) -> UtcDateTime {
        self.created
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub creator: Id<UserMarker>,
    pub text: PostText,
    pub language: Option<LanguageCode>,
    pub image: Option<PostImage>,
    pub reports_count: u32,
    pub is_globally_hidden: bool,
    created: UtcDateTime,
}

impl Post {
    /// Rebuilds a persisted post with its stored creation stamp. Persistence
    /// only; creation goes through [`NewPost::compose`].
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn rehydrate(
        id: Id<PostMarker>,
        creator: Id<UserMarker>,
        text: PostText,
        language: Option<LanguageCode>,
        image: Option<PostImage>,
        reports_count: u32,
        is_globally_hidden: bool,
        created: UtcDateTime,
    ) -> Self {
        Self {
            id,
            creator,
            text,
            language,
            image,
            reports_count,
            is_globally_hidden,
            created,
        }
    }

    #[must_use]
    pub fn created(&self) -> UtcDateTime {
        self.created
    }

    /// The only mutation an edit may perform; `created` stays untouched.
    pub fn edit_text(&mut self, text: PostText) {
        self.text = text;
    }

    /// Counts a moderation report and hides the post once the configured
    /// threshold is reached.
    pub fn register_report(&mut self, hide_threshold: u32) {
        self.reports_count += 1;
        if self.reports_count >= hide_threshold {
            self.is_globally_hidden = true;
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct NewComment {
    pub post: Id<PostMarker>,
    pub commenter: Id<UserMarker>,
    pub text: CommentText,
    created: UtcDateTime,
}

impl NewComment {
    #[must_use]
    pub fn compose(post: Id<PostMarker>, commenter: Id<UserMarker>, text: CommentText) -> Self {
        Self {
            post,
            commenter,
            text,
            created: UtcDateTime::now(),
        }
    }

    #[must_use]
    pub fn created(&self) -> UtcDateTime {
        self.created
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct PostComment {
    pub id: Id<CommentMarker>,
    pub post: Id<PostMarker>,
    pub commenter: Id<UserMarker>,
    pub text: CommentText,
    pub reports_count: u32,
    pub is_globally_hidden: bool,
    created: UtcDateTime,
}

impl PostComment {
    /// Persistence-only counterpart of [`NewComment::compose`].
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn rehydrate(
        id: Id<CommentMarker>,
        post: Id<PostMarker>,
        commenter: Id<UserMarker>,
        text: CommentText,
        reports_count: u32,
        is_globally_hidden: bool,
        created: UtcDateTime,
    ) -> Self {
        Self {
            id,
            post,
            commenter,
            text,
            reports_count,
            is_globally_hidden,
            created,
        }
    }

    #[must_use]
    pub fn created(&self) -> UtcDateTime {
        self.created
    }

    pub fn edit_text(&mut self, text: CommentText) {
        self.text = text;
    }

    pub fn register_report(&mut self, hide_threshold: u32) {
        self.reports_count += 1;
        if self.reports_count >= hide_threshold {
            self.is_globally_hidden = true;
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct NewReaction {
    pub post: Id<PostMarker>,
    pub reactor: Id<UserMarker>,
    pub emoji: Id<EmojiMarker>,
    created: UtcDateTime,
}

impl NewReaction {
    #[must_use]
    pub fn compose(
        post: Id<PostMarker>,
        reactor: Id<UserMarker>,
        emoji: Id<EmojiMarker>,
    ) -> Self {
        Self {
            post,
            reactor,
            emoji,
            created: UtcDateTime::now(),
        }
    }

    #[must_use]
    pub fn created(&self) -> UtcDateTime {
        self.created
    }
}

/// Exactly one emoji per reaction; reacting again replaces, not extends.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct PostReaction {
    pub id: Id<ReactionMarker>,
    pub post: Id<PostMarker>,
    pub reactor: Id<UserMarker>,
    pub emoji: Id<EmojiMarker>,
    created: UtcDateTime,
}

impl PostReaction {
    #[must_use]
    pub fn rehydrate(
        id: Id<ReactionMarker>,
        post: Id<PostMarker>,
        reactor: Id<UserMarker>,
        emoji: Id<EmojiMarker>,
        created: UtcDateTime,
    ) -> Self {
        Self {
            id,
            post,
            reactor,
            emoji,
            created,
        }
    }

    #[must_use]
    pub fn created(&self) -> UtcDateTime {
        self.created
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{
        Id,
        post::{
            AudienceCircles, CommentText, InvalidTextError, LanguageCode, NewPost, Post, PostText,
        },
    };
    use time::macros::utc_datetime;

    fn audience() -> AudienceCircles {
        AudienceCircles::new(vec![Id::new(1)]).unwrap()
    }

    #[test]
    fn text_bounds() {
        assert!(PostText::new("hello world".to_owned(), 5000).is_ok());
        assert_eq!(
            PostText::new(String::new(), 5000),
            Err(InvalidTextError::Empty)
        );
        assert_eq!(
            PostText::new("a".repeat(5001), 5000),
            Err(InvalidTextError::TooLong {
                len: 5001,
                max: 5000
            })
        );

        assert!(CommentText::new("a".repeat(1500), 1500).is_ok());
        assert!(CommentText::new("a".repeat(1501), 1500).is_err());
    }

    #[test]
    fn text_bound_counts_chars_not_bytes() {
        assert!(PostText::new("ü".repeat(10), 10).is_ok());
    }

    #[test]
    fn language_codes() {
        assert!(LanguageCode::new("en".to_owned()).is_ok());
        assert!(LanguageCode::new("pt-br".to_owned()).is_ok());
        assert!(LanguageCode::new(String::new()).is_err());
        assert!(LanguageCode::new("EN".to_owned()).is_err());
        assert!(LanguageCode::new("much-too-long-tag".to_owned()).is_err());
    }

    #[test]
    fn audience_must_not_be_empty() {
        assert!(AudienceCircles::new(vec![]).is_err());
        assert!(AudienceCircles::new(vec![Id::new(1), Id::new(2)]).is_ok());
    }

    #[test]
    fn audience_dedups() {
        let audience = AudienceCircles::new(vec![Id::new(2), Id::new(1), Id::new(2)]).unwrap();
        assert_eq!(audience.get(), &[Id::new(1), Id::new(2)]);
    }

    #[test]
    fn compose_stamps_created() {
        let before = time::UtcDateTime::now();
        let new_post = NewPost::compose(
            Id::new(7),
            PostText::new("hi".to_owned(), 5000).unwrap(),
            None,
            audience(),
        );
        let after = time::UtcDateTime::now();

        assert!(new_post.created() >= before);
        assert!(new_post.created() <= after);
    }

    #[test]
    fn edit_does_not_touch_created() {
        let created = utc_datetime!(2019-06-20 11:57);
        let mut post = Post::rehydrate(
            Id::new(1),
            Id::new(7),
            PostText::new("original".to_owned(), 5000).unwrap(),
            None,
            None,
            0,
            false,
            created,
        );

        post.edit_text(PostText::new("edited".to_owned(), 5000).unwrap());

        assert_eq!(post.text.get(), "edited");
        assert_eq!(post.created(), created);
    }

    #[test]
    fn report_threshold_hides_exactly_at_threshold() {
        let mut post = Post::rehydrate(
            Id::new(1),
            Id::new(7),
            PostText::new("reported".to_owned(), 5000).unwrap(),
            None,
            None,
            0,
            false,
            utc_datetime!(2019-06-20 11:57),
        );

        for _ in 0..19 {
            post.register_report(20);
        }
        assert_eq!(post.reports_count, 19);
        assert!(!post.is_globally_hidden);

        post.register_report(20);
        assert_eq!(post.reports_count, 20);
        assert!(post.is_globally_hidden);
    }
}
