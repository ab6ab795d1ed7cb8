//! Row-shaped structs and their conversions into domain models.
//!
//! Text and color fields are re-validated on the way out so that a corrupted
//! row surfaces as an error instead of leaking an invalid value.

use openbook_common::config::OpenbookConfig;
use openbook_common::model::ModelValidationError;
use openbook_common::model::emoji::{Emoji, EmojiColor};
use openbook_common::model::invite::UserInvite;
use openbook_common::model::post::{
    CommentText, LanguageCode, MediaLocation, Post, PostComment, PostImage, PostReaction, PostText,
};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Clone, Debug, FromRow)]
pub struct PostRecord {
    pub id: i64,
    pub creator_id: i64,
    pub text: String,
    pub language_code: Option<String>,
    pub image_location: Option<String>,
    pub image_content_type: Option<String>,
    pub reports_count: i32,
    pub is_globally_hidden: bool,
    pub created: OffsetDateTime,
}

impl PostRecord {
    pub fn into_post(self, config: &OpenbookConfig) -> Result<Post, ModelValidationError> {
        let text = PostText::new(self.text, config.post_max_length)?;
        let language = self.language_code.map(LanguageCode::new).transpose()?;
        let image = match (self.image_location, self.image_content_type) {
            (Some(location), Some(content_type)) => Some(PostImage {
                location: MediaLocation(location),
                content_type,
            }),
            _ => None,
        };

        Ok(Post::rehydrate(
            self.id.cast_unsigned().into(),
            self.creator_id.cast_unsigned().into(),
            text,
            language,
            image,
            self.reports_count.cast_unsigned(),
            self.is_globally_hidden,
            self.created.to_utc(),
        ))
    }
}

#[derive(Clone, Debug, FromRow)]
pub struct CommentRecord {
    pub id: i64,
    pub post_id: i64,
    pub commenter_id: i64,
    pub text: String,
    pub reports_count: i32,
    pub is_globally_hidden: bool,
    pub created: OffsetDateTime,
}

impl CommentRecord {
    pub fn into_comment(
        self,
        config: &OpenbookConfig,
    ) -> Result<PostComment, ModelValidationError> {
        let text = CommentText::new(self.text, config.post_comment_max_length)?;

        Ok(PostComment::rehydrate(
            self.id.cast_unsigned().into(),
            self.post_id.cast_unsigned().into(),
            self.commenter_id.cast_unsigned().into(),
            text,
            self.reports_count.cast_unsigned(),
            self.is_globally_hidden,
            self.created.to_utc(),
        ))
    }
}

#[derive(Clone, Debug, FromRow)]
pub struct ReactionRecord {
    pub id: i64,
    pub post_id: i64,
    pub reactor_id: i64,
    pub emoji_id: i64,
    pub created: OffsetDateTime,
}

impl From<ReactionRecord> for PostReaction {
    fn from(value: ReactionRecord) -> Self {
        PostReaction::rehydrate(
            value.id.cast_unsigned().into(),
            value.post_id.cast_unsigned().into(),
            value.reactor_id.cast_unsigned().into(),
            value.emoji_id.cast_unsigned().into(),
            value.created.to_utc(),
        )
    }
}

#[derive(Clone, Debug, FromRow)]
pub struct EmojiRecord {
    pub id: i64,
    pub name: String,
    pub shortcut: String,
    pub color: String,
    pub icon: String,
    pub created: OffsetDateTime,
}

impl TryFrom<EmojiRecord> for Emoji {
    type Error = ModelValidationError;

    fn try_from(value: EmojiRecord) -> Result<Self, Self::Error> {
        let color = EmojiColor::new(value.color)?;

        Ok(Emoji::rehydrate(
            value.id.cast_unsigned().into(),
            value.name,
            value.shortcut,
            color,
            MediaLocation(value.icon),
            value.created.to_utc(),
        ))
    }
}

#[derive(Clone, Debug, FromRow)]
pub struct InviteRecord {
    pub id: i64,
    pub email: Option<String>,
    pub name: Option<String>,
    pub is_invite_email_sent: bool,
    pub created: OffsetDateTime,
}

impl From<InviteRecord> for UserInvite {
    fn from(value: InviteRecord) -> Self {
        UserInvite {
            id: value.id.cast_unsigned().into(),
            email: value.email,
            name: value.name,
            is_invite_email_sent: value.is_invite_email_sent,
            created: value.created.to_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::record::{EmojiRecord, PostRecord};
    use openbook_common::config::{Environment, OpenbookConfig};
    use openbook_common::model::emoji::Emoji;
    use time::macros::datetime;

    fn config() -> OpenbookConfig {
        OpenbookConfig::with_defaults(Environment::Test, "postgres://".to_owned())
    }

    fn post_record() -> PostRecord {
        PostRecord {
            id: 3,
            creator_id: 9,
            text: "hello".to_owned(),
            language_code: Some("en".to_owned()),
            image_location: None,
            image_content_type: None,
            reports_count: 2,
            is_globally_hidden: false,
            created: datetime!(2019-06-20 11:57 UTC),
        }
    }

    #[test]
    fn post_record_roundtrips_fields() {
        let post = post_record().into_post(&config()).unwrap();

        assert_eq!(post.id.get(), 3);
        assert_eq!(post.creator.get(), 9);
        assert_eq!(post.text.get(), "hello");
        assert_eq!(post.language.as_ref().unwrap().get(), "en");
        assert!(post.image.is_none());
        assert_eq!(post.reports_count, 2);
        assert_eq!(post.created(), datetime!(2019-06-20 11:57 UTC).to_utc());
    }

    #[test]
    fn image_columns_become_post_image() {
        let mut record = post_record();
        record.image_location = Some("media/post-images/3.png".to_owned());
        record.image_content_type = Some("image/png".to_owned());

        let post = record.into_post(&config()).unwrap();
        let image = post.image.unwrap();
        assert_eq!(image.location.0, "media/post-images/3.png");
        assert_eq!(image.content_type, "image/png");
    }

    #[test]
    fn corrupted_color_is_rejected() {
        let record = EmojiRecord {
            id: 1,
            name: "thumbs up".to_owned(),
            shortcut: "+1".to_owned(),
            color: "not-a-color".to_owned(),
            icon: "media/emojis/1.png".to_owned(),
            created: datetime!(2019-06-20 11:57 UTC),
        };

        assert!(Emoji::try_from(record).is_err());
    }
}
