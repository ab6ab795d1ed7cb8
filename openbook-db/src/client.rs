use crate::record::{CommentRecord, EmojiRecord, InviteRecord, PostRecord, ReactionRecord};
use openbook_common::config::OpenbookConfig;
use openbook_common::model::emoji::{Emoji, EmojiMarker, NewEmoji};
use openbook_common::model::invite::{InviteMarker, UserInvite};
use openbook_common::model::post::{
    CommentMarker, NewComment, NewPost, NewReaction, Post, PostComment, PostImage, PostMarker,
    PostReaction, PostText, ReactionMarker,
};
use openbook_common::model::{Id, ModelValidationError};
use sqlx::PgPool;
use thiserror::Error;
use time::OffsetDateTime;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// The outcome of counting one moderation report.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct ReportOutcome {
    pub reports_count: u32,
    pub is_globally_hidden: bool,
}

const SELECT_POST: &str = "
    SELECT posts.id, posts.creator_id, posts.text, posts.language_code,
           post_images.location AS image_location,
           post_images.content_type AS image_content_type,
           posts.reports_count, posts.is_globally_hidden, posts.created
    FROM posts
    LEFT JOIN post_images ON post_images.post_id = posts.id
";

pub struct DbClient {
    pool: PgPool,
    config: OpenbookConfig,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool, config: OpenbookConfig) -> Self {
        Self { pool, config }
    }

    pub async fn connect(config: OpenbookConfig) -> Result<Self> {
        let pool = PgPool::connect(&config.database_url).await?;
        Ok(Self::new(pool, config))
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Persists a post, its optional image and its audience rows in one
    /// transaction. Nothing is left behind if any insert fails.
    pub async fn create_post(
        &self,
        post: &NewPost,
        image: Option<&PostImage>,
    ) -> Result<Id<PostMarker>> {
        let mut tx = self.pool.begin().await?;

        let post_id: i64 = sqlx::query_scalar(
            "
            INSERT INTO posts (creator_id, text, language_code, created)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(post.creator.get().cast_signed())
        .bind(post.text.get())
        .bind(post.language.as_ref().map(|language| language.get()))
        .bind(OffsetDateTime::from(post.created()))
        .fetch_one(&mut *tx)
        .await?;

        if let Some(image) = image {
            sqlx::query(
                "
                INSERT INTO post_images (post_id, location, content_type)
                VALUES ($1, $2, $3)
                ",
            )
            .bind(post_id)
            .bind(&image.location.0)
            .bind(&image.content_type)
            .execute(&mut *tx)
            .await?;
        }

        for circle in post.audience.get() {
            sqlx::query(
                "
                INSERT INTO posts_circles (post_id, circle_id)
                VALUES ($1, $2)
                ",
            )
            .bind(post_id)
            .bind(circle.get().cast_signed())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(post_id.cast_unsigned().into())
    }

    pub async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let record = sqlx::query_as::<_, PostRecord>(&format!("{SELECT_POST} WHERE posts.id = $1"))
            .bind(post_id.get().cast_signed())
            .fetch_optional(&self.pool)
            .await?;

        let post = record
            .map(|record| record.into_post(&self.config))
            .transpose()?;
        Ok(post)
    }

    /// Default listing: globally hidden posts are excluded.
    pub async fn list_visible_posts(&self) -> Result<Vec<Post>> {
        let records = sqlx::query_as::<_, PostRecord>(&format!(
            "{SELECT_POST} WHERE NOT posts.is_globally_hidden ORDER BY posts.created DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        records
            .into_iter()
            .map(|record| record.into_post(&self.config).map_err(DbError::from))
            .collect()
    }

    /// Edits never touch the creation stamp; only the text column is updated.
    pub async fn update_post_text(
        &self,
        post_id: Id<PostMarker>,
        text: &PostText,
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE posts SET text = $2 WHERE id = $1")
            .bind(post_id.get().cast_signed())
            .bind(text.get())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn create_comment(&self, comment: &NewComment) -> Result<Id<CommentMarker>> {
        let comment_id: i64 = sqlx::query_scalar(
            "
            INSERT INTO post_comments (post_id, commenter_id, text, created)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(comment.post.get().cast_signed())
        .bind(comment.commenter.get().cast_signed())
        .bind(comment.text.get())
        .bind(OffsetDateTime::from(comment.created()))
        .fetch_one(&self.pool)
        .await?;

        Ok(comment_id.cast_unsigned().into())
    }

    pub async fn fetch_post_comments(&self, post_id: Id<PostMarker>) -> Result<Vec<PostComment>> {
        let records = sqlx::query_as::<_, CommentRecord>(
            "
            SELECT id, post_id, commenter_id, text, reports_count, is_globally_hidden, created
            FROM post_comments
            WHERE post_id = $1 AND NOT is_globally_hidden
            ORDER BY created
            ",
        )
        .bind(post_id.get().cast_signed())
        .fetch_all(&self.pool)
        .await?;

        records
            .into_iter()
            .map(|record| record.into_comment(&self.config).map_err(DbError::from))
            .collect()
    }

    pub async fn create_reaction(&self, reaction: &NewReaction) -> Result<Id<ReactionMarker>> {
        let reaction_id: i64 = sqlx::query_scalar(
            "
            INSERT INTO post_reactions (post_id, reactor_id, emoji_id, created)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(reaction.post.get().cast_signed())
        .bind(reaction.reactor.get().cast_signed())
        .bind(reaction.emoji.get().cast_signed())
        .bind(OffsetDateTime::from(reaction.created()))
        .fetch_one(&self.pool)
        .await?;

        Ok(reaction_id.cast_unsigned().into())
    }

    pub async fn fetch_post_reactions(&self, post_id: Id<PostMarker>) -> Result<Vec<PostReaction>> {
        let records = sqlx::query_as::<_, ReactionRecord>(
            "
            SELECT id, post_id, reactor_id, emoji_id, created
            FROM post_reactions
            WHERE post_id = $1
            ORDER BY created
            ",
        )
        .bind(post_id.get().cast_signed())
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(PostReaction::from).collect())
    }

    /// Counts a report atomically; the hidden flag flips in the same
    /// statement once the configured threshold is reached and never unflips.
    pub async fn report_post(&self, post_id: Id<PostMarker>) -> Result<Option<ReportOutcome>> {
        self.count_report("posts", post_id.get()).await
    }

    pub async fn report_comment(
        &self,
        comment_id: Id<CommentMarker>,
    ) -> Result<Option<ReportOutcome>> {
        self.count_report("post_comments", comment_id.get()).await
    }

    async fn count_report(&self, table: &str, id: u64) -> Result<Option<ReportOutcome>> {
        let threshold = i64::from(self.config.global_hide_content_after_reports_amount);

        let row: Option<(i32, bool)> = sqlx::query_as(&format!(
            "
            UPDATE {table}
            SET reports_count = reports_count + 1,
                is_globally_hidden = is_globally_hidden OR reports_count + 1 >= $2
            WHERE id = $1
            RETURNING reports_count, is_globally_hidden
            "
        ))
        .bind(id.cast_signed())
        .bind(threshold)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(reports_count, is_globally_hidden)| ReportOutcome {
            reports_count: reports_count.cast_unsigned(),
            is_globally_hidden,
        }))
    }

    pub async fn create_emoji(&self, emoji: &NewEmoji) -> Result<Id<EmojiMarker>> {
        let emoji_id: i64 = sqlx::query_scalar(
            "
            INSERT INTO emojis (name, shortcut, color, icon, created)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(&emoji.name)
        .bind(&emoji.shortcut)
        .bind(emoji.color.get())
        .bind(&emoji.icon.0)
        .bind(OffsetDateTime::from(emoji.created()))
        .fetch_one(&self.pool)
        .await?;

        Ok(emoji_id.cast_unsigned().into())
    }

    pub async fn list_emojis(&self) -> Result<Vec<Emoji>> {
        let records = sqlx::query_as::<_, EmojiRecord>(
            "SELECT id, name, shortcut, color, icon, created FROM emojis ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        records
            .into_iter()
            .map(|record| Emoji::try_from(record).map_err(DbError::from))
            .collect()
    }

    /// `failed_only` restricts the sweep to invites whose email was never
    /// confirmed sent.
    pub async fn list_invites(&self, failed_only: bool) -> Result<Vec<UserInvite>> {
        let sql = if failed_only {
            "
            SELECT id, email, name, is_invite_email_sent, created
            FROM user_invites
            WHERE NOT is_invite_email_sent
            ORDER BY id
            "
        } else {
            "
            SELECT id, email, name, is_invite_email_sent, created
            FROM user_invites
            ORDER BY id
            "
        };

        let records = sqlx::query_as::<_, InviteRecord>(sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(records.into_iter().map(UserInvite::from).collect())
    }

    pub async fn mark_invite_sent(&self, invite_id: Id<InviteMarker>) -> Result<()> {
        sqlx::query("UPDATE user_invites SET is_invite_email_sent = TRUE WHERE id = $1")
            .bind(invite_id.get().cast_signed())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
