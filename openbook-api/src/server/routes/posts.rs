use crate::dispatch::{ContentEvent, NotificationDispatcher};
use crate::server::json::Json;
use crate::server::{Actor, Result, ServerError, ServerRouter};
use crate::storage::{MediaStorage, UploadValidationError, media_extension, validate_upload};
use axum::{
    Router,
    extract::{Multipart, State},
    http::StatusCode,
};
use axum_extra::routing::{RouterExt, TypedPath};
use openbook_common::config::OpenbookConfig;
use openbook_common::model::emoji::EmojiMarker;
use openbook_common::model::post::{
    AudienceCircles, CommentMarker, CommentText, LanguageCode, NewComment, NewPost, NewReaction,
    Post, PostComment, PostImage, PostMarker, PostReaction, PostText,
};
use openbook_common::model::{Id, ModelValidationError, circle::CircleMarker};
use openbook_db::client::DbClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    Router::new()
        .typed_post(create_post)
        .typed_get(list_posts)
        .typed_get(get_post)
        .typed_patch(edit_post)
        .typed_post(create_comment)
        .typed_get(get_post_comments)
        .typed_post(create_reaction)
        .typed_get(get_post_reactions)
        .typed_post(report_post)
        .typed_post(report_comment)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts")]
struct PostsPath;

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}", rejection(ServerError))]
struct PostPath {
    id: Id<PostMarker>,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/comments", rejection(ServerError))]
struct PostCommentsPath {
    id: Id<PostMarker>,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/reactions", rejection(ServerError))]
struct PostReactionsPath {
    id: Id<PostMarker>,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/report", rejection(ServerError))]
struct ReportPostPath {
    id: Id<PostMarker>,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/comments/{id}/report", rejection(ServerError))]
struct ReportCommentPath {
    id: Id<CommentMarker>,
}

/// Multipart creation: `text` (required), `circle_ids` (required, comma
/// separated), `language` (optional) and `image` (optional file part).
async fn create_post(
    _: PostsPath,
    actor: Actor,
    State(db): State<Arc<DbClient>>,
    State(storage): State<Arc<MediaStorage>>,
    State(dispatcher): State<Arc<dyn NotificationDispatcher>>,
    State(config): State<Arc<OpenbookConfig>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Post>)> {
    let mut text = None;
    let mut language = None;
    let mut circles = Vec::new();
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("text") => text = Some(field.text().await?),
            Some("language") => {
                let value = field.text().await?;
                if !value.is_empty() {
                    language =
                        Some(LanguageCode::new(value).map_err(ModelValidationError::from)?);
                }
            }
            Some("circle_ids") => {
                let value = field.text().await?;
                circles = parse_circle_ids(&value)?;
            }
            Some("image") => {
                let content_type = field
                    .content_type()
                    .map(ToOwned::to_owned)
                    .ok_or(UploadValidationError::MissingContentType)
                    .map_err(ServerError::Upload)?;
                let bytes = field.bytes().await?;
                upload = Some((content_type, bytes));
            }
            _ => {}
        }
    }

    let text = text.ok_or(ServerError::MissingField("text"))?;
    let text = PostText::new(text, config.post_max_length).map_err(ModelValidationError::from)?;
    let audience = AudienceCircles::new(circles).map_err(ModelValidationError::from)?;

    let new_post = NewPost::compose(actor.user_id(), text, language, audience);

    // Media bytes are written before the database transaction; the post, its
    // image row and its audience rows then commit atomically.
    let image = match upload {
        Some((content_type, bytes)) => {
            validate_upload(&content_type, bytes.len() as u64, &config)?;
            let key = format!(
                "post-images/{}-{}.{}",
                new_post.created().unix_timestamp_nanos(),
                new_post.creator,
                media_extension(&content_type),
            );
            let location = storage.store(&key, &content_type, bytes.to_vec()).await?;
            Some(PostImage {
                location,
                content_type,
            })
        }
        None => None,
    };

    let post_id = db.create_post(&new_post, image.as_ref()).await?;
    dispatcher.enqueue(ContentEvent::PostCreated { post: post_id });

    let post = db
        .fetch_post(post_id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(post_id))?;

    Ok((StatusCode::CREATED, Json(post)))
}

fn parse_circle_ids(value: &str) -> Result<Vec<Id<CircleMarker>>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u64>()
                .map(Id::new)
                .map_err(|_| ServerError::MalformedField("circle_ids"))
        })
        .collect()
}

async fn list_posts(_: PostsPath, State(db): State<Arc<DbClient>>) -> Result<Json<Vec<Post>>> {
    let posts = db.list_visible_posts().await?;
    Ok(Json(posts))
}

async fn get_post(
    PostPath { id }: PostPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Post>> {
    let post = db
        .fetch_post(id)
        .await?
        .filter(|post| !post.is_globally_hidden)
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(Json(post))
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct EditPostBody {
    text: String,
}

async fn edit_post(
    PostPath { id }: PostPath,
    actor: Actor,
    State(db): State<Arc<DbClient>>,
    State(config): State<Arc<OpenbookConfig>>,
    Json(body): Json<EditPostBody>,
) -> Result<Json<Post>> {
    let mut post = db
        .fetch_post(id)
        .await?
        .filter(|post| !post.is_globally_hidden)
        .ok_or(ServerError::PostByIdNotFound(id))?;

    if post.creator != actor.user_id() {
        return Err(ServerError::NotPostCreator(id));
    }

    let text = PostText::new(body.text, config.post_max_length).map_err(ModelValidationError::from)?;
    db.update_post_text(id, &text).await?;
    post.edit_text(text);

    Ok(Json(post))
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct CreateCommentBody {
    text: String,
}

async fn create_comment(
    PostCommentsPath { id }: PostCommentsPath,
    actor: Actor,
    State(db): State<Arc<DbClient>>,
    State(dispatcher): State<Arc<dyn NotificationDispatcher>>,
    State(config): State<Arc<OpenbookConfig>>,
    Json(body): Json<CreateCommentBody>,
) -> Result<(StatusCode, Json<PostComment>)> {
    db.fetch_post(id)
        .await?
        .filter(|post| !post.is_globally_hidden)
        .ok_or(ServerError::PostByIdNotFound(id))?;

    let text = CommentText::new(body.text, config.post_comment_max_length)
        .map_err(ModelValidationError::from)?;
    let new_comment = NewComment::compose(id, actor.user_id(), text);

    let comment_id = db.create_comment(&new_comment).await?;
    dispatcher.enqueue(ContentEvent::CommentCreated {
        post: id,
        comment: comment_id,
    });

    let comment = PostComment::rehydrate(
        comment_id,
        new_comment.post,
        new_comment.commenter,
        new_comment.text.clone(),
        0,
        false,
        new_comment.created(),
    );

    Ok((StatusCode::CREATED, Json(comment)))
}

async fn get_post_comments(
    PostCommentsPath { id }: PostCommentsPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Vec<PostComment>>> {
    db.fetch_post(id)
        .await?
        .filter(|post| !post.is_globally_hidden)
        .ok_or(ServerError::PostByIdNotFound(id))?;

    let comments = db.fetch_post_comments(id).await?;
    Ok(Json(comments))
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct CreateReactionBody {
    emoji_id: Id<EmojiMarker>,
}

async fn create_reaction(
    PostReactionsPath { id }: PostReactionsPath,
    actor: Actor,
    State(db): State<Arc<DbClient>>,
    State(dispatcher): State<Arc<dyn NotificationDispatcher>>,
    Json(body): Json<CreateReactionBody>,
) -> Result<(StatusCode, Json<PostReaction>)> {
    db.fetch_post(id)
        .await?
        .filter(|post| !post.is_globally_hidden)
        .ok_or(ServerError::PostByIdNotFound(id))?;

    let new_reaction = NewReaction::compose(id, actor.user_id(), body.emoji_id);

    let reaction_id = db.create_reaction(&new_reaction).await?;
    dispatcher.enqueue(ContentEvent::ReactionCreated {
        post: id,
        reaction: reaction_id,
    });

    let reaction = PostReaction::rehydrate(
        reaction_id,
        new_reaction.post,
        new_reaction.reactor,
        new_reaction.emoji,
        new_reaction.created(),
    );

    Ok((StatusCode::CREATED, Json(reaction)))
}

async fn get_post_reactions(
    PostReactionsPath { id }: PostReactionsPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Vec<PostReaction>>> {
    db.fetch_post(id)
        .await?
        .filter(|post| !post.is_globally_hidden)
        .ok_or(ServerError::PostByIdNotFound(id))?;

    let reactions = db.fetch_post_reactions(id).await?;
    Ok(Json(reactions))
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct ReportResponse {
    reports_count: u32,
    is_globally_hidden: bool,
}

async fn report_post(
    ReportPostPath { id }: ReportPostPath,
    _actor: Actor,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<ReportResponse>> {
    let outcome = db
        .report_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(Json(ReportResponse {
        reports_count: outcome.reports_count,
        is_globally_hidden: outcome.is_globally_hidden,
    }))
}

async fn report_comment(
    ReportCommentPath { id }: ReportCommentPath,
    _actor: Actor,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<ReportResponse>> {
    let outcome = db
        .report_comment(id)
        .await?
        .ok_or(ServerError::CommentByIdNotFound(id))?;

    Ok(Json(ReportResponse {
        reports_count: outcome.reports_count,
        is_globally_hidden: outcome.is_globally_hidden,
    }))
}

#[cfg(test)]
mod tests {
    use super::parse_circle_ids;
    use openbook_common::model::circle::world_circle;

    #[test]
    fn circle_id_lists_parse() {
        assert_eq!(parse_circle_ids("1").unwrap(), vec![world_circle()]);
        assert_eq!(parse_circle_ids("1, 2,3").unwrap().len(), 3);
        assert!(parse_circle_ids("").unwrap().is_empty());
        assert!(parse_circle_ids("1,x").is_err());
    }
}
