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
use openbook_common::model::ModelValidationError;
use openbook_common::model::emoji::{Emoji, EmojiColor, NewEmoji};
use openbook_db::client::DbClient;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    Router::new().typed_get(list_emojis).typed_post(create_emoji)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/emojis")]
struct EmojisPath;

async fn list_emojis(
    _: EmojisPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Vec<Emoji>>> {
    let emojis = db.list_emojis().await?;
    Ok(Json(emojis))
}

/// Multipart catalog entry: `name`, `shortcut`, `color` (strict `#RRGGBB`)
/// and an `icon` file part.
async fn create_emoji(
    _: EmojisPath,
    _actor: Actor,
    State(db): State<Arc<DbClient>>,
    State(storage): State<Arc<MediaStorage>>,
    State(config): State<Arc<OpenbookConfig>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Emoji>)> {
    let mut name = None;
    let mut shortcut = None;
    let mut color = None;
    let mut icon = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("name") => name = Some(field.text().await?),
            Some("shortcut") => shortcut = Some(field.text().await?),
            Some("color") => {
                let value = field.text().await?;
                color = Some(EmojiColor::new(value).map_err(ModelValidationError::from)?);
            }
            Some("icon") => {
                let content_type = field
                    .content_type()
                    .map(ToOwned::to_owned)
                    .ok_or(UploadValidationError::MissingContentType)
                    .map_err(ServerError::Upload)?;
                let bytes = field.bytes().await?;
                icon = Some((content_type, bytes));
            }
            _ => {}
        }
    }

    let name = name.ok_or(ServerError::MissingField("name"))?;
    let shortcut = shortcut.ok_or(ServerError::MissingField("shortcut"))?;
    let color = color.ok_or(ServerError::MissingField("color"))?;
    let (content_type, bytes) = icon.ok_or(ServerError::MissingField("icon"))?;

    validate_upload(&content_type, bytes.len() as u64, &config)?;
    let key = format!(
        "emojis/{shortcut}.{}",
        media_extension(&content_type),
    );
    let location = storage.store(&key, &content_type, bytes.to_vec()).await?;

    let new_emoji = NewEmoji::compose(name, shortcut, color, location);
    let emoji_id = db.create_emoji(&new_emoji).await?;

    let emoji = Emoji::rehydrate(
        emoji_id,
        new_emoji.name.clone(),
        new_emoji.shortcut.clone(),
        new_emoji.color.clone(),
        new_emoji.icon.clone(),
        new_emoji.created(),
    );

    Ok((StatusCode::CREATED, Json(emoji)))
}
