use crate::server::ServerError;
use axum::{extract::FromRequestParts, http::request::Parts};
use openbook_common::model::{Id, user::UserMarker};

pub const ACTOR_HEADER: &str = "x-openbook-user-id";

/// The authenticated actor behind a mutation. Token verification happens in
/// the identity layer in front of this service; this extractor only reads the
/// user id that layer forwards. Every content mutation requires one.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct Actor {
    id: Id<UserMarker>,
}

impl Actor {
    #[must_use]
    pub fn user_id(self) -> Id<UserMarker> {
        self.id
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(ACTOR_HEADER)
            .ok_or(ServerError::MissingActorHeader(ACTOR_HEADER))?;

        let id = value
            .to_str()
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .ok_or(ServerError::InvalidActorHeader(ACTOR_HEADER))?;

        Ok(Self { id: Id::new(id) })
    }
}
