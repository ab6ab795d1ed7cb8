use crate::server::ServerRouter;
use axum::Router;

mod emojis;
mod posts;

pub fn routes() -> ServerRouter {
    Router::new().merge(posts::routes()).merge(emojis::routes())
}
