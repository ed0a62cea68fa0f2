use axum::{
    Router, middleware,
    routing::{delete, get, patch, post},
};

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::{posts, users};

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/refresh/{token}", get(auth::refresh))
        .route("/referral/{code}", get(users::verify_referral))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/users", get(users::list))
        .route("/users/search", get(users::search))
        .route(
            "/users/{id}",
            get(users::view).patch(users::update).delete(users::delete),
        )
        // posts
        .route("/users/post", post(posts::create_post).get(posts::list_posts))
        .route("/users/post/private", get(posts::list_private_posts))
        .route("/users/post/{id}", patch(posts::update_post))
        .route("/users/post-delete/{id}", delete(posts::delete_post))
        // comments
        .route("/users/comment", post(posts::create_comment))
        .route(
            "/users/comment/{post_id}",
            get(posts::list_comments)
                .patch(posts::update_comment)
                .delete(posts::delete_comment),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
