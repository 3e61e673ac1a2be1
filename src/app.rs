use crate::state::AppState;
use crate::{accounts, csrf, handlers};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/static/like.js", get(handlers::like_script))
        .route("/tweets/home/", get(handlers::home))
        .route("/tweets/create/", get(handlers::create_form).post(handlers::create_tweet))
        .route("/tweets/:id/", get(handlers::detail))
        .route("/tweets/:id/delete/", get(handlers::delete_form).post(handlers::delete_tweet))
        .route("/tweets/:id/like/", post(handlers::like_tweet))
        .route("/tweets/:id/unlike/", post(handlers::unlike_tweet))
        .route("/accounts/signup/", get(accounts::signup_form).post(accounts::signup))
        .route("/accounts/login/", get(accounts::login_form).post(accounts::login))
        .route("/accounts/logout/", post(accounts::logout))
        .route("/accounts/:username/", get(accounts::profile))
        .route("/accounts/:username/follow/", post(accounts::follow))
        .route("/accounts/:username/unfollow/", post(accounts::unfollow))
        .route("/accounts/:username/following_list/", get(accounts::following_list))
        .route("/accounts/:username/follower_list/", get(accounts::follower_list))
        .layer(middleware::from_fn(csrf::csrf_layer))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
