use crate::auth::{CurrentUser, HOME_PATH};
use crate::client::LikeButton;
use crate::csrf::CsrfToken;
use crate::errors::AppError;
use crate::likes;
use crate::models::{AppData, LikeState, Tweet, TokenForm, TweetForm};
use crate::state::AppState;
use crate::storage::persist_data;
use crate::ui::{self, Page, TweetView};
use crate::validation::{FormErrors, validate_tweet};
use axum::{
    Extension, Form, Json,
    extract::{Path, State},
    http::header::CONTENT_TYPE,
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::info;

pub async fn root() -> Redirect {
    Redirect::to(HOME_PATH)
}

pub async fn home(
    State(state): State<AppState>,
    Extension(csrf): Extension<CsrfToken>,
    user: CurrentUser,
) -> Html<String> {
    let data = state.data.lock().await;
    let views = tweet_views(&data, &user.username, data.timeline(None));
    let page = Page {
        title: "ホーム",
        viewer: Some(&user.username),
        csrf: csrf.value(),
    };
    Html(ui::render_home(&page, &views))
}

pub async fn create_form(Extension(csrf): Extension<CsrfToken>, user: CurrentUser) -> Html<String> {
    let page = create_page(&user, &csrf);
    Html(ui::render_create(&page, "", &FormErrors::default()))
}

pub async fn create_tweet(
    State(state): State<AppState>,
    Extension(csrf): Extension<CsrfToken>,
    user: CurrentUser,
    Form(form): Form<TweetForm>,
) -> Result<Response, AppError> {
    csrf.verify(Some(&form.csrfmiddlewaretoken))?;
    let content = match validate_tweet(&form.content) {
        Ok(content) => content,
        Err(errors) => {
            let page = create_page(&user, &csrf);
            return Ok(Html(ui::render_create(&page, &form.content, &errors)).into_response());
        }
    };

    let mut data = state.data.lock().await;
    let tweet = data.insert_tweet(&user.username, &content);
    persist_data(&state.data_path, &data).await?;
    info!(tweet_id = tweet.id, username = %user.username, "tweet created");

    Ok(Redirect::to(HOME_PATH).into_response())
}

pub async fn detail(
    State(state): State<AppState>,
    Extension(csrf): Extension<CsrfToken>,
    user: CurrentUser,
    Path(tweet_id): Path<u64>,
) -> Result<Html<String>, AppError> {
    let data = state.data.lock().await;
    let tweet = find_tweet(&data, tweet_id)?;
    let is_owner = tweet.username == user.username;
    let view = tweet_views(&data, &user.username, vec![tweet]).remove(0);
    let page = Page {
        title: "ツイート詳細",
        viewer: Some(&user.username),
        csrf: csrf.value(),
    };
    Ok(Html(ui::render_detail(&page, &view, is_owner)))
}

pub async fn delete_form(
    State(state): State<AppState>,
    Extension(csrf): Extension<CsrfToken>,
    user: CurrentUser,
    Path(tweet_id): Path<u64>,
) -> Result<Html<String>, AppError> {
    let data = state.data.lock().await;
    let tweet = owned_tweet(&data, tweet_id, &user)?;
    let page = Page {
        title: "ツイート削除",
        viewer: Some(&user.username),
        csrf: csrf.value(),
    };
    Ok(Html(ui::render_delete_confirm(&page, tweet)))
}

pub async fn delete_tweet(
    State(state): State<AppState>,
    Extension(csrf): Extension<CsrfToken>,
    user: CurrentUser,
    Path(tweet_id): Path<u64>,
    form: Option<Form<TokenForm>>,
) -> Result<Redirect, AppError> {
    csrf.verify(form.as_ref().map(|Form(form)| form.csrfmiddlewaretoken.as_str()))?;

    let mut data = state.data.lock().await;
    owned_tweet(&data, tweet_id, &user)?;
    data.remove_tweet(tweet_id);
    persist_data(&state.data_path, &data).await?;
    info!(tweet_id, username = %user.username, "tweet deleted");

    Ok(Redirect::to(HOME_PATH))
}

pub async fn like_tweet(
    State(state): State<AppState>,
    Extension(csrf): Extension<CsrfToken>,
    user: CurrentUser,
    Path(tweet_id): Path<u64>,
) -> Result<Json<LikeState>, AppError> {
    csrf.verify(None)?;
    let mut data = state.data.lock().await;
    let liked = likes::like(&mut data, &user.username, tweet_id)?;
    persist_data(&state.data_path, &data).await?;
    info!(tweet_id, username = %user.username, liked_count = liked.liked_count, "tweet liked");
    Ok(Json(liked))
}

pub async fn unlike_tweet(
    State(state): State<AppState>,
    Extension(csrf): Extension<CsrfToken>,
    user: CurrentUser,
    Path(tweet_id): Path<u64>,
) -> Result<Json<LikeState>, AppError> {
    csrf.verify(None)?;
    let mut data = state.data.lock().await;
    let unliked = likes::unlike(&mut data, &user.username, tweet_id)?;
    persist_data(&state.data_path, &data).await?;
    info!(tweet_id, username = %user.username, liked_count = unliked.liked_count, "tweet unliked");
    Ok(Json(unliked))
}

pub async fn like_script() -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/javascript; charset=utf-8")],
        ui::like_script(),
    )
}

/// Pairs each tweet with the like button `viewer` should see for it.
pub(crate) fn tweet_views(data: &AppData, viewer: &str, tweets: Vec<&Tweet>) -> Vec<TweetView> {
    let liked = likes::liked_tweet_ids(data, viewer);
    tweets
        .into_iter()
        .map(|tweet| TweetView {
            button: LikeButton::for_state(&LikeState {
                tweet_id: tweet.id,
                is_liked: liked.contains(&tweet.id),
                liked_count: likes::like_count(data, tweet.id),
            }),
            tweet: tweet.clone(),
        })
        .collect()
}

fn create_page<'a>(user: &'a CurrentUser, csrf: &'a CsrfToken) -> Page<'a> {
    Page {
        title: "ツイートする",
        viewer: Some(&user.username),
        csrf: csrf.value(),
    }
}

fn find_tweet(data: &AppData, tweet_id: u64) -> Result<&Tweet, AppError> {
    data.tweets
        .get(&tweet_id)
        .ok_or_else(|| AppError::not_found(format!("tweet {tweet_id} not found")))
}

fn owned_tweet<'a>(data: &'a AppData, tweet_id: u64, user: &CurrentUser) -> Result<&'a Tweet, AppError> {
    let tweet = find_tweet(data, tweet_id)?;
    if tweet.username != user.username {
        return Err(AppError::forbidden("only the author can delete this tweet"));
    }
    Ok(tweet)
}
