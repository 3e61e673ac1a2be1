use crate::auth::{self, CurrentUser, HOME_PATH, LOGIN_PATH};
use crate::cookies::{self, SESSION_COOKIE};
use crate::csrf::CsrfToken;
use crate::errors::AppError;
use crate::handlers::tweet_views;
use crate::models::{AppData, FriendShip, LoginForm, SignUpForm, TokenForm, User};
use crate::state::AppState;
use crate::storage::persist_data;
use crate::ui::{self, Page, ProfileView};
use crate::validation::{FormErrors, validate_signup};
use axum::{
    Extension, Form,
    extract::{Path, Query, State},
    http::{HeaderMap, header::SET_COOKIE},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

pub const LOGIN_FAILED: &str =
    "正しいユーザー名とパスワードを入力してください。どちらのフィールドも大文字と小文字は区別されます。";
pub const CANNOT_FOLLOW_SELF: &str = "自分をフォローすることはできません。";
pub const ALREADY_FOLLOWING: &str = "すでにフォローしています。";
pub const CANNOT_UNFOLLOW_SELF: &str = "自分にリクエストできません。";

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub next: String,
}

fn guest_page<'a>(title: &'a str, csrf: &'a CsrfToken) -> Page<'a> {
    Page {
        title,
        viewer: None,
        csrf: csrf.value(),
    }
}

pub async fn signup_form(Extension(csrf): Extension<CsrfToken>) -> Html<String> {
    let page = guest_page("新規登録", &csrf);
    Html(ui::render_signup(&page, "", "", &FormErrors::default()))
}

pub async fn signup(
    State(state): State<AppState>,
    Extension(csrf): Extension<CsrfToken>,
    Form(form): Form<SignUpForm>,
) -> Result<Response, AppError> {
    csrf.verify(Some(&form.csrfmiddlewaretoken))?;

    let username = form.username.trim().to_string();
    {
        let mut data = state.data.lock().await;
        let errors = validate_signup(&form, &data);
        if !errors.is_empty() {
            let page = guest_page("新規登録", &csrf);
            return Ok(Html(ui::render_signup(&page, &form.username, &form.email, &errors)).into_response());
        }

        let salt = auth::new_salt();
        data.users.insert(
            username.clone(),
            User {
                username: username.clone(),
                email: form.email.trim().to_string(),
                password_hash: auth::hash_password(&form.password1, &salt),
                salt,
                date_joined: Utc::now(),
            },
        );
        persist_data(&state.data_path, &data).await?;
    }
    info!(%username, "user signed up");

    let cookie = auth::start_session(&state, &username).await?;
    Ok(([(SET_COOKIE, cookie)], Redirect::to(HOME_PATH)).into_response())
}

pub async fn login_form(
    Extension(csrf): Extension<CsrfToken>,
    Query(query): Query<LoginQuery>,
) -> Html<String> {
    let page = guest_page("ログイン", &csrf);
    Html(ui::render_login(&page, "", &query.next, None))
}

pub async fn login(
    State(state): State<AppState>,
    Extension(csrf): Extension<CsrfToken>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    csrf.verify(Some(&form.csrfmiddlewaretoken))?;

    let authenticated = {
        let data = state.data.lock().await;
        data.users
            .get(&form.username)
            .is_some_and(|user| auth::verify_password(user, &form.password))
    };
    if !authenticated {
        warn!(username = %form.username, "login failed");
        let page = guest_page("ログイン", &csrf);
        return Ok(Html(ui::render_login(&page, &form.username, &form.next, Some(LOGIN_FAILED))).into_response());
    }

    let cookie = auth::start_session(&state, &form.username).await?;
    let target = auth::safe_next(&form.next);
    Ok(([(SET_COOKIE, cookie)], Redirect::to(target)).into_response())
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(csrf): Extension<CsrfToken>,
    headers: HeaderMap,
    form: Option<Form<TokenForm>>,
) -> Result<Response, AppError> {
    csrf.verify(form.as_ref().map(|Form(form)| form.csrfmiddlewaretoken.as_str()))?;
    auth::end_session(&state, &headers).await;
    let cookie = cookies::expire_cookie(SESSION_COOKIE).map_err(AppError::internal)?;
    Ok(([(SET_COOKIE, cookie)], Redirect::to(LOGIN_PATH)).into_response())
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(csrf): Extension<CsrfToken>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> Result<Html<String>, AppError> {
    let data = state.data.lock().await;
    find_user(&data, &username)?;

    let tweets = tweet_views(&data, &user.username, data.timeline(Some(username.as_str())));
    let profile = ProfileView {
        username: &username,
        is_self: username == user.username,
        is_following: data.is_following(&user.username, &username),
        following: data.following_of(&username).len(),
        followers: data.followers_of(&username).len(),
        tweets: &tweets,
    };
    let page = Page {
        title: &username,
        viewer: Some(&user.username),
        csrf: csrf.value(),
    };
    Ok(Html(ui::render_profile(&page, &profile)))
}

pub async fn follow(
    State(state): State<AppState>,
    Extension(csrf): Extension<CsrfToken>,
    user: CurrentUser,
    Path(username): Path<String>,
    form: Option<Form<TokenForm>>,
) -> Result<Redirect, AppError> {
    csrf.verify(form.as_ref().map(|Form(form)| form.csrfmiddlewaretoken.as_str()))?;
    if username == user.username {
        return Err(AppError::bad_request(CANNOT_FOLLOW_SELF));
    }

    let mut data = state.data.lock().await;
    find_user(&data, &username)?;
    if data.is_following(&user.username, &username) {
        return Err(AppError::bad_request(ALREADY_FOLLOWING));
    }
    data.friendships.push(FriendShip {
        follower: user.username.clone(),
        following: username.clone(),
        created_at: Utc::now(),
    });
    persist_data(&state.data_path, &data).await?;
    info!(follower = %user.username, following = %username, "followed");

    Ok(Redirect::to(HOME_PATH))
}

pub async fn unfollow(
    State(state): State<AppState>,
    Extension(csrf): Extension<CsrfToken>,
    user: CurrentUser,
    Path(username): Path<String>,
    form: Option<Form<TokenForm>>,
) -> Result<Redirect, AppError> {
    csrf.verify(form.as_ref().map(|Form(form)| form.csrfmiddlewaretoken.as_str()))?;
    if username == user.username {
        return Err(AppError::bad_request(CANNOT_UNFOLLOW_SELF));
    }

    let mut data = state.data.lock().await;
    find_user(&data, &username)?;
    data.friendships
        .retain(|f| !(f.follower == user.username && f.following == username));
    persist_data(&state.data_path, &data).await?;
    info!(follower = %user.username, following = %username, "unfollowed");

    Ok(Redirect::to(HOME_PATH))
}

pub async fn following_list(
    State(state): State<AppState>,
    Extension(csrf): Extension<CsrfToken>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> Result<Html<String>, AppError> {
    let data = state.data.lock().await;
    find_user(&data, &username)?;
    let heading = format!("{username} のフォロー");
    let page = Page {
        title: &heading,
        viewer: Some(&user.username),
        csrf: csrf.value(),
    };
    Ok(Html(ui::render_user_list(
        &page,
        &heading,
        &data.following_of(&username),
        |f| f.following.as_str(),
    )))
}

pub async fn follower_list(
    State(state): State<AppState>,
    Extension(csrf): Extension<CsrfToken>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> Result<Html<String>, AppError> {
    let data = state.data.lock().await;
    find_user(&data, &username)?;
    let heading = format!("{username} のフォロワー");
    let page = Page {
        title: &heading,
        viewer: Some(&user.username),
        csrf: csrf.value(),
    };
    Ok(Html(ui::render_user_list(
        &page,
        &heading,
        &data.followers_of(&username),
        |f| f.follower.as_str(),
    )))
}

fn find_user<'a>(data: &'a AppData, username: &str) -> Result<&'a User, AppError> {
    data.users
        .get(username)
        .ok_or_else(|| AppError::not_found(format!("user {username} not found")))
}
