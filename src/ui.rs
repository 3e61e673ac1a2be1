use crate::client::{COUNT_PREFIX, LIKE_LABEL, LikeButton, UNLIKE_LABEL};
use crate::models::{FriendShip, Tweet};
use crate::validation::FormErrors;

/// A tweet as shown in a list, with the viewer's like button.
#[derive(Debug, Clone)]
pub struct TweetView {
    pub tweet: Tweet,
    pub button: LikeButton,
}

#[derive(Debug)]
pub struct ProfileView<'a> {
    pub username: &'a str,
    pub is_self: bool,
    pub is_following: bool,
    pub following: usize,
    pub followers: usize,
    pub tweets: &'a [TweetView],
}

pub struct Page<'a> {
    pub title: &'a str,
    pub viewer: Option<&'a str>,
    pub csrf: &'a str,
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(page: &Page<'_>, body: &str) -> String {
    let nav = match page.viewer {
        Some(username) => format!(
            r#"<a href="/tweets/home/">ホーム</a>
      <a href="/tweets/create/">ツイートする</a>
      <a href="/accounts/{user}/">{user}</a>
      <form method="post" action="/accounts/logout/" class="inline">{token}<button type="submit">ログアウト</button></form>"#,
            user = escape(username),
            token = token_field(page.csrf),
        ),
        None => r#"<a href="/accounts/login/">ログイン</a>
      <a href="/accounts/signup/">新規登録</a>"#
            .to_string(),
    };

    LAYOUT_HTML
        .replace("{{TITLE}}", &escape(page.title))
        .replace("{{NAV}}", &nav)
        .replace("{{BODY}}", body)
}

fn token_field(csrf: &str) -> String {
    format!(
        r#"<input type="hidden" name="csrfmiddlewaretoken" value="{}" />"#,
        escape(csrf)
    )
}

fn field_errors(errors: &FormErrors, field: &str) -> String {
    errors
        .get(field)
        .iter()
        .map(|message| format!(r#"<p class="error">{}</p>"#, escape(message)))
        .collect()
}

pub fn render_like_button(button: &LikeButton) -> String {
    format!(
        r#"<div class="likes">
        <button type="button" class="like-button" data-url="{url}" onclick="like(this)">{label}</button>
        <span class="count" id="{counter}">{count}</span>
      </div>"#,
        url = escape(&button.url),
        label = escape(&button.label),
        counter = button.counter_id(),
        count = escape(&button.count_text),
    )
}

fn render_tweet_card(view: &TweetView) -> String {
    let tweet = &view.tweet;
    format!(
        r#"<article class="tweet">
      <header><a href="/accounts/{user}/">{user}</a> <time>{time}</time></header>
      <p><a href="/tweets/{id}/">{content}</a></p>
      {button}
    </article>"#,
        user = escape(&tweet.username),
        time = tweet.created_at.format("%Y-%m-%d %H:%M"),
        id = tweet.id,
        content = escape(&tweet.content),
        button = render_like_button(&view.button),
    )
}

fn render_tweet_list(tweets: &[TweetView]) -> String {
    if tweets.is_empty() {
        return r#"<p class="empty">ツイートはまだありません。</p>"#.to_string();
    }
    tweets.iter().map(render_tweet_card).collect()
}

pub fn render_home(page: &Page<'_>, tweets: &[TweetView]) -> String {
    let body = format!(r#"<h1>ホーム</h1>{}"#, render_tweet_list(tweets));
    layout(page, &body)
}

pub fn render_create(page: &Page<'_>, content: &str, errors: &FormErrors) -> String {
    let body = format!(
        r#"<h1>ツイートする</h1>
    <form method="post" action="/tweets/create/">
      {token}
      <textarea name="content" maxlength="200">{content}</textarea>
      {errors}
      <button type="submit">投稿</button>
    </form>"#,
        token = token_field(page.csrf),
        content = escape(content),
        errors = field_errors(errors, "content"),
    );
    layout(page, &body)
}

pub fn render_detail(page: &Page<'_>, view: &TweetView, is_owner: bool) -> String {
    let delete = if is_owner {
        format!(r#"<a class="danger" href="/tweets/{}/delete/">削除</a>"#, view.tweet.id)
    } else {
        String::new()
    };
    let body = format!(
        r#"<h1>ツイート詳細</h1>
    {card}
    {delete}"#,
        card = render_tweet_card(view),
    );
    layout(page, &body)
}

pub fn render_delete_confirm(page: &Page<'_>, tweet: &Tweet) -> String {
    let body = format!(
        r#"<h1>ツイートを削除しますか？</h1>
    <blockquote>{content}</blockquote>
    <form method="post" action="/tweets/{id}/delete/">
      {token}
      <button type="submit" class="danger">削除する</button>
      <a href="/tweets/{id}/">キャンセル</a>
    </form>"#,
        content = escape(&tweet.content),
        id = tweet.id,
        token = token_field(page.csrf),
    );
    layout(page, &body)
}

pub fn render_signup(page: &Page<'_>, username: &str, email: &str, errors: &FormErrors) -> String {
    let body = format!(
        r#"<h1>新規登録</h1>
    <form method="post" action="/accounts/signup/">
      {token}
      <label>ユーザー名 <input name="username" value="{username}" /></label>
      {username_errors}
      <label>メールアドレス <input type="email" name="email" value="{email}" /></label>
      {email_errors}
      <label>パスワード <input type="password" name="password1" /></label>
      {password1_errors}
      <label>パスワード（確認用） <input type="password" name="password2" /></label>
      {password2_errors}
      <button type="submit">登録</button>
    </form>"#,
        token = token_field(page.csrf),
        username = escape(username),
        email = escape(email),
        username_errors = field_errors(errors, "username"),
        email_errors = field_errors(errors, "email"),
        password1_errors = field_errors(errors, "password1"),
        password2_errors = field_errors(errors, "password2"),
    );
    layout(page, &body)
}

pub fn render_login(page: &Page<'_>, username: &str, next: &str, error: Option<&str>) -> String {
    let error = error
        .map(|message| format!(r#"<p class="error">{}</p>"#, escape(message)))
        .unwrap_or_default();
    let body = format!(
        r#"<h1>ログイン</h1>
    <form method="post" action="/accounts/login/">
      {token}
      <input type="hidden" name="next" value="{next}" />
      {error}
      <label>ユーザー名 <input name="username" value="{username}" /></label>
      <label>パスワード <input type="password" name="password" /></label>
      <button type="submit">ログイン</button>
    </form>"#,
        token = token_field(page.csrf),
        next = escape(next),
        username = escape(username),
    );
    layout(page, &body)
}

pub fn render_profile(page: &Page<'_>, profile: &ProfileView<'_>) -> String {
    let user = escape(profile.username);
    let follow = if profile.is_self {
        String::new()
    } else {
        let (action, label) = if profile.is_following {
            ("unfollow", "フォロー解除")
        } else {
            ("follow", "フォロー")
        };
        format!(
            r#"<form method="post" action="/accounts/{user}/{action}/">{token}<button type="submit">{label}</button></form>"#,
            token = token_field(page.csrf),
        )
    };
    let body = format!(
        r#"<h1>{user}</h1>
    <p class="relations">
      <a href="/accounts/{user}/following_list/">フォロー {following}</a>
      <a href="/accounts/{user}/follower_list/">フォロワー {followers}</a>
    </p>
    {follow}
    {tweets}"#,
        following = profile.following,
        followers = profile.followers,
        tweets = render_tweet_list(profile.tweets),
    );
    layout(page, &body)
}

/// Following or follower list; `pick` selects which side of each relation to show.
pub fn render_user_list(
    page: &Page<'_>,
    heading: &str,
    relations: &[&FriendShip],
    pick: impl Fn(&FriendShip) -> &str,
) -> String {
    let items: String = relations
        .iter()
        .map(|relation| {
            let name = escape(pick(*relation));
            format!(
                r#"<li><a href="/accounts/{name}/">{name}</a> <time>{}</time></li>"#,
                relation.created_at.format("%Y-%m-%d")
            )
        })
        .collect();
    let body = format!(
        r#"<h1>{}</h1>
    <ul class="users">{items}</ul>"#,
        escape(heading)
    );
    layout(page, &body)
}

/// The toggle script served at `/static/like.js`.
pub fn like_script() -> String {
    LIKE_JS
        .replace("{{LIKE_LABEL}}", LIKE_LABEL)
        .replace("{{UNLIKE_LABEL}}", UNLIKE_LABEL)
        .replace("{{COUNT_PREFIX}}", COUNT_PREFIX)
}

const LIKE_JS: &str = r#"const getCookie = (name) => {
  if (document.cookie && document.cookie !== '') {
    for (const cookie of document.cookie.split(';')) {
      const pair = cookie.trim();
      const eq = pair.indexOf('=');
      const key = eq === -1 ? pair : pair.slice(0, eq);
      if (key === name) {
        return decodeURIComponent(eq === -1 ? '' : pair.slice(eq + 1));
      }
    }
  }
};

const csrftoken = getCookie('csrftoken');

const like = async (button) => {
  const response = await fetch(button.dataset.url, {
    method: 'POST',
    headers: {
      'Content-Type': 'application/json',
      'X-CSRFToken': csrftoken,
    },
  });
  const state = await response.json();
  applyLikeState(state, button);
};

const applyLikeState = (state, button) => {
  const count = document.querySelector(`#count_${state.tweet_id}`);
  if (state.is_liked) {
    button.setAttribute('data-url', `/tweets/${state.tweet_id}/unlike/`);
    button.textContent = '{{UNLIKE_LABEL}}';
  } else {
    button.setAttribute('data-url', `/tweets/${state.tweet_id}/like/`);
    button.textContent = '{{LIKE_LABEL}}';
  }
  count.textContent = `{{COUNT_PREFIX}} ${state.liked_count}`;
};
"#;

const LAYOUT_HTML: &str = r#"<!DOCTYPE html>
<html lang="ja">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <style>
    :root {
      --bg: #f5f8fa;
      --ink: #14171a;
      --muted: #657786;
      --accent: #1da1f2;
      --danger: #e0245e;
      --card: #ffffff;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: "Hiragino Sans", "Noto Sans JP", sans-serif;
    }

    nav {
      display: flex;
      gap: 16px;
      align-items: center;
      padding: 12px 24px;
      background: var(--card);
      border-bottom: 1px solid #e1e8ed;
    }

    nav a {
      color: var(--accent);
      text-decoration: none;
      font-weight: 600;
    }

    main {
      width: min(640px, 100%);
      margin: 24px auto;
      padding: 0 16px;
      display: grid;
      gap: 12px;
    }

    .tweet {
      background: var(--card);
      border: 1px solid #e1e8ed;
      border-radius: 14px;
      padding: 14px 18px;
    }

    .tweet header {
      color: var(--muted);
      font-size: 0.9rem;
    }

    .likes {
      display: flex;
      gap: 12px;
      align-items: center;
    }

    button {
      border: none;
      border-radius: 999px;
      padding: 6px 16px;
      background: var(--accent);
      color: white;
      font-weight: 600;
      cursor: pointer;
    }

    .danger {
      background: var(--danger);
      color: white;
    }

    .error {
      color: var(--danger);
      margin: 4px 0;
    }

    form {
      display: grid;
      gap: 8px;
    }

    form.inline {
      display: inline;
    }

    textarea {
      min-height: 120px;
    }
  </style>
  <script src="/static/like.js" defer></script>
</head>
<body>
  <nav>
      {{NAV}}
  </nav>
  <main>
    {{BODY}}
  </main>
</body>
</html>
"#;
