//! Server-rendered pages.
//!
//! Pages are thin HTML shells; the tables inside them are filled from the
//! JSON API by a small inline script. Redirects carry a one-shot notice in
//! the flash cookie, which the next rendered page displays and clears.

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::{AppendHeaders, Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;
use stockroom_auth::{LoginInput, RegisterInput};
use stockroom_core::access::{Identity, Operation};
use stockroom_core::error::StockroomError;
use tracing::info;

use crate::cookies::{self, FLASH_COOKIE};
use crate::error::ApiError;
use crate::extract::{PageUser, cookie_value, perm, session_token};
use crate::state::AppState;

/// A message shown once at the top of the next page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: &'static str,
    pub message: String,
}

impl Notice {
    fn new(level: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new("info", message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new("success", message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new("warning", message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new("danger", message)
    }
}

type SetCookies = Vec<(HeaderName, String)>;

fn redirect(path: &str, cookies: SetCookies) -> Response {
    (AppendHeaders(cookies), Redirect::to(path)).into_response()
}

/// 303 to `path`, carrying `notice` in the flash cookie.
pub fn redirect_with_notice(path: &str, notice: Notice, state: &AppState) -> Response {
    redirect(
        path,
        vec![(
            SET_COOKIE,
            cookies::flash(notice.level, &notice.message, &state.settings),
        )],
    )
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/login", get(login_form).post(login_submit))
        .route("/register", get(register_form).post(register_submit))
        .route("/logout", get(logout))
        .route("/unauthorized", get(unauthorized))
        .route("/dashboard", get(dashboard))
        .route("/inventory", get(inventory))
        .route("/incoming", get(incoming))
        .route("/outgoing", get(outgoing))
        .route("/manage-users", get(manage_users))
}

/// Identity behind the request's session, if it is still valid.
async fn current_identity(headers: &HeaderMap, state: &AppState) -> Option<Identity> {
    let token = session_token(headers)?;
    state.auth.authenticate(Some(&token)).await.ok()
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

const NAV: [(&str, &str, Option<Operation>); 5] = [
    ("/dashboard", "Dashboard", None),
    ("/inventory", "Inventory", Some(Operation::ViewInventory)),
    ("/incoming", "Incoming", Some(Operation::RecordTransaction)),
    ("/outgoing", "Outgoing", Some(Operation::RecordTransaction)),
    ("/manage-users", "Users", Some(Operation::ManageUsers)),
];

fn nav(identity: Option<&Identity>) -> String {
    let Some(identity) = identity else {
        return r#"<nav><a href="/login">Log in</a> <a href="/register">Register</a></nav>"#
            .to_string();
    };
    let links: String = NAV
        .iter()
        .filter(|(_, _, op)| op.is_none_or(|op| op.permits(identity.role)))
        .map(|(href, label, _)| format!(r#"<a href="{href}">{label}</a> "#))
        .collect();
    format!(
        r#"<nav>{links}<span class="who">{} ({})</span> <a href="/logout">Log out</a></nav>"#,
        escape_html(&identity.display_name),
        identity.role,
    )
}

/// Render a page. Any pending flash notice is shown (ahead of `notice`)
/// and its cookie cleared.
fn render(
    status: StatusCode,
    title: &str,
    body: &str,
    identity: Option<&Identity>,
    headers: &HeaderMap,
    state: &AppState,
    notice: Option<Notice>,
) -> Response {
    let mut notices = Vec::new();
    let mut set_cookies: SetCookies = Vec::new();
    if let Some(value) = cookie_value(headers, FLASH_COOKIE).filter(|v| !v.is_empty()) {
        if let Some((level, message)) = cookies::decode_flash(&value) {
            notices.push((level, message));
        }
        set_cookies.push((SET_COOKIE, cookies::clear_flash(&state.settings)));
    }
    if let Some(notice) = notice {
        notices.push((notice.level.to_string(), notice.message));
    }

    let notices: String = notices
        .iter()
        .map(|(level, message)| {
            format!(
                r#"<div class="notice notice-{}">{}</div>"#,
                escape_html(level),
                escape_html(message)
            )
        })
        .collect();

    let html = format!(
        r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>{title} · Stockroom</title></head>
<body>
{nav}
{notices}
<main>
<h1>{title}</h1>
{body}
</main>
<script>{PAGE_SCRIPT}</script>
</body>
</html>"#,
        title = escape_html(title),
        nav = nav(identity),
    );
    (status, AppendHeaders(set_cookies), Html(html)).into_response()
}

/// Fills every `table[data-source]` and `section[data-summary]` from the
/// JSON endpoint it names, and posts `form[data-endpoint]` forms as JSON.
const PAGE_SCRIPT: &str = r#"
async function fillTable(table) {
  const cols = table.dataset.columns.split(',');
  const res = await fetch(table.dataset.source, { credentials: 'same-origin' });
  const data = await res.json();
  const rows = Array.isArray(data) ? data : (data.recent_activity || []);
  table.tBodies[0].innerHTML = '';
  for (const row of rows) {
    const tr = table.tBodies[0].insertRow();
    for (const col of cols) tr.insertCell().textContent = row[col] ?? '';
  }
}

async function fillSummary(section) {
  const res = await fetch(section.dataset.summary, { credentials: 'same-origin' });
  const data = await res.json();
  for (const el of section.querySelectorAll('[data-field]')) {
    el.textContent = data[el.dataset.field] ?? '';
  }
}

function refresh() {
  document.querySelectorAll('table[data-source]').forEach(fillTable);
  document.querySelectorAll('section[data-summary]').forEach(fillSummary);
}

document.querySelectorAll('form[data-endpoint]').forEach((form) => {
  form.addEventListener('submit', async (event) => {
    event.preventDefault();
    const status = form.querySelector('[data-status]');
    const body = {};
    for (const [key, value] of new FormData(form)) {
      if (value !== '') body[key] = value;
    }
    const res = await fetch(form.dataset.endpoint, {
      method: 'POST',
      credentials: 'same-origin',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify(body),
    });
    const data = await res.json().catch(() => ({}));
    if (res.ok) {
      status.className = 'notice notice-success';
      status.textContent = `Recorded ${data.quantity} × ${data.item_name}.`;
      form.reset();
      refresh();
    } else {
      status.className = 'notice notice-danger';
      status.textContent = data.error || `Request failed (${res.status}).`;
    }
  });
});

refresh();
"#;

/// Counter cells filled from the dashboard summary.
const SUMMARY_FIELDS: [(&str, &str); 4] = [
    ("total_items", "Items"),
    ("total_stock_quantity", "Units in stock"),
    ("low_stock_items", "Low stock"),
    ("total_transactions", "Transactions"),
];

fn summary_section(source: &str) -> String {
    let cells: String = SUMMARY_FIELDS
        .iter()
        .map(|(field, label)| format!(r#"<div><span data-field="{field}"></span> {label}</div>"#))
        .collect();
    format!(r#"<section id="summary" data-summary="{source}">{cells}</section>"#)
}

fn data_table(source: &str, columns: &[&str]) -> String {
    let head: String = columns.iter().map(|c| format!("<th>{c}</th>")).collect();
    format!(
        concat!(
            r#"<table data-source="{}" data-columns="{}">"#,
            r#"<thead><tr>{}</tr></thead><tbody></tbody></table>"#,
        ),
        source,
        columns.join(","),
        head,
    )
}

fn movement_form(kind: &str) -> String {
    format!(
        r#"<form data-endpoint="/api/transactions/{kind}">
<label>Item ID <input name="item_id" required></label>
<label>Quantity <input name="quantity" type="number" min="1" required></label>
<label>Notes <input name="notes"></label>
<button type="submit">Record</button>
<p data-status role="status"></p>
</form>
{}"#,
        data_table(
            &format!("/api/transactions?type={kind}"),
            &["timestamp", "item_id", "item_name", "quantity", "user", "notes"],
        )
    )
}

// ---------------------------------------------------------------------------
// Session pages
// ---------------------------------------------------------------------------

async fn home(State(state): State<AppState>, headers: HeaderMap) -> Redirect {
    match current_identity(&headers, &state).await {
        Some(_) => Redirect::to("/dashboard"),
        None => Redirect::to("/login"),
    }
}

const LOGIN_FORM: &str = r#"<form method="post" action="/login">
<label>Username <input name="username" autocomplete="username"></label>
<label>Password <input name="password" type="password" autocomplete="current-password"></label>
<button type="submit">Log in</button>
</form>
<p><a href="/register">Create an account</a></p>"#;

const REGISTER_FORM: &str = r#"<form method="post" action="/register">
<label>Username <input name="username"></label>
<label>Name <input name="name"></label>
<label>Password <input name="password" type="password" autocomplete="new-password"></label>
<button type="submit">Register</button>
</form>"#;

#[derive(Debug, Deserialize)]
struct LoginForm {
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RegisterForm {
    username: Option<String>,
    password: Option<String>,
    name: Option<String>,
}

fn filled(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn login_form(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if current_identity(&headers, &state).await.is_some() {
        return Redirect::to("/dashboard").into_response();
    }
    render(StatusCode::OK, "Log in", LOGIN_FORM, None, &headers, &state, None)
}

async fn login_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let (Some(username), Some(password)) = (filled(form.username), filled(form.password)) else {
        return render(
            StatusCode::BAD_REQUEST,
            "Log in",
            LOGIN_FORM,
            None,
            &headers,
            &state,
            Some(Notice::warning("Username and password are required.")),
        );
    };

    match state.auth.login(LoginInput { username, password }).await {
        Ok(out) => redirect(
            "/dashboard",
            vec![
                (SET_COOKIE, cookies::session(&out.token, &state.settings)),
                (
                    SET_COOKIE,
                    cookies::flash(
                        "success",
                        &format!("Welcome, {}.", out.identity.display_name),
                        &state.settings,
                    ),
                ),
            ],
        ),
        Err(StockroomError::InvalidCredentials) => render(
            StatusCode::UNAUTHORIZED,
            "Log in",
            LOGIN_FORM,
            None,
            &headers,
            &state,
            Some(Notice::danger("Invalid username or password.")),
        ),
        Err(other) => {
            let err = ApiError::from(other);
            render(
                err.status(),
                "Log in",
                LOGIN_FORM,
                None,
                &headers,
                &state,
                Some(failure_notice(&err)),
            )
        }
    }
}

/// Notice for a failed form submission. Server faults get a generic text.
fn failure_notice(err: &ApiError) -> Notice {
    if err.status().is_server_error() {
        Notice::danger("Something went wrong. Please try again.")
    } else {
        Notice::warning(err.message())
    }
}

async fn register_form(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !state.settings.allow_registration {
        return redirect_with_notice("/login", Notice::warning("Registration is disabled."), &state);
    }
    render(StatusCode::OK, "Register", REGISTER_FORM, None, &headers, &state, None)
}

async fn register_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<RegisterForm>,
) -> Response {
    if !state.settings.allow_registration {
        return redirect_with_notice("/login", Notice::warning("Registration is disabled."), &state);
    }
    let (Some(username), Some(password), Some(display_name)) =
        (filled(form.username), filled(form.password), filled(form.name))
    else {
        return render(
            StatusCode::BAD_REQUEST,
            "Register",
            REGISTER_FORM,
            None,
            &headers,
            &state,
            Some(Notice::warning("Username, password and name are all required.")),
        );
    };

    match state
        .auth
        .register(RegisterInput {
            username,
            password,
            display_name,
        })
        .await
    {
        Ok(user) => {
            info!(username = %user.username, "Self-registered operator account");
            redirect_with_notice(
                "/login",
                Notice::success(format!(
                    "Registered {} as {}. Please log in.",
                    user.username, user.role
                )),
                &state,
            )
        }
        Err(err) => {
            let err = ApiError::from(err);
            render(
                err.status(),
                "Register",
                REGISTER_FORM,
                None,
                &headers,
                &state,
                Some(failure_notice(&err)),
            )
        }
    }
}

async fn logout(
    PageUser(identity, _): PageUser<perm::Authenticated>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if let Some(token) = session_token(&headers) {
        state.auth.logout(&token).await?;
    }
    Ok(redirect(
        "/login",
        vec![
            (SET_COOKIE, cookies::clear_session(&state.settings)),
            (
                SET_COOKIE,
                cookies::flash(
                    "info",
                    &format!("You ({}) have been logged out.", identity.display_name),
                    &state.settings,
                ),
            ),
        ],
    ))
}

async fn unauthorized(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let identity = current_identity(&headers, &state).await;
    render(
        StatusCode::FORBIDDEN,
        "Access denied",
        concat!(
            "<p>Your role may not open that page.</p>",
            r#"<p><a href="/dashboard">Back to the dashboard</a></p>"#,
        ),
        identity.as_ref(),
        &headers,
        &state,
        None,
    )
}

// ---------------------------------------------------------------------------
// Application pages
// ---------------------------------------------------------------------------

async fn dashboard(
    PageUser(identity, _): PageUser<perm::Authenticated>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let body = if Operation::ViewDashboard.permits(identity.role) {
        format!(
            "{}\n<h2>Recent activity</h2>\n{}",
            summary_section("/api/dashboard/summary"),
            data_table(
                "/api/dashboard/summary",
                &["timestamp", "type", "item_name", "quantity", "user"],
            )
        )
    } else {
        format!(
            "<h2>Recent transactions</h2>\n{}",
            data_table(
                "/api/transactions",
                &["timestamp", "type", "item_name", "quantity", "user"],
            )
        )
    };
    render(StatusCode::OK, "Dashboard", &body, Some(&identity), &headers, &state, None)
}

async fn inventory(
    PageUser(identity, _): PageUser<perm::ViewInventory>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let body = data_table(
        "/api/inventory",
        &["id", "name", "category", "quantity", "added_by", "last_update"],
    );
    render(StatusCode::OK, "Inventory", &body, Some(&identity), &headers, &state, None)
}

async fn incoming(
    PageUser(identity, _): PageUser<perm::RecordTransaction>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let body = movement_form("incoming");
    render(StatusCode::OK, "Incoming stock", &body, Some(&identity), &headers, &state, None)
}

async fn outgoing(
    PageUser(identity, _): PageUser<perm::RecordTransaction>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let body = movement_form("outgoing");
    render(StatusCode::OK, "Outgoing stock", &body, Some(&identity), &headers, &state, None)
}

async fn manage_users(
    PageUser(identity, _): PageUser<perm::ManageUsers>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let body = data_table("/api/users", &["username", "name", "role"]);
    render(StatusCode::OK, "Users", &body, Some(&identity), &headers, &state, None)
}
