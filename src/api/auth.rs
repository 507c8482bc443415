//! Authentication pages
//!
//! - GET/POST /auth/login/ - sign in, then go to `next` or home
//! - GET/POST /auth/logout/ - sign out
//! - GET/POST /auth/signup/ - register, then go to the login page

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::get,
    Form, Router,
};
use serde::Deserialize;

use crate::api::context::{LoggedOutContext, LoginContext, SignupContext};
use crate::api::middleware::{
    extract_session_token, found, is_safe_next, AppState, CurrentUser, PageError, LOGIN_URL,
};
use crate::forms::{LoginForm, SignupForm, USERNAME_TAKEN};
use crate::models::CreateUserInput;
use crate::services::UserServiceError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login/", get(login_page).post(login))
        .route("/logout/", get(logout).post(logout))
        .route("/signup/", get(signup_page).post(signup))
}

/// Query string of the login page
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

impl NextQuery {
    fn safe_next(self) -> Option<String> {
        self.next.filter(|next| is_safe_next(next))
    }
}

pub async fn login_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<NextQuery>,
) -> Result<Response, PageError> {
    let form = LoginForm {
        next: query.safe_next(),
        ..Default::default()
    };
    state.render("registration/login.html", &LoginContext { user, form })
}

/// Sign in and set the session cookie
pub async fn login(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<NextQuery>,
    Form(mut form): Form<LoginForm>,
) -> Result<Response, PageError> {
    form.next = form
        .next
        .take()
        .filter(|next| is_safe_next(next))
        .or_else(|| query.safe_next());

    if form.validate() {
        match state.user_service.login(&form.username, &form.password).await {
            Ok(session) => {
                let location = form.next.as_deref().unwrap_or("/");
                let mut response = found(location);
                response
                    .headers_mut()
                    .insert(header::SET_COOKIE, state.session_cookie(&session.id)?);
                return Ok(response);
            }
            Err(UserServiceError::AuthenticationError(_)) => form.reject_credentials(),
            Err(e) => return Err(e.into()),
        }
    }

    state.render("registration/login.html", &LoginContext { user, form })
}

pub async fn signup_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, PageError> {
    let context = SignupContext {
        user,
        form: SignupForm::default(),
    };
    state.render("registration/signup.html", &context)
}

/// Register a new user; they sign in separately afterwards
pub async fn signup(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(mut form): Form<SignupForm>,
) -> Result<Response, PageError> {
    if form.validate() {
        let input = CreateUserInput::new(form.username.clone(), form.password1.clone());
        match state.user_service.signup(input).await {
            Ok(_) => return Ok(found(LOGIN_URL)),
            Err(UserServiceError::UserExists(_)) => form.errors.add("username", USERNAME_TAKEN),
            Err(UserServiceError::ValidationError(message)) => form.errors.add_non_field(message),
            Err(e) => return Err(e.into()),
        }
    }

    state.render("registration/signup.html", &SignupContext { user, form })
}

/// Close the session and clear the cookie
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, PageError> {
    if let Some(token) = extract_session_token(&headers, &state.session_cookie_name) {
        state.user_service.logout(&token).await?;
    }

    let page = state.render("registration/logged_out.html", &LoggedOutContext { user: None })?;
    Ok(([(header::SET_COOKIE, state.clear_session_cookie()?)], page).into_response())
}
