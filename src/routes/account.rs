//! Routes for accounts: signing up, logging in and logging out.

use argon2::{hash_encoded, verify_encoded};

use chrono::{Duration, Utc};

use log::info;

use rand::{distributions::Alphanumeric, thread_rng, Rng};

use rocket::form::{Form, FromForm};
use rocket::http::{Cookie, CookieJar, Status};
use rocket::request::{FromRequest, Outcome, Request};
use rocket::response::{Redirect, Responder};
use rocket::{get, post, uri, State};

use crate::models::*;
use crate::views::{LoginPage, SignupPage};
use crate::{Error, Result};

/// Usernames that would shadow a route if they were allowed.
const RESERVED_USERNAMES: &[&str] =
    &["auth", "follow", "group", "media", "new", "static"];

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Session {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let db = req
            .rocket()
            .state::<Database>()
            .expect("expected database to be initialized");
        let cookies = req.cookies();

        let session_id = match cookies.get("session") {
            Some(cookie) => cookie.value(),
            None => {
                return Outcome::Error((
                    Status::Forbidden,
                    Error::MissingSessionCookie,
                ))
            }
        };

        match db.session(session_id) {
            Ok(session) => Outcome::Success(session),
            Err(err) => Outcome::Error((Status::Forbidden, err)),
        }
    }
}

/// Check a requested username: 1 to 30 characters from `[A-Za-z0-9_-]`,
/// and not a word the router owns.
fn validate_username(username: &str) -> Result<()> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-';

    if username.is_empty()
        || username.len() > 30
        || !username.chars().all(allowed)
        || RESERVED_USERNAMES.contains(&username)
    {
        return Err(Error::UsernameInvalid {
            username: username.into(),
        });
    }

    Ok(())
}

/// Open a new session for a user and hand the client its cookie.
fn start_session(
    db: &Database,
    cookies: &CookieJar<'_>,
    user: User,
) -> Result<()> {
    let id: String = thread_rng()
        .sample_iter(Alphanumeric)
        .map(char::from)
        .take(42)
        .collect();

    let expires = Utc::now() + Duration::weeks(1);

    cookies.add(
        Cookie::build(("session", id.clone()))
            .path("/")
            .http_only(true),
    );

    db.insert_session(Session { id, expires, user })?;

    Ok(())
}

/// Signup form data.
#[derive(FromForm)]
pub struct SignupData {
    username: String,
    display_name: String,
    password: String,
    password_confirm: String,
}

/// Login form data.
#[derive(FromForm)]
pub struct LoginData {
    username: String,
    password: String,
}

/// How a signup ends: logged in and heading home, or back on the form.
#[derive(Responder)]
pub enum SignupOutcome {
    Proceed(Redirect),
    Retry(SignupPage),
}

/// How a login attempt ends: heading home, or back on the form.
#[derive(Responder)]
pub enum LoginOutcome {
    Proceed(Redirect),
    Retry(LoginPage),
}

/// Serve the signup page.
#[get("/auth/signup")]
pub fn signup_page(db: &State<Database>) -> Result<SignupPage> {
    SignupPage::new(db)
}

/// Handle a signup: validate, create the user, and log them in.
#[post("/auth/signup", data = "<signup_data>")]
pub fn handle_signup(
    signup_data: Form<SignupData>,
    db: &State<Database>,
    cookies: &CookieJar<'_>,
) -> Result<SignupOutcome> {
    let SignupData {
        username,
        display_name,
        password,
        password_confirm,
    } = signup_data.into_inner();

    let rejection = if let Err(err) = validate_username(&username) {
        Some(err)
    } else if password.len() < 8 {
        Some(Error::PasswordTooShort)
    } else if password != password_confirm {
        Some(Error::PasswordMismatch)
    } else {
        None
    };

    if let Some(err) = rejection {
        return Ok(SignupOutcome::Retry(SignupPage::with_error(
            db,
            Some(err.to_string()),
            username,
            display_name,
        )?));
    }

    let display_name = if display_name.trim().is_empty() {
        username.clone()
    } else {
        display_name
    };

    let salt: [u8; 16] = thread_rng().gen();
    let password_hash =
        hash_encoded(password.as_bytes(), &salt, &argon2::Config::default())?;

    let user = match db.insert_user(NewUser {
        username: username.clone(),
        display_name: display_name.clone(),
        password_hash,
        joined: Utc::now(),
    }) {
        Ok(user) => user,
        Err(err @ Error::UsernameTaken { .. }) => {
            return Ok(SignupOutcome::Retry(SignupPage::with_error(
                db,
                Some(err.to_string()),
                username,
                display_name,
            )?))
        }
        Err(err) => return Err(err),
    };

    info!("User '{}' signed up", user.username);

    start_session(db, cookies, user)?;

    Ok(SignupOutcome::Proceed(Redirect::to(uri!(
        crate::routes::home(_)
    ))))
}

/// Serve the login page.
#[get("/auth/login")]
pub fn login_page(db: &State<Database>) -> Result<LoginPage> {
    LoginPage::new(db)
}

/// Log a user in.
#[post("/auth/login", data = "<login_data>")]
pub async fn handle_login(
    login_data: Form<LoginData>,
    db: &State<Database>,
    cookies: &CookieJar<'_>,
) -> Result<LoginOutcome> {
    let LoginData { username, password } = login_data.into_inner();

    let user = match db.user(&username) {
        Ok(user) => Some(user),
        Err(Error::UserNotFound { .. }) => None,
        Err(err) => return Err(err),
    };

    let verified = match &user {
        Some(user) => verify_encoded(&user.password_hash, password.as_bytes())?,
        None => false,
    };

    if let (Some(user), true) = (user, verified) {
        info!("User '{}' logged in", user.username);

        start_session(db, cookies, user)?;

        return Ok(LoginOutcome::Proceed(Redirect::to(uri!(
            crate::routes::home(_)
        ))));
    }

    // To reduce the effectiveness of brute-forcing passwords.
    rocket::tokio::time::sleep(std::time::Duration::from_secs(4)).await;

    Ok(LoginOutcome::Retry(LoginPage::with_error(
        db,
        Some(Error::LoginInvalid.to_string()),
        username,
    )?))
}

/// Log a user out.
#[get("/auth/logout")]
pub fn logout(
    session: Option<Session>,
    cookies: &CookieJar<'_>,
    db: &State<Database>,
) -> Result<Redirect> {
    let session = session.ok_or(Error::NotAuthenticated)?;

    cookies.remove(Cookie::build("session").path("/"));

    db.delete_session(&session.id)?;

    info!("User '{}' logged out", session.user.username);

    Ok(Redirect::to(uri!(crate::routes::home(_))))
}
