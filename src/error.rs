//! Error types.

use log::{error, warn};

use rocket::http::Status;
use rocket::response::{Redirect, Responder};
use rocket::{uri, Request};

use derive_more::{Display, From};

use crate::models::PostId;
use crate::views::error::*;

/// Our error type.
#[derive(Debug, Display, From)]
pub enum Error {
    #[display(fmt = "User '{}' not found", username)]
    UserNotFound { username: String },
    #[display(fmt = "Group '{}' not found", slug)]
    GroupNotFound { slug: String },
    #[display(fmt = "Post #{} not found", post_id)]
    PostNotFound { post_id: PostId },
    #[display(fmt = "Tried to change content without authentication")]
    NotAuthenticated,
    #[display(fmt = "Missing session cookie")]
    MissingSessionCookie,
    #[display(fmt = "Invalid session cookie")]
    SessionNotFound,
    #[display(fmt = "Session expired")]
    ExpiredSession,
    #[display(fmt = "Only the author of post #{} can edit it", post_id)]
    NotPostAuthor { username: String, post_id: PostId },
    #[display(fmt = "User '{}' tried to follow themselves", username)]
    SelfFollow { username: String },
    #[display(fmt = "A post needs some text")]
    EmptyPostBody,
    #[display(fmt = "A comment needs some text")]
    EmptyCommentBody,
    #[display(fmt = "Uploads must be images, got '{}'", content_type)]
    ImageBadContentType { content_type: String },
    #[display(fmt = "Couldn't read the uploaded file as an image")]
    ImageInvalid,
    #[display(fmt = "The uploaded image is too large")]
    ImageTooLarge,
    #[display(
        fmt = "Usernames are 1 to 30 letters, digits, '-' or '_', got '{}'",
        username
    )]
    UsernameInvalid { username: String },
    #[display(fmt = "The username '{}' is already taken", username)]
    UsernameTaken { username: String },
    #[display(fmt = "Passwords must be at least 8 characters")]
    PasswordTooShort,
    #[display(fmt = "The passwords don't match")]
    PasswordMismatch,
    #[display(fmt = "Invalid username or password")]
    LoginInvalid,
    #[display(fmt = "A group with slug '{}' already exists", slug)]
    GroupSlugTaken { slug: String },
    #[display(fmt = "Couldn't render template '{}'", name)]
    TemplateUnrenderable { name: String },
    #[display(fmt = "Path for {} at {} does not exist", name, path)]
    ConfigPathNotFound { name: String, path: String },
    #[display(fmt = "Couldn't hash password: {}", _0)]
    #[from]
    HashError(argon2::Error),
    #[display(fmt = "JSON error: {}", _0)]
    #[from]
    JsonError(serde_json::error::Error),
    #[display(fmt = "YAML error: {}", _0)]
    #[from]
    YamlError(serde_yaml::Error),
    #[display(fmt = "Couldn't initialize logging: {}", _0)]
    #[from]
    LogError(log::SetLoggerError),
    #[display(fmt = "Database connection pool error: {}", _0)]
    #[from]
    R2d2Error(r2d2::Error),
    #[display(fmt = "Database error: {}", _0)]
    #[from]
    DatabaseError(diesel::result::Error),
    #[display(fmt = "Database migration error: {}", _0)]
    #[from]
    MigrationError(Box<dyn std::error::Error + Send + Sync>),
    #[display(fmt = "Couldn't open the SQLite database: {}", _0)]
    #[from]
    ConnectionError(diesel::ConnectionError),
    #[display(fmt = "Couldn't launch the server: {}", _0)]
    #[from]
    LaunchError(rocket::Error),
    #[display(fmt = "I/O error: {}", _0)]
    #[from]
    IoError(std::io::Error),
    #[display(fmt = "I/O error: {}: {}", msg, cause)]
    IoErrorMsg { cause: std::io::Error, msg: String },
    #[display(fmt = "Error parsing duration: {}", _0)]
    #[from]
    DurationParseError(parse_duration::parse::Error),
}

impl Error {
    pub fn from_io_error<S>(cause: std::io::Error, msg: S) -> Error
    where
        S: Into<String>,
    {
        Error::IoErrorMsg {
            cause,
            msg: msg.into(),
        }
    }

    /// Whether this error came from bad form input.
    ///
    /// Form routes intercept these and re-render the form with the message
    /// instead of letting the responder produce an error page.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::EmptyPostBody
                | Error::EmptyCommentBody
                | Error::ImageBadContentType { .. }
                | Error::ImageInvalid
                | Error::ImageTooLarge
                | Error::UsernameInvalid { .. }
                | Error::UsernameTaken { .. }
                | Error::PasswordTooShort
                | Error::PasswordMismatch
                | Error::LoginInvalid
                | Error::GroupSlugTaken { .. }
        )
    }
}

impl<'r> Responder<'r, 'static> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> rocket::response::Result<'static> {
        match self {
            Error::UserNotFound { .. }
            | Error::GroupNotFound { .. }
            | Error::PostNotFound { .. } => {
                warn!("{}", &self);

                let page = NotFoundPage::new(self.to_string());

                let mut res = page.respond_to(req)?;
                res.set_status(Status::NotFound);

                Ok(res)
            }

            Error::NotAuthenticated
            | Error::MissingSessionCookie
            | Error::SessionNotFound
            | Error::ExpiredSession => {
                // If the client isn't authenticated, just redirect them to
                // the login page.

                let login_uri = uri!(crate::routes::account::login_page);

                Redirect::to(login_uri).respond_to(req)
            }

            Error::NotPostAuthor { username, post_id } => {
                warn!("User tried to edit post #{} by '{}'", post_id, username);

                let post_uri = uri!(crate::routes::post_detail(&username, post_id));

                Redirect::to(post_uri).respond_to(req)
            }

            Error::SelfFollow { username } => {
                let profile_uri = uri!(crate::routes::profile(&username, _));

                Redirect::to(profile_uri).respond_to(req)
            }

            err if err.is_validation() => {
                warn!("{}", &err);

                let page = BadRequestPage::new(err.to_string());

                let mut res = page.respond_to(req)?;
                res.set_status(Status::BadRequest);

                Ok(res)
            }

            err => {
                error!("{}", &err);

                let page = InternalServerErrorPage::new(err.to_string());

                let mut res = page.respond_to(req)?;
                res.set_status(Status::InternalServerError);

                Ok(res)
            }
        }
    }
}

impl std::error::Error for Error {}

/// Our result type.
pub type Result<T> = std::result::Result<T, Error>;
