//! Routes for writing, editing and commenting on posts.

use std::path::Path;

use chrono::offset::Utc;

use log::info;

use rocket::data::Capped;
use rocket::form::{Form, FromForm};
use rocket::fs::TempFile;
use rocket::response::{Redirect, Responder};
use rocket::tokio::io::AsyncReadExt;
use rocket::{get, post, uri, State};

use crate::config::Config;
use crate::media;
use crate::models::*;
use crate::views::{EditPostPage, NewPostPage, PostPage};
use crate::{Error, Result};

/// Form data for writing or editing a post.
#[derive(FromForm)]
pub struct PostData<'r> {
    body: String,
    /// The slug of the group to file the post under; empty for none.
    group: Option<String>,
    image: Option<Capped<TempFile<'r>>>,
}

/// Form data for a comment.
#[derive(FromForm)]
pub struct CommentData {
    body: String,
}

/// How a post submission ends: on the new post, or back on the form.
#[derive(Responder)]
pub enum NewPostOutcome {
    Proceed(Redirect),
    Retry(NewPostPage),
}

/// How an edit ends: on the edited post, or back on the form.
#[derive(Responder)]
pub enum EditPostOutcome {
    Proceed(Redirect),
    Retry(EditPostPage),
}

/// How a comment submission ends: on the post, or back on its page.
#[derive(Responder)]
pub enum CommentOutcome {
    Proceed(Redirect),
    Retry(PostPage),
}

/// Validate and store an uploaded image, if one was sent.
///
/// Browsers submit an empty file field when no file was chosen; that counts
/// as no image, not as a bad one.
async fn save_image(
    file: Option<Capped<TempFile<'_>>>,
    upload_dir: &Path,
) -> Result<Option<String>> {
    let file = match file {
        Some(file) if file.value.len() > 0 => file,
        _ => return Ok(None),
    };

    if !file.is_complete() {
        return Err(Error::ImageTooLarge);
    }

    let mut file = file.value;

    match file.content_type() {
        Some(content_type) if content_type.top() == "image" => {}
        content_type => {
            return Err(Error::ImageBadContentType {
                content_type: content_type
                    .map(|content_type| content_type.to_string())
                    .unwrap_or_else(|| String::from("unknown")),
            })
        }
    }

    let mut data = Vec::new();

    file.open()
        .await
        .map_err(|err| Error::from_io_error(err, "Couldn't open the upload"))?
        .read_to_end(&mut data)
        .await
        .map_err(|err| Error::from_io_error(err, "Couldn't read the upload"))?;

    Ok(Some(media::store_image(&data, upload_dir)?))
}

/// Look up the group a post should be filed under, if any.
///
/// The form sends an empty slug for "no group".
fn resolve_group(db: &Database, slug: Option<&str>) -> Result<Option<GroupId>> {
    match slug.filter(|slug| !slug.is_empty()) {
        Some(slug) => Ok(Some(db.group(slug)?.id)),
        None => Ok(None),
    }
}

/// Serve the form for writing a new post.
#[get("/new")]
pub fn new_post(
    db: &State<Database>,
    session: Option<Session>,
) -> Result<NewPostPage> {
    let session = session.ok_or(Error::NotAuthenticated)?;

    NewPostPage::new(db, &session.user)
}

/// Handle a request to create a new post.
#[post("/new", data = "<post_data>")]
pub async fn handle_new_post(
    post_data: Form<PostData<'_>>,
    db: &State<Database>,
    config: &State<Config>,
    session: Option<Session>,
) -> Result<NewPostOutcome> {
    let session = session.ok_or(Error::NotAuthenticated)?;

    let PostData { body, group, image } = post_data.into_inner();

    if body.trim().is_empty() {
        return Ok(NewPostOutcome::Retry(NewPostPage::with_error(
            db,
            &session.user,
            Some(Error::EmptyPostBody.to_string()),
            body,
        )?));
    }

    let group_id = resolve_group(db, group.as_deref())?;

    let image = match save_image(image, &config.upload_dir).await {
        Ok(image) => image,
        Err(err) if err.is_validation() => {
            return Ok(NewPostOutcome::Retry(NewPostPage::with_error(
                db,
                &session.user,
                Some(err.to_string()),
                body,
            )?))
        }
        Err(err) => return Err(err),
    };

    let post_id = db.insert_post(NewPost {
        time_stamp: Utc::now(),
        body,
        author: session.user.id,
        group_id,
        image,
    })?;

    info!("User '{}' wrote post #{}", session.user.username, post_id);

    Ok(NewPostOutcome::Proceed(Redirect::to(uri!(
        crate::routes::post_detail(&session.user.username, post_id)
    ))))
}

/// Serve the form for editing a post.
#[get("/<username>/<post_id>/edit")]
pub fn edit_post(
    username: String,
    post_id: PostId,
    db: &State<Database>,
    session: Option<Session>,
) -> Result<EditPostPage> {
    let session = session.ok_or(Error::NotAuthenticated)?;

    let post = db.post(post_id)?;
    let author = db.user_by_id(post.author)?;

    if author.username != username {
        return Err(Error::PostNotFound { post_id });
    }

    if post.author != session.user.id {
        return Err(Error::NotPostAuthor { username, post_id });
    }

    EditPostPage::new(db, &session.user, post)
}

/// Handle a request to edit a post.
///
/// The group tag is rewritten from the form on every edit; the image is
/// only replaced when a new one is uploaded.
#[post("/<username>/<post_id>/edit", data = "<post_data>")]
pub async fn handle_edit_post(
    username: String,
    post_id: PostId,
    post_data: Form<PostData<'_>>,
    db: &State<Database>,
    config: &State<Config>,
    session: Option<Session>,
) -> Result<EditPostOutcome> {
    let session = session.ok_or(Error::NotAuthenticated)?;

    let post = db.post(post_id)?;
    let author = db.user_by_id(post.author)?;

    if author.username != username {
        return Err(Error::PostNotFound { post_id });
    }

    if post.author != session.user.id {
        return Err(Error::NotPostAuthor { username, post_id });
    }

    let PostData { body, group, image } = post_data.into_inner();

    if body.trim().is_empty() {
        return Ok(EditPostOutcome::Retry(EditPostPage::with_error(
            db,
            &session.user,
            post,
            body,
            Some(Error::EmptyPostBody.to_string()),
        )?));
    }

    let group_id = resolve_group(db, group.as_deref())?;

    let image = match save_image(image, &config.upload_dir).await {
        Ok(image) => image,
        Err(err) if err.is_validation() => {
            return Ok(EditPostOutcome::Retry(EditPostPage::with_error(
                db,
                &session.user,
                post,
                body,
                Some(err.to_string()),
            )?))
        }
        Err(err) => return Err(err),
    };

    db.update_post(
        post_id,
        UpdatePost {
            body,
            group_id: Some(group_id),
            image,
        },
    )?;

    info!("User '{}' edited post #{}", session.user.username, post_id);

    Ok(EditPostOutcome::Proceed(Redirect::to(uri!(
        crate::routes::post_detail(&username, post_id)
    ))))
}

/// Handle a request to comment on a post.
#[post("/<username>/<post_id>/comment", data = "<comment_data>")]
pub fn handle_new_comment(
    username: String,
    post_id: PostId,
    comment_data: Form<CommentData>,
    db: &State<Database>,
    session: Option<Session>,
) -> Result<CommentOutcome> {
    let session = session.ok_or(Error::NotAuthenticated)?;

    let post = db.post(post_id)?;
    let author = db.user_by_id(post.author)?;

    if author.username != username {
        return Err(Error::PostNotFound { post_id });
    }

    let CommentData { body } = comment_data.into_inner();

    if body.trim().is_empty() {
        return Ok(CommentOutcome::Retry(PostPage::with_comment_error(
            db,
            Some(&session.user),
            post,
            Some(Error::EmptyCommentBody.to_string()),
        )?));
    }

    db.insert_comment(NewComment {
        time_stamp: Utc::now(),
        body,
        post_id,
        author: session.user.id,
    })?;

    Ok(CommentOutcome::Proceed(Redirect::to(uri!(
        crate::routes::post_detail(&username, post_id)
    ))))
}
