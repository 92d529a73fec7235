//! Rocket HTTP routes.

use log::info;

use rocket::request::{FromRequest, Outcome, Request};
use rocket::response::Redirect;
use rocket::{catch, catchers, get, routes, uri, Catcher, Route, State};

use rocket_dyn_templates::Metadata;

use crate::cache::ListingCache;
use crate::feed;
use crate::models::*;
use crate::views::error::{
    BadRequestPage, InternalServerErrorPage, NotFoundPage,
};
use crate::views::*;
use crate::{Error, Result};

pub mod account;
pub mod new;

/// Get all routes.
pub fn routes() -> Vec<Route> {
    routes![
        crate::routes::home,
        crate::routes::group,
        crate::routes::following,
        crate::routes::profile,
        crate::routes::post_detail,
        crate::routes::follow,
        crate::routes::unfollow,
        crate::routes::new::new_post,
        crate::routes::new::handle_new_post,
        crate::routes::new::edit_post,
        crate::routes::new::handle_edit_post,
        crate::routes::new::handle_new_comment,
        crate::routes::account::signup_page,
        crate::routes::account::handle_signup,
        crate::routes::account::login_page,
        crate::routes::account::handle_login,
        crate::routes::account::logout,
    ]
}

/// Get all catchers.
pub fn catchers() -> Vec<Catcher> {
    catchers![not_found, unprocessable_entity, internal_error]
}

/// 404 for paths that don't match any route.
#[catch(404)]
fn not_found(req: &Request<'_>) -> NotFoundPage {
    NotFoundPage::new(format!("{} was not found", req.uri()))
}

/// 422 for forms that couldn't be parsed at all.
#[catch(422)]
fn unprocessable_entity() -> BadRequestPage {
    BadRequestPage::new("The submitted form was malformed")
}

/// 500 for everything the error responder didn't get to handle.
#[catch(500)]
fn internal_error() -> InternalServerErrorPage {
    InternalServerErrorPage::new("Something went wrong on our end")
}

/// The referring page, used to send a client back after an action.
#[derive(Debug)]
pub struct Referer(Option<String>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Referer {
    type Error = std::convert::Infallible;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(Referer(
            req.headers().get_one("Referer").map(String::from),
        ))
    }
}

/// Redirect back to the referring page, or to a fallback for clients that
/// didn't send one.
fn bounce(referer: Referer, fallback: rocket::http::uri::Origin<'static>) -> Redirect {
    match referer.0 {
        Some(uri) => Redirect::to(uri),
        None => Redirect::to(fallback),
    }
}

/// Serve the home page: the global feed.
///
/// The rendered listing is cached for a short window, so a brand new post
/// can take a few seconds to show up here.
#[get("/?<page>")]
pub fn home(
    page: Option<u32>,
    db: &State<Database>,
    cache: &State<ListingCache>,
    session: Option<Session>,
    metadata: Metadata<'_>,
) -> Result<HomePage> {
    let requested = page.unwrap_or(1);

    let listing = match cache.get(requested) {
        Some(rendered) => rendered,
        None => {
            let fragment = FeedFragment::new(db, feed::global(db, page)?)?;

            let (_, rendered) = metadata
                .render("fragments/feed", fragment)
                .ok_or_else(|| Error::TemplateUnrenderable {
                    name: "fragments/feed".into(),
                })?;

            cache.put(requested, rendered.clone());

            rendered
        }
    };

    HomePage::new(db, session.as_ref().map(|session| &session.user), listing)
}

/// Serve a group's feed.
#[get("/group/<slug>?<page>")]
pub fn group(
    slug: String,
    page: Option<u32>,
    db: &State<Database>,
    session: Option<Session>,
) -> Result<GroupPage> {
    let (group, feed) = feed::group(db, &slug, page)?;

    GroupPage::new(db, session.as_ref().map(|session| &session.user), group, feed)
}

/// Serve the viewer's following feed.
#[get("/follow?<page>")]
pub fn following(
    page: Option<u32>,
    db: &State<Database>,
    session: Option<Session>,
) -> Result<FollowingPage> {
    let session = session.ok_or(Error::NotAuthenticated)?;

    let feed = feed::following(db, &session.user, page)?;

    FollowingPage::new(db, &session.user, feed)
}

/// Serve an author's profile: their details and their posts.
#[get("/<username>?<page>", rank = 2)]
pub fn profile(
    username: String,
    page: Option<u32>,
    db: &State<Database>,
    session: Option<Session>,
) -> Result<ProfilePage> {
    let (author, feed) = feed::author(db, &username, page)?;

    ProfilePage::new(db, session.as_ref().map(|session| &session.user), author, feed)
}

/// Serve a single post with its comments.
#[get("/<username>/<post_id>", rank = 2)]
pub fn post_detail(
    username: String,
    post_id: PostId,
    db: &State<Database>,
    session: Option<Session>,
) -> Result<PostPage> {
    let post = db.post(post_id)?;
    let author = db.user_by_id(post.author)?;

    if author.username != username {
        return Err(Error::PostNotFound { post_id });
    }

    PostPage::new(db, session.as_ref().map(|session| &session.user), post)
}

/// Follow an author, then head back to the referring page.
#[get("/<username>/follow")]
pub fn follow(
    username: String,
    db: &State<Database>,
    session: Option<Session>,
    referer: Referer,
) -> Result<Redirect> {
    let session = session.ok_or(Error::NotAuthenticated)?;

    let author = db.user(&username)?;

    if db.insert_follow(&session.user, &author)? {
        info!("User '{}' followed '{}'", session.user.username, username);
    }

    Ok(bounce(referer, uri!(profile(&username, _))))
}

/// Stop following an author, then head back to the referring page.
#[get("/<username>/unfollow")]
pub fn unfollow(
    username: String,
    db: &State<Database>,
    session: Option<Session>,
    referer: Referer,
) -> Result<Redirect> {
    let session = session.ok_or(Error::NotAuthenticated)?;

    let author = db.user(&username)?;

    if db.delete_follow(&session.user, &author)? {
        info!("User '{}' unfollowed '{}'", session.user.username, username);
    }

    Ok(bounce(referer, uri!(profile(&username, _))))
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use chrono::{Duration, Utc};

    use rocket::http::{ContentType, Cookie, Status};
    use rocket::local::blocking::{Client, LocalResponse};

    use tempfile::TempDir;

    use crate::cache::{ListingCache, ManualClock};
    use crate::config::Config;
    use crate::models::test_support::*;
    use crate::models::{Database, Session};

    /// A site under test: a cookie-tracking client, the clock driving the
    /// listing cache, and the temporary upload directory backing it.
    struct TestSite {
        client: Client,
        clock: Arc<ManualClock>,
        _upload_dir: TempDir,
    }

    fn test_site() -> TestSite {
        let upload_dir =
            tempfile::tempdir().expect("could not create upload dir");
        let root = Path::new(env!("CARGO_MANIFEST_DIR"));

        let config = Config {
            address: "127.0.0.1".into(),
            port: 8000,
            static_dir: root.join("static"),
            upload_dir: upload_dir.path().to_path_buf(),
            template_dir: root.join("templates"),
            database_url: ":memory:".into(),
            log_file: None,
            feed_cache_ttl: std::time::Duration::from_secs(20),
        };

        let clock = Arc::new(ManualClock::new(base_time()));
        let cache =
            ListingCache::with_clock(config.feed_cache_ttl, clock.clone());
        let db = Database::open(&config.database_url)
            .expect("could not open database");

        let rocket = crate::instance(config, db, cache)
            .expect("could not build the instance");
        let client = Client::tracked(rocket).expect("could not build a client");

        TestSite {
            client,
            clock,
            _upload_dir: upload_dir,
        }
    }

    fn db(client: &Client) -> &Database {
        client.rocket().state().expect("database not managed")
    }

    fn signup(client: &Client, username: &str) {
        let response = client
            .post("/auth/signup")
            .header(ContentType::Form)
            .body(format!(
                "username={name}&display_name={name}\
                 &password=password1&password_confirm=password1",
                name = username
            ))
            .dispatch();

        assert_eq!(response.status(), Status::SeeOther);
    }

    fn logout(client: &Client) {
        let response = client.get("/auth/logout").dispatch();

        assert_eq!(response.status(), Status::SeeOther);
    }

    fn write_post(client: &Client, body: &str) {
        let response = client
            .post("/new")
            .header(ContentType::Form)
            .body(format!("body={}", body))
            .dispatch();

        assert_eq!(response.status(), Status::SeeOther);
    }

    fn body_of(response: LocalResponse) -> String {
        response.into_string().expect("response body")
    }

    fn multipart_body(
        text: &str,
        file: Option<(&str, &[u8])>,
    ) -> (ContentType, Vec<u8>) {
        let boundary = "X-QUILL-BOUNDARY";
        let mut data = Vec::new();

        data.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; \
                 name=\"body\"\r\n\r\n{}\r\n",
                boundary, text
            )
            .as_bytes(),
        );

        if let Some((content_type, bytes)) = file {
            data.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; \
                     name=\"image\"; filename=\"upload.png\"\r\n\
                     Content-Type: {}\r\n\r\n",
                    boundary, content_type
                )
                .as_bytes(),
            );
            data.extend_from_slice(bytes);
            data.extend_from_slice(b"\r\n");
        }

        data.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

        let content_type = ContentType::new("multipart", "form-data")
            .with_params(("boundary", boundary));

        (content_type, data)
    }

    fn png_bytes() -> Vec<u8> {
        let mut data = std::io::Cursor::new(Vec::new());

        image::DynamicImage::new_rgba8(1, 1)
            .write_to(&mut data, image::ImageFormat::Png)
            .expect("could not encode test image");

        data.into_inner()
    }

    #[test]
    fn the_home_page_renders_on_an_empty_site() {
        let site = test_site();

        let response = site.client.get("/").dispatch();

        assert_eq!(response.status(), Status::Ok);
        assert!(body_of(response).contains("<html"));
    }

    #[test]
    fn the_global_feed_serves_stale_pages_within_the_ttl() {
        let site = test_site();
        let client = &site.client;

        signup(client, "ada");
        write_post(client, "first-post");

        let warm = body_of(client.get("/").dispatch());
        assert!(warm.contains("first-post"));

        write_post(client, "second-post");

        let stale = body_of(client.get("/").dispatch());
        assert!(stale.contains("first-post"));
        assert!(!stale.contains("second-post"));

        site.clock.advance(Duration::seconds(21));

        let fresh = body_of(client.get("/").dispatch());
        assert!(fresh.contains("second-post"));
    }

    #[test]
    fn posting_requires_a_session() {
        let site = test_site();
        let client = &site.client;

        let form = client.get("/new").dispatch();
        assert_eq!(form.status(), Status::SeeOther);
        assert_eq!(form.headers().get_one("Location"), Some("/auth/login"));

        let response = client
            .post("/new")
            .header(ContentType::Form)
            .body("body=sneaky")
            .dispatch();

        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(
            response.headers().get_one("Location"),
            Some("/auth/login")
        );
        assert_eq!(db(client).num_posts().unwrap(), 0);
    }

    #[test]
    fn editing_and_commenting_require_a_session() {
        let site = test_site();
        let client = &site.client;

        signup(client, "ada");
        write_post(client, "untouched");
        logout(client);

        let post = db(client)
            .post_page(crate::pagination::Page { num: 1, width: 10 })
            .unwrap()
            .remove(0);

        let edit = client
            .post(format!("/ada/{}/edit", post.id))
            .header(ContentType::Form)
            .body("body=defaced")
            .dispatch();
        assert_eq!(edit.status(), Status::SeeOther);
        assert_eq!(edit.headers().get_one("Location"), Some("/auth/login"));

        let comment = client
            .post(format!("/ada/{}/comment", post.id))
            .header(ContentType::Form)
            .body("body=anonymous")
            .dispatch();
        assert_eq!(comment.status(), Status::SeeOther);

        assert_eq!(db(client).post(post.id).unwrap().body, "untouched");
        assert!(db(client).comments_on_post(post.id).unwrap().is_empty());
    }

    #[test]
    fn a_post_can_be_written_and_read_back() {
        let site = test_site();
        let client = &site.client;

        signup(client, "ada");
        write_post(client, "hello-from-ada");

        let profile = body_of(client.get("/ada").dispatch());
        assert!(profile.contains("hello-from-ada"));

        let post = db(client)
            .post_page(crate::pagination::Page { num: 1, width: 10 })
            .unwrap()
            .remove(0);

        let detail =
            body_of(client.get(format!("/ada/{}", post.id)).dispatch());
        assert!(detail.contains("hello-from-ada"));
    }

    #[test]
    fn posts_can_carry_an_image() {
        let site = test_site();
        let client = &site.client;

        signup(client, "ada");

        let png = png_bytes();
        let (content_type, data) =
            multipart_body("with-an-image", Some(("image/png", &png)));

        let response = client
            .post("/new")
            .header(content_type)
            .body(data)
            .dispatch();
        assert_eq!(response.status(), Status::SeeOther);

        let post = db(client)
            .post_page(crate::pagination::Page { num: 1, width: 10 })
            .unwrap()
            .remove(0);
        let image = post.image.expect("post should have an image");
        assert!(image.starts_with("posts/"));

        let served = client.get(format!("/media/{}", image)).dispatch();
        assert_eq!(served.status(), Status::Ok);
    }

    #[test]
    fn non_images_are_rejected_without_a_write() {
        let site = test_site();
        let client = &site.client;

        signup(client, "ada");

        let zip = b"PK\x03\x04not an image at all";
        let (content_type, data) =
            multipart_body("never-stored", Some(("image/png", zip)));

        let response = client
            .post("/new")
            .header(content_type)
            .body(data)
            .dispatch();

        assert_eq!(response.status(), Status::Ok);
        assert_eq!(db(client).num_posts().unwrap(), 0);
    }

    #[test]
    fn an_empty_body_rerenders_the_form() {
        let site = test_site();
        let client = &site.client;

        signup(client, "ada");

        let response = client
            .post("/new")
            .header(ContentType::Form)
            .body("body=+++")
            .dispatch();

        assert_eq!(response.status(), Status::Ok);
        assert_eq!(db(client).num_posts().unwrap(), 0);
    }

    #[test]
    fn only_the_author_can_edit_a_post() {
        let site = test_site();
        let client = &site.client;

        signup(client, "ada");
        write_post(client, "original-text");
        logout(client);

        let post = db(client)
            .post_page(crate::pagination::Page { num: 1, width: 10 })
            .unwrap()
            .remove(0);

        signup(client, "eve");

        let response = client
            .post(format!("/ada/{}/edit", post.id))
            .header(ContentType::Form)
            .body("body=defaced")
            .dispatch();

        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(
            response.headers().get_one("Location"),
            Some(format!("/ada/{}", post.id).as_str())
        );
        assert_eq!(db(client).post(post.id).unwrap().body, "original-text");
    }

    #[test]
    fn authors_can_edit_their_own_posts() {
        let site = test_site();
        let client = &site.client;

        signup(client, "ada");
        write_post(client, "first-draft");

        let post = db(client)
            .post_page(crate::pagination::Page { num: 1, width: 10 })
            .unwrap()
            .remove(0);

        let response = client
            .post(format!("/ada/{}/edit", post.id))
            .header(ContentType::Form)
            .body("body=second-draft")
            .dispatch();

        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(db(client).post(post.id).unwrap().body, "second-draft");
    }

    #[test]
    fn comments_appear_on_the_post_page() {
        let site = test_site();
        let client = &site.client;

        signup(client, "ada");
        write_post(client, "commentable");

        let post = db(client)
            .post_page(crate::pagination::Page { num: 1, width: 10 })
            .unwrap()
            .remove(0);

        let response = client
            .post(format!("/ada/{}/comment", post.id))
            .header(ContentType::Form)
            .body("body=nice-post")
            .dispatch();
        assert_eq!(response.status(), Status::SeeOther);

        let detail =
            body_of(client.get(format!("/ada/{}", post.id)).dispatch());
        assert!(detail.contains("nice-post"));
    }

    #[test]
    fn an_empty_comment_is_rejected_without_a_write() {
        let site = test_site();
        let client = &site.client;

        signup(client, "ada");
        write_post(client, "commentable");

        let post = db(client)
            .post_page(crate::pagination::Page { num: 1, width: 10 })
            .unwrap()
            .remove(0);

        let response = client
            .post(format!("/ada/{}/comment", post.id))
            .header(ContentType::Form)
            .body("body=++")
            .dispatch();

        assert_eq!(response.status(), Status::Ok);
        assert!(db(client).comments_on_post(post.id).unwrap().is_empty());
    }

    #[test]
    fn following_updates_the_follow_feed() {
        let site = test_site();
        let client = &site.client;

        let bob = add_user(db(client), "bob");
        add_post(db(client), &bob, "bobs-dispatch", 0);

        signup(client, "ada");

        let empty = body_of(client.get("/follow").dispatch());
        assert!(!empty.contains("bobs-dispatch"));

        assert_eq!(
            client.get("/bob/follow").dispatch().status(),
            Status::SeeOther
        );

        let followed = body_of(client.get("/follow").dispatch());
        assert!(followed.contains("bobs-dispatch"));

        assert_eq!(
            client.get("/bob/unfollow").dispatch().status(),
            Status::SeeOther
        );

        let unfollowed = body_of(client.get("/follow").dispatch());
        assert!(!unfollowed.contains("bobs-dispatch"));
    }

    #[test]
    fn following_yourself_is_bounced_without_an_edge() {
        let site = test_site();
        let client = &site.client;

        signup(client, "ada");

        let response = client.get("/ada/follow").dispatch();
        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(response.headers().get_one("Location"), Some("/ada"));

        let ada = db(client).user("ada").unwrap();
        assert_eq!(db(client).follower_count(ada.id).unwrap(), 0);
    }

    #[test]
    fn the_follow_feed_requires_a_session() {
        let site = test_site();

        let response = site.client.get("/follow").dispatch();

        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(
            response.headers().get_one("Location"),
            Some("/auth/login")
        );
    }

    #[test]
    fn follow_bounces_back_to_the_referring_page() {
        let site = test_site();
        let client = &site.client;

        add_user(db(client), "bob");
        signup(client, "ada");

        let response = client
            .get("/bob/follow")
            .header(rocket::http::Header::new("Referer", "/group/rust"))
            .dispatch();

        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(
            response.headers().get_one("Location"),
            Some("/group/rust")
        );
    }

    #[test]
    fn unknown_users_and_groups_render_404s() {
        let site = test_site();

        let user = site.client.get("/nobody").dispatch();
        assert_eq!(user.status(), Status::NotFound);

        let group = site.client.get("/group/void").dispatch();
        assert_eq!(group.status(), Status::NotFound);
    }

    #[test]
    fn group_pages_list_only_tagged_posts() {
        let site = test_site();
        let client = &site.client;

        let bob = add_user(db(client), "bob");
        let rust = add_group(db(client), "rust");
        add_group_post(db(client), &bob, "tagged-post", 0, Some(&rust));
        add_post(db(client), &bob, "untagged-post", 10);

        let page = body_of(client.get("/group/rust").dispatch());

        assert!(page.contains("tagged-post"));
        assert!(!page.contains("untagged-post"));
    }

    #[test]
    fn reserved_and_malformed_usernames_are_rejected() {
        let site = test_site();
        let client = &site.client;

        for username in ["new", "follow", "not%20ok", ""] {
            let response = client
                .post("/auth/signup")
                .header(ContentType::Form)
                .body(format!(
                    "username={}&display_name=x\
                     &password=password1&password_confirm=password1",
                    username
                ))
                .dispatch();

            assert_eq!(response.status(), Status::Ok);
        }

        assert!(db(client).user("new").is_err());
        assert!(db(client).user("follow").is_err());
    }

    #[test]
    fn a_taken_username_rerenders_the_signup_form() {
        let site = test_site();
        let client = &site.client;

        signup(client, "ada");
        logout(client);

        let response = client
            .post("/auth/signup")
            .header(ContentType::Form)
            .body(
                "username=ada&display_name=Another+Ada\
                 &password=password2&password_confirm=password2",
            )
            .dispatch();

        assert_eq!(response.status(), Status::Ok);
        assert!(body_of(response).contains("already taken"));
        assert_eq!(db(client).user("ada").unwrap().display_name, "ada");
    }

    #[test]
    fn a_failed_login_rerenders_the_form() {
        let site = test_site();
        let client = &site.client;

        signup(client, "ada");
        logout(client);

        let response = client
            .post("/auth/login")
            .header(ContentType::Form)
            .body("username=ada&password=wrong-password")
            .dispatch();

        assert_eq!(response.status(), Status::Ok);

        // Still logged out: protected pages bounce to the login form.
        let form = client.get("/new").dispatch();
        assert_eq!(form.status(), Status::SeeOther);
    }

    #[test]
    fn logging_out_ends_the_session() {
        let site = test_site();
        let client = &site.client;

        signup(client, "ada");

        assert_eq!(client.get("/new").dispatch().status(), Status::Ok);

        logout(client);

        let form = client.get("/new").dispatch();
        assert_eq!(form.status(), Status::SeeOther);
        assert_eq!(form.headers().get_one("Location"), Some("/auth/login"));
    }

    #[test]
    fn expired_sessions_redirect_to_login() {
        let site = test_site();
        let client = &site.client;

        let ada = add_user(db(client), "ada");

        db(client)
            .insert_session(Session {
                id: "a".repeat(42),
                expires: Utc::now() - Duration::hours(1),
                user: ada,
            })
            .expect("insert session");

        let response = client
            .get("/new")
            .cookie(Cookie::new("session", "a".repeat(42)))
            .dispatch();

        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(
            response.headers().get_one("Location"),
            Some("/auth/login")
        );
    }

    #[test]
    fn out_of_range_pages_clamp_to_the_last_page() {
        let site = test_site();
        let client = &site.client;

        let bob = add_user(db(client), "bob");

        add_post(db(client), &bob, "the-oldest-post", 0);
        for n in 1..11 {
            add_post(db(client), &bob, "filler", n);
        }

        // Eleven posts at ten per page: the oldest sits alone on page two.
        let page = body_of(client.get("/?page=99").dispatch());
        assert!(page.contains("the-oldest-post"));
    }
}
