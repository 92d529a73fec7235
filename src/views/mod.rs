//! Views, types to generate layouts.
//!
//! Most of these types are meant to be returned from a route.

use serde::{Serialize, Serializer};

use serde_json::value::{to_value, Value as JsonValue};

use rocket::uri;

use crate::feed::Feed;
use crate::models::*;
use crate::pagination::Pagination;
use crate::profile::{self, FollowStatus, ProfileSummary};
use crate::Result;

pub mod error;

#[macro_export]
macro_rules! impl_template_responder {
    ($t:ty, $template:expr) => {
        impl<'r> ::rocket::response::Responder<'r, 'static> for $t {
            fn respond_to(
                self,
                req: &'r ::rocket::request::Request<'_>,
            ) -> ::rocket::response::Result<'static> {
                let data = ::serde_json::value::to_value(self)
                    .expect("could not serialize value");
                let template =
                    ::rocket_dyn_templates::Template::render($template, data);

                log::trace!("Rendering template at {}", $template);

                template.respond_to(req)
            }
        }
    };
}

/// Display information for a page.
#[derive(Debug, Serialize)]
pub struct PageInfo {
    /// A list of groups for the site navigation.
    pub groups: Vec<GroupView>,
    /// The logged-in user, if there is one.
    pub viewer: Option<UserView>,
    /// The version of the quill server.
    pub version: String,
}

impl PageInfo {
    fn new(db: &Database, viewer: Option<&User>) -> Result<PageInfo> {
        Ok(PageInfo {
            groups: db.all_groups()?.into_iter().map(GroupView).collect(),
            viewer: viewer.cloned().map(UserView),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// Page info for pages that render without touching the database.
    fn bare() -> PageInfo {
        PageInfo {
            groups: Vec::new(),
            viewer: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// A wrapper for a user that can be passed into a template.
#[derive(Debug)]
pub struct UserView(User);

impl Serialize for UserView {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let uri = self.0.uri();

        let mut data = to_value(&self.0).expect("could not serialize user");

        data.as_object_mut()
            .unwrap()
            .insert("uri".into(), JsonValue::String(uri));

        data.serialize(serializer)
    }
}

/// A wrapper for a group that can be passed into a template.
#[derive(Debug)]
pub struct GroupView(Group);

impl Serialize for GroupView {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let uri = self.0.uri();

        let mut data = to_value(&self.0).expect("could not serialize group");

        data.as_object_mut()
            .unwrap()
            .insert("uri".into(), JsonValue::String(uri));

        data.serialize(serializer)
    }
}

/// A post and the rows a template needs to render it.
#[derive(Debug)]
pub struct PostView {
    post: Post,
    author: User,
    group: Option<Group>,
}

impl PostView {
    fn new(db: &Database, post: Post) -> Result<PostView> {
        let author = db.user_by_id(post.author)?;
        let group = match post.group_id {
            Some(group_id) => Some(db.group_by_id(group_id)?),
            None => None,
        };

        Ok(PostView { post, author, group })
    }

    fn load(db: &Database, posts: Vec<Post>) -> Result<Vec<PostView>> {
        posts
            .into_iter()
            .map(|post| PostView::new(db, post))
            .collect()
    }
}

impl Serialize for PostView {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let time_stamp = self.post.time_stamp.format("%F %R").to_string();

        let uri =
            uri!(crate::routes::post_detail(&self.author.username, self.post.id))
                .to_string();
        let edit_uri =
            uri!(crate::routes::new::edit_post(&self.author.username, self.post.id))
                .to_string();
        let comment_uri = uri!(crate::routes::new::handle_new_comment(
            &self.author.username,
            self.post.id
        ))
        .to_string();

        let mut data = to_value(&self.post).expect("could not serialize post");

        let obj = data.as_object_mut().unwrap();

        obj.insert("time_stamp".into(), JsonValue::String(time_stamp));
        obj.insert("uri".into(), JsonValue::String(uri));
        obj.insert("edit_uri".into(), JsonValue::String(edit_uri));
        obj.insert("comment_uri".into(), JsonValue::String(comment_uri));
        obj.insert(
            "author".into(),
            to_value(UserView(self.author.clone()))
                .expect("could not serialize author"),
        );

        if let Some(group) = &self.group {
            obj.insert(
                "group".into(),
                to_value(GroupView(group.clone()))
                    .expect("could not serialize group"),
            );
        }

        if let Some(image_uri) = self.post.image_uri() {
            obj.insert("image_uri".into(), JsonValue::String(image_uri));
        }

        data.serialize(serializer)
    }
}

/// A comment and its author.
#[derive(Debug)]
pub struct CommentView {
    comment: Comment,
    author: User,
}

impl CommentView {
    fn load(db: &Database, comments: Vec<Comment>) -> Result<Vec<CommentView>> {
        comments
            .into_iter()
            .map(|comment| {
                Ok(CommentView {
                    author: db.user_by_id(comment.author)?,
                    comment,
                })
            })
            .collect()
    }
}

impl Serialize for CommentView {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let time_stamp = self.comment.time_stamp.format("%F %R").to_string();

        let mut data =
            to_value(&self.comment).expect("could not serialize comment");

        let obj = data.as_object_mut().unwrap();

        obj.insert("time_stamp".into(), JsonValue::String(time_stamp));
        obj.insert(
            "author".into(),
            to_value(UserView(self.author.clone()))
                .expect("could not serialize author"),
        );

        data.serialize(serializer)
    }
}

/// One page of a feed, rendered separately from the page chrome.
///
/// The home page renders its listing through this so the HTML can be kept
/// in the listing cache and reused across viewers; the chrome around it is
/// still rendered per request.
#[derive(Debug, Serialize)]
pub struct FeedFragment {
    posts: Vec<PostView>,
    pagination: Pagination,
}

impl FeedFragment {
    pub fn new(db: &Database, feed: Feed) -> Result<FeedFragment> {
        Ok(FeedFragment {
            posts: PostView::load(db, feed.posts)?,
            pagination: feed.pagination,
        })
    }
}

/// The home page: the global feed.
#[derive(Debug, Serialize)]
pub struct HomePage {
    page_info: PageInfo,
    /// The feed fragment, already rendered to HTML.
    listing: String,
}

impl HomePage {
    pub fn new(
        db: &Database,
        viewer: Option<&User>,
        listing: String,
    ) -> Result<HomePage> {
        Ok(HomePage {
            page_info: PageInfo::new(db, viewer)?,
            listing,
        })
    }
}

impl_template_responder!(HomePage, "pages/home");

/// The feed page for one group.
#[derive(Debug, Serialize)]
pub struct GroupPage {
    page_info: PageInfo,
    group: GroupView,
    posts: Vec<PostView>,
    pagination: Pagination,
}

impl GroupPage {
    pub fn new(
        db: &Database,
        viewer: Option<&User>,
        group: Group,
        feed: Feed,
    ) -> Result<GroupPage> {
        Ok(GroupPage {
            page_info: PageInfo::new(db, viewer)?,
            group: GroupView(group),
            posts: PostView::load(db, feed.posts)?,
            pagination: feed.pagination,
        })
    }
}

impl_template_responder!(GroupPage, "pages/group");

/// An author's profile: their details, counts, and posts.
#[derive(Debug, Serialize)]
pub struct ProfilePage {
    page_info: PageInfo,
    author: UserView,
    summary: ProfileSummary,
    can_follow: bool,
    can_unfollow: bool,
    follow_uri: String,
    unfollow_uri: String,
    posts: Vec<PostView>,
    pagination: Pagination,
}

impl ProfilePage {
    pub fn new(
        db: &Database,
        viewer: Option<&User>,
        author: User,
        feed: Feed,
    ) -> Result<ProfilePage> {
        let summary = profile::summarize(db, viewer, &author)?;

        let follow_uri =
            uri!(crate::routes::follow(&author.username)).to_string();
        let unfollow_uri =
            uri!(crate::routes::unfollow(&author.username)).to_string();

        Ok(ProfilePage {
            page_info: PageInfo::new(db, viewer)?,
            can_follow: summary.follow_status == FollowStatus::NotFollowing,
            can_unfollow: summary.follow_status == FollowStatus::Following,
            author: UserView(author),
            summary,
            follow_uri,
            unfollow_uri,
            posts: PostView::load(db, feed.posts)?,
            pagination: feed.pagination,
        })
    }
}

impl_template_responder!(ProfilePage, "pages/profile");

/// The viewer's following feed, with the authors they follow.
#[derive(Debug, Serialize)]
pub struct FollowingPage {
    page_info: PageInfo,
    authors: Vec<UserView>,
    posts: Vec<PostView>,
    pagination: Pagination,
}

impl FollowingPage {
    pub fn new(db: &Database, viewer: &User, feed: Feed) -> Result<FollowingPage> {
        Ok(FollowingPage {
            page_info: PageInfo::new(db, Some(viewer))?,
            authors: db
                .followed_authors(viewer.id)?
                .into_iter()
                .map(UserView)
                .collect(),
            posts: PostView::load(db, feed.posts)?,
            pagination: feed.pagination,
        })
    }
}

impl_template_responder!(FollowingPage, "pages/following");

/// A single post with its comments.
#[derive(Debug, Serialize)]
pub struct PostPage {
    page_info: PageInfo,
    post: PostView,
    comments: Vec<CommentView>,
    can_edit: bool,
    comment_error: Option<String>,
}

impl PostPage {
    pub fn new(db: &Database, viewer: Option<&User>, post: Post) -> Result<PostPage> {
        PostPage::with_comment_error(db, viewer, post, None)
    }

    /// The post page re-rendered after a rejected comment.
    pub fn with_comment_error(
        db: &Database,
        viewer: Option<&User>,
        post: Post,
        comment_error: Option<String>,
    ) -> Result<PostPage> {
        let can_edit =
            viewer.map(|viewer| viewer.id == post.author).unwrap_or(false);
        let comments = CommentView::load(db, db.comments_on_post(post.id)?)?;

        Ok(PostPage {
            page_info: PageInfo::new(db, viewer)?,
            post: PostView::new(db, post)?,
            comments,
            can_edit,
            comment_error,
        })
    }
}

impl_template_responder!(PostPage, "pages/post");

/// The form for writing a new post.
#[derive(Debug, Serialize)]
pub struct NewPostPage {
    page_info: PageInfo,
    error: Option<String>,
    body: String,
}

impl NewPostPage {
    pub fn new(db: &Database, viewer: &User) -> Result<NewPostPage> {
        NewPostPage::with_error(db, viewer, None, String::new())
    }

    /// The form re-rendered after a rejected submission, keeping the input.
    pub fn with_error(
        db: &Database,
        viewer: &User,
        error: Option<String>,
        body: String,
    ) -> Result<NewPostPage> {
        Ok(NewPostPage {
            page_info: PageInfo::new(db, Some(viewer))?,
            error,
            body,
        })
    }
}

impl_template_responder!(NewPostPage, "pages/new-post");

/// The form for editing an existing post.
#[derive(Debug, Serialize)]
pub struct EditPostPage {
    page_info: PageInfo,
    post: PostView,
    body: String,
    error: Option<String>,
}

impl EditPostPage {
    pub fn new(db: &Database, viewer: &User, post: Post) -> Result<EditPostPage> {
        let body = post.body.clone();

        EditPostPage::with_error(db, viewer, post, body, None)
    }

    /// The form re-rendered after a rejected edit, keeping the input.
    pub fn with_error(
        db: &Database,
        viewer: &User,
        post: Post,
        body: String,
        error: Option<String>,
    ) -> Result<EditPostPage> {
        Ok(EditPostPage {
            page_info: PageInfo::new(db, Some(viewer))?,
            post: PostView::new(db, post)?,
            body,
            error,
        })
    }
}

impl_template_responder!(EditPostPage, "pages/edit-post");

/// The login form.
#[derive(Debug, Serialize)]
pub struct LoginPage {
    page_info: PageInfo,
    error: Option<String>,
    username: String,
}

impl LoginPage {
    pub fn new(db: &Database) -> Result<LoginPage> {
        LoginPage::with_error(db, None, String::new())
    }

    /// The form re-rendered after a failed login.
    pub fn with_error(
        db: &Database,
        error: Option<String>,
        username: String,
    ) -> Result<LoginPage> {
        Ok(LoginPage {
            page_info: PageInfo::new(db, None)?,
            error,
            username,
        })
    }
}

impl_template_responder!(LoginPage, "pages/login");

/// The signup form.
#[derive(Debug, Serialize)]
pub struct SignupPage {
    page_info: PageInfo,
    error: Option<String>,
    username: String,
    display_name: String,
}

impl SignupPage {
    pub fn new(db: &Database) -> Result<SignupPage> {
        SignupPage::with_error(db, None, String::new(), String::new())
    }

    /// The form re-rendered after a rejected signup, keeping the input.
    pub fn with_error(
        db: &Database,
        error: Option<String>,
        username: String,
        display_name: String,
    ) -> Result<SignupPage> {
        Ok(SignupPage {
            page_info: PageInfo::new(db, None)?,
            error,
            username,
            display_name,
        })
    }
}

impl_template_responder!(SignupPage, "pages/signup");
