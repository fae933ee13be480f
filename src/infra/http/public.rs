use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    application::{error::HttpError, feed::FeedError, posts::PostError},
    domain::entities::UserRecord,
    presentation::views::{
        CommentView, FollowTemplate, GroupTemplate, IndexTemplate, LayoutChrome, PostCard,
        PostDetailTemplate, PostDetailView, PostListView, ProfileTemplate, ProfileView,
        group_href, post_href, profile_href, render_not_found_response, render_template_response,
    },
};

use super::{HttpState, MaybeViewer, RequireViewer, db_health_response};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct PageQuery {
    page: Option<String>,
}

/// Home timeline. Rendered without viewer details so one cached copy fits everyone.
pub(super) async fn index(
    State(state): State<HttpState>,
    Query(query): Query<PageQuery>,
) -> Response {
    match state.feed.home(query.page.as_deref()).await {
        Ok(page) => {
            let template = IndexTemplate {
                chrome: LayoutChrome::anonymous("Latest posts"),
                list: PostListView::new("Latest posts", &page, "/"),
            };
            render_template_response(template, StatusCode::OK)
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

pub(super) async fn group_posts(
    State(state): State<HttpState>,
    MaybeViewer(viewer): MaybeViewer,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    match state.feed.group(&slug, query.page.as_deref()).await {
        Ok(timeline) => {
            let title = format!("Group posts {}", timeline.group.title);
            let list = PostListView::new(
                timeline.group.title.clone(),
                &timeline.posts,
                &group_href(&timeline.group.slug),
            )
            .with_description(timeline.group.description.clone())
            .with_empty_message("No posts in this group yet.");
            let template = GroupTemplate {
                chrome: LayoutChrome::for_viewer(title, viewer.as_ref()),
                list,
            };
            render_template_response(template, StatusCode::OK)
        }
        Err(err) => feed_error_to_response(err, viewer.as_ref()),
    }
}

pub(super) async fn profile(
    State(state): State<HttpState>,
    MaybeViewer(viewer): MaybeViewer,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    match state
        .feed
        .profile(&username, viewer.as_ref(), query.page.as_deref())
        .await
    {
        Ok(timeline) => {
            let base = profile_href(&timeline.author.username);
            let profile = ProfileView {
                username: timeline.author.username.clone(),
                posts_count: timeline.posts_count,
                followers_count: timeline.followers_count,
                show_follow_controls: timeline.following.is_some(),
                is_following: timeline.following.unwrap_or(false),
                follow_href: format!("{base}/follow"),
                unfollow_href: format!("{base}/unfollow"),
            };
            let template = ProfileTemplate {
                chrome: LayoutChrome::for_viewer(
                    format!("Profile of {}", timeline.author.username),
                    viewer.as_ref(),
                ),
                list: PostListView::new("Posts", &timeline.posts, &base),
                profile,
            };
            render_template_response(template, StatusCode::OK)
        }
        Err(err) => feed_error_to_response(err, viewer.as_ref()),
    }
}

pub(super) async fn post_detail(
    State(state): State<HttpState>,
    MaybeViewer(viewer): MaybeViewer,
    Path(id): Path<String>,
) -> Response {
    let Some(id) = parse_post_id(&id) else {
        return render_not_found_response(
            LayoutChrome::for_viewer("Not found", viewer.as_ref()),
            format!("`{id}` is not a post id"),
        );
    };
    render_post_detail(&state, viewer.as_ref(), id, None).await
}

/// Render the detail page, optionally with a rejected comment kept in the form.
pub(super) async fn render_post_detail(
    state: &HttpState,
    viewer: Option<&UserRecord>,
    id: Uuid,
    rejected_comment: Option<(String, String)>,
) -> Response {
    let detail = match state.posts.detail(id).await {
        Ok(detail) => detail,
        Err(err) => return post_error_to_response(err, viewer),
    };

    let status = if rejected_comment.is_some() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };
    let (comment_text, comment_error) = rejected_comment.unwrap_or_default();
    let href = post_href(detail.post.id);

    let view = PostDetailView {
        post: PostCard::from(&detail.post),
        author_posts_count: detail.author_posts_count,
        can_edit: viewer.is_some_and(|viewer| viewer.id == detail.post.author.id),
        edit_href: format!("{href}/edit"),
        can_comment: viewer.is_some(),
        comment_action: format!("{href}/comment"),
        comment_text,
        has_comment_error: !comment_error.is_empty(),
        comment_error,
        comments: detail.comments.iter().map(CommentView::from).collect(),
        title: detail.title.clone(),
    };
    let template = PostDetailTemplate {
        chrome: LayoutChrome::for_viewer(detail.title, viewer),
        detail: view,
    };
    render_template_response(template, status)
}

pub(super) async fn follow_index(
    State(state): State<HttpState>,
    RequireViewer(viewer): RequireViewer,
    Query(query): Query<PageQuery>,
) -> Response {
    match state.feed.following(&viewer, query.page.as_deref()).await {
        Ok(page) => {
            let list = PostListView::new("Following", &page, "/follow")
                .with_empty_message("Authors you follow have not posted anything yet.");
            let template = FollowTemplate {
                chrome: LayoutChrome::for_viewer("Following", Some(&viewer)),
                list,
            };
            render_template_response(template, StatusCode::OK)
        }
        Err(err) => feed_error_to_response(err, Some(&viewer)),
    }
}

pub(super) async fn db_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.health.check().await)
}

pub(super) async fn not_found(MaybeViewer(viewer): MaybeViewer) -> Response {
    render_not_found_response(
        LayoutChrome::for_viewer("Not found", viewer.as_ref()),
        "no route matched",
    )
}

pub(super) fn parse_post_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

fn feed_error_to_response(err: FeedError, viewer: Option<&UserRecord>) -> Response {
    match err {
        FeedError::UnknownGroup(_) | FeedError::UnknownAuthor(_) => {
            let detail = err.to_string();
            render_not_found_response(LayoutChrome::for_viewer("Not found", viewer), detail)
        }
        FeedError::Repo(err) => HttpError::from(err).into_response(),
    }
}

pub(super) fn post_error_to_response(err: PostError, viewer: Option<&UserRecord>) -> Response {
    match err {
        PostError::NotFound => render_not_found_response(
            LayoutChrome::for_viewer("Not found", viewer),
            "post not found",
        ),
        other => HttpError::from(other).into_response(),
    }
}
