//! Handlers that change content: posting, editing, commenting and following.

use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    application::{
        error::HttpError,
        follow::FollowError,
        posts::{FormErrors, PostError, PostForm},
    },
    domain::entities::{PostRecord, UserRecord},
    presentation::views::{
        LayoutChrome, PostFormTemplate, PostFormView, post_href, profile_href,
        render_not_found_response, render_template_response,
    },
};

use super::{
    HttpState, RequireViewer,
    public::{parse_post_id, post_error_to_response, render_post_detail},
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct PostFormInput {
    text: String,
    group: Option<String>,
    image: Option<String>,
}

impl From<PostFormInput> for PostForm {
    fn from(input: PostFormInput) -> Self {
        Self {
            text: input.text,
            group: input.group,
            image: input.image,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct CommentInput {
    text: String,
}

const CREATE_HEADING: &str = "New post";
const EDIT_HEADING: &str = "Edit post";

pub(super) async fn create_form(
    State(state): State<HttpState>,
    RequireViewer(viewer): RequireViewer,
) -> Response {
    let groups = match state.posts.groups().await {
        Ok(groups) => groups,
        Err(err) => return HttpError::from(err).into_response(),
    };
    let template = PostFormTemplate {
        chrome: LayoutChrome::for_viewer(CREATE_HEADING, Some(&viewer)),
        form: PostFormView::new(CREATE_HEADING, "/create", "Publish", &groups),
    };
    render_template_response(template, StatusCode::OK)
}

pub(super) async fn create_submit(
    State(state): State<HttpState>,
    RequireViewer(viewer): RequireViewer,
    Form(input): Form<PostFormInput>,
) -> Response {
    let form = PostForm::from(input);
    match state.posts.create_post(&viewer, form.clone()).await {
        Ok(_) => Redirect::to(&profile_href(&viewer.username)).into_response(),
        Err(PostError::Validation(errors)) => {
            rerender_form(
                &state,
                &viewer,
                CREATE_HEADING,
                "/create",
                "Publish",
                &form,
                &errors,
            )
            .await
        }
        Err(err) => post_error_to_response(err, Some(&viewer)),
    }
}

pub(super) async fn edit_form(
    State(state): State<HttpState>,
    RequireViewer(viewer): RequireViewer,
    Path(id): Path<String>,
) -> Response {
    let Some(id) = parse_post_id(&id) else {
        return not_a_post(&viewer, &id);
    };

    let post = match state.posts.editable(&viewer, id).await {
        Ok(post) => post,
        Err(err) => return edit_error_to_response(err, &viewer),
    };
    let groups = match state.posts.groups().await {
        Ok(groups) => groups,
        Err(err) => return HttpError::from(err).into_response(),
    };

    let template = PostFormTemplate {
        chrome: LayoutChrome::for_viewer(EDIT_HEADING, Some(&viewer)),
        form: stored_values(
            PostFormView::new(EDIT_HEADING, edit_action(id), "Save", &groups),
            &post,
        ),
    };
    render_template_response(template, StatusCode::OK)
}

pub(super) async fn edit_submit(
    State(state): State<HttpState>,
    RequireViewer(viewer): RequireViewer,
    Path(id): Path<String>,
    Form(input): Form<PostFormInput>,
) -> Response {
    let Some(id) = parse_post_id(&id) else {
        return not_a_post(&viewer, &id);
    };

    let form = PostForm::from(input);
    match state.posts.update_post(&viewer, id, form.clone()).await {
        Ok(post) => Redirect::to(&post_href(post.id)).into_response(),
        Err(PostError::Validation(errors)) => {
            rerender_form(
                &state,
                &viewer,
                EDIT_HEADING,
                &edit_action(id),
                "Save",
                &form,
                &errors,
            )
            .await
        }
        Err(err) => edit_error_to_response(err, &viewer),
    }
}

pub(super) async fn add_comment(
    State(state): State<HttpState>,
    RequireViewer(viewer): RequireViewer,
    Path(id): Path<String>,
    Form(input): Form<CommentInput>,
) -> Response {
    let Some(id) = parse_post_id(&id) else {
        return not_a_post(&viewer, &id);
    };

    match state.posts.add_comment(&viewer, id, &input.text).await {
        Ok(_) => Redirect::to(&post_href(id)).into_response(),
        Err(PostError::Validation(errors)) => {
            let message = errors.for_field("text").unwrap_or_default().to_string();
            render_post_detail(&state, Some(&viewer), id, Some((input.text, message))).await
        }
        Err(err) => post_error_to_response(err, Some(&viewer)),
    }
}

pub(super) async fn profile_follow(
    State(state): State<HttpState>,
    RequireViewer(viewer): RequireViewer,
    Path(username): Path<String>,
) -> Response {
    match state.follow.follow(&viewer, &username).await {
        Ok(_) => Redirect::to(&profile_href(&username)).into_response(),
        Err(err) => follow_error_to_response(err, &viewer),
    }
}

pub(super) async fn profile_unfollow(
    State(state): State<HttpState>,
    RequireViewer(viewer): RequireViewer,
    Path(username): Path<String>,
) -> Response {
    match state.follow.unfollow(&viewer, &username).await {
        Ok(_) => Redirect::to(&profile_href(&username)).into_response(),
        Err(err) => follow_error_to_response(err, &viewer),
    }
}

async fn rerender_form(
    state: &HttpState,
    viewer: &UserRecord,
    heading: &str,
    action: &str,
    submit_label: &str,
    form: &PostForm,
    errors: &FormErrors,
) -> Response {
    let groups = match state.posts.groups().await {
        Ok(groups) => groups,
        Err(err) => return HttpError::from(err).into_response(),
    };
    let view = PostFormView::new(heading, action, submit_label, &groups)
        .with_values(&form.text, form.group.as_deref(), form.image.as_deref())
        .with_errors(errors);
    let template = PostFormTemplate {
        chrome: LayoutChrome::for_viewer(heading, Some(viewer)),
        form: view,
    };
    render_template_response(template, StatusCode::BAD_REQUEST)
}

fn stored_values(view: PostFormView, post: &PostRecord) -> PostFormView {
    let group = post.group.as_ref().map(|group| group.id.to_string());
    view.with_values(&post.text, group.as_deref(), post.image.as_deref())
}

fn edit_action(id: Uuid) -> String {
    format!("{}/edit", post_href(id))
}

/// Non-authors are sent back to the post instead of being shown an error.
fn edit_error_to_response(err: PostError, viewer: &UserRecord) -> Response {
    match err {
        PostError::NotAuthor { post_id } => Redirect::to(&post_href(post_id)).into_response(),
        other => post_error_to_response(other, Some(viewer)),
    }
}

fn follow_error_to_response(err: FollowError, viewer: &UserRecord) -> Response {
    match err {
        FollowError::UnknownAuthor(username) => render_not_found_response(
            LayoutChrome::for_viewer("Not found", Some(viewer)),
            format!("User `{username}` does not exist"),
        ),
        other => HttpError::from(other).into_response(),
    }
}

fn not_a_post(viewer: &UserRecord, raw: &str) -> Response {
    render_not_found_response(
        LayoutChrome::for_viewer("Not found", Some(viewer)),
        format!("`{raw}` is not a post id"),
    )
}
