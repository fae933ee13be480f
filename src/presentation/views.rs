use crate::application::error::{ErrorReport, HttpError};
use crate::application::pagination::Page;
use crate::application::posts::FormErrors;
use crate::domain::entities::{CommentRecord, GroupRecord, PostRecord, UserRecord};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

const SITE_TITLE: &str = "Plaza";
const DISPLAY_DATE: &[BorrowedFormatItem<'static>] =
    format_description!("[day] [month repr:short] [year], [hour]:[minute]");
const ISO_DATE: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(chrome: LayoutChrome, detail: impl Into<String>) -> Response {
    let template = ErrorTemplate {
        chrome,
        error: ErrorPageView::not_found(),
    };
    let mut response = render_template_response(template, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        detail,
    )
    .attach(&mut response);
    response
}

/// Page furniture shared by every template, exposed to them as `chrome`.
#[derive(Clone)]
pub struct LayoutChrome {
    pub site_title: String,
    pub page_title: String,
    pub is_authenticated: bool,
    pub viewer_name: String,
    pub viewer_profile_href: String,
}

impl LayoutChrome {
    /// Chrome that never mentions the viewer; required for shared cached pages.
    pub fn anonymous(page_title: impl Into<String>) -> Self {
        Self {
            site_title: SITE_TITLE.to_string(),
            page_title: page_title.into(),
            is_authenticated: false,
            viewer_name: String::new(),
            viewer_profile_href: String::new(),
        }
    }

    pub fn for_viewer(page_title: impl Into<String>, viewer: Option<&UserRecord>) -> Self {
        let chrome = Self::anonymous(page_title);
        match viewer {
            Some(viewer) => Self {
                is_authenticated: true,
                viewer_name: viewer.username.clone(),
                viewer_profile_href: profile_href(&viewer.username),
                ..chrome
            },
            None => chrome,
        }
    }
}

#[derive(Clone)]
pub struct PostCard {
    pub text: String,
    pub author: String,
    pub author_href: String,
    pub detail_href: String,
    pub published: String,
    pub iso_date: String,
    pub has_group: bool,
    pub group_title: String,
    pub group_href: String,
    pub has_image: bool,
    pub image: String,
}

impl From<&PostRecord> for PostCard {
    fn from(post: &PostRecord) -> Self {
        let (has_group, group_title, group_href) = match &post.group {
            Some(group) => (true, group.title.clone(), group_href(&group.slug)),
            None => (false, String::new(), String::new()),
        };
        Self {
            text: post.text.clone(),
            author: post.author.username.clone(),
            author_href: profile_href(&post.author.username),
            detail_href: post_href(post.id),
            published: format_display_date(post.created_at),
            iso_date: format_iso_date(post.created_at),
            has_group,
            group_title,
            group_href,
            has_image: post.image.is_some(),
            image: post.image.clone().unwrap_or_default(),
        }
    }
}

#[derive(Clone)]
pub struct PageLink {
    pub number: u32,
    pub href: String,
    pub is_current: bool,
}

/// Prev/next links plus a short run of page numbers around the current one.
#[derive(Clone)]
pub struct PaginatorView {
    pub number: u32,
    pub page_count: u32,
    pub total_count: u64,
    pub is_paginated: bool,
    pub has_prev: bool,
    pub prev_href: String,
    pub has_next: bool,
    pub next_href: String,
    pub links: Vec<PageLink>,
}

const PAGE_LINK_RADIUS: u32 = 2;

impl PaginatorView {
    pub fn new<T>(page: &Page<T>, base_path: &str) -> Self {
        let href = |number: u32| format!("{base_path}?page={number}");
        let first = page.number.saturating_sub(PAGE_LINK_RADIUS).max(1);
        let last = page
            .number
            .saturating_add(PAGE_LINK_RADIUS)
            .min(page.page_count);

        Self {
            number: page.number,
            page_count: page.page_count,
            total_count: page.total_count,
            is_paginated: page.page_count > 1,
            has_prev: page.has_prev(),
            prev_href: page.prev_number().map(href).unwrap_or_default(),
            has_next: page.has_next(),
            next_href: page.next_number().map(href).unwrap_or_default(),
            links: (first..=last)
                .map(|number| PageLink {
                    number,
                    href: href(number),
                    is_current: number == page.number,
                })
                .collect(),
        }
    }
}

pub struct PostListView {
    pub heading: String,
    pub description: String,
    pub posts: Vec<PostCard>,
    pub has_results: bool,
    pub empty_message: String,
    pub paginator: PaginatorView,
}

impl PostListView {
    pub fn new(heading: impl Into<String>, page: &Page<PostRecord>, base_path: &str) -> Self {
        Self {
            heading: heading.into(),
            description: String::new(),
            posts: page.items.iter().map(PostCard::from).collect(),
            has_results: !page.is_empty(),
            empty_message: "No posts yet.".to_string(),
            paginator: PaginatorView::new(page, base_path),
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..self
        }
    }

    pub fn with_empty_message(self, message: impl Into<String>) -> Self {
        Self {
            empty_message: message.into(),
            ..self
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub chrome: LayoutChrome,
    pub list: PostListView,
}

#[derive(Template)]
#[template(path = "group.html")]
pub struct GroupTemplate {
    pub chrome: LayoutChrome,
    pub list: PostListView,
}

#[derive(Template)]
#[template(path = "follow.html")]
pub struct FollowTemplate {
    pub chrome: LayoutChrome,
    pub list: PostListView,
}

pub struct ProfileView {
    pub username: String,
    pub posts_count: u64,
    pub followers_count: u64,
    pub show_follow_controls: bool,
    pub is_following: bool,
    pub follow_href: String,
    pub unfollow_href: String,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub chrome: LayoutChrome,
    pub profile: ProfileView,
    pub list: PostListView,
}

#[derive(Clone)]
pub struct CommentView {
    pub author: String,
    pub author_href: String,
    pub text: String,
    pub published: String,
    pub iso_date: String,
}

impl From<&CommentRecord> for CommentView {
    fn from(comment: &CommentRecord) -> Self {
        Self {
            author: comment.author.username.clone(),
            author_href: profile_href(&comment.author.username),
            text: comment.text.clone(),
            published: format_display_date(comment.created_at),
            iso_date: format_iso_date(comment.created_at),
        }
    }
}

pub struct PostDetailView {
    pub title: String,
    pub post: PostCard,
    pub author_posts_count: u64,
    pub can_edit: bool,
    pub edit_href: String,
    pub can_comment: bool,
    pub comment_action: String,
    pub comment_text: String,
    pub comment_error: String,
    pub has_comment_error: bool,
    pub comments: Vec<CommentView>,
}

#[derive(Template)]
#[template(path = "post_detail.html")]
pub struct PostDetailTemplate {
    pub chrome: LayoutChrome,
    pub detail: PostDetailView,
}

#[derive(Clone)]
pub struct GroupOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

pub struct PostFormView {
    pub heading: String,
    pub action: String,
    pub submit_label: String,
    pub text: String,
    pub image: String,
    pub groups: Vec<GroupOption>,
    pub no_group_selected: bool,
    pub text_error: String,
    pub group_error: String,
    pub image_error: String,
    pub has_errors: bool,
}

impl PostFormView {
    pub fn new(
        heading: impl Into<String>,
        action: impl Into<String>,
        submit_label: impl Into<String>,
        groups: &[GroupRecord],
    ) -> Self {
        Self {
            heading: heading.into(),
            action: action.into(),
            submit_label: submit_label.into(),
            text: String::new(),
            image: String::new(),
            groups: groups
                .iter()
                .map(|group| GroupOption {
                    value: group.id.to_string(),
                    label: group.title.clone(),
                    selected: false,
                })
                .collect(),
            no_group_selected: true,
            text_error: String::new(),
            group_error: String::new(),
            image_error: String::new(),
            has_errors: false,
        }
    }

    /// Pre-fill the form from submitted or stored values.
    pub fn with_values(mut self, text: &str, group: Option<&str>, image: Option<&str>) -> Self {
        self.text = text.to_string();
        self.image = image.unwrap_or_default().to_string();
        let group = group.map(str::trim).unwrap_or_default();
        for option in &mut self.groups {
            option.selected = option.value == group;
        }
        self.no_group_selected = !self.groups.iter().any(|option| option.selected);
        self
    }

    pub fn with_errors(mut self, errors: &FormErrors) -> Self {
        self.text_error = errors.for_field("text").unwrap_or_default().to_string();
        self.group_error = errors.for_field("group").unwrap_or_default().to_string();
        self.image_error = errors.for_field("image").unwrap_or_default().to_string();
        self.has_errors = !errors.is_empty();
        self
    }
}

#[derive(Template)]
#[template(path = "post_form.html")]
pub struct PostFormTemplate {
    pub chrome: LayoutChrome,
    pub form: PostFormView,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            title: "Page not found".to_string(),
            message: "The page you requested does not exist.".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub chrome: LayoutChrome,
    pub error: ErrorPageView,
}

pub fn profile_href(username: &str) -> String {
    format!("/profile/{username}")
}

pub fn group_href(slug: &str) -> String {
    format!("/group/{slug}")
}

pub fn post_href(id: uuid::Uuid) -> String {
    format!("/posts/{id}")
}

fn format_display_date(value: OffsetDateTime) -> String {
    value.format(DISPLAY_DATE).unwrap_or_default()
}

fn format_iso_date(value: OffsetDateTime) -> String {
    value
        .to_offset(time::UtcOffset::UTC)
        .format(ISO_DATE)
        .unwrap_or_default()
}
