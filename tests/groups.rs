mod support;

use std::sync::Arc;

use plaza::application::groups::{CreateGroupCommand, GroupError, GroupService};

use support::InMemoryContent;

fn service(content: &Arc<InMemoryContent>) -> GroupService {
    GroupService::new(content.clone())
}

fn command(title: &str, slug: Option<&str>) -> CreateGroupCommand {
    CreateGroupCommand {
        title: title.to_string(),
        description: "about".to_string(),
        slug: slug.map(str::to_string),
    }
}

#[tokio::test]
async fn slug_is_derived_from_a_cyrillic_title() {
    let content = InMemoryContent::new();
    let group = service(&content)
        .create_group(command("Спорт", None))
        .await
        .expect("group");
    assert_eq!(group.slug, "sport");
    assert_eq!(group.title, "Спорт");
}

#[tokio::test]
async fn explicit_slug_is_kept() {
    let content = InMemoryContent::new();
    let group = service(&content)
        .create_group(command("Спорт", Some("sport-news")))
        .await
        .expect("group");
    assert_eq!(group.slug, "sport-news");
}

#[tokio::test]
async fn explicit_slug_must_be_url_safe() {
    let content = InMemoryContent::new();
    let err = service(&content)
        .create_group(command("Спорт", Some("Спорт!")))
        .await
        .expect_err("invalid slug");
    assert!(matches!(err, GroupError::Domain(_)));
}

#[tokio::test]
async fn duplicate_slug_is_rejected() {
    let content = InMemoryContent::new();
    let groups = service(&content);
    groups
        .create_group(command("Спорт", None))
        .await
        .expect("first");

    let err = groups
        .create_group(command("спорт", None))
        .await
        .expect_err("duplicate");
    assert!(matches!(err, GroupError::DuplicateSlug(slug) if slug == "sport"));
}

#[tokio::test]
async fn blank_title_is_rejected() {
    let content = InMemoryContent::new();
    let err = service(&content)
        .create_group(command("   ", None))
        .await
        .expect_err("blank");
    assert!(matches!(err, GroupError::Domain(_)));
}
