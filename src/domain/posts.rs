//! Rules shared by posts and comments.

use super::error::DomainError;

/// Number of characters of a post's text used in its detail page title.
pub const DETAIL_TITLE_CHARS: usize = 30;

/// Number of characters used when a post is summarized in logs or admin output.
pub const SUMMARY_CHARS: usize = 15;

/// Longest image reference accepted on a post.
pub const MAX_IMAGE_REF_LEN: usize = 255;

/// Borrow at most `max` characters from the start of `text`.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

/// Title of a post's detail page, built from the start of its text.
pub fn detail_title(text: &str) -> String {
    format!("Post \"{}\"", truncate_chars(text, DETAIL_TITLE_CHARS))
}

/// Validate free-form body text (post or comment), returning it trimmed.
pub fn validate_text(field: &'static str, raw: &str) -> Result<String, DomainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(field, "this field is required"));
    }
    Ok(trimmed.to_string())
}

/// Validate an optional image reference; blank input means "no image".
pub fn validate_image_ref(raw: Option<&str>) -> Result<Option<String>, DomainError> {
    let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };

    if value.chars().count() > MAX_IMAGE_REF_LEN {
        return Err(DomainError::validation(
            "image",
            format!("must be at most {MAX_IMAGE_REF_LEN} characters"),
        ));
    }

    if value.contains("..") || value.starts_with('/') {
        return Err(DomainError::validation(
            "image",
            "must be a relative reference inside the media store",
        ));
    }

    Ok(Some(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_title_uses_first_thirty_characters() {
        let text = "Текст поста в группе спорт длинной более 30 символов";
        assert_eq!(detail_title(text), "Post \"Текст поста в группе спорт дли\"");
    }

    #[test]
    fn truncate_chars_keeps_short_text() {
        assert_eq!(truncate_chars("short", 30), "short");
    }

    #[test]
    fn validate_text_rejects_blank_input() {
        let err = validate_text("text", "   \n").expect_err("blank text rejected");
        assert_eq!(err.field(), "text");
    }

    #[test]
    fn validate_text_trims() {
        assert_eq!(validate_text("text", "  hello ").unwrap(), "hello");
    }

    #[test]
    fn image_ref_blank_is_none() {
        assert_eq!(validate_image_ref(Some("  ")).unwrap(), None);
        assert_eq!(validate_image_ref(None).unwrap(), None);
    }

    #[test]
    fn image_ref_rejects_traversal() {
        assert!(validate_image_ref(Some("../etc/passwd")).is_err());
        assert!(validate_image_ref(Some("/abs/path.gif")).is_err());
        assert_eq!(
            validate_image_ref(Some("posts/cover.gif")).unwrap(),
            Some("posts/cover.gif".to_string())
        );
    }
}
