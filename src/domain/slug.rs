//! Utilities for deriving URL-safe, Latin-only slugs from group titles.
//!
//! Titles are usually written in Russian, so the pipeline transliterates
//! Cyrillic letters (and typographic quotes and dashes) into ASCII before
//! stripping anything that is not a word character or a hyphen. Characters
//! that have no transliteration are dropped before the table is applied;
//! strict transliteration rejects anything that still falls outside ASCII so
//! an unmapped letter can never silently vanish from a stored slug.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use thiserror::Error;

/// Longest slug stored for a group.
pub const MAX_GROUP_SLUG_LEN: usize = 100;

/// Ordered transliteration table: source character and its ASCII rendering.
const TRANSLITERATION: &[(char, &str)] = &[
    ('\'', "'"),
    ('"', "\""),
    ('‘', "'"),
    ('’', "'"),
    ('«', "\""),
    ('»', "\""),
    ('“', "\""),
    ('”', "\""),
    ('–', "-"),
    ('—', "-"),
    ('‒', "-"),
    ('−', "-"),
    ('…', "..."),
    ('№', "#"),
    ('Щ', "Sch"),
    ('Ё', "Yo"),
    ('Ж', "Zh"),
    ('Ц', "Ts"),
    ('Ч', "Ch"),
    ('Ш', "Sh"),
    ('Ы', "Yi"),
    ('Ю', "Yu"),
    ('Я', "Ya"),
    ('А', "A"),
    ('Б', "B"),
    ('В', "V"),
    ('Г', "G"),
    ('Д', "D"),
    ('Е', "E"),
    ('З', "Z"),
    ('И', "I"),
    ('Й', "J"),
    ('К', "K"),
    ('Л', "L"),
    ('М', "M"),
    ('Н', "N"),
    ('О', "O"),
    ('П', "P"),
    ('Р', "R"),
    ('С', "S"),
    ('Т', "T"),
    ('У', "U"),
    ('Ф', "F"),
    ('Х', "H"),
    ('Э', "E"),
    ('Ъ', "`"),
    ('Ь', "'"),
    ('щ', "sch"),
    ('ё', "yo"),
    ('ж', "zh"),
    ('ц', "ts"),
    ('ч', "ch"),
    ('ш', "sh"),
    ('ы', "yi"),
    ('ю', "yu"),
    ('я', "ya"),
    ('а', "a"),
    ('б', "b"),
    ('в', "v"),
    ('г', "g"),
    ('д', "d"),
    ('е', "e"),
    ('з', "z"),
    ('и', "i"),
    ('й', "j"),
    ('к', "k"),
    ('л', "l"),
    ('м', "m"),
    ('н', "n"),
    ('о', "o"),
    ('п', "p"),
    ('р', "r"),
    ('с', "s"),
    ('т', "t"),
    ('у', "u"),
    ('ф', "f"),
    ('х', "h"),
    ('э', "e"),
    ('ъ', "`"),
    ('ь', "'"),
    ('c', "c"),
    ('q', "q"),
    ('y', "y"),
    ('x', "x"),
    ('w', "w"),
    ('1', "1"),
    ('2', "2"),
    ('3', "3"),
    ('4', "4"),
    ('5', "5"),
    ('6', "6"),
    ('7', "7"),
    ('8', "8"),
    ('9', "9"),
    ('0', "0"),
];

static TABLE: Lazy<HashMap<char, &'static str>> =
    Lazy::new(|| TRANSLITERATION.iter().copied().collect());

/// Every character a slug source may contain: the table's sources plus each
/// single-character rendering it produces.
static ALPHABET: Lazy<HashSet<char>> = Lazy::new(|| {
    let mut alphabet = HashSet::with_capacity(TRANSLITERATION.len() * 2);
    for (source, rendered) in TRANSLITERATION {
        alphabet.insert(*source);
        let mut chars = rendered.chars();
        if let (Some(single), None) = (chars.next(), chars.next()) {
            alphabet.insert(single);
        }
    }
    alphabet
});

/// Errors that can occur while generating a slug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
    #[error("unicode text does not transliterate completely: `{character}` has no mapping")]
    IncompleteTransliteration { character: char },
}

/// Apply the transliteration table to every character of `input`.
///
/// With `strict` set, any character above code point 128 left after
/// transliteration is reported as [`SlugError::IncompleteTransliteration`].
pub fn transliterate(input: &str, strict: bool) -> Result<String, SlugError> {
    let mut output = String::with_capacity(input.len());
    for ch in input.chars() {
        match TABLE.get(&ch) {
            Some(rendered) => output.push_str(rendered),
            None => output.push(ch),
        }
    }

    if strict {
        if let Some(character) = output.chars().find(|ch| u32::from(*ch) > 128) {
            return Err(SlugError::IncompleteTransliteration { character });
        }
    }

    Ok(output)
}

/// Prepare `input` for use as a URL path segment.
///
/// The result contains only ASCII letters, digits, underscores and single
/// hyphens, never starts or ends with a hyphen, and may be empty when the
/// input has no transliterable content.
pub fn slugify(input: &str) -> Result<String, SlugError> {
    let lowered = input.to_lowercase();
    let with_and = replace_ampersands(&lowered);
    let hyphenated = collapse_separators(&with_and);
    let filtered: String = hyphenated
        .chars()
        .filter(|ch| ALPHABET.contains(ch))
        .collect();

    let transliterated = transliterate(&filtered, true)?;
    let cleaned: String = transliterated
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_' || *ch == '-' || ch.is_whitespace())
        .collect();

    Ok(cleaned
        .trim_matches(|ch: char| ch.is_whitespace() || ch == '-')
        .to_lowercase())
}

/// Derive the slug stored for a group, capped at [`MAX_GROUP_SLUG_LEN`].
pub fn derive_group_slug(title: &str) -> Result<String, SlugError> {
    if title.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let slug = slugify(title)?;
    let capped: String = slug.chars().take(MAX_GROUP_SLUG_LEN).collect();
    let capped = capped.trim_end_matches('-').to_string();

    if capped.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: title.to_string(),
        });
    }

    Ok(capped)
}

fn replace_ampersands(input: &str) -> String {
    input.replace("&amp;", " and ").replace('&', " and ")
}

fn collapse_separators(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut in_separator = false;
    for ch in input.chars() {
        if ch == '-' || ch.is_whitespace() {
            if !in_separator {
                output.push('-');
                in_separator = true;
            }
        } else {
            output.push(ch);
            in_separator = false;
        }
    }
    output
}
