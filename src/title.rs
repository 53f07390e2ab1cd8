//! Session title derivation from command-line words.

use std::sync::OnceLock;

use regex::Regex;
use time::macros::format_description;
use time::OffsetDateTime;

const UNNAMED_PREFIX: &str = "unnamed_session_";

fn disallowed_chars() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new("[^a-zA-Z0-9_]+").expect("title regex must compile"))
}

/// Joins `words` with `_`, drops everything outside `[a-zA-Z0-9_]`, and
/// lowercases the result. An empty result becomes
/// `unnamed_session_<YYYY-MM-DD HH:MM:SS>` at `now`.
#[must_use]
pub fn session_title<S: AsRef<str>>(words: &[S], now: OffsetDateTime) -> String {
    let joined = words
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("_");
    let title = disallowed_chars().replace_all(&joined, "").to_lowercase();

    if title.is_empty() {
        unnamed_title(now)
    } else {
        title
    }
}

#[must_use]
pub fn unnamed_title(now: OffsetDateTime) -> String {
    let stamp = now
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .unwrap_or_else(|_| now.unix_timestamp().to_string());
    format!("{UNNAMED_PREFIX}{stamp}")
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    const NOW: OffsetDateTime = datetime!(2026-10-14 09:05:03 UTC);

    #[test]
    fn single_word_drops_punctuation_and_spaces() {
        assert_eq!(session_title(&["My Session!!"], NOW), "mysession");
    }

    #[test]
    fn words_are_joined_with_underscores() {
        assert_eq!(session_title(&["My", "Session!!"], NOW), "my_session");
    }

    #[test]
    fn underscores_and_digits_survive() {
        assert_eq!(session_title(&["rust_2021", "Q4"], NOW), "rust_2021_q4");
    }

    #[test]
    fn no_words_yields_unnamed_timestamped_title() {
        let words: [&str; 0] = [];
        assert_eq!(
            session_title(&words, NOW),
            "unnamed_session_2026-10-14 09:05:03"
        );
    }

    #[test]
    fn word_with_nothing_allowed_yields_unnamed_title() {
        assert_eq!(
            session_title(&["?!"], NOW),
            "unnamed_session_2026-10-14 09:05:03"
        );
    }
}
