/// Derives a URL/anchor-safe identifier from a human-readable title.
///
/// Lowercases, drops everything that is not a lowercase letter, digit, space,
/// or hyphen, then collapses runs of spaces/hyphens into a single underscore.
/// Deterministic and pure; distinct titles that slugify identically collide,
/// which is accepted.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();

    let mut out = String::with_capacity(lowered.len());
    let mut pending_separator = false;
    for ch in lowered.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(ch);
            continue;
        }
        if ch.is_whitespace() || ch == '-' {
            pending_separator = true;
        }
        // Everything else is stripped.
    }

    out.trim_matches('_').to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_replaces_spaces() {
        assert_eq!(slugify("Chapter One"), "chapter_one");
    }

    #[test]
    fn strips_punctuation() {
        assert_eq!(
            slugify("Chapter 1: The Beginning?"),
            "chapter_1_the_beginning"
        );
    }

    #[test]
    fn collapses_runs_of_spaces_and_hyphens() {
        assert_eq!(slugify("a  - -  b"), "a_b");
    }

    #[test]
    fn trims_leading_and_trailing_separators() {
        assert_eq!(slugify("  -hello-  "), "hello");
    }

    #[test]
    fn is_idempotent_on_its_own_output() {
        for title in ["Chapter 1: The Beginning?", "A  B--C", "  x  ", "日本語 Title"] {
            let slug = slugify(title);
            assert_eq!(slugify(&slug), slug, "title={title}");
        }
    }

    #[test]
    fn non_ascii_letters_are_stripped() {
        assert_eq!(slugify("日本語 7"), "7");
    }
}
