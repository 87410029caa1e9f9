//! Rule-based English pluralization of type names.
//!
//! Rules are tried in order and the first one whose suffix matches wins.
//! Suffixes are compared ASCII case-insensitively. There are two kinds of
//! rules: appending ones keep the word intact and add a fixed ending, and
//! replacing ones swap the last occurrence of the matched suffix for a
//! fixed replacement. A word no rule matches gets a plain `s`.

use std::borrow::Cow;

/// A single pluralization rule.
#[derive(Debug, Clone, Copy)]
enum Rule {
    /// `word + plural` if the word ends with any of `suffixes`.
    Append {
        /// Endings that trigger the rule.
        suffixes: &'static [&'static str],
        /// What to append.
        plural: &'static str,
    },
    /// Replace the last occurrence of the matching suffix with `plural`.
    Replace {
        /// Endings that trigger the rule.
        suffixes: &'static [&'static str],
        /// What the matching suffix is replaced with.
        plural: &'static str,
    },
}

/// Order matters: `bus` must be seen before `us`, the vowel-`y` endings
/// before `y`, and `ouse` before `us`.
static RULES: &[Rule] = &[
    Rule::Append  { suffixes: &["bus", "ss", "sh", "ch", "x", "zz"], plural: "es" },
    Rule::Append  { suffixes: &["th", "ph", "ff", "ay", "ey", "oy", "uy"], plural: "s" },
    Rule::Append  { suffixes: &["o"], plural: "es" },
    Rule::Replace { suffixes: &["fe", "f"], plural: "ves" },
    Rule::Replace { suffixes: &["non"], plural: "na" },
    Rule::Replace { suffixes: &["ion"], plural: "ia" },
    Rule::Replace { suffixes: &["is"], plural: "es" },
    Rule::Replace { suffixes: &["y"], plural: "ies" },
    Rule::Replace { suffixes: &["ouse"], plural: "ice" },
    Rule::Replace { suffixes: &["us"], plural: "i" },
];

/// Returns the plural form of `word`.
///
/// Empty and all-whitespace input is returned unchanged.
///
/// ```
/// # use guava::plural::pluralize;
/// #
/// assert_eq!(pluralize("User"), "Users");
/// assert_eq!(pluralize("Category"), "Categories");
/// assert_eq!(pluralize("Mouse"), "Mice");
/// assert_eq!(pluralize("Criterion"), "Criteria");
/// assert_eq!(pluralize("   "), "   ");
/// ```
pub fn pluralize(word: &str) -> Cow<'_, str> {
    if word.trim().is_empty() {
        return Cow::Borrowed(word);
    }

    for rule in RULES {
        match *rule {
            Rule::Append { suffixes, plural } => {
                if suffixes.iter().any(|suffix| ends_with_ignore_case(word, suffix)) {
                    return Cow::Owned(format!("{}{}", word, plural));
                }
            }
            Rule::Replace { suffixes, plural } => {
                if let Some(suffix) = suffixes.iter().find(|suffix| ends_with_ignore_case(word, suffix)) {
                    return Cow::Owned(replace_last_occurrence(word, suffix, plural));
                }
            }
        }
    }

    Cow::Owned(format!("{}s", word))
}

/// Replaces the rightmost ASCII case-insensitive occurrence of `old` in
/// `input` with `new`. Returns `input` unchanged if `old` does not occur
/// in it or is empty.
///
/// ```
/// # use guava::plural::replace_last_occurrence;
/// #
/// assert_eq!(replace_last_occurrence("TestTest", "test", "Case"), "TestCase");
/// assert_eq!(replace_last_occurrence("Leaf", "xyz", "ves"), "Leaf");
/// ```
pub fn replace_last_occurrence(input: &str, old: &str, new: &str) -> String {
    match rfind_ignore_case(input, old) {
        Some(start) => {
            let mut output = String::with_capacity(input.len() - old.len() + new.len());
            output.push_str(&input[..start]);
            output.push_str(new);
            output.push_str(&input[start + old.len()..]);
            output
        }
        None => input.to_owned(),
    }
}

/// Byte offset of the rightmost case-insensitive match of `needle`.
fn rfind_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }

    let bytes = haystack.as_bytes();

    (0..=haystack.len() - needle.len()).rev().find(|&start| {
        let end = start + needle.len();
        haystack.is_char_boundary(start)
            && haystack.is_char_boundary(end)
            && bytes[start..end].eq_ignore_ascii_case(needle.as_bytes())
    })
}

/// `str::ends_with()`, ignoring ASCII case.
fn ends_with_ignore_case(word: &str, suffix: &str) -> bool {
    word.len() >= suffix.len()
        && word.is_char_boundary(word.len() - suffix.len())
        && word[word.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}
