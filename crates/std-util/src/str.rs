/// Pluralizes a `PascalCase` type name.
///
/// Only the trailing word is inflected so that acronym prefixes keep their
/// casing: `CDDep` becomes `CDDeps`, `SomeItemDetail` becomes
/// `SomeItemDetails`.
pub fn pluralize(name: &str) -> String {
    let split = last_word_start(name);
    let (head, word) = name.split_at(split);

    if word.is_empty() {
        return name.to_string();
    }

    let plural = pluralizer::pluralize(&word.to_lowercase(), 2, false);

    let mut ret = String::with_capacity(head.len() + plural.len());
    ret.push_str(head);

    let mut chars = plural.chars();
    let first_upper = word.chars().next().is_some_and(char::is_uppercase);

    if let Some(first) = chars.next() {
        if first_upper {
            ret.extend(first.to_uppercase());
        } else {
            ret.push(first);
        }
        ret.push_str(chars.as_str());
    }

    ret
}

/// Byte offset of the last word in a `PascalCase` or `snake_case` name.
fn last_word_start(name: &str) -> usize {
    let mut start = 0;

    for (i, ch) in name.char_indices() {
        if ch.is_uppercase() {
            start = i;
        } else if ch == '_' {
            start = i + ch.len_utf8();
        }
    }

    start
}

/// Case-insensitive equality as used for model names.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.len() == b.len() && a.chars().zip(b.chars()).all(|(a, b)| a.to_lowercase().eq(b.to_lowercase()))
}
