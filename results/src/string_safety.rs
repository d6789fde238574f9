use constants::MAX_TEXT_FIELD_SIZE;

/// Trims `value` and cuts it down to at most `MAX_LEN` bytes without splitting a char.
pub fn safe_truncate_str<const MAX_LEN: usize>(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.len() <= MAX_LEN {
        return trimmed;
    }
    let mut end = MAX_LEN;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    &trimmed[..end]
}

pub fn safe_truncate_string<const MAX_LEN: usize, T: AsRef<str>>(value: &T) -> &str {
    safe_truncate_str::<MAX_LEN>(value.as_ref())
}

/// Joins the non-empty parts with newlines and caps the result for storage in the model.
pub fn join_message<'a, I>(parts: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let joined = parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    String::from(safe_truncate_string::<MAX_TEXT_FIELD_SIZE, _>(&joined))
}
