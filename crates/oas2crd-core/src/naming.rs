use heck::ToPascalCase;

/// Type identifier for a JSON key or schema title (`pet-owner` → `PetOwner`).
///
/// Separators are dropped, a leading digit gets a `_` prefix and a key with
/// nothing usable in it becomes `Unnamed`.
pub fn type_name(key: &str) -> String {
    let name = sanitize_identifier(key).to_pascal_case();
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{name}")
    } else {
        name
    }
}

/// Lowercase only the first character: `BasicAuth` → `basicAuth`.
pub fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Uppercase only the first character: `post` → `Post`.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Sanitize a string to be a valid identifier.
fn sanitize_identifier(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut prev_was_separator = false;

    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if prev_was_separator && !result.is_empty() {
                result.push('_');
            }
            result.push(ch);
            prev_was_separator = false;
        } else {
            prev_was_separator = true;
        }
    }

    if result.is_empty() {
        return "unnamed".to_string();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_name() {
        assert_eq!(type_name("listModels"), "ListModels");
        assert_eq!(type_name("pet-owner"), "PetOwner");
    }

    #[test]
    fn test_special_chars() {
        assert_eq!(type_name("application/json"), "ApplicationJson");
        assert_eq!(type_name("$%"), "Unnamed");
    }

    #[test]
    fn test_lower_first() {
        assert_eq!(lower_first("BasicAuth"), "basicAuth");
        assert_eq!(lower_first("URL"), "uRL");
        assert_eq!(lower_first(""), "");
    }

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("post"), "Post");
        assert_eq!(capitalize_first("delete"), "Delete");
        assert_eq!(capitalize_first(""), "");
    }
}
