use std::borrow::Cow;

/// Makes `name` a valid Avro name: `[A-Za-z_][A-Za-z0-9_]*`.
///
/// Invalid characters become `_`; a leading digit gets a `_` prefix.
pub(crate) fn sanitize(name: &str) -> Cow<'_, str> {
    let valid_start = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid_start && valid_rest {
        return Cow::Borrowed(name);
    }

    let mut out = String::with_capacity(name.len() + 1);
    if !valid_start {
        out.push('_');
    }
    out.extend(name.chars().map(|c| {
        if c.is_ascii_alphanumeric() || c == '_' {
            c
        } else {
            '_'
        }
    }));
    Cow::Owned(out)
}

/// Sanitizes every dot-separated segment of a namespace.
pub(crate) fn sanitize_namespace(namespace: &str) -> String {
    namespace
        .split('.')
        .filter(|segment| !segment.is_empty())
        .map(|segment| sanitize(segment).into_owned())
        .collect::<Vec<_>>()
        .join(".")
}
