//! Type recovery from `@param` tags in signature doc comments.

use crate::types::is_builtin;

/// Returns the pipe-separated type candidates declared for `$name`.
pub(crate) fn param_types<'a>(doc: &'a str, name: &str) -> Option<Vec<&'a str>> {
    for line in doc.lines() {
        let line = line
            .trim()
            .trim_start_matches("/**")
            .trim_start_matches('*')
            .trim_end_matches("*/")
            .trim();
        let Some(rest) = line.strip_prefix("@param") else {
            continue;
        };
        let mut tokens = rest.split_whitespace();
        let (Some(types), Some(variable)) = (tokens.next(), tokens.next()) else {
            continue;
        };
        let variable = variable
            .trim_start_matches('&')
            .trim_start_matches("...")
            .trim_start_matches('$');
        if variable == name {
            return Some(types.split('|').collect());
        }
    }
    None
}

/// Returns the first usable class candidate annotated for `$name`.
pub(crate) fn annotated_type(doc: &str, name: &str) -> Option<String> {
    param_types(doc, name)?
        .into_iter()
        .map(|v| v.trim().trim_start_matches('?').trim_start_matches('\\'))
        .filter(|v| !v.is_empty() && !v.contains('<') && !v.ends_with("[]"))
        .find(|v| !is_builtin(v))
        .map(str::to_owned)
}
