use crate::core::InstanceId;
use regex::Regex;

const MAX_TOKEN_LEN: usize = 32;
const FALLBACK_TOKEN: &str = "profile";

lazy_static::lazy_static! {
    static ref UNSAFE_RUN: Regex = Regex::new(r"[^A-Za-z0-9_-]+").expect("valid pattern");
}

/// Turn a display name into a token safe for any filesystem.
pub fn sanitize_name(name: &str) -> String {
    let replaced = UNSAFE_RUN.replace_all(name.trim(), "_");
    let token: String = replaced
        .trim_matches('_')
        .to_lowercase()
        .chars()
        .take(MAX_TOKEN_LEN)
        .collect();
    let token = token.trim_end_matches('_');
    if token.is_empty() {
        FALLBACK_TOKEN.to_string()
    } else {
        token.to_string()
    }
}

/// Folder name of a profile root. The id prefix keeps roots disjoint.
pub fn folder_name(id: InstanceId, name: &str) -> String {
    format!("{:03}_{}", id, sanitize_name(name))
}
