//! Identifier and tag helpers.

use crate::errors::{ThreatError, ThreatResult};

/// Derive an ID from a title: lowercase, runs of other characters become `-`.
pub fn make_id(title: &str) -> String {
    let mut id = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.trim().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !id.is_empty() {
                id.push('-');
            }
            pending_dash = false;
            id.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    id
}

/// Suffix of an individual risk's synthetic ID: every whitespace run in the
/// title becomes one `-`, everything else is kept as written.
pub fn risk_title_suffix(title: &str) -> String {
    let mut suffix = String::with_capacity(title.len());
    let mut in_space = false;
    for c in title.chars() {
        if c.is_whitespace() {
            if !in_space {
                suffix.push('-');
            }
            in_space = true;
        } else {
            in_space = false;
            suffix.push(c);
        }
    }
    suffix
}

pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Explicit ID if given, else derived from the title; either must be valid.
pub fn resolve_id(explicit: Option<&str>, title: &str, context: &str) -> ThreatResult<String> {
    let id = match explicit.map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => make_id(title),
    };
    if !is_valid_id(&id) {
        return Err(ThreatError::InvalidId {
            context: context.to_string(),
            id,
        });
    }
    Ok(id)
}

pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// Normalized tags with empties and repeats removed, original order kept.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags.iter().map(|t| normalize_tag(t)) {
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_id() {
        assert_eq!(make_id("Customer Web Client"), "customer-web-client");
        assert_eq!(make_id("  ERP / SAP (prod) "), "erp-sap-prod");
        assert_eq!(make_id("--x--"), "x");
        assert_eq!(make_id("!!!"), "");
    }

    #[test]
    fn test_risk_title_suffix_keeps_punctuation() {
        assert_eq!(risk_title_suffix("SQL Injection (Login)"), "SQL-Injection-(Login)");
        assert_eq!(risk_title_suffix("a \t b"), "a-b");
        assert_eq!(risk_title_suffix("x/y"), "x/y");
    }

    #[test]
    fn test_resolve_id_prefers_explicit() {
        assert_eq!(resolve_id(Some("db-1"), "Database", "ctx").unwrap(), "db-1");
        assert_eq!(resolve_id(None, "Main Database", "ctx").unwrap(), "main-database");
        assert_eq!(resolve_id(Some("  "), "Main Database", "ctx").unwrap(), "main-database");
    }

    #[test]
    fn test_resolve_id_rejects_bad_syntax() {
        let err = resolve_id(Some("db_1"), "Database", "data asset 'Database'").unwrap_err();
        assert!(matches!(err, ThreatError::InvalidId { ref id, .. } if id == "db_1"));
        assert!(resolve_id(None, "???", "ctx").is_err());
    }

    #[test]
    fn test_normalize_tags() {
        let tags: Vec<String> = [" Docker ", "docker", "", "K8s"]
            .iter()
            .map(|t| t.to_string())
            .collect();
        assert_eq!(normalize_tags(&tags), vec!["docker", "k8s"]);
    }
}
