use super::*;
use std::cmp::Ordering;
use tempfile::TempDir;

#[test]
fn parses_frontmatter_with_identity() {
    let content = r#"---
identity:
  role: security auditor
  tone: formal
  expertise:
    - authentication
    - cryptography
---

Review the login flow.
"#;
    let doc = PromptDocument::parse("01-review.md", content).unwrap();
    assert_eq!(doc.frontmatter.identity.role.as_deref(), Some("security auditor"));
    assert_eq!(doc.frontmatter.identity.tone.as_deref(), Some("formal"));
    assert_eq!(
        doc.frontmatter.identity.expertise,
        vec!["authentication", "cryptography"]
    );
    assert_eq!(doc.body, "Review the login flow.\n");
}

#[test]
fn file_without_frontmatter_is_all_body() {
    let doc = PromptDocument::parse("plain.md", "Just a prompt.\n").unwrap();
    assert!(doc.frontmatter.identity.role.is_none());
    assert!(doc.frontmatter.extra.is_empty());
    assert_eq!(doc.body, "Just a prompt.\n");
}

#[test]
fn unknown_frontmatter_fields_are_preserved() {
    let content = "---\nauthor: someone\nversion: 2\n---\nBody.\n";
    let doc = PromptDocument::parse("x.md", content).unwrap();
    assert!(doc.frontmatter.extra.contains_key("author"));
    assert!(doc.frontmatter.extra.contains_key("version"));
}

#[test]
fn empty_frontmatter_block_yields_defaults() {
    let doc = PromptDocument::parse("x.md", "---\n---\nBody.\n").unwrap();
    assert!(doc.frontmatter.identity.preamble().is_empty());
    assert_eq!(doc.body, "Body.\n");
}

#[test]
fn crlf_line_endings_are_tolerated() {
    let content = "---\r\nidentity:\r\n  role: writer\r\n---\r\nBody text.\r\n";
    let doc = PromptDocument::parse("x.md", content).unwrap();
    assert_eq!(doc.frontmatter.identity.role.as_deref(), Some("writer"));
    assert!(doc.body.contains("Body text."));
}

#[test]
fn malformed_frontmatter_is_an_error() {
    let content = "---\nidentity: [unclosed\n---\nBody.\n";
    assert!(PromptDocument::parse("bad.md", content).is_err());
}

#[test]
fn basename_strips_md_extension() {
    let doc = PromptDocument::parse("01-intro.md", "x").unwrap();
    assert_eq!(doc.basename(), "01-intro");
}

#[test]
fn preamble_includes_present_clauses_in_order() {
    let identity = Identity {
        role: Some("reviewer".to_string()),
        persona: Some("a meticulous engineer".to_string()),
        tone: Some("neutral".to_string()),
        expertise: vec!["Rust".to_string(), "security".to_string()],
        context: Some("an internal audit".to_string()),
        constraints: vec!["no speculation".to_string(), "cite sources".to_string()],
    };
    assert_eq!(
        identity.preamble(),
        "Act as reviewer. You are a meticulous engineer. Use a neutral tone. \
         You have expertise in: Rust, security. Context: an internal audit. \
         Constraints: no speculation; cite sources."
    );
}

#[test]
fn preamble_omits_absent_clauses() {
    let identity = Identity {
        tone: Some("playful".to_string()),
        constraints: vec!["stay brief".to_string()],
        ..Identity::default()
    };
    assert_eq!(
        identity.preamble(),
        "Use a playful tone. Constraints: stay brief."
    );
}

#[test]
fn empty_identity_falls_back_to_default_instruction() {
    let identity = Identity::default();
    assert_eq!(identity.preamble(), "");
    assert_eq!(identity.system_message(), DEFAULT_SYSTEM_INSTRUCTION);
}

#[test]
fn natural_cmp_orders_digit_runs_numerically() {
    assert_eq!(natural_cmp("2-detail.md", "10-wrapup.md"), Ordering::Less);
    assert_eq!(natural_cmp("10-wrapup.md", "2-detail.md"), Ordering::Greater);
    assert_eq!(natural_cmp("01-a.md", "01-a.md"), Ordering::Equal);
    assert_eq!(natural_cmp("01-a.md", "01-b.md"), Ordering::Less);
    assert_eq!(natural_cmp("a2.md", "a10.md"), Ordering::Less);
}

#[test]
fn natural_cmp_is_case_insensitive() {
    assert_eq!(natural_cmp("Alpha.md", "alpha.md"), Ordering::Equal);
    assert_eq!(natural_cmp("Beta.md", "alpha.md"), Ordering::Greater);
}

#[test]
fn find_prompt_files_filters_and_sorts() {
    let temp = TempDir::new().unwrap();
    for name in ["10-last.md", "2-second.md", "1-first.md", "notes.txt", "README.MD"] {
        std::fs::write(temp.path().join(name), "body").unwrap();
    }
    std::fs::create_dir(temp.path().join("sub.md")).unwrap();

    let files = find_prompt_files(temp.path()).unwrap();
    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["1-first.md", "2-second.md", "10-last.md", "README.MD"]);
}

#[test]
fn find_prompt_files_missing_directory_is_config_error() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("nope");
    let err = find_prompt_files(&missing).unwrap_err();
    assert!(matches!(err, crate::error::CascadeError::ConfigError(_)));
}

#[test]
fn load_reads_from_disk() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("01-intro.md");
    std::fs::write(&path, "---\nidentity:\n  role: narrator\n---\nOnce upon a time.\n").unwrap();

    let doc = PromptDocument::load(&path).unwrap();
    assert_eq!(doc.name, "01-intro.md");
    assert_eq!(doc.frontmatter.identity.role.as_deref(), Some("narrator"));
    assert_eq!(doc.body, "Once upon a time.\n");
}
