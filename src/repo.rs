//! Repository context provider for cascade.
//!
//! Resolves the subject repository (local path or remote URL, shallow-cloned)
//! and renders a bounded directory listing into the markdown description that
//! seeds the accumulated context. The rest of the program only ever consumes
//! that description string.

use crate::error::{CascadeError, Result};
use crate::interact::Interaction;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Maximum directory depth in the tree listing (root entries are depth 0).
const TREE_MAX_DEPTH: usize = 2;

/// Maximum number of entries in the tree listing.
const TREE_MAX_ENTRIES: usize = 400;

/// Directory names skipped entirely while listing.
const TREE_IGNORED: [&str; 9] = [
    ".git",
    "node_modules",
    "dist",
    "build",
    ".next",
    "out",
    "coverage",
    ".turbo",
    ".cache",
];

/// A resolved subject repository.
#[derive(Debug, Clone)]
pub struct RepoContext {
    /// Absolute root of the repository on local disk.
    pub root: PathBuf,
    /// How the root was obtained: `local` or `cloned`.
    pub source: &'static str,
    /// Markdown description injected as the context seed.
    pub description: String,
}

/// Resolve the subject repository for a session.
///
/// - An existing local directory is used as-is.
/// - An `http(s)` URL is shallow-cloned under `{base_dir}/repos/`.
/// - With no argument, the operator is asked (interactive runs); unattended
///   runs proceed with no repository context at all.
pub fn obtain<I>(
    arg: Option<&str>,
    interaction: &mut I,
    base_dir: &Path,
    unattended: bool,
) -> Result<Option<RepoContext>>
where
    I: Interaction + ?Sized,
{
    if let Some(arg) = arg {
        if Path::new(arg).is_dir() {
            return Ok(Some(resolve_local(Path::new(arg))?));
        }
        if is_url(arg) {
            return Ok(Some(clone_remote(arg, base_dir)?));
        }
        return Err(CascadeError::ConfigError(format!(
            "repository '{}' is neither an existing directory nor an http(s) URL",
            arg
        )));
    }

    if unattended {
        return Ok(None);
    }

    let use_local = interaction.confirm(
        "Analyze a local repository path? (No = shallow-clone a GitHub URL)",
        true,
    )?;
    if use_local {
        let path = interaction.line("Enter local repository path:")?;
        if path.is_empty() || !Path::new(&path).is_dir() {
            return Err(CascadeError::ConfigError(format!(
                "invalid local repository path: '{}'",
                path
            )));
        }
        Ok(Some(resolve_local(Path::new(&path))?))
    } else {
        let url = interaction.line("Enter GitHub HTTPS URL (public or accessible):")?;
        if !is_url(&url) {
            return Err(CascadeError::ConfigError(format!(
                "invalid repository URL: '{}'",
                url
            )));
        }
        Ok(Some(clone_remote(&url, base_dir)?))
    }
}

fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

fn resolve_local(path: &Path) -> Result<RepoContext> {
    let root = path.canonicalize().map_err(|e| {
        CascadeError::UserError(format!(
            "failed to resolve repository path '{}': {}",
            path.display(),
            e
        ))
    })?;
    let description = describe(&root, "local");
    Ok(RepoContext {
        root,
        source: "local",
        description,
    })
}

fn clone_remote(url: &str, base_dir: &Path) -> Result<RepoContext> {
    let repos_dir = base_dir.join("repos");
    std::fs::create_dir_all(&repos_dir).map_err(|e| {
        CascadeError::UserError(format!(
            "failed to create repos directory '{}': {}",
            repos_dir.display(),
            e
        ))
    })?;

    let target = repos_dir.join(format!(
        "{}-{}",
        sanitize_repo_name(url),
        Utc::now().timestamp_millis()
    ));
    println!("Cloning {} -> {}", url, target.display());
    run_git(&repos_dir, &["clone", "--depth", "1", url, &target.to_string_lossy()])?;

    let description = describe(&target, "cloned");
    Ok(RepoContext {
        root: target,
        source: "cloned",
        description,
    })
}

/// Run a git command with captured output, mapping non-zero exit to
/// [`CascadeError::GitError`].
fn run_git(cwd: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .current_dir(cwd)
        .args(args)
        .output()
        .map_err(|e| CascadeError::GitError(format!("failed to run git: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(CascadeError::GitError(format!(
            "git {} failed: {}",
            args.first().unwrap_or(&""),
            if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr
            }
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Derive a filesystem-safe name for a clone target.
///
/// URLs keep their last two path segments (owner-repo, `.git` stripped);
/// anything else has unsafe characters replaced with `-`.
pub fn sanitize_repo_name(input: &str) -> String {
    if let Some(rest) = input
        .strip_prefix("https://")
        .or_else(|| input.strip_prefix("http://"))
    {
        let path = rest.split_once('/').map(|(_, p)| p).unwrap_or("");
        let path = path.trim_end_matches('/').trim_end_matches(".git");
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let tail = if segments.len() >= 2 {
            segments[segments.len() - 2..].join("-")
        } else {
            segments.join("-")
        };
        if !tail.is_empty() {
            return tail;
        }
    }
    input
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Render the markdown repository description.
pub fn describe(root: &Path, source: &str) -> String {
    let tree = build_tree(root, TREE_MAX_DEPTH, TREE_MAX_ENTRIES);
    format!(
        "### Repository Context\n- Root: {}\n- Source: {}\n\n\
         Directory tree (depth {}):\n\n```\n{}\n```\n",
        root.display(),
        source,
        TREE_MAX_DEPTH,
        tree
    )
}

/// Bounded, depth-limited directory listing with a fixed ignore set.
/// Entries are sorted by name for a stable description.
fn build_tree(root: &Path, max_depth: usize, max_entries: usize) -> String {
    let mut lines = Vec::new();
    walk(root, root, 0, max_depth, max_entries, &mut lines);
    lines.join("\n")
}

fn walk(
    root: &Path,
    dir: &Path,
    depth: usize,
    max_depth: usize,
    max_entries: usize,
    lines: &mut Vec<String>,
) {
    if depth > max_depth || lines.len() >= max_entries {
        return;
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    let mut entries: Vec<_> = entries.flatten().collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        if lines.len() >= max_entries {
            break;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if TREE_IGNORED.contains(&name.as_ref()) {
            continue;
        }
        let path = entry.path();
        let is_dir = path.is_dir();
        let rel = path
            .strip_prefix(root)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| name.to_string());
        lines.push(format!(
            "{}- {}{}",
            "  ".repeat(depth),
            rel,
            if is_dir { "/" } else { "" }
        ));
        if is_dir {
            walk(root, &path, depth + 1, max_depth, max_entries, lines);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedInteraction;
    use tempfile::TempDir;

    #[test]
    fn sanitize_keeps_owner_and_repo_from_urls() {
        assert_eq!(
            sanitize_repo_name("https://github.com/user/repo"),
            "user-repo"
        );
        assert_eq!(
            sanitize_repo_name("https://github.com/user/repo.git"),
            "user-repo"
        );
        assert_eq!(
            sanitize_repo_name("http://example.com/a/b/c"),
            "b-c"
        );
    }

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_repo_name("../weird name"), "..-weird-name");
        assert_eq!(sanitize_repo_name("my_project.v2"), "my_project.v2");
    }

    #[test]
    fn tree_skips_ignored_directories_and_respects_depth() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("src/deep/deeper/deepest")).unwrap();
        std::fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        std::fs::write(root.join("README.md"), "x").unwrap();
        std::fs::write(root.join("src/main.rs"), "x").unwrap();

        let tree = build_tree(root, 2, 400);

        assert!(tree.contains("- README.md"));
        assert!(tree.contains("- src/"));
        assert!(tree.contains("- src/main.rs"));
        assert!(tree.contains("- src/deep/deeper/"));
        assert!(!tree.contains("deepest"), "depth 3 must be cut off");
        assert!(!tree.contains("node_modules"));
    }

    #[test]
    fn tree_is_bounded_by_entry_count() {
        let temp = TempDir::new().unwrap();
        for i in 0..20 {
            std::fs::write(temp.path().join(format!("f{:02}.txt", i)), "x").unwrap();
        }
        let tree = build_tree(temp.path(), 2, 5);
        assert_eq!(tree.lines().count(), 5);
    }

    #[test]
    fn describe_carries_root_and_source() {
        let temp = TempDir::new().unwrap();
        let description = describe(temp.path(), "local");
        assert!(description.starts_with("### Repository Context"));
        assert!(description.contains(&format!("- Root: {}", temp.path().display())));
        assert!(description.contains("- Source: local"));
    }

    #[test]
    fn local_directory_argument_resolves_in_place() {
        let temp = TempDir::new().unwrap();
        let mut interaction = ScriptedInteraction::auto();
        let repo = obtain(
            Some(&temp.path().to_string_lossy()),
            &mut interaction,
            temp.path(),
            false,
        )
        .unwrap()
        .expect("local path resolves to a context");
        assert_eq!(repo.source, "local");
        assert!(repo.description.contains("### Repository Context"));
    }

    #[test]
    fn unattended_without_argument_has_no_repo_context() {
        let temp = TempDir::new().unwrap();
        let mut interaction = ScriptedInteraction::auto();
        let repo = obtain(None, &mut interaction, temp.path(), true).unwrap();
        assert!(repo.is_none());
    }

    #[test]
    fn bad_argument_is_a_config_error() {
        let temp = TempDir::new().unwrap();
        let mut interaction = ScriptedInteraction::auto();
        let err = obtain(Some("no/such/dir"), &mut interaction, temp.path(), true).unwrap_err();
        assert!(matches!(err, CascadeError::ConfigError(_)));
    }

    #[test]
    fn interactive_local_path_is_validated() {
        let temp = TempDir::new().unwrap();
        let mut interaction = ScriptedInteraction::auto();
        // confirm defaults to true (local path), line returns empty.
        let err = obtain(None, &mut interaction, temp.path(), false).unwrap_err();
        assert!(matches!(err, CascadeError::ConfigError(_)));
    }
}
