use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::WalkBuilder;
use glob::Pattern;
use std::path::{Path, PathBuf};

/// File patterns imported when none are configured
pub const DEFAULT_PATTERNS: &[&str] = &["*.tf", "*.tfvars"];

/// Selects which files under an import directory are sources.
pub struct SourceFilter {
    ignored: Gitignore,
    patterns: Vec<Pattern>,
}

impl SourceFilter {
    pub fn new(root: &Path, patterns: &[String], extra_excludes: &[String]) -> Self {
        let mut builder = GitignoreBuilder::new(root);

        // 1. Load from .gitignore and .ignore
        builder.add(root.join(".gitignore"));
        builder.add(root.join(".ignore"));

        // 2. Terraform working state and other noise
        let defaults = [
            ".terraform/", ".git/", ".tfsource/", "node_modules/", "target/",
            "*.tfstate", "*.tfstate.*", "*.tfplan", ".terraform.lock.hcl", "crash.log",
        ];

        for pattern in defaults {
            // Static patterns, known to parse
            builder.add_line(None, pattern).ok();
        }

        // 3. Add user config excludes
        for pattern in extra_excludes {
            if let Err(e) = builder.add_line(None, pattern) {
                tracing::warn!(%pattern, "skipping exclude pattern: {}", e);
            }
        }

        let patterns = if patterns.is_empty() {
            DEFAULT_PATTERNS.iter().filter_map(|p| Pattern::new(p).ok()).collect()
        } else {
            patterns
                .iter()
                .filter_map(|p| match Pattern::new(p) {
                    Ok(pattern) => Some(pattern),
                    Err(e) => {
                        tracing::warn!(pattern = %p, "skipping import pattern: {}", e);
                        None
                    }
                })
                .collect()
        };

        Self {
            ignored: builder.build().unwrap_or_else(|_| Gitignore::empty()),
            patterns,
        }
    }

    /// Whether a file path (relative to the root) looks like a source
    pub fn wants(&self, relative: &Path) -> bool {
        let file_name = relative.file_name().and_then(|n| n.to_str()).unwrap_or("");
        self.patterns
            .iter()
            .any(|p| p.matches(file_name) || p.matches_path(relative))
    }

    /// All wanted files under `root`, sorted
    pub fn walk(&self, root: &Path) -> Vec<PathBuf> {
        let ignored = self.ignored.clone();
        let mut walker = WalkBuilder::new(root);
        walker
            .hidden(false)
            .require_git(false)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                !ignored.matched(entry.path(), is_dir).is_ignore()
            });

        let mut files: Vec<PathBuf> = walker
            .build()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("walk error under {}: {}", root.display(), e);
                    None
                }
            })
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| entry.into_path())
            .filter(|path| {
                let relative = path.strip_prefix(root).unwrap_or(path);
                self.wants(relative)
            })
            .collect();

        files.sort();
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_walk_selects_sources_and_skips_noise() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "main.tf");
        touch(root, "prod.tfvars");
        touch(root, "modules/net/main.tf");
        touch(root, "README.md");
        touch(root, "terraform.tfstate");
        touch(root, ".terraform/modules/cached.tf");

        let filter = SourceFilter::new(root, &[], &[]);
        let relative: Vec<_> = filter
            .walk(root)
            .into_iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            relative,
            vec![
                PathBuf::from("main.tf"),
                PathBuf::from("modules/net/main.tf"),
                PathBuf::from("prod.tfvars"),
            ]
        );
    }

    #[test]
    fn test_gitignore_and_excludes_are_honored() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join(".gitignore"), "scratch/\n").unwrap();
        touch(root, "main.tf");
        touch(root, "scratch/tmp.tf");
        touch(root, "legacy/old.tf");

        let filter = SourceFilter::new(root, &[], &["legacy/".to_string()]);
        let files = filter.walk(root);

        assert_eq!(files, vec![root.join("main.tf")]);
    }

    #[test]
    fn test_terraform_state_is_skipped_under_any_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "main.tf");
        touch(root, "terraform.tfstate");
        touch(root, "terraform.tfstate.backup");
        touch(root, ".terraform/providers/p.tf");

        let filter = SourceFilter::new(root, &["*".to_string()], &[]);
        assert_eq!(filter.walk(root), vec![root.join("main.tf")]);
    }

    #[test]
    fn test_custom_patterns() {
        let dir = tempfile::tempdir().unwrap();
        let filter = SourceFilter::new(dir.path(), &["*.hcl".to_string()], &[]);
        assert!(filter.wants(Path::new("policy.hcl")));
        assert!(!filter.wants(Path::new("main.tf")));
    }
}
