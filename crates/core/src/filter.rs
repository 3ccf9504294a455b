// Glob-based include/exclude filters for paths

use anyhow::{anyhow, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

/// Patterns skipped by default when reading or listing
pub const DEFAULT_SKIP_READ: &[&str] = &[
    "**/.git/**",
    "**/.venv/**",
    "**/__pycache__/**",
    "**/node_modules/**",
    "*.pyc",
    "*.DS_Store",
    "*~",
];

pub fn default_skip_read() -> Vec<String> {
    DEFAULT_SKIP_READ.iter().map(|p| p.to_string()).collect()
}

#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl PathFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            include: build_glob_set(include)?,
            exclude: build_glob_set(exclude)?,
        })
    }

    /// Filter that only excludes
    pub fn excluding(exclude: &[String]) -> Result<Self> {
        Self::new(&[], exclude)
    }

    /// A path passes if it matches an include pattern (when any are set)
    /// and matches no exclude pattern.
    pub fn matches(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();

        if let Some(include) = &self.include {
            if !include.is_match(path) {
                return false;
            }
        }

        match &self.exclude {
            Some(exclude) => !exclude.is_match(path),
            None => true,
        }
    }
}

fn build_glob_set(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|err| anyhow!("invalid glob {}: {}", pattern, err))?;
        builder.add(glob);
    }
    Ok(Some(
        builder
            .build()
            .map_err(|err| anyhow!("invalid glob set: {}", err))?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(patterns: &[&str]) -> Vec<String> {
        patterns.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_matches_globs() {
        let skip = default_skip_read();
        let cases: Vec<(&str, Vec<String>, Vec<String>, bool)> = vec![
            ("file.txt", strings(&["*.txt"]), vec![], true),
            ("file.txt", strings(&["*.csv"]), vec![], false),
            ("file.txt", strings(&["*.txt"]), strings(&["file.txt"]), false),
            ("file.txt", vec![], strings(&["file.txt"]), false),
            ("file.txt", vec![], vec![], true),
            ("subdir/file.txt", strings(&["**/*.txt"]), vec![], true),
            ("subdir/file.txt", strings(&["**/*.csv"]), strings(&["**/*.txt"]), false),
            ("subdir/.git/config", vec![], skip.clone(), false),
            ("subdir/.venv/file.py", vec![], skip.clone(), false),
            ("subdir/normal_folder/file.py", vec![], skip.clone(), true),
            (".venv/file.py", vec![], skip.clone(), false),
            ("src/.venv/file.py", vec![], skip.clone(), false),
            ("src/__pycache__/file.py", vec![], skip.clone(), false),
            ("/abs/path/module.pyc", vec![], skip.clone(), false),
            ("notes.txt~", vec![], skip.clone(), false),
        ];

        for (path, include, exclude, expected) in cases {
            let filter = PathFilter::new(&include, &exclude).unwrap();
            assert_eq!(
                filter.matches(path),
                expected,
                "path {} include {:?} exclude {:?}",
                path,
                include,
                exclude
            );
        }
    }

    #[test]
    fn test_invalid_glob() {
        assert!(PathFilter::excluding(&strings(&["a[b"])).is_err());
    }

    #[test]
    fn test_default_filter_passes_everything() {
        assert!(PathFilter::default().matches("anything/at/all"));
    }
}
