//! Collapse resolved import paths into one dependency per repository

use std::collections::HashMap;
use vendr_errors::NormalizationError;
use vendr_types::{normalize_name, Dependency};

/// One dependency per repository root, in first-seen order
///
/// Sub-package suffixes are appended in input order and repeats are kept.
/// Paths that cannot be normalized are skipped.
#[must_use]
pub fn aggregate_packages<I, S>(paths: I) -> Vec<Dependency>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    aggregate_with(paths, false, |_, _| {})
}

/// Like [`aggregate_packages`], but each sub-package is listed once
#[must_use]
pub fn aggregate_packages_dedup<I, S>(paths: I) -> Vec<Dependency>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    aggregate_with(paths, true, |_, _| {})
}

pub(crate) fn aggregate_with<I, S, F>(paths: I, dedupe: bool, mut on_invalid: F) -> Vec<Dependency>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: FnMut(&str, NormalizationError),
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut deps: Vec<Dependency> = Vec::new();

    for path in paths {
        let path = path.as_ref();
        let (root, suffix) = match normalize_name(path) {
            Ok(split) => split,
            Err(e) => {
                on_invalid(path, e);
                continue;
            }
        };

        let pos = *index.entry(root.clone()).or_insert_with(|| {
            deps.push(Dependency::new(root));
            deps.len() - 1
        });

        if !suffix.is_empty() {
            let subpackages = &mut deps[pos].subpackages;
            if !dedupe || !subpackages.contains(&suffix) {
                subpackages.push(suffix);
            }
        }
    }

    deps
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PATHS: [&str; 3] = ["example.com/a/sub1", "example.com/a/sub2", "example.com/a/sub1"];

    #[test]
    fn duplicates_are_preserved_by_default() {
        let deps = aggregate_packages(PATHS);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "example.com/a");
        assert!(deps[0].reference.is_empty());
        assert_eq!(deps[0].subpackages, vec!["sub1", "sub2", "sub1"]);
    }

    #[test]
    fn dedup_variant_lists_each_subpackage_once() {
        let deps = aggregate_packages_dedup(PATHS);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].subpackages, vec!["sub1", "sub2"]);
    }

    #[test]
    fn roots_keep_first_seen_order() {
        let deps = aggregate_packages([
            "github.com/b/b/x",
            "github.com/a/a",
            "github.com/b/b",
            "golang.org/x/net/context",
        ]);
        let names: Vec<&str> = deps.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["github.com/b/b", "github.com/a/a", "golang.org/x/net"]);
        assert_eq!(deps[0].subpackages, vec!["x"]);
        assert!(deps[1].subpackages.is_empty());
    }

    #[test]
    fn invalid_paths_are_reported_and_skipped() {
        let mut invalid = Vec::new();
        let deps = aggregate_with(["fmt", "github.com/a/a", ""], false, |path, _| {
            invalid.push(path.to_string());
        });
        assert_eq!(deps.len(), 1);
        assert_eq!(invalid, vec!["fmt".to_string(), String::new()]);
    }

    proptest! {
        #[test]
        fn one_dependency_per_root(
            picks in proptest::collection::vec((0usize..4, 0usize..3), 0..40),
        ) {
            let roots = ["github.com/a/a", "github.com/b/b", "example.com/c", "gopkg.in/yaml.v2"];
            let subs = ["", "x", "y/z"];
            let paths: Vec<String> = picks
                .iter()
                .map(|&(r, s)| if subs[s].is_empty() {
                    roots[r].to_string()
                } else {
                    format!("{}/{}", roots[r], subs[s])
                })
                .collect();

            let deps = aggregate_packages(&paths);

            let mut expected: Vec<&str> = Vec::new();
            for &(r, _) in &picks {
                if !expected.contains(&roots[r]) {
                    expected.push(roots[r]);
                }
            }
            let names: Vec<&str> = deps.iter().map(|d| d.name.as_str()).collect();
            prop_assert_eq!(names, expected);

            let total_subs: usize = deps.iter().map(|d| d.subpackages.len()).sum();
            let non_empty = picks.iter().filter(|&&(_, s)| !subs[s].is_empty()).count();
            prop_assert_eq!(total_subs, non_empty);
        }
    }
}
