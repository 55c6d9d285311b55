//! Integration tests for resolver crate

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;
    use vendr_errors::{Error, VcsError};
    use vendr_events::{AppEvent, ResolverEvent};
    use vendr_resolver::*;
    use vendr_types::Dependency;

    /// Handler that materialises canned repositories instead of fetching
    struct FakeRemote {
        vendor: PathBuf,
        /// repository root -> (relative file path, contents)
        repos: HashMap<String, Vec<(String, String)>>,
        not_found_calls: Mutex<Vec<String>>,
        on_gopath_calls: Mutex<Vec<String>>,
    }

    impl FakeRemote {
        fn new(vendor: &Path) -> Self {
            Self {
                vendor: vendor.to_path_buf(),
                repos: HashMap::new(),
                not_found_calls: Mutex::new(Vec::new()),
                on_gopath_calls: Mutex::new(Vec::new()),
            }
        }

        fn repo(mut self, root: &str, files: &[(&str, &str)]) -> Self {
            self.repos.insert(
                root.to_string(),
                files
                    .iter()
                    .map(|(p, c)| ((*p).to_string(), (*c).to_string()))
                    .collect(),
            );
            self
        }
    }

    #[async_trait]
    impl MissingPackageHandler for FakeRemote {
        async fn not_found(&self, package: &str) -> Result<bool, Error> {
            self.not_found_calls
                .lock()
                .unwrap()
                .push(package.to_string());
            let (root, _) = vendr_types::normalize_name(package)?;
            let Some(files) = self.repos.get(&root) else {
                return Err(VcsError::CommandFailed {
                    program: "git".into(),
                    args: format!("clone https://{root}"),
                    code: Some(128),
                    stderr: "repository not found".into(),
                }
                .into());
            };
            for (rel, contents) in files {
                let path = self.vendor.join(&root).join(rel);
                std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                std::fs::write(path, contents).unwrap();
            }
            Ok(true)
        }

        async fn on_gopath(&self, package: &str) -> Result<bool, Error> {
            self.on_gopath_calls
                .lock()
                .unwrap()
                .push(package.to_string());
            Ok(false)
        }
    }

    fn project() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("vendr.yaml"), "package: app\n").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_missing_packages_are_fetched_during_the_walk() {
        let dir = project();
        let vendor = dir.path().join("vendor");
        let remote = Arc::new(
            FakeRemote::new(&vendor)
                .repo(
                    "github.com/foo/app",
                    &[(
                        "cmd/main.go",
                        "package main\nimport (\n\"fmt\"\n\"github.com/bar/lib/util\"\n)\n",
                    )],
                )
                .repo(
                    "github.com/bar/lib",
                    &[
                        ("lib.go", "package lib\n"),
                        ("util/util.go", "package util\nimport \"golang.org/x/net/context\"\n"),
                    ],
                )
                .repo("golang.org/x/net", &[("context/context.go", "package context\n")]),
        );

        let resolver = ImportResolver::new(dir.path())
            .unwrap()
            .with_handler(remote.clone());
        let dep = Dependency::new("github.com/foo/app").with_subpackages(vec!["cmd".into()]);
        let found = resolver.resolve_all(&[dep]).await.unwrap();

        let rel: Vec<String> = found
            .iter()
            .map(|p| {
                p.strip_prefix(&vendor)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        assert_eq!(
            rel,
            vec![
                "github.com/foo/app",
                "github.com/foo/app/cmd",
                "github.com/bar/lib/util",
                "golang.org/x/net/context",
            ]
        );

        // One fetch per missing repository, never for sub-packages of a fetched root
        assert_eq!(
            *remote.not_found_calls.lock().unwrap(),
            vec![
                "github.com/foo/app".to_string(),
                "github.com/bar/lib/util".to_string(),
                "golang.org/x/net/context".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_handler_failure_aborts_the_walk() {
        let dir = project();
        let remote = Arc::new(FakeRemote::new(&dir.path().join("vendor")));
        let (tx, mut rx) = vendr_events::channel();

        let resolver = ImportResolver::new(dir.path())
            .unwrap()
            .with_handler(remote)
            .with_event_sender(tx);
        let err = resolver
            .resolve_all(&[Dependency::new("github.com/gone/away")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Resolve(vendr_errors::ResolveError::Unresolvable { .. })
        ));

        let mut failed = false;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, AppEvent::Resolver(ResolverEvent::Failed { .. })) {
                failed = true;
            }
        }
        assert!(failed);
    }

    #[tokio::test]
    async fn test_source_path_packages_are_reported_not_fetched() {
        let dir = project();
        let gopath = tempdir().unwrap();
        let on_path = gopath.path().join("src/example.com/shared");
        std::fs::create_dir_all(&on_path).unwrap();
        std::fs::write(on_path.join("shared.go"), "package shared\nimport \"os\"\n").unwrap();

        let remote = Arc::new(FakeRemote::new(&dir.path().join("vendor")));
        let resolver = ImportResolver::new(dir.path())
            .unwrap()
            .with_source_path(Some(gopath.path().to_path_buf()))
            .with_handler(remote.clone());

        let found = resolver
            .resolve_all(&[Dependency::new("example.com/shared")])
            .await
            .unwrap();

        assert_eq!(found, vec![dir.path().join("vendor/example.com/shared")]);
        assert_eq!(
            *remote.on_gopath_calls.lock().unwrap(),
            vec!["example.com/shared".to_string()]
        );
        assert!(remote.not_found_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_subpackage_in_fetched_repo_is_skipped() {
        let dir = project();
        let remote = Arc::new(
            FakeRemote::new(&dir.path().join("vendor"))
                .repo("example.com/a", &[("a.go", "package a\n")]),
        );
        let resolver = ImportResolver::new(dir.path())
            .unwrap()
            .with_handler(remote);

        let dep = Dependency::new("example.com/a").with_subpackages(vec!["nope".into()]);
        let found = resolver.resolve_all(&[dep]).await.unwrap();
        assert_eq!(found, vec![dir.path().join("vendor/example.com/a")]);
    }

    #[tokio::test]
    async fn test_test_files_and_cgo_are_ignored() {
        let dir = project();
        let pkg = dir.path().join("vendor/example.com/a");
        std::fs::create_dir_all(&pkg).unwrap();
        std::fs::write(pkg.join("a.go"), "package a\nimport \"C\"\n").unwrap();
        std::fs::write(
            pkg.join("a_test.go"),
            "package a\nimport \"example.com/testing/only\"\n",
        )
        .unwrap();

        let resolver = ImportResolver::new(dir.path()).unwrap();
        let found = resolver
            .resolve_all(&[Dependency::new("example.com/a")])
            .await
            .unwrap();
        assert_eq!(found, vec![pkg]);
    }
}
