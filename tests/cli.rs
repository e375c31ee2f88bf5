//! End-to-end tests of the `exm` binary.

mod common;

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use common::module_repo;

/// Module name used in the project manifests; resolves as a local path
/// relative to the project directory.
const MODULE_NAME: &str = "fixtures/sources/repo-a";

/// A project directory with one fixture module repo and a requirements file.
struct TestProject {
    dir: TempDir,
    repo: common::TestGit,
}

impl TestProject {
    fn new(requirements: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let (repo, ..) = module_repo(&dir.path().join(MODULE_NAME)).unwrap();
        std::fs::write(dir.path().join("extensions.toml"), requirements).unwrap();
        Self { dir, repo }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn exm(&self, args: &[&str]) -> Command {
        let mut cmd = Command::cargo_bin("exm").unwrap();
        cmd.current_dir(self.path())
            .env("EXM_CACHE_DIR", self.path().join("cache"))
            .args(args);
        cmd
    }

    fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.path().join(relative)).unwrap()
    }
}

fn version_requirements() -> String {
    format!(
        "version = 1\n\n[[modules]]\nname = \"{MODULE_NAME}\"\nversion = \">=1.0.0\"\n"
    )
}

#[test]
fn ensure_writes_locks_and_registrations() {
    let project = TestProject::new(&version_requirements());

    project.exm(&["ensure"]).assert().success();

    let locks = project.read("extensions.lock");
    assert!(locks.contains(MODULE_NAME));
    assert!(locks.contains("v1.2.0"));

    let registrations = project.read("registrations.yaml");
    assert!(registrations.contains("ExtensionRegistration"));
    assert!(registrations.contains("ExtensionDeployment"));
}

#[test]
fn ensure_is_sticky_until_forced_to_update() {
    let project = TestProject::new(&version_requirements());
    project.exm(&["ensure"]).assert().success();

    // A newer release appears upstream.
    project.repo.write("README.md", "# v1.3\n").unwrap();
    project.repo.commit_all("third release").unwrap();
    project.repo.tag("v1.3.0").unwrap();

    project.exm(&["ensure"]).assert().success();
    assert!(project.read("extensions.lock").contains("v1.2.0"));

    project.exm(&["ensure", "--update-all"]).assert().success();
    assert!(project.read("extensions.lock").contains("v1.3.0"));
}

#[test]
fn ensure_update_flags_are_mutually_exclusive() {
    let project = TestProject::new(&version_requirements());
    project
        .exm(&["ensure", "--update-all", "--update", MODULE_NAME])
        .assert()
        .failure();
}

#[test]
fn solve_writes_locks() {
    let project = TestProject::new(&version_requirements());

    project.exm(&["solve"]).assert().success();
    assert!(project.read("extensions.lock").contains("v1.2.0"));
}

#[test]
fn fetch_requires_recorded_locks() {
    let project = TestProject::new(&version_requirements());

    project
        .exm(&["fetch"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not read locks file"));

    project.exm(&["solve"]).assert().success();
    project
        .exm(&["fetch", "--registrations", "-"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ExtensionRegistration"));
}

#[test]
fn fetch_fails_for_modules_missing_from_locks() {
    let project = TestProject::new(&version_requirements());
    project.exm(&["solve"]).assert().success();

    // Empty the locks file: the module key is now absent.
    std::fs::write(project.path().join("extensions.lock"), "version = 1\n").unwrap();

    project
        .exm(&["fetch"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no lock recorded"));
}

#[test]
fn solve_reports_missing_artifacts() {
    let project = TestProject::new(&format!(
        "version = 1\n\n[[modules]]\nname = \"{MODULE_NAME}\"\nfilename = \"absent.yaml\"\n"
    ));

    project
        .exm(&["solve"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not have file"));
}
