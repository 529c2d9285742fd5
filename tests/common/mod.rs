// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

use quickpack::Paths;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// A throwaway project tree plus isolated install/unit/temp roots.
///
/// Keep the struct alive for the duration of the test to prevent cleanup.
pub struct TestEnv {
    pub project: TempDir,
    pub roots: TempDir,
    pub paths: Paths,
}

/// Create a project directory with a `.qp/` scripts directory and isolated
/// roots for install base, unit dir, and staging temp.
pub fn setup_env() -> TestEnv {
    let project = TempDir::new().unwrap();
    let roots = TempDir::new().unwrap();
    fs::create_dir_all(project.path().join(".qp")).unwrap();

    let paths = Paths {
        project_dir: project.path().to_path_buf(),
        install_base: roots.path().join("opt"),
        unit_dir: roots.path().join("units"),
        temp_dir: roots.path().join("tmp"),
    };
    fs::create_dir_all(&paths.install_base).unwrap();
    fs::create_dir_all(&paths.unit_dir).unwrap();
    fs::create_dir_all(&paths.temp_dir).unwrap();

    TestEnv {
        project,
        roots,
        paths,
    }
}

/// Write a file under the project tree, creating parent directories.
pub fn write_project_file(env: &TestEnv, rel: &str, content: &str) {
    let path = env.project.path().join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Write a descriptor into `.qp/config.json` and load it.
pub fn load_config(env: &TestEnv, json: &str) -> quickpack::Config {
    let config_path = env.project.path().join(".qp/config.json");
    fs::write(&config_path, json).unwrap();
    quickpack::Config::load(&config_path).unwrap()
}

/// Collect every file under `root` as (relative path, contents) pairs,
/// sorted, for tree comparisons.
pub fn snapshot_tree(root: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files = Vec::new();
    for entry in walkdir(root) {
        let rel = entry.strip_prefix(root).unwrap().to_string_lossy().into_owned();
        files.push((rel, fs::read(&entry).unwrap()));
    }
    files.sort();
    files
}

fn walkdir(root: &Path) -> Vec<std::path::PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap().flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                out.push(path);
            }
        }
    }
    out
}
