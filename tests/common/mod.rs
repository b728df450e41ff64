//! Common test utilities for rust-sdkmigrate tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use rust_sdkmigrate::{migrate_directory, CancellationToken, MigrateOptions, MigrationReport};

/// Test context with temporary directory for isolated test execution
pub struct TestContext {
    /// Kept to prevent temp directory cleanup until TestContext is dropped
    _temp_dir: TempDir,
    pub root: PathBuf,
    /// Stored for debugging purposes
    _fixture_name: String,
}

impl TestContext {
    /// Create a new test context by copying a fixture to a temp directory
    pub fn with_fixture(fixture_name: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let fixture_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(fixture_name);

        let root = temp_dir.path().to_path_buf();

        // Copy fixture to temp directory
        copy_dir_recursive(&fixture_path, &root).expect("Failed to copy fixture");

        Self {
            _temp_dir: temp_dir,
            root,
            _fixture_name: fixture_name.to_string(),
        }
    }

    /// Path of a file inside the copied fixture
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative))
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", relative, e))
    }

    /// Options rooted at the fixture copy
    pub fn options(&self) -> MigrateOptions {
        MigrateOptions::new(&self.root)
    }

    /// Run a migration, panicking on a batch-level error
    pub fn migrate(&self, options: MigrateOptions) -> MigrationReport {
        migrate_directory(options, &CancellationToken::new()).unwrap_or_else(|e| {
            panic!(
                "Migration of fixture '{}' failed: {:#}",
                self._fixture_name, e
            )
        })
    }
}

/// Recursively copy a directory
fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    if !dst.exists() {
        fs::create_dir_all(dst)?;
    }

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }

    Ok(())
}

/// Normalize line endings so expected XML can be written with `\n`
pub fn normalize(xml: &str) -> String {
    xml.replace("\r\n", "\n")
}

/// Assert that migrated XML contains a fragment
#[macro_export]
macro_rules! assert_xml_contains {
    ($xml:expr, $fragment:expr) => {
        assert!(
            $xml.contains($fragment),
            "Expected migrated project to contain '{}', got:\n{}",
            $fragment,
            $xml
        );
    };
}

/// Assert that migrated XML does not contain a fragment
#[macro_export]
macro_rules! assert_xml_lacks {
    ($xml:expr, $fragment:expr) => {
        assert!(
            !$xml.contains($fragment),
            "Expected migrated project not to contain '{}', got:\n{}",
            $fragment,
            $xml
        );
    };
}
