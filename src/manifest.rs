//! Test-registration manifest.
//!
//! Registered tests are described by [`TestRecord`]s and serialized as a
//! binary property list, the compact encoding the downstream test harness
//! consumes. Records are sorted by test name so the encoded bytes are
//! stable across runs.

use serde::Serialize;

/// Registration data for one test.
#[derive(Debug, Clone, Serialize)]
pub struct TestRecord {
    /// Test name, unique within the suite.
    #[serde(rename = "TestName")]
    pub test_name: String,
    /// Architecture tag; always `platform-native` for generated tests.
    #[serde(rename = "Arch")]
    pub arch: String,
    /// Working directory the harness switches to before running.
    #[serde(rename = "WorkingDirectory")]
    pub working_directory: String,
    /// Command argv; the generated run script.
    #[serde(rename = "Command")]
    pub command: Vec<String>,
    /// Set when any run line requested elevation.
    #[serde(rename = "AsRoot", skip_serializing_if = "Option::is_none")]
    pub as_root: Option<bool>,
    /// Execution timeout from `RUN_TIMEOUT`, if declared.
    #[serde(rename = "Timeout", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    /// Comma-joined boot arguments from `BOOT_ARGS`, if declared.
    #[serde(rename = "BootArgsSet", skip_serializing_if = "Option::is_none")]
    pub boot_args: Option<String>,
    /// Whether the harness reports each mode invocation separately.
    #[serde(rename = "ShowSubtestResults")]
    pub show_subtests: bool,
}

/// The aggregate registration manifest.
#[derive(Debug, Serialize)]
pub struct Manifest {
    #[serde(rename = "ConfigVersion")]
    config_version: String,
    #[serde(rename = "Project")]
    project: String,
    #[serde(rename = "Tests")]
    tests: Vec<TestRecord>,
    #[serde(rename = "IgnoreCrashes", skip_serializing_if = "Vec::is_empty")]
    ignore_crashes: Vec<String>,
}

impl Manifest {
    /// Assemble the manifest, sorting records by test name.
    #[must_use]
    pub fn new(mut tests: Vec<TestRecord>, ignore_crashes: Vec<String>) -> Self {
        tests.sort_by(|a, b| a.test_name.cmp(&b.test_name));
        Self {
            config_version: "0.1.0".to_owned(),
            project: "dltest".to_owned(),
            tests,
            ignore_crashes,
        }
    }

    /// Encode the manifest as a binary property list.
    ///
    /// # Errors
    ///
    /// Returns a [`plist::Error`] if serialization fails.
    pub fn to_binary(&self) -> Result<Vec<u8>, plist::Error> {
        let mut buffer = Vec::new();
        plist::to_writer_binary(&mut buffer, self)?;
        Ok(buffer)
    }
}
