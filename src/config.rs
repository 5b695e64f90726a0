//! Generator configuration.
//!
//! Every external parameter the generator consumes is declared here and
//! parsed from one configuration file of `KEY = value...` lines handed over
//! by the outer build. There are no ambient environment lookups: the caller
//! names the toolchain, the roots, and the target OS explicitly.

use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;
use std::fs;
use std::io;
use thiserror::Error;

/// Errors raised while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("read {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// A line did not follow the `KEY = value...` shape.
    #[error("malformed configuration line {line_no}: expected `KEY = value...`")]
    Malformed {
        /// One-based line number of the offending line.
        line_no: usize,
    },
    /// A required key was absent or had no value.
    #[error("missing required configuration key {key}")]
    MissingKey {
        /// Name of the absent key.
        key: &'static str,
    },
}

/// Fully resolved generator configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Source tree root; test cases live under `testing/test-cases`.
    pub src_root: Utf8PathBuf,
    /// Build products root; per-test outputs land under `SYMROOT/<test>`.
    pub sym_root: Utf8PathBuf,
    /// SDK root passed to the compiler and linker.
    pub sdk_root: Utf8PathBuf,
    /// Intermediate objects root.
    pub obj_root: Utf8PathBuf,
    /// Minimum-OS flag name, e.g. `mmacosx-version-min`.
    pub os_flag: String,
    /// Minimum-OS version paired with `os_flag`.
    pub os_version: String,
    /// Extra linker flags appended to every link rule.
    pub linker_flags: String,
    /// Owner passed to the install tool.
    pub install_owner: String,
    /// Group passed to the install tool.
    pub install_group: String,
    /// Mode flag passed to the install tool.
    pub install_mode: String,
    /// Installation root for the packaged test suite.
    pub install_dir: Utf8PathBuf,
    /// Destination for generated build files and scripts.
    pub derived_files_dir: Utf8PathBuf,
    /// C compiler path.
    pub cc_tool: Utf8PathBuf,
    /// C++ compiler path.
    pub cxx_tool: Utf8PathBuf,
    /// Architectures built for every target.
    pub archs: Vec<String>,
    /// Project header search paths.
    pub user_header_search_paths: Vec<String>,
    /// System header search paths.
    pub system_header_search_paths: Vec<String>,
    /// Optional override for the static invocation table output path.
    pub test_table_path: Option<Utf8PathBuf>,
}

impl Config {
    /// Load a configuration file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn from_path(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse configuration text.
    ///
    /// Lines are split on whitespace; the first token is the key, the
    /// second must be `=`, and the rest are values. Blank lines and lines
    /// starting with `#` are skipped; unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on malformed lines or missing required keys.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut map: HashMap<&str, Vec<String>> = HashMap::new();
        for (idx, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let mut tokens = trimmed.split_whitespace();
            let key = tokens.next().ok_or(ConfigError::Malformed { line_no: idx + 1 })?;
            if tokens.next() != Some("=") {
                return Err(ConfigError::Malformed { line_no: idx + 1 });
            }
            map.insert(key, tokens.map(str::to_owned).collect());
        }

        Ok(Self {
            src_root: required(&map, "SRCROOT")?.into(),
            sym_root: required(&map, "SYMROOT")?.into(),
            sdk_root: required(&map, "SDKROOT")?.into(),
            obj_root: required(&map, "OBJROOT")?.into(),
            os_flag: required(&map, "OSFLAG")?,
            os_version: required(&map, "OSVERSION")?,
            linker_flags: joined(&map, "LDFLAGS"),
            install_owner: required(&map, "INSTALL_OWNER")?,
            install_group: required(&map, "INSTALL_GROUP")?,
            install_mode: required(&map, "INSTALL_MODE_FLAG")?,
            install_dir: required(&map, "INSTALL_DIR")?.into(),
            derived_files_dir: required(&map, "DERIVED_FILES_DIR")?.into(),
            cc_tool: required(&map, "CC")?.into(),
            cxx_tool: required(&map, "CXX")?.into(),
            archs: multi(&map, "ARCHS"),
            user_header_search_paths: multi(&map, "USER_HEADER_SEARCH_PATHS"),
            system_header_search_paths: multi(&map, "SYSTEM_HEADER_SEARCH_PATHS"),
            test_table_path: map
                .get("TEST_TABLE_PATH")
                .and_then(|values| values.first())
                .map(Utf8PathBuf::from),
        })
    }

    /// Root directory scanned for `*.dtest` test-case directories.
    #[must_use]
    pub fn test_src_root(&self) -> Utf8PathBuf {
        self.src_root.join("testing/test-cases")
    }

    /// Whether the target platform family is macOS.
    #[must_use]
    pub fn macos_build(&self) -> bool {
        self.os_flag == "mmacosx-version-min"
    }

    /// Elevation prefix substituted for `$SUDO` in run lines.
    #[must_use]
    pub fn sudo_cmd(&self) -> &'static str {
        if self.macos_build() { "sudo" } else { "" }
    }

    /// OS family name matched against `BUILD_ONLY` directives.
    #[must_use]
    pub fn os_name(&self) -> &'static str {
        match self.os_flag.as_str() {
            "mmacosx-version-min" => "MacOSX",
            "miphoneos-version-min" => "iOS",
            "mtvos-version-min" => "tvOS",
            "mwatchos-version-min" => "watchOS",
            _ => "unknown",
        }
    }

    /// The `-<osflag>=<version>` value bound to the global `minOS` variable.
    #[must_use]
    pub fn min_os_flag(&self) -> String {
        format!("-{}={}", self.os_flag, self.os_version)
    }

    /// Header search arguments shared by every compile rule.
    #[must_use]
    pub fn header_paths(&self) -> String {
        let mut paths = format!(" -isysroot {}", self.sdk_root);
        for header_path in self
            .user_header_search_paths
            .iter()
            .chain(&self.system_header_search_paths)
        {
            paths.push_str(&format!(" -I{header_path}"));
        }
        paths
    }

    /// Destination of the static invocation table.
    #[must_use]
    pub fn table_path(&self) -> Utf8PathBuf {
        self.test_table_path
            .clone()
            .unwrap_or_else(|| self.derived_files_dir.join("test_registry.h"))
    }
}

fn required(map: &HashMap<&str, Vec<String>>, key: &'static str) -> Result<String, ConfigError> {
    map.get(key)
        .and_then(|values| values.first())
        .cloned()
        .ok_or(ConfigError::MissingKey { key })
}

fn joined(map: &HashMap<&str, Vec<String>>, key: &str) -> String {
    map.get(key).map(|values| values.join(" ")).unwrap_or_default()
}

fn multi(map: &HashMap<&str, Vec<String>>, key: &str) -> Vec<String> {
    map.get(key).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SAMPLE: &str = "\
SRCROOT = /src
SYMROOT = /build/sym
SDKROOT = /sdk
OBJROOT = /build/obj
OSFLAG = mmacosx-version-min
OSVERSION = 10.14
LDFLAGS = -Wl,-no_uuid
INSTALL_OWNER = root
INSTALL_GROUP = wheel
INSTALL_MODE_FLAG = a+rX
INSTALL_DIR = /dst
DERIVED_FILES_DIR = /build/derived
CC = /toolchain/bin/clang
CXX = /toolchain/bin/clang++
ARCHS = x86_64 arm64
USER_HEADER_SEARCH_PATHS = /src/include
SYSTEM_HEADER_SEARCH_PATHS =
";

    #[rstest]
    fn parses_a_full_configuration() {
        let config = Config::parse(SAMPLE).expect("parse");
        assert_eq!(config.src_root, "/src");
        assert_eq!(config.archs, vec!["x86_64", "arm64"]);
        assert!(config.macos_build());
        assert_eq!(config.sudo_cmd(), "sudo");
        assert_eq!(config.os_name(), "MacOSX");
        assert_eq!(config.min_os_flag(), "-mmacosx-version-min=10.14");
        assert_eq!(config.test_src_root(), "/src/testing/test-cases");
        assert_eq!(config.header_paths(), " -isysroot /sdk -I/src/include");
        assert_eq!(config.table_path(), "/build/derived/test_registry.h");
    }

    #[rstest]
    fn missing_key_is_fatal() {
        let text = SAMPLE.replace("SDKROOT = /sdk\n", "");
        let err = Config::parse(&text).expect_err("missing key");
        assert!(matches!(err, ConfigError::MissingKey { key: "SDKROOT" }));
    }

    #[rstest]
    fn malformed_line_is_fatal() {
        let err = Config::parse("SRCROOT /src\n").expect_err("missing equals");
        assert!(matches!(err, ConfigError::Malformed { line_no: 1 }));
    }

    #[rstest]
    #[case("miphoneos-version-min", "iOS", "")]
    #[case("mwatchos-version-min", "watchOS", "")]
    fn non_macos_targets_have_no_sudo(
        #[case] os_flag: &str,
        #[case] os_name: &str,
        #[case] sudo: &str,
    ) {
        let text = SAMPLE.replace("mmacosx-version-min", os_flag);
        let config = Config::parse(&text).expect("parse");
        assert!(!config.macos_build());
        assert_eq!(config.os_name(), os_name);
        assert_eq!(config.sudo_cmd(), sudo);
    }

    #[rstest]
    fn table_path_override_wins() {
        let text = format!("{SAMPLE}TEST_TABLE_PATH = /gen/table.h\n");
        let config = Config::parse(&text).expect("parse");
        assert_eq!(config.table_path(), "/gen/table.h");
    }
}
