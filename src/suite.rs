//! Test-suite orchestration.
//!
//! The orchestrator owns the whole pass: it seeds the build graph, walks
//! the test-case directories, drives the directive parser, the command
//! translator, and the run-script generator for each test, and performs the
//! final serialization pass. Every output is buffered in a [`StableFile`]
//! and committed only once the full pass has succeeded, so a fatal error
//! never leaves partial artifacts behind.

use crate::config::Config;
use crate::directive::{self, ScanContext};
use crate::manifest::{Manifest, TestRecord};
use crate::ninja::{GraphError, NinjaFile};
use crate::runscript;
use crate::stable_file::StableFile;
use crate::translate::{self, INSTALL_PREFIX, TranslateContext};
use anyhow::{Context, Result};
use camino::Utf8Path;
use itertools::Itertools;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Root where packaged tests execute on the target.
pub const RUN_ROOT: &str = "/usr/local/tests/dltest";

/// Extensions scanned for directive comments.
const SOURCE_EXTENSIONS: &[&str] = &[".c", ".cpp", ".cxx", ".m", ".mm"];

/// Directives accumulated for one test-case directory.
#[derive(Debug, Default)]
struct TestCase {
    name: String,
    build_lines: Vec<String>,
    run_lines: Vec<String>,
    min_os: Option<String>,
    timeout: Option<String>,
    boot_args: Option<String>,
    as_root: bool,
}

/// Counts reported after a full pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuiteSummary {
    /// Tests that produced graph and script artifacts.
    pub registered: usize,
    /// Tests silently excluded for lacking build or run directives.
    pub excluded: usize,
}

/// Drives one full generation pass over a test-suite source tree.
#[derive(Debug)]
pub struct Suite {
    config: Config,
}

impl Suite {
    /// Create an orchestrator for the given configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the full pass: discover, translate, and serialize.
    ///
    /// # Errors
    ///
    /// Returns an error on any fatal configuration problem (unknown command
    /// family, duplicate or missing target, unreadable input) or I/O
    /// failure. Nothing is written to disk when an error is returned.
    pub fn run(&self) -> Result<SuiteSummary> {
        let cfg = &self.config;
        let mut ninja = NinjaFile::new();
        self.seed_graph(&mut ninja)?;

        let mut pending: Vec<StableFile> = Vec::new();
        let mut run_all = String::from("#!/bin/sh\n");
        let mut records: Vec<TestRecord> = Vec::new();
        let mut invocations: Vec<String> = Vec::new();
        let mut suppressed: Vec<String> = Vec::new();
        let mut registered = 0usize;
        let mut excluded = 0usize;

        for test_name in self.discover_tests()? {
            debug!(test = %test_name, "processing");
            let case = self.scan_test(&test_name, &mut suppressed)?;
            if case.build_lines.is_empty() || case.run_lines.is_empty() {
                debug!(test = %case.name, "excluded: needs both build and run directives");
                excluded += 1;
                continue;
            }

            let src_dir = format!("$SRCROOT/testing/test-cases/{test_name}.dtest");
            let dst_dir = format!("$SYMROOT/{test_name}");
            let run_dir = format!("{RUN_ROOT}/{test_name}");
            let ctx = TranslateContext {
                test_name: &test_name,
                min_os: case.min_os.as_deref(),
                src_dir: &src_dir,
                dst_dir: &dst_dir,
                macos_build: cfg.macos_build(),
            };
            translate::process_build_lines(&mut ninja, &case.build_lines, &ctx)?;

            let script = runscript::emit_run_script(
                &mut ninja,
                &test_name,
                &case.run_lines,
                &run_dir,
                &cfg.sym_root,
                cfg.macos_build(),
            )?;
            pending.push(script);

            run_all.push_str(&format!("{run_dir}/run.sh\n"));
            for line in &case.run_lines {
                invocations.push(runscript::invocation_entry(&test_name, line));
            }
            records.push(TestRecord {
                test_name: test_name.clone(),
                arch: "platform-native".to_owned(),
                working_directory: run_dir,
                command: vec!["./run.sh".to_owned()],
                as_root: case.as_root.then_some(true),
                timeout: case.timeout.clone(),
                boot_args: case.boot_args.clone(),
                show_subtests: true,
            });
            registered += 1;
        }

        self.finish(&mut ninja, &mut pending, &run_all, records, suppressed, &invocations)?;

        for file in pending {
            let path = file.path().to_owned();
            let wrote = file.commit().with_context(|| format!("write {path}"))?;
            if wrote {
                debug!(%path, "wrote");
            } else {
                debug!(%path, "unchanged");
            }
        }
        info!(registered, excluded, "build plan complete");
        Ok(SuiteSummary {
            registered,
            excluded,
        })
    }

    /// Seed includes, global variables, rules, and the suite-wide phonies.
    fn seed_graph(&self, ninja: &mut NinjaFile) -> Result<(), GraphError> {
        let cfg = &self.config;
        ninja.add_include("config.ninja");
        ninja.add_variable("minOS", cfg.min_os_flag());
        ninja.add_variable(
            "archs",
            cfg.archs.iter().map(|arch| format!("-arch {arch}")).join(" "),
        );
        ninja.add_variable("mode", "0755");
        ninja.add_variable("headerpaths", cfg.header_paths());

        let compile = |tool: &Utf8Path| {
            format!("{tool} -g -MMD -MF $out.d $archs -o $out -c $in $minOS $headerpaths $cflags")
        };
        let link = |tool: &Utf8Path| {
            format!(
                "{tool} -g $archs -o $out -ltest_support $in $minOS -isysroot {} {} \
                 && dsymutil -o $out.dSYM $out $extraCmds \
                 && codesign --force --sign - $entitlements $out",
                cfg.sdk_root, cfg.linker_flags,
            )
        };
        ninja.add_rule("cc", compile(&cfg.cc_tool), Some("$out.d"));
        ninja.add_rule("cxx", compile(&cfg.cxx_tool), Some("$out.d"));
        ninja.add_rule("cc-link", link(&cfg.cc_tool), None);
        ninja.add_rule("cxx-link", link(&cfg.cxx_tool), None);
        ninja.add_rule("dtrace", "/usr/sbin/dtrace -h -s $in -o $out", None);
        ninja.add_rule("cp", "/bin/cp -p $in $out", None);
        ninja.add_rule(
            "install",
            format!(
                "/usr/bin/install -m $mode -o {} -g {} $install_flags $in $out",
                cfg.install_owner, cfg.install_group,
            ),
            None,
        );
        ninja.add_rule("symlink", "ln -sfh $source $out", None);

        ninja.new_target("phony", "all")?;
        ninja.new_target("phony", "install")?;
        Ok(())
    }

    /// Discover `*.dtest` directories in sorted order.
    fn discover_tests(&self) -> Result<Vec<String>> {
        let root = self.config.test_src_root();
        let mut names = Vec::new();
        for entry in WalkDir::new(root.as_std_path())
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.with_context(|| format!("scan {root}"))?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if let Some(test) = name.strip_suffix(".dtest") {
                names.push(test.to_owned());
            }
        }
        Ok(names)
    }

    /// Scan one test directory's sources into a [`TestCase`].
    fn scan_test(&self, test_name: &str, suppressed: &mut Vec<String>) -> Result<TestCase> {
        let cfg = &self.config;
        let src_dir = format!("$SRCROOT/testing/test-cases/{test_name}.dtest");
        let dst_dir = format!("$SYMROOT/{test_name}");
        let run_dir = format!("{RUN_ROOT}/{test_name}");
        let ctx = ScanContext {
            os_name: cfg.os_name(),
            os_flag: &cfg.os_flag,
            build_dir: &dst_dir,
            run_dir: &run_dir,
            src_dir: &src_dir,
            sudo_cmd: cfg.sudo_cmd(),
        };

        let dir = cfg.test_src_root().join(format!("{test_name}.dtest"));
        let mut case = TestCase {
            name: test_name.to_owned(),
            ..TestCase::default()
        };
        for entry in WalkDir::new(dir.as_std_path())
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.with_context(|| format!("scan {dir}"))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if !SOURCE_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
                continue;
            }
            let text = std::fs::read_to_string(entry.path())
                .with_context(|| format!("read {}", entry.path().display()))?;
            let scan = directive::scan_source(&text, &ctx);
            case.build_lines.extend(scan.build_lines);
            case.run_lines.extend(scan.run_lines);
            if scan.min_os.is_some() {
                case.min_os = scan.min_os;
            }
            if scan.timeout.is_some() {
                case.timeout = scan.timeout;
            }
            if scan.boot_args.is_some() {
                case.boot_args = scan.boot_args;
            }
            case.as_root |= scan.as_root;
            suppressed.extend(scan.suppressed_crashes);
        }
        Ok(case)
    }

    /// Final serialization pass: aggregate script, manifest, invocation
    /// table, and the build graph itself.
    fn finish(
        &self,
        ninja: &mut NinjaFile,
        pending: &mut Vec<StableFile>,
        run_all: &str,
        records: Vec<TestRecord>,
        suppressed: Vec<String>,
        invocations: &[String],
    ) -> Result<()> {
        let cfg = &self.config;

        let mut run_all_file = StableFile::new(cfg.derived_files_dir.join("run_all_tests.sh"));
        run_all_file.write_str(run_all);
        run_all_file.set_executable(true);
        pending.push(run_all_file);
        let run_all_install = format!("{INSTALL_PREFIX}/run_all_tests.sh");
        ninja
            .new_target("install", run_all_install.clone())?
            .add_input("$DERIVED_FILES_DIR/run_all_tests.sh");
        ninja.target_mut("install")?.add_input(run_all_install);

        let manifest = Manifest::new(records, suppressed);
        let plist_path = cfg.derived_files_dir.join("dltests.plist");
        let mut manifest_file = StableFile::new(plist_path.clone());
        manifest_file.write_bytes(
            &manifest
                .to_binary()
                .context("encode registration manifest")?,
        );
        pending.push(manifest_file);
        let manifest_install = format!("{INSTALL_PREFIX}/dltests.plist");
        let target = ninja.new_target("install", manifest_install.clone())?;
        target.add_input(plist_path.as_str());
        target.add_variable("mode", "0644");
        ninja.target_mut("install")?.add_input(manifest_install);

        let mut table_file = StableFile::new(cfg.table_path());
        table_file.write_str(&format!(
            "static const TestInfo sTests[] = {{\n{}\n}};\n",
            invocations.join(",\n"),
        ));
        pending.push(table_file);

        let mut graph_file = StableFile::new(cfg.derived_files_dir.join("build.ninja"));
        graph_file.write_str(&ninja.render());
        pending.push(graph_file);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn run_root_matches_install_prefix_layout() {
        // The packaged run directory and the install prefix must agree on
        // the suite directory name, or installed scripts cd into nothing.
        let suffix = INSTALL_PREFIX.rsplit('/').next().expect("suffix");
        assert!(RUN_ROOT.ends_with(suffix));
    }
}
