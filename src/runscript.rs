//! Run-script generation.
//!
//! Every registered test gets one POSIX shell script that replays its run
//! lines under each loader execution mode: the interpreted loader (mode 2)
//! and the compiled-closure loader (mode 3), each additionally run with the
//! shared-cache bypass on macOS. A run line that asked for elevation keeps
//! its `sudo` prefix in every mode, with the mode environment placed after
//! `sudo` so the variables reach the test process.

use crate::ninja::{GraphError, NinjaFile};
use crate::stable_file::StableFile;
use crate::translate::INSTALL_PREFIX;
use camino::Utf8Path;

/// Environment prefix shared by every emitted invocation.
const OUTPUT_ENV: &str = "TEST_OUTPUT=BATS";

/// Build the run script for one test and register its install target.
///
/// Returns the filled [`StableFile`] so the orchestrator can commit it with
/// the rest of the pass's outputs.
///
/// # Errors
///
/// Returns a [`GraphError`] if the per-test install phony is missing or the
/// install target collides.
pub fn emit_run_script(
    ninja: &mut NinjaFile,
    test_name: &str,
    run_lines: &[String],
    run_dir: &str,
    sym_root: &Utf8Path,
    macos_build: bool,
) -> Result<StableFile, GraphError> {
    let mut script = String::new();
    script.push_str("#!/bin/sh\n");
    script.push_str(&format!("cd {run_dir}\n"));
    for (banner, env) in modes(macos_build) {
        script.push_str(&format!("echo \"{banner}\"\n"));
        for line in run_lines {
            script.push_str(&mode_line(line, env));
            script.push('\n');
        }
    }

    let mut file = StableFile::new(sym_root.join(test_name).join("run.sh"));
    file.write_str(&script);
    file.set_executable(true);

    let installed = format!("{INSTALL_PREFIX}/{test_name}/run.sh");
    ninja
        .new_target("install", installed.clone())?
        .add_input(format!("{sym_root}/{test_name}/run.sh"));
    ninja
        .target_mut(&format!("install-{test_name}"))?
        .add_input(installed);
    Ok(file)
}

/// Format one invocation-table entry, dropping the elevation prefix.
#[must_use]
pub fn invocation_entry(test_name: &str, run_line: &str) -> String {
    let line = run_line.strip_prefix("sudo ").unwrap_or(run_line);
    format!("{{ \"{}\", \"{}\" }}", test_name, line.replace('"', "\\\""))
}

fn modes(macos_build: bool) -> Vec<(&'static str, &'static str)> {
    let mut modes = vec![(
        "run in loader2 mode",
        "TEST_LOADER_MODE=2 LOADER_USE_CLOSURES=0",
    )];
    if macos_build {
        modes.push((
            "run in loader2 mode with no shared cache",
            "TEST_LOADER_MODE=2 LOADER_SHARED_REGION=avoid",
        ));
    }
    modes.push((
        "run in loader3 mode",
        "TEST_LOADER_MODE=3 LOADER_USE_CLOSURES=1",
    ));
    if macos_build {
        modes.push((
            "run in loader3 mode with no shared cache",
            "TEST_LOADER_MODE=3 LOADER_SHARED_REGION=avoid LOADER_USE_CLOSURES=1",
        ));
    }
    modes
}

fn mode_line(run_line: &str, env: &str) -> String {
    match run_line.strip_prefix("sudo ") {
        Some(rest) => format!("sudo {OUTPUT_ENV} {env} {rest}"),
        None => format!("{OUTPUT_ENV} {env} {run_line}"),
    }
}
