//! Directive scanning for annotated test sources.
//!
//! Test sources carry their build and execution instructions as directive
//! comments (`BUILD:`, `RUN:`, and friends) anywhere in a line. This module
//! extracts them as typed [`Directive`] records, applies `$NAME`-style
//! substitution from a small variable table, and folds one file's worth of
//! directives into a [`SourceScan`].

/// One parsed directive line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// A build command template.
    Build(String),
    /// A run command template.
    Run(String),
    /// Restrict the rest of the file to one OS family.
    BuildOnlyOs(String),
    /// Override the minimum OS version for this test.
    BuildMinOs(String),
    /// Execution timeout recorded in the registration manifest.
    RunTimeout(String),
    /// Boot arguments recorded in the registration manifest.
    BootArgs(String),
    /// A crash-log name to suppress suite-wide.
    NoCrashLog(String),
}

/// Substitution and OS context for scanning one source file.
#[derive(Debug, Clone, Copy)]
pub struct ScanContext<'a> {
    /// OS family name matched against `BUILD_ONLY` values.
    pub os_name: &'a str,
    /// Minimum-OS flag name used to format `BUILD_MIN_OS` overrides.
    pub os_flag: &'a str,
    /// Value of `$BUILD_DIR` in build lines.
    pub build_dir: &'a str,
    /// Value of `$RUN_DIR` in build and run lines.
    pub run_dir: &'a str,
    /// Value of `$SRC_DIR` in build lines.
    pub src_dir: &'a str,
    /// Value of `$SUDO` in run lines; empty when elevation is unavailable.
    pub sudo_cmd: &'a str,
}

/// Directives folded from one source file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SourceScan {
    /// Substituted build command lines, in file order.
    pub build_lines: Vec<String>,
    /// Substituted run command lines, in file order.
    pub run_lines: Vec<String>,
    /// Minimum-OS override, already formatted as `-<osflag>=<version>`.
    pub min_os: Option<String>,
    /// Execution timeout, if declared.
    pub timeout: Option<String>,
    /// Comma-joined boot arguments, if declared.
    pub boot_args: Option<String>,
    /// Whether any run line requested elevation via `$SUDO`.
    pub as_root: bool,
    /// Crash-log names to suppress suite-wide.
    pub suppressed_crashes: Vec<String>,
}

/// Parse one line into a directive, if it carries one.
#[must_use]
pub fn parse_line(line: &str) -> Option<Directive> {
    if let Some(payload) = payload_after(line, "BUILD_ONLY:") {
        return Some(Directive::BuildOnlyOs(payload.trim().to_owned()));
    }
    if let Some(payload) = payload_after(line, "BUILD_MIN_OS:") {
        return Some(Directive::BuildMinOs(payload.trim().to_owned()));
    }
    if let Some(payload) = payload_after(line, "BUILD:") {
        return Some(Directive::Build(payload.trim().to_owned()));
    }
    if let Some(payload) = payload_after(line, "RUN_TIMEOUT:") {
        return Some(Directive::RunTimeout(payload.trim().to_owned()));
    }
    if let Some(payload) = payload_after(line, "RUN:") {
        return Some(Directive::Run(payload.trim().to_owned()));
    }
    if let Some(payload) = payload_after(line, "BOOT_ARGS:") {
        return Some(Directive::BootArgs(payload.trim().to_owned()));
    }
    if let Some(payload) = payload_after(line, "NO_CRASH_LOG:") {
        return Some(Directive::NoCrashLog(payload.trim().to_owned()));
    }
    None
}

fn payload_after<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    line.find(marker).map(|idx| &line[idx + marker.len()..])
}

/// Expand `$NAME` and `${NAME}` placeholders from `table`.
///
/// Unresolved placeholders are kept verbatim so later phases can match on
/// them (build lines keep `$CC`, `$DEPENDS_ON`, and the other command
/// markers). `$$` collapses to a literal `$`.
#[must_use]
pub fn substitute(text: &str, table: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
        } else if let Some(braced) = after.strip_prefix('{') {
            if let Some(end) = braced.find('}') {
                let name = &braced[..end];
                match lookup(table, name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("${");
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &braced[end + 1..];
            } else {
                out.push_str("${");
                rest = braced;
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            let name = &after[..end];
            if name.is_empty() {
                out.push('$');
            } else {
                match lookup(table, name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('$');
                        out.push_str(name);
                    }
                }
            }
            rest = &after[end..];
        }
    }
    out.push_str(rest);
    out
}

fn lookup<'a>(table: &[(&str, &'a str)], name: &str) -> Option<&'a str> {
    table.iter().find(|(key, _)| *key == name).map(|(_, value)| *value)
}

/// Scan one source file's text into a [`SourceScan`].
///
/// A `BUILD_ONLY` directive naming a different OS family drops the rest of
/// the file; directives collected before it are kept. A matching value has
/// no effect beyond letting the scan continue.
#[must_use]
pub fn scan_source(text: &str, ctx: &ScanContext<'_>) -> SourceScan {
    let build_table = [
        ("BUILD_DIR", ctx.build_dir),
        ("RUN_DIR", ctx.run_dir),
        ("SRC_DIR", ctx.src_dir),
    ];
    let run_table = [("RUN_DIR", ctx.run_dir), ("SUDO", ctx.sudo_cmd)];

    let mut scan = SourceScan::default();
    for line in text.lines() {
        let Some(directive) = parse_line(line) else {
            continue;
        };
        match directive {
            Directive::BuildOnlyOs(os) => {
                if os != ctx.os_name {
                    break;
                }
            }
            Directive::BuildMinOs(version) => {
                scan.min_os = Some(format!("-{}={}", ctx.os_flag, version));
            }
            Directive::Build(payload) => {
                scan.build_lines.push(substitute(&payload, &build_table));
            }
            Directive::Run(payload) => {
                if payload.contains("$SUDO") {
                    scan.as_root = true;
                }
                let substituted = substitute(&payload, &run_table);
                scan.run_lines.push(substituted.trim().to_owned());
            }
            Directive::RunTimeout(value) => scan.timeout = Some(value),
            Directive::BootArgs(value) => {
                scan.boot_args = Some(value.split_whitespace().collect::<Vec<_>>().join(","));
            }
            Directive::NoCrashLog(value) => scan.suppressed_crashes.push(value),
        }
    }
    scan
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ctx<'a>() -> ScanContext<'a> {
        ScanContext {
            os_name: "MacOSX",
            os_flag: "mmacosx-version-min",
            build_dir: "$SYMROOT/example",
            run_dir: "/usr/local/tests/dltest/example",
            src_dir: "$SRCROOT/testing/test-cases/example.dtest",
            sudo_cmd: "sudo",
        }
    }

    #[rstest]
    #[case("$BUILD_DIR/out", &[("BUILD_DIR", "/b")], "/b/out")]
    #[case("${BUILD_DIR}/out", &[("BUILD_DIR", "/b")], "/b/out")]
    #[case("$UNKNOWN stays", &[("BUILD_DIR", "/b")], "$UNKNOWN stays")]
    #[case("${UNKNOWN} stays", &[], "${UNKNOWN} stays")]
    #[case("cost: $$5", &[], "cost: $5")]
    #[case("trailing $", &[], "trailing $")]
    fn substitution_cases(
        #[case] input: &str,
        #[case] table: &[(&str, &str)],
        #[case] expected: &str,
    ) {
        assert_eq!(substitute(input, table), expected);
    }

    #[rstest]
    fn directives_are_found_anywhere_in_a_line() {
        assert_eq!(
            parse_line("// BUILD:  $CC main.c -o $BUILD_DIR/main.exe"),
            Some(Directive::Build("$CC main.c -o $BUILD_DIR/main.exe".into()))
        );
        assert_eq!(
            parse_line("# RUN_TIMEOUT: 120"),
            Some(Directive::RunTimeout("120".into()))
        );
        assert_eq!(parse_line("int main() { return 0; }"), None);
    }

    #[rstest]
    fn scan_substitutes_and_flags_elevation() {
        let text = "\
// BUILD: $CC main.c -o $BUILD_DIR/main.exe
// RUN: $SUDO ./main.exe
// BOOT_ARGS: alpha   beta
";
        let scan = scan_source(text, &ctx());
        assert_eq!(
            scan.build_lines,
            vec!["$CC main.c -o $SYMROOT/example/main.exe"]
        );
        assert_eq!(scan.run_lines, vec!["sudo ./main.exe"]);
        assert!(scan.as_root);
        assert_eq!(scan.boot_args.as_deref(), Some("alpha,beta"));
    }

    #[rstest]
    fn empty_sudo_prefix_is_trimmed_away() {
        let context = ScanContext {
            sudo_cmd: "",
            ..ctx()
        };
        let scan = scan_source("// RUN: $SUDO ./main.exe\n", &context);
        assert_eq!(scan.run_lines, vec!["./main.exe"]);
        assert!(scan.as_root);
    }

    #[rstest]
    fn mismatched_build_only_drops_the_rest_of_the_file() {
        let text = "\
// RUN: ./early.exe
// BUILD_ONLY: iOS
// BUILD: $CC late.c -o $BUILD_DIR/late.exe
// RUN: ./late.exe
";
        let scan = scan_source(text, &ctx());
        assert_eq!(scan.run_lines, vec!["./early.exe"]);
        assert!(scan.build_lines.is_empty());
    }

    #[rstest]
    fn matching_build_only_keeps_scanning() {
        let text = "\
// BUILD_ONLY: MacOSX
// BUILD: $CC main.c -o $BUILD_DIR/main.exe
// RUN: ./main.exe
";
        let scan = scan_source(text, &ctx());
        assert_eq!(scan.build_lines.len(), 1);
        assert_eq!(scan.run_lines.len(), 1);
    }

    #[rstest]
    fn last_min_os_override_wins() {
        let text = "\
// BUILD_MIN_OS: 10.12
// BUILD_MIN_OS: 10.14
";
        let scan = scan_source(text, &ctx());
        assert_eq!(scan.min_os.as_deref(), Some("-mmacosx-version-min=10.14"));
    }
}
