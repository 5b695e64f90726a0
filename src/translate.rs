//! Build-line translation.
//!
//! Each build line is a tokenized command template beginning with a command
//! marker (`$CC`, `$CP`, `$SYMLINK`, ...). This module expands one test's
//! build lines into graph elements: compile and link targets, copy and
//! symlink targets, install targets, and the dependency edges between them.
//! The dispatch is a closed enumeration; an unrecognized marker aborts the
//! whole run rather than guessing.

use crate::ninja::{GraphError, NinjaFile};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Install-image prefix for every packaged test artifact.
pub const INSTALL_PREFIX: &str = "$INSTALL_DIR/tests/dltest";

/// The support archive force-loaded into every main executable.
pub const TEST_SUPPORT_ARCHIVE: &str = "$BUILT_PRODUCTS_DIR/libtest_support.a";

/// Directory holding content-addressed object files.
pub const OBJECTS_DIR: &str = "$OBJROOT/tests.build/objects";

/// Prefix stripped from built outputs to derive their install path.
const BUILD_ROOT_PREFIX: &str = "$SYMROOT/";

/// Linker flags that consume exactly one following token.
const PAIRED_LINKER_FLAGS: &[&str] = &[
    "-install_name",
    "-framework",
    "-rpath",
    "-compatibility_version",
    "-sub_library",
    "-undefined",
    "-current_version",
];

/// Extensions recognized as compilable sources.
const SOURCE_EXTENSIONS: &[&str] = &[".s", ".c", ".cpp", ".cxx", ".m", ".mm"];

/// Errors raised while translating build lines. All are fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranslateError {
    /// The first token of a build line named no known command family.
    #[error("unknown build command: {0}")]
    UnknownCommand(String),
    /// A command or flag was missing its following argument.
    #[error("{command} is missing its argument")]
    MissingArgument {
        /// The command or flag short of an argument.
        command: String,
    },
    /// A compile line carried no `-o` output.
    #[error("compile line has no -o output")]
    MissingOutput,
    /// Graph construction failed underneath the translation.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// The compiler family driving a compile line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// C compiler.
    Cc,
    /// C++ compiler.
    Cxx,
}

impl Tool {
    /// Rule-name stem for this tool (`cc` or `cxx`).
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Cc => "cc",
            Self::Cxx => "cxx",
        }
    }
}

/// The closed set of recognized build-line command families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// `$DTRACE` header generation.
    Dtrace,
    /// `$CP` file copy into the test build directory.
    Copy,
    /// `$SYMLINK` link creation.
    Symlink,
    /// `$STRIP` post-link augmentation of an existing target.
    Strip,
    /// `$SKIP_INSTALL` removal of a generated install target.
    SkipInstall,
    /// `$ENV_VARS_ENABLE` entitlement for loader environment variables.
    EnvVarsEnable,
    /// `$TASK_FOR_PID_ENABLE` entitlement for task inspection.
    TaskForPidEnable,
    /// `$CC` / `$CXX` compiler invocation.
    Compile(Tool),
}

impl CommandKind {
    /// Resolve a build line's first token to a command family.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "$DTRACE" => Some(Self::Dtrace),
            "$CP" => Some(Self::Copy),
            "$SYMLINK" => Some(Self::Symlink),
            "$STRIP" => Some(Self::Strip),
            "$SKIP_INSTALL" => Some(Self::SkipInstall),
            "$ENV_VARS_ENABLE" => Some(Self::EnvVarsEnable),
            "$TASK_FOR_PID_ENABLE" => Some(Self::TaskForPidEnable),
            "$CC" => Some(Self::Compile(Tool::Cc)),
            "$CXX" => Some(Self::Compile(Tool::Cxx)),
            _ => None,
        }
    }
}

/// Per-test context threaded through translation.
#[derive(Debug, Clone, Copy)]
pub struct TranslateContext<'a> {
    /// Test name; also the per-test phony target's output.
    pub test_name: &'a str,
    /// Minimum-OS override from `BUILD_MIN_OS`, already formatted.
    pub min_os: Option<&'a str>,
    /// Source directory of the test case (`$SRCROOT`-relative template).
    pub src_dir: &'a str,
    /// Build destination directory (`$SYMROOT`-relative template).
    pub dst_dir: &'a str,
    /// Whether the target platform family is macOS.
    pub macos_build: bool,
}

/// Translate one test's build lines into graph elements.
///
/// Creates the per-test phony pair (`<test>` and `install-<test>`), wires
/// them into the suite-wide `all` and `install` phonies, then dispatches
/// each line on its command family.
///
/// # Errors
///
/// Returns a [`TranslateError`] on an unknown command family, a missing
/// argument, or a graph violation; the caller is expected to abort.
pub fn process_build_lines(
    ninja: &mut NinjaFile,
    build_lines: &[String],
    ctx: &TranslateContext<'_>,
) -> Result<(), TranslateError> {
    let install_phony = format!("install-{}", ctx.test_name);
    ninja.new_target("phony", install_phony.clone())?;
    ninja.new_target("phony", ctx.test_name)?;
    ninja.target_mut("all")?.add_input(ctx.test_name);
    ninja.target_mut("install")?.add_input(install_phony.as_str());

    for line in build_lines {
        let args: Vec<&str> = line.split_whitespace().collect();
        let Some(first) = args.first().copied() else {
            continue;
        };
        match CommandKind::from_token(first) {
            Some(CommandKind::Dtrace) => translate_dtrace(ninja, &args, ctx)?,
            Some(CommandKind::Copy) => translate_copy(ninja, &args, ctx, &install_phony)?,
            Some(CommandKind::Symlink) => translate_symlink(ninja, &args, ctx, &install_phony)?,
            Some(CommandKind::Strip) => translate_strip(ninja, &args)?,
            Some(CommandKind::SkipInstall) => translate_skip_install(ninja, &args, &install_phony)?,
            Some(CommandKind::EnvVarsEnable) => {
                translate_entitlement(ninja, &args, ctx, "get_task_allow_entitlement.plist")?;
            }
            Some(CommandKind::TaskForPidEnable) => {
                translate_entitlement(ninja, &args, ctx, "task_for_pid_entitlement.plist")?;
            }
            Some(CommandKind::Compile(tool)) => {
                translate_compile(ninja, &args, tool, ctx, &install_phony)?;
            }
            None => return Err(TranslateError::UnknownCommand(first.to_owned())),
        }
    }
    Ok(())
}

/// Derive the install path for a built output by re-rooting it under the
/// install prefix.
#[must_use]
pub fn install_path(output: &str) -> String {
    let relative = output.strip_prefix(BUILD_ROOT_PREFIX).unwrap_or(output);
    format!("{INSTALL_PREFIX}/{relative}")
}

/// Content-derived object-file base name.
///
/// The digest covers the link output, the source path, the tool, and the
/// sorted compiler flags, so two sources compiled with different flags never
/// collide and identical inputs name the same object.
#[must_use]
pub fn object_hash(link_output: &str, source: &str, tool: &str, cflags: &[String]) -> String {
    let mut sorted: Vec<&str> = cflags.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    let mut hasher = Sha256::new();
    hasher.update(link_output.as_bytes());
    hasher.update(source.as_bytes());
    hasher.update(tool.as_bytes());
    hasher.update(sorted.concat().as_bytes());
    format!("{:x}", hasher.finalize())
}

fn arg_at<'a>(args: &[&'a str], idx: usize) -> Result<&'a str, TranslateError> {
    args.get(idx).copied().ok_or_else(|| TranslateError::MissingArgument {
        command: args.first().copied().unwrap_or_default().to_owned(),
    })
}

fn owned_arg_at(args: &[String], idx: usize, command: &str) -> Result<String, TranslateError> {
    args.get(idx).cloned().ok_or_else(|| TranslateError::MissingArgument {
        command: command.to_owned(),
    })
}

fn translate_dtrace(
    ninja: &mut NinjaFile,
    args: &[&str],
    ctx: &TranslateContext<'_>,
) -> Result<(), TranslateError> {
    let mut output = None;
    for (idx, arg) in args.iter().enumerate() {
        if *arg == "-o" {
            output = Some(arg_at(args, idx + 1)?);
        }
    }
    let output = output.ok_or(TranslateError::MissingOutput)?;
    let mut inputs = Vec::new();
    for (idx, arg) in args.iter().enumerate() {
        if *arg == "-s" {
            inputs.push(format!("{}/{}", ctx.src_dir, arg_at(args, idx + 1)?));
        }
    }
    let target = ninja.new_target("dtrace", output)?;
    for input in inputs {
        target.add_input(input);
    }
    Ok(())
}

fn translate_copy(
    ninja: &mut NinjaFile,
    args: &[&str],
    ctx: &TranslateContext<'_>,
    install_phony: &str,
) -> Result<(), TranslateError> {
    let source = arg_at(args, 1)?;
    let dest = arg_at(args, 2)?;
    let target = ninja.new_target("cp", dest)?;
    target.add_input(format!("{}/{}", ctx.src_dir, source));
    ninja.target_mut(ctx.test_name)?.add_input(dest);
    let installed = install_path(dest);
    ninja.new_target("install", installed.clone())?.add_input(dest);
    ninja.target_mut(install_phony)?.add_input(installed);
    Ok(())
}

fn translate_symlink(
    ninja: &mut NinjaFile,
    args: &[&str],
    ctx: &TranslateContext<'_>,
    install_phony: &str,
) -> Result<(), TranslateError> {
    let source = arg_at(args, 1)?;
    let dest = arg_at(args, 2)?;
    let target = ninja.new_target("symlink", dest)?;
    target.add_variable("source", source);
    ninja.target_mut(ctx.test_name)?.add_input(dest);
    let installed = install_path(dest);
    let install_target = ninja.new_target("symlink", installed.clone())?;
    install_target.add_variable("source", source);
    ninja.target_mut(install_phony)?.add_input(installed);
    Ok(())
}

fn translate_strip(ninja: &mut NinjaFile, args: &[&str]) -> Result<(), TranslateError> {
    let name = arg_at(args, 1)?;
    let target = ninja.target_mut(name)?;
    let extra = format!("&& strip {}", target.output());
    target.add_variable("extraCmds", extra);
    Ok(())
}

fn translate_skip_install(
    ninja: &mut NinjaFile,
    args: &[&str],
    install_phony: &str,
) -> Result<(), TranslateError> {
    let built = arg_at(args, 1)?;
    let installed = install_path(built);
    ninja.delete_target(&installed)?;
    ninja.target_mut(install_phony)?.remove_input(&installed);
    Ok(())
}

fn translate_entitlement(
    ninja: &mut NinjaFile,
    args: &[&str],
    ctx: &TranslateContext<'_>,
    entitlement: &str,
) -> Result<(), TranslateError> {
    if ctx.macos_build {
        return Ok(());
    }
    let name = arg_at(args, 1)?;
    let target = ninja.target_mut(name)?;
    target.add_variable(
        "entitlements",
        format!("--entitlements $SRCROOT/testing/{entitlement}"),
    );
    Ok(())
}

fn translate_compile(
    ninja: &mut NinjaFile,
    args: &[&str],
    tool: Tool,
    ctx: &TranslateContext<'_>,
    install_phony: &str,
) -> Result<(), TranslateError> {
    let tool_name = tool.name();
    // Snapshot before this line adds anything: only previously declared
    // targets are resolvable as dependency references.
    let known = ninja.output_names();
    let args: Vec<String> = args
        .iter()
        .skip(1)
        .map(|arg| arg.replace('"', "\\\""))
        .collect();

    // First pass: the link target must exist before forward references.
    let mut link_output = None;
    for (idx, arg) in args.iter().enumerate() {
        if arg == "-o" {
            link_output = Some(owned_arg_at(&args, idx + 1, "-o")?);
            break;
        }
    }
    let link_output = link_output.ok_or(TranslateError::MissingOutput)?;
    ninja
        .new_target(format!("{tool_name}-link"), link_output.clone())?
        .add_dependency(TEST_SUPPORT_ARCHIVE);
    ninja.target_mut(ctx.test_name)?.add_input(link_output.as_str());

    // Second pass: classify every remaining token.
    let mut sources: Vec<String> = Vec::new();
    let mut cflags: Vec<String> = Vec::new();
    let mut ldflags: Vec<String> = Vec::new();
    let mut dependencies: Vec<String> = Vec::new();
    let mut link_inputs: Vec<String> = Vec::new();
    let mut link_deps: Vec<String> = Vec::new();
    let mut is_main_executable = true;
    let mut skip = 0usize;
    for (idx, arg) in args.iter().enumerate() {
        if skip > 0 {
            skip -= 1;
            continue;
        }
        if arg == "-o" {
            skip = 1;
        } else if arg == "$DEPENDS_ON" {
            skip = 1;
            dependencies.push(owned_arg_at(&args, idx + 1, "$DEPENDS_ON")?);
        } else if arg == "-arch" {
            skip = 1;
            let next = owned_arg_at(&args, idx + 1, "-arch")?;
            ldflags.push(arg.clone());
            ldflags.push(next.clone());
            cflags.push(arg.clone());
            cflags.push(next);
        } else if PAIRED_LINKER_FLAGS.contains(&arg.as_str()) {
            skip = 1;
            let next = owned_arg_at(&args, idx + 1, arg)?;
            ldflags.push(arg.clone());
            ldflags.push(next);
        } else if arg == "-sectcreate" {
            skip = 3;
            ldflags.push(arg.clone());
            for offset in 1..=3 {
                ldflags.push(owned_arg_at(&args, idx + offset, "-sectcreate")?);
            }
        } else if arg == "-nostdlib" || arg == "-flat_namespace" || arg.starts_with("-L") {
            ldflags.push(arg.clone());
        } else if arg == "-dynamiclib" || arg == "-bundle" {
            ldflags.push(arg.clone());
            is_main_executable = false;
        } else if SOURCE_EXTENSIONS.iter().any(|ext| arg.ends_with(ext)) {
            sources.push(format!("{}/{}", ctx.src_dir, arg));
        } else if known.contains(arg) {
            link_inputs.push(arg.clone());
        } else if arg.starts_with("-Wl,") {
            for part in arg.split(',') {
                if known.iter().any(|name| name == part) {
                    link_deps.push(part.to_owned());
                }
            }
            ldflags.push(arg.clone());
        } else if let Some(lib) = arg.strip_prefix("-weak-l") {
            library_reference(&known, ctx, lib, arg, &mut ldflags, &mut link_deps);
        } else if let Some(lib) = arg.strip_prefix("-upward-l") {
            library_reference(&known, ctx, lib, arg, &mut ldflags, &mut link_deps);
        } else if let Some(lib) = arg.strip_prefix("-l") {
            library_reference(&known, ctx, lib, arg, &mut ldflags, &mut link_deps);
        } else {
            cflags.push(arg.clone());
        }
    }

    if is_main_executable {
        ldflags.push(format!("-force_load {TEST_SUPPORT_ARCHIVE}"));
    }

    for source in &sources {
        let hash = object_hash(&link_output, source, tool_name, &cflags);
        let object = format!("{OBJECTS_DIR}/{hash}.o");
        let target = ninja.new_target(tool_name, object.clone())?;
        target.add_input(source.clone());
        for dependency in &dependencies {
            target.add_dependency(dependency.clone());
        }
        if !cflags.is_empty() {
            target.add_variable("cflags", cflags.join(" "));
        }
        if let Some(min_os) = ctx.min_os {
            target.add_variable("minOS", min_os);
        }
        link_inputs.push(object);
    }

    let link = ninja.target_mut(&link_output)?;
    for input in link_inputs {
        link.add_input(input);
    }
    for dependency in link_deps {
        link.add_dependency(dependency);
    }
    if !ldflags.is_empty() {
        link.add_variable("ldflags", ldflags.join(" "));
    }
    if let Some(min_os) = ctx.min_os {
        link.add_variable("minOS", min_os);
    }

    let installed = install_path(&link_output);
    ninja
        .new_target("install", installed.clone())?
        .add_input(link_output.as_str());
    ninja.target_mut(install_phony)?.add_input(installed);
    Ok(())
}

fn library_reference(
    known: &[String],
    ctx: &TranslateContext<'_>,
    lib: &str,
    flag: &str,
    ldflags: &mut Vec<String>,
    link_deps: &mut Vec<String>,
) {
    let candidate = format!("{}/lib{}.dylib", ctx.dst_dir, lib);
    if known.iter().any(|name| name == &candidate) {
        link_deps.push(candidate);
    }
    ldflags.push(flag.to_owned());
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn seeded() -> NinjaFile {
        let mut ninja = NinjaFile::new();
        ninja.new_target("phony", "all").expect("all");
        ninja.new_target("phony", "install").expect("install");
        ninja
    }

    /// Rejoin continuation lines so asserts can match logical lines.
    fn unwrapped(text: &str) -> String {
        text.replace("$\n      ", "").replace("$\n  ", "")
    }

    fn ctx<'a>(min_os: Option<&'a str>) -> TranslateContext<'a> {
        TranslateContext {
            test_name: "example",
            min_os,
            src_dir: "$SRCROOT/testing/test-cases/example.dtest",
            dst_dir: "$SYMROOT/example",
            macos_build: true,
        }
    }

    #[rstest]
    fn unknown_command_family_is_fatal() {
        let mut ninja = seeded();
        let lines = vec!["$FROBNICATE a b".to_owned()];
        let err = process_build_lines(&mut ninja, &lines, &ctx(None)).expect_err("unknown");
        assert_eq!(err, TranslateError::UnknownCommand("$FROBNICATE".into()));
    }

    #[rstest]
    fn object_hash_is_pure_and_flag_sensitive() {
        let flags_a = vec!["-DX".to_owned(), "-Os".to_owned()];
        let flags_b = vec!["-Os".to_owned(), "-DX".to_owned()];
        let flags_c = vec!["-DY".to_owned(), "-Os".to_owned()];
        let a = object_hash("$SYMROOT/t/a.exe", "src/a.c", "cc", &flags_a);
        let b = object_hash("$SYMROOT/t/a.exe", "src/a.c", "cc", &flags_b);
        let c = object_hash("$SYMROOT/t/a.exe", "src/a.c", "cc", &flags_c);
        assert_eq!(a, b, "flag order must not change the identity");
        assert_ne!(a, c, "different flags must not collide");
        assert_ne!(
            object_hash("$SYMROOT/t/a.exe", "src/a.c", "cc", &flags_a),
            object_hash("$SYMROOT/t/a.exe", "src/a.c", "cxx", &flags_a),
        );
    }

    #[rstest]
    fn compile_line_builds_link_object_and_install_targets() {
        let mut ninja = seeded();
        let lines = vec![
            "$CC -o $SYMROOT/example/main.exe -framework Foo -lbar main.c".to_owned(),
        ];
        process_build_lines(&mut ninja, &lines, &ctx(Some("-mmacosx-version-min=10.14")))
            .expect("translate");

        let rendered = ninja.render();
        assert!(rendered.contains("build $SYMROOT/example/main.exe: cc-link"));
        assert!(rendered.contains("$OBJROOT/tests.build/objects/"));
        assert!(rendered.contains(
            "build $INSTALL_DIR/tests/dltest/example/main.exe: install $SYMROOT/example/main.exe"
        ));
        assert!(rendered.contains("-framework Foo"));
        assert!(rendered.contains("-lbar"));
        // Main executables force-load the shared support archive.
        assert!(rendered.contains("-force_load $BUILT_PRODUCTS_DIR/libtest_support.a"));
        assert!(rendered.contains("minOS = -mmacosx-version-min=10.14"));
    }

    #[rstest]
    fn library_flag_resolves_to_dependency_when_target_exists() {
        let mut ninja = seeded();
        let lines = vec![
            "$CC -dynamiclib -o $SYMROOT/example/libbar.dylib bar.c".to_owned(),
            "$CC -o $SYMROOT/example/main.exe -lbar main.c".to_owned(),
        ];
        process_build_lines(&mut ninja, &lines, &ctx(None)).expect("translate");
        let rendered = unwrapped(&ninja.render());
        let main_line = rendered
            .lines()
            .find(|line| line.starts_with("build $SYMROOT/example/main.exe"))
            .expect("main link line");
        assert!(
            main_line.contains("| $BUILT_PRODUCTS_DIR/libtest_support.a $SYMROOT/example/libbar.dylib"),
            "unexpected link line: {main_line}"
        );
    }

    #[rstest]
    fn unresolved_library_flag_stays_a_flag_only() {
        let mut ninja = seeded();
        let lines = vec!["$CC -o $SYMROOT/example/main.exe -lbar main.c".to_owned()];
        process_build_lines(&mut ninja, &lines, &ctx(None)).expect("translate");
        let rendered = ninja.render();
        assert!(rendered.contains("-lbar"));
        assert!(!rendered.contains("libbar.dylib"));
    }

    #[rstest]
    fn dynamiclib_is_not_force_loaded() {
        let mut ninja = seeded();
        let lines = vec!["$CC -dynamiclib -o $SYMROOT/example/libx.dylib x.c".to_owned()];
        process_build_lines(&mut ninja, &lines, &ctx(None)).expect("translate");
        assert!(!ninja.render().contains("-force_load"));
    }

    #[rstest]
    fn linker_passthrough_components_become_dependencies() {
        let mut ninja = seeded();
        let lines = vec![
            "$CC -dynamiclib -o $SYMROOT/example/liba.dylib a.c".to_owned(),
            "$CC -o $SYMROOT/example/main.exe -Wl,-reexport,$SYMROOT/example/liba.dylib main.c"
                .to_owned(),
        ];
        process_build_lines(&mut ninja, &lines, &ctx(None)).expect("translate");
        let rendered = unwrapped(&ninja.render());
        let main_line = rendered
            .lines()
            .find(|line| line.starts_with("build $SYMROOT/example/main.exe"))
            .expect("main link line");
        assert!(main_line.contains("$SYMROOT/example/liba.dylib"));
        assert!(rendered.contains("-Wl,-reexport,$SYMROOT/example/liba.dylib"));
    }

    #[rstest]
    fn strip_augments_an_existing_target() {
        let mut ninja = seeded();
        let lines = vec![
            "$CC -o $SYMROOT/example/main.exe main.c".to_owned(),
            "$STRIP $SYMROOT/example/main.exe".to_owned(),
        ];
        process_build_lines(&mut ninja, &lines, &ctx(None)).expect("translate");
        assert!(ninja
            .render()
            .contains("extraCmds = && strip $SYMROOT/example/main.exe"));
    }

    #[rstest]
    fn strip_of_unknown_target_is_fatal() {
        let mut ninja = seeded();
        let lines = vec!["$STRIP $SYMROOT/example/ghost.exe".to_owned()];
        let err = process_build_lines(&mut ninja, &lines, &ctx(None)).expect_err("miss");
        assert!(matches!(
            err,
            TranslateError::Graph(GraphError::TargetNotFound { .. })
        ));
    }

    #[rstest]
    fn copy_creates_build_and_install_targets() {
        let mut ninja = seeded();
        let lines = vec!["$CP data.txt $SYMROOT/example/data.txt".to_owned()];
        process_build_lines(&mut ninja, &lines, &ctx(None)).expect("translate");
        let rendered = ninja.render();
        assert!(rendered.contains(
            "build $SYMROOT/example/data.txt: cp $SRCROOT/testing/test-cases/example.dtest/data.txt"
        ));
        assert!(rendered.contains(
            "build $INSTALL_DIR/tests/dltest/example/data.txt: install $SYMROOT/example/data.txt"
        ));
    }

    #[rstest]
    fn skip_install_removes_the_install_target() {
        let mut ninja = seeded();
        let lines = vec![
            "$CP data.txt $SYMROOT/example/data.txt".to_owned(),
            "$SKIP_INSTALL $SYMROOT/example/data.txt".to_owned(),
        ];
        process_build_lines(&mut ninja, &lines, &ctx(None)).expect("translate");
        assert!(!ninja.has_target("$INSTALL_DIR/tests/dltest/example/data.txt"));
    }

    #[rstest]
    fn missing_paired_flag_argument_is_fatal() {
        let mut ninja = seeded();
        let lines = vec!["$CC -o $SYMROOT/example/main.exe main.c -framework".to_owned()];
        let err = process_build_lines(&mut ninja, &lines, &ctx(None)).expect_err("truncated");
        assert_eq!(
            err,
            TranslateError::MissingArgument {
                command: "-framework".into()
            }
        );
    }

    #[rstest]
    fn compile_without_output_is_fatal() {
        let mut ninja = seeded();
        let lines = vec!["$CC main.c".to_owned()];
        let err = process_build_lines(&mut ninja, &lines, &ctx(None)).expect_err("no -o");
        assert_eq!(err, TranslateError::MissingOutput);
    }

    #[rstest]
    fn entitlement_applies_only_off_macos() {
        let mut ninja = seeded();
        let lines = vec![
            "$CC -o $SYMROOT/example/main.exe main.c".to_owned(),
            "$ENV_VARS_ENABLE $SYMROOT/example/main.exe".to_owned(),
        ];
        let context = TranslateContext {
            macos_build: false,
            ..ctx(None)
        };
        process_build_lines(&mut ninja, &lines, &context).expect("translate");
        assert!(ninja
            .render()
            .contains("entitlements = --entitlements $SRCROOT/testing/get_task_allow_entitlement.plist"));

        let mut macos = seeded();
        process_build_lines(&mut macos, &lines, &ctx(None)).expect("translate");
        assert!(!macos.render().contains("entitlements ="));
    }
}
