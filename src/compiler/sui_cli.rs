use super::{CompiledPackage, PackageCompiler};
use crate::codegen::PackageSource;
use crate::error::BuildError;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, warn};

/// Held for the whole build: the working directory and the package
/// sources are process-wide.
static BUILD_LOCK: Mutex<()> = Mutex::new(());

/// Restores the previous working directory when dropped.
struct WorkingDirGuard {
    previous: PathBuf,
}

impl WorkingDirGuard {
    fn enter(dir: &Path) -> Result<Self, BuildError> {
        let previous = env::current_dir()?;
        env::set_current_dir(dir)?;
        Ok(WorkingDirGuard { previous })
    }
}

impl Drop for WorkingDirGuard {
    fn drop(&mut self) {
        if let Err(e) = env::set_current_dir(&self.previous) {
            warn!(
                dir = %self.previous.display(),
                error = %e,
                "Failed to restore working directory"
            );
        }
    }
}

/// Builds packages with `sui move build`.
///
/// Each package lives at `<packages_dir>/<package>` with its own
/// `Move.toml`; the rendered module replaces `sources/<module>.move`.
#[derive(Debug, Clone)]
pub struct SuiCliCompiler {
    packages_dir: PathBuf,
    sui_bin: PathBuf,
}

impl SuiCliCompiler {
    pub fn new(packages_dir: impl Into<PathBuf>) -> Self {
        SuiCliCompiler {
            packages_dir: packages_dir.into(),
            sui_bin: PathBuf::from("sui"),
        }
    }

    pub fn with_sui_bin(mut self, sui_bin: impl Into<PathBuf>) -> Self {
        self.sui_bin = sui_bin.into();
        self
    }

    fn package_dir(&self, source: &PackageSource) -> Result<PathBuf, BuildError> {
        // absolute, so the path stays valid after changing directory
        let dir = self.packages_dir.join(source.package);
        Ok(if dir.is_absolute() {
            dir
        } else {
            env::current_dir()?.join(dir)
        })
    }

    /// A bare name is left for `PATH` lookup; any other relative path is
    /// anchored before changing directory.
    fn sui_bin(&self) -> Result<PathBuf, BuildError> {
        if self.sui_bin.is_absolute() || self.sui_bin.components().count() == 1 {
            return Ok(self.sui_bin.clone());
        }
        Ok(env::current_dir()?.join(&self.sui_bin))
    }

    fn run(sui_bin: &Path, args: &[&str]) -> Result<Output, BuildError> {
        let command = format!("{} {}", sui_bin.display(), args.join(" "));
        let output = Command::new(sui_bin).args(args).output()?;
        if !output.status.success() {
            return Err(BuildError::CommandFailed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

impl PackageCompiler for SuiCliCompiler {
    fn compile(&self, source: &PackageSource) -> Result<CompiledPackage, BuildError> {
        let _lock = BUILD_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let package_dir = self.package_dir(source)?;
        let sui_bin = self.sui_bin()?;
        let sources_dir = package_dir.join("sources");
        fs::create_dir_all(&sources_dir)?;
        let module_path = sources_dir.join(format!("{}.move", source.module));
        fs::write(&module_path, &source.source)?;
        info!(path = %module_path.display(), "Contract source written");

        let _cwd = WorkingDirGuard::enter(&package_dir)?;

        let diagnostics = Self::run(
            &sui_bin,
            &["move", "build", "--skip-fetch-latest-git-deps"],
        )?;
        debug!(
            stdout = %String::from_utf8_lossy(&diagnostics.stdout),
            stderr = %String::from_utf8_lossy(&diagnostics.stderr),
            "Build output"
        );

        let dump = Self::run(
            &sui_bin,
            &[
                "move",
                "build",
                "--dump-bytecode-as-base64",
                "--skip-fetch-latest-git-deps",
            ],
        )?;
        CompiledPackage::from_dump(&String::from_utf8_lossy(&dump.stdout))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::codegen::{POOL_TOKEN_FACTORY_PACKAGE, TOKEN_FACTORY_MODULE};
    use std::os::unix::fs::PermissionsExt;

    fn stub(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn source() -> PackageSource {
        PackageSource {
            package: POOL_TOKEN_FACTORY_PACKAGE,
            module: TOKEN_FACTORY_MODULE,
            source: "module token_factory::pool_token_factory {}\n".to_string(),
        }
    }

    const DUMP: &str = r#"{"modules":["oRzrCw=="],"dependencies":["0x1","0x2"]}"#;

    fn ok_script() -> String {
        format!(
            r#"case "$*" in
  *dump-bytecode-as-base64*) echo '{}' ;;
  *) echo "BUILDING token_factory" ;;
esac"#,
            DUMP
        )
    }

    fn check_build(root: &Path, bin: &Path, before: &Path) {
        let ok = stub(bin, "sui-ok", &ok_script());
        let compiler = SuiCliCompiler::new(root.join("contracts")).with_sui_bin(&ok);
        let package = compiler.compile(&source()).unwrap();
        assert_eq!(package.modules, vec![vec![0xa1, 0x1c, 0xeb, 0x0b]]);
        assert_eq!(package.dependencies.len(), 2);
        let written =
            fs::read_to_string(root.join("contracts/token_pool_factory/sources/token_factory.move"))
                .unwrap();
        assert_eq!(written, source().source);
        assert_eq!(env::current_dir().unwrap(), before);
    }

    fn check_failures(root: &Path, bin: &Path, before: &Path) {
        let failing = stub(bin, "sui-fail", "echo 'error[E01002]: unexpected token' >&2\nexit 1");
        let compiler = SuiCliCompiler::new(root.join("contracts")).with_sui_bin(&failing);
        match compiler.compile(&source()) {
            Err(BuildError::CommandFailed { stderr, .. }) => {
                assert_eq!(stderr, "error[E01002]: unexpected token")
            }
            other => panic!("expected command failure, got {:?}", other),
        }
        assert_eq!(env::current_dir().unwrap(), before);

        let garbage = stub(bin, "sui-garbage", "echo 'not json'");
        let compiler = SuiCliCompiler::new(root.join("contracts")).with_sui_bin(&garbage);
        assert!(matches!(
            compiler.compile(&source()),
            Err(BuildError::MalformedOutput(_))
        ));
        assert_eq!(env::current_dir().unwrap(), before);
    }

    /// A relative binary path is resolved against the caller's directory,
    /// not the package directory the build runs in.
    fn check_relative_sui_bin(root: &Path, bin: &Path, before: &Path) {
        let ok = stub(bin, "sui-relative", &ok_script());
        let ups: PathBuf = before.components().skip(1).map(|_| "..").collect();
        let relative = ups.join(ok.strip_prefix("/").unwrap());
        assert!(relative.is_relative());
        let compiler = SuiCliCompiler::new(root.join("relative")).with_sui_bin(&relative);
        assert_eq!(compiler.compile(&source()).unwrap().modules.len(), 1);
        assert_eq!(env::current_dir().unwrap(), before);
    }

    /// Each invocation logs entry and exit; serialized builds never
    /// interleave and each build's two invocations stay adjacent.
    fn check_concurrent_builds(root: &Path, bin: &Path, before: &Path) {
        let markers = root.join("markers.log");
        let slow = stub(
            bin,
            "sui-slow",
            &format!(
                r#"dir=$(pwd -P)
echo "enter $dir" >> '{markers}'
sleep 0.05
case "$*" in
  *dump-bytecode-as-base64*) echo '{dump}' ;;
esac
echo "exit $dir" >> '{markers}'"#,
                markers = markers.display(),
                dump = DUMP
            ),
        );

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|i| {
                    let compiler = SuiCliCompiler::new(root.join(format!("concurrent-{}", i)))
                        .with_sui_bin(&slow);
                    scope.spawn(move || compiler.compile(&source()))
                })
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap().unwrap().modules.len(), 1);
            }
        });
        assert_eq!(env::current_dir().unwrap(), before);

        let log = fs::read_to_string(&markers).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 16);
        let mut dirs = Vec::new();
        for build in lines.chunks(4) {
            let dir = build[0].strip_prefix("enter ").unwrap();
            assert_eq!(
                build,
                [
                    format!("enter {}", dir),
                    format!("exit {}", dir),
                    format!("enter {}", dir),
                    format!("exit {}", dir),
                ]
            );
            dirs.push(dir);
        }
        dirs.sort();
        dirs.dedup();
        assert_eq!(dirs.len(), 4);
    }

    // one test drives every scenario: the working directory is process-wide
    #[test]
    fn test_sui_cli_compiler() {
        let root = tempfile::tempdir().unwrap();
        let bin = root.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        let before = env::current_dir().unwrap();

        check_build(root.path(), &bin, &before);
        check_failures(root.path(), &bin, &before);
        check_relative_sui_bin(root.path(), &bin, &before);
        check_concurrent_builds(root.path(), &bin, &before);
    }
}
