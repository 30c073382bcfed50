//! Native executables as benchmark variants.
//!
//! An external variant names a build target. The target is turned into an
//! executable path once per process through an [`ExecutableResolver`] and
//! the [`ExecutableCache`]; the executable is then invoked once per case
//! repetition and prints its own elapsed nanoseconds on stdout.
//!
//! Only [`CargoBenchResolver`] knows about the build tool's output format.

use crate::error::{BuildResolutionError, ExternalProcessError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

/// Position of the artifact event counted from the end of the build event
/// stream. The last event is `build-finished`, the one before it is the
/// artifact of the requested target.
pub const ARTIFACT_OFFSET_FROM_END: usize = 2;

/// Field of the artifact event holding the executable path.
pub const ARTIFACT_PATH_FIELD: &str = "executable";

const POLL_INTERVAL: Duration = Duration::from_millis(1);

// ============================================================================
// Resolution
// ============================================================================

/// Turns a build target identifier into a runnable executable.
pub trait ExecutableResolver: Send + Sync {
    fn resolve(&self, target: &str) -> Result<PathBuf, BuildResolutionError>;
}

/// Builds `harness = false` bench targets with cargo in release mode.
#[derive(Clone, Debug)]
pub struct CargoBenchResolver {
    cargo: PathBuf,
    manifest_path: Option<PathBuf>,
}

impl CargoBenchResolver {
    /// Use `$CARGO` when running under cargo, `cargo` from `PATH` otherwise.
    pub fn new() -> Self {
        let cargo = std::env::var_os("CARGO")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("cargo"));
        Self {
            cargo,
            manifest_path: None,
        }
    }

    /// Build targets of the package at `manifest_path` instead of the
    /// package in the current directory.
    pub fn with_manifest(mut self, manifest_path: impl Into<PathBuf>) -> Self {
        self.manifest_path = Some(manifest_path.into());
        self
    }
}

impl Default for CargoBenchResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CargoBenchResolver {
    fn build_command(&self, target: &str) -> Command {
        let mut cmd = Command::new(&self.cargo);
        cmd.args(["build", "--release", "--bench", target, "--message-format=json"]);
        if let Some(manifest) = &self.manifest_path {
            cmd.arg("--manifest-path").arg(manifest);
        }
        cmd
    }
}

impl ExecutableResolver for CargoBenchResolver {
    fn resolve(&self, target: &str) -> Result<PathBuf, BuildResolutionError> {
        let mut cmd = self.build_command(target);

        log::info!("building native target '{}'", target);
        let output = cmd.output().map_err(|source| BuildResolutionError::Spawn {
            target: target.to_string(),
            source,
        })?;

        if !output.status.success() {
            return Err(BuildResolutionError::BuildFailed {
                target: target.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_build_events(target, &String::from_utf8_lossy(&output.stdout))
    }
}

/// Extract the executable path from a line-delimited JSON build event
/// stream.
pub fn parse_build_events(target: &str, stream: &str) -> Result<PathBuf, BuildResolutionError> {
    let events: Vec<&str> = stream.lines().filter(|l| !l.trim().is_empty()).collect();

    let line = events
        .len()
        .checked_sub(ARTIFACT_OFFSET_FROM_END)
        .map(|idx| events[idx])
        .ok_or_else(|| BuildResolutionError::MissingArtifact {
            target: target.to_string(),
        })?;

    let event: serde_json::Value =
        serde_json::from_str(line).map_err(|source| BuildResolutionError::MalformedEvent {
            target: target.to_string(),
            source,
        })?;

    event
        .get(ARTIFACT_PATH_FIELD)
        .and_then(serde_json::Value::as_str)
        .map(PathBuf::from)
        .ok_or_else(|| BuildResolutionError::MissingArtifact {
            target: target.to_string(),
        })
}

/// Resolver over executables that already exist, keyed by target.
#[derive(Clone, Debug, Default)]
pub struct PrebuiltResolver {
    paths: HashMap<String, PathBuf>,
}

impl PrebuiltResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, target: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.paths.insert(target.into(), path.into());
        self
    }
}

impl ExecutableResolver for PrebuiltResolver {
    fn resolve(&self, target: &str) -> Result<PathBuf, BuildResolutionError> {
        self.paths
            .get(target)
            .cloned()
            .ok_or_else(|| BuildResolutionError::MissingArtifact {
                target: target.to_string(),
            })
    }
}

// ============================================================================
// Cache
// ============================================================================

/// Memoized target → executable resolutions.
///
/// Only successful resolutions are stored; a failed target is resolved
/// again on its next use. The lock is held across resolution.
#[derive(Debug, Default)]
pub struct ExecutableCache {
    resolved: Mutex<HashMap<String, PathBuf>>,
}

static GLOBAL_CACHE: OnceLock<Arc<ExecutableCache>> = OnceLock::new();

impl ExecutableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache.
    pub fn global() -> Arc<ExecutableCache> {
        Arc::clone(GLOBAL_CACHE.get_or_init(|| Arc::new(ExecutableCache::new())))
    }

    pub fn get_or_resolve(
        &self,
        target: &str,
        resolver: &dyn ExecutableResolver,
    ) -> Result<PathBuf, BuildResolutionError> {
        let mut resolved = self.resolved.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(path) = resolved.get(target) {
            return Ok(path.clone());
        }

        let path = resolver.resolve(target)?;
        log::debug!("resolved '{}' to {}", target, path.display());
        resolved.insert(target.to_string(), path.clone());
        Ok(path)
    }

    pub fn contains(&self, target: &str) -> bool {
        self.resolved
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(target)
    }
}

// ============================================================================
// Invocation
// ============================================================================

/// How case arguments are passed to a native executable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ArgEncoding {
    /// All arguments joined without separators into one token. Compatible
    /// with existing native harness executables; `12, 3` becomes `123`.
    #[default]
    Concatenated,
    /// One process argument per case argument.
    Separate,
}

impl ArgEncoding {
    pub fn encode(self, args: &[String]) -> Vec<String> {
        match self {
            ArgEncoding::Concatenated => vec![args.concat()],
            ArgEncoding::Separate => args.to_vec(),
        }
    }
}

/// Invocation settings for native executables.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExternalConfig {
    pub encoding: ArgEncoding,
    /// Kill the executable after this long. `None` waits forever.
    pub timeout: Option<Duration>,
}

/// Resolver, cache and invocation settings for external variants.
pub struct ExternalRunner {
    resolver: Box<dyn ExecutableResolver>,
    cache: Arc<ExecutableCache>,
    config: ExternalConfig,
}

impl ExternalRunner {
    /// Runner backed by the process-wide cache.
    pub fn new(resolver: impl ExecutableResolver + 'static) -> Self {
        Self {
            resolver: Box::new(resolver),
            cache: ExecutableCache::global(),
            config: ExternalConfig::default(),
        }
    }

    pub fn with_cache(mut self, cache: Arc<ExecutableCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_config(mut self, config: ExternalConfig) -> Self {
        self.config = config;
        self
    }

    pub fn resolve(&self, target: &str) -> Result<PathBuf, BuildResolutionError> {
        self.cache.get_or_resolve(target, self.resolver.as_ref())
    }

    /// Run `path` once and return the nanoseconds it reports.
    pub fn invoke(&self, path: &Path, args: &[String]) -> Result<u64, ExternalProcessError> {
        invoke(path, args, &self.config)
    }
}

impl Default for ExternalRunner {
    fn default() -> Self {
        Self::new(CargoBenchResolver::new())
    }
}

/// Run a native executable once and parse its reported elapsed nanoseconds.
pub fn invoke(path: &Path, args: &[String], config: &ExternalConfig) -> Result<u64, ExternalProcessError> {
    let mut cmd = Command::new(path);
    cmd.args(config.encoding.encode(args))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let spawn_err = |source| ExternalProcessError::Spawn {
        path: path.to_path_buf(),
        source,
    };

    let output = match config.timeout {
        None => cmd.output().map_err(spawn_err)?,
        Some(timeout) => wait_with_timeout(&mut cmd, path, timeout)?,
    };

    if !output.status.success() {
        return Err(ExternalProcessError::NonZeroExit {
            path: path.to_path_buf(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    parse_elapsed(path, &output.stdout)
}

fn wait_with_timeout(cmd: &mut Command, path: &Path, timeout: Duration) -> Result<Output, ExternalProcessError> {
    let spawn_err = |source| ExternalProcessError::Spawn {
        path: path.to_path_buf(),
        source,
    };

    let mut child = cmd.spawn().map_err(spawn_err)?;
    let deadline = Instant::now() + timeout;

    loop {
        if child.try_wait().map_err(spawn_err)?.is_some() {
            return child.wait_with_output().map_err(spawn_err);
        }
        if Instant::now() >= deadline {
            // Already exited or unkillable; either way the run is lost
            let _ = child.kill();
            let _ = child.wait();
            return Err(ExternalProcessError::TimedOut {
                path: path.to_path_buf(),
                timeout,
            });
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Parse stdout as a base-10 nanosecond count. Trailing whitespace is
/// accepted, anything else is an error.
pub fn parse_elapsed(path: &Path, stdout: &[u8]) -> Result<u64, ExternalProcessError> {
    let text = String::from_utf8_lossy(stdout);
    match text.trim_end().parse::<u64>() {
        Ok(nanos) => Ok(nanos),
        Err(_) => Err(ExternalProcessError::UnparseableOutput {
            path: path.to_path_buf(),
            output: text.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const BUILD_STREAM: &str = r#"{"reason":"compiler-artifact","target":{"name":"rand"},"executable":null}
{"reason":"compiler-artifact","target":{"name":"mul_f32"},"executable":"/work/target/release/deps/mul_f32-3f2a"}
{"reason":"build-finished","success":true}
"#;

    /// Fails the first `failures` resolutions, then succeeds.
    struct Flaky {
        failures: usize,
        calls: AtomicUsize,
    }

    impl ExecutableResolver for Flaky {
        fn resolve(&self, target: &str) -> Result<PathBuf, BuildResolutionError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(BuildResolutionError::BuildFailed {
                    target: target.to_string(),
                    stderr: "error[E0425]".to_string(),
                })
            } else {
                Ok(PathBuf::from(format!("/bin/{}", target)))
            }
        }
    }

    #[test]
    fn test_parse_build_events() {
        let path = parse_build_events("mul_f32", BUILD_STREAM).unwrap();
        assert_eq!(path, PathBuf::from("/work/target/release/deps/mul_f32-3f2a"));
    }

    #[test]
    fn test_parse_build_events_missing_path() {
        let stream = "{\"reason\":\"build-finished\",\"success\":true}\n";
        assert!(matches!(
            parse_build_events("x", stream),
            Err(BuildResolutionError::MissingArtifact { .. })
        ));

        let stream = "{\"reason\":\"compiler-artifact\",\"executable\":null}\n{\"reason\":\"build-finished\"}\n";
        assert!(matches!(
            parse_build_events("x", stream),
            Err(BuildResolutionError::MissingArtifact { .. })
        ));
    }

    #[test]
    fn test_parse_build_events_malformed() {
        let stream = "warning: unused\n{\"reason\":\"build-finished\"}\n";
        assert!(matches!(
            parse_build_events("x", stream),
            Err(BuildResolutionError::MalformedEvent { .. })
        ));
    }

    #[test]
    fn test_cache_memoizes_success() {
        let cache = ExecutableCache::new();
        let resolver = Flaky {
            failures: 0,
            calls: AtomicUsize::new(0),
        };

        let a = cache.get_or_resolve("echo", &resolver).unwrap();
        let b = cache.get_or_resolve("echo", &resolver).unwrap();
        assert_eq!(a, b);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cache_retries_failure() {
        let cache = ExecutableCache::new();
        let resolver = Flaky {
            failures: 1,
            calls: AtomicUsize::new(0),
        };

        assert!(cache.get_or_resolve("echo", &resolver).is_err());
        assert!(!cache.contains("echo"));
        assert!(cache.get_or_resolve("echo", &resolver).is_ok());
        assert!(cache.contains("echo"));
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_arg_encoding() {
        let args = vec!["12".to_string(), "3".to_string()];
        assert_eq!(ArgEncoding::Concatenated.encode(&args), vec!["123"]);
        assert_eq!(ArgEncoding::Separate.encode(&args), vec!["12", "3"]);
        assert_eq!(ArgEncoding::Concatenated.encode(&[]), vec![""]);
    }

    #[test]
    fn test_parse_elapsed() {
        let path = Path::new("bench");
        assert_eq!(parse_elapsed(path, b"123456\n").unwrap(), 123456);
        assert_eq!(parse_elapsed(path, b"42  \r\n").unwrap(), 42);
        assert!(parse_elapsed(path, b"12.5\n").is_err());
        assert!(parse_elapsed(path, b"").is_err());
        assert!(parse_elapsed(path, b" 7").is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_invoke_echo() {
        let config = ExternalConfig::default();
        let elapsed = invoke(Path::new("/bin/echo"), &["15".to_string(), "00".to_string()], &config).unwrap();
        assert_eq!(elapsed, 1500);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_invoke_non_zero_exit() {
        let err = invoke(Path::new("/bin/false"), &[], &ExternalConfig::default()).unwrap_err();
        assert!(matches!(err, ExternalProcessError::NonZeroExit { .. }));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_invoke_timeout() {
        let config = ExternalConfig {
            encoding: ArgEncoding::Separate,
            timeout: Some(Duration::from_millis(50)),
        };
        let err = invoke(Path::new("/bin/sleep"), &["5".to_string()], &config).unwrap_err();
        assert!(matches!(err, ExternalProcessError::TimedOut { .. }));
    }

    #[test]
    fn test_build_command_uses_manifest() {
        let args = |resolver: &CargoBenchResolver| -> Vec<String> {
            resolver
                .build_command("sum_f32")
                .get_args()
                .map(|a| a.to_string_lossy().into_owned())
                .collect()
        };

        let plain = CargoBenchResolver::new();
        assert_eq!(
            args(&plain),
            vec!["build", "--release", "--bench", "sum_f32", "--message-format=json"]
        );

        let pinned = CargoBenchResolver::new().with_manifest("/work/bench/Cargo.toml");
        assert_eq!(
            args(&pinned)[5..],
            ["--manifest-path", "/work/bench/Cargo.toml"]
        );
    }

    #[test]
    fn test_invoke_missing_executable() {
        let err = invoke(
            Path::new("/nonexistent/perfsuite-native"),
            &[],
            &ExternalConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ExternalProcessError::Spawn { .. }));
    }
}
