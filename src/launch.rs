// Launch plans: what a supervisor starts for each instance of an app

use crate::config::{ResolvedEcosystem, ResolvedLaunchSpec};
use crate::error::{LaunchSpecError, Result};
use crate::platform::PlatformFamily;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, warn};

/// Per-instance index injected into every launched process
pub const INSTANCE_ENV_VAR: &str = "NODE_APP_INSTANCE";

/// Variable selecting the wrapped application's runtime mode
pub const MODE_ENV_VAR: &str = "NODE_ENV";

/// Executable extensions tried on Windows when `PATHEXT` is unset
const DEFAULT_PATHEXT: &str = ".COM;.EXE;.BAT;.CMD";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeMode {
    Production,
    Development,
}

impl RuntimeMode {
    /// `development` or an unset `NODE_ENV` means Development; any other
    /// value means Production.
    pub fn from_env(env: &BTreeMap<String, String>) -> Self {
        match env.get(MODE_ENV_VAR).map(String::as_str) {
            None | Some("development") => RuntimeMode::Development,
            Some(_) => RuntimeMode::Production,
        }
    }

    /// The application reloads on code changes only in development
    pub fn hot_reload(&self) -> bool {
        matches!(self, RuntimeMode::Development)
    }
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeMode::Production => write!(f, "production"),
            RuntimeMode::Development => write!(f, "development"),
        }
    }
}

/// Which launch path a check refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Interpreter,
    Script,
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKind::Interpreter => write!(f, "interpreter"),
            PathKind::Script => write!(f, "script"),
        }
    }
}

/// A launch path that does not exist on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingPath {
    pub kind: PathKind,
    pub path: PathBuf,
}

/// Program, arguments and environment for one instance of an app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    app: String,
    instance: usize,
    program: PathBuf,
    args: Vec<PathBuf>,
    env: BTreeMap<String, String>,
    cwd: Option<PathBuf>,
    mode: RuntimeMode,
    family: PlatformFamily,
}

impl LaunchPlan {
    /// One plan per instance, numbered from 0
    pub fn for_app(app: &ResolvedLaunchSpec, family: PlatformFamily) -> Vec<LaunchPlan> {
        let mode = RuntimeMode::from_env(app.env());
        debug!(app = app.name(), instances = app.instances(), %mode, "Building launch plans");

        (0..app.instances())
            .map(|instance| {
                let mut env = app.env().clone();
                env.entry(INSTANCE_ENV_VAR.to_string())
                    .or_insert_with(|| instance.to_string());

                LaunchPlan {
                    app: app.name().to_string(),
                    instance,
                    program: app.interpreter().to_path_buf(),
                    args: vec![app.script().to_path_buf()],
                    env,
                    cwd: None,
                    mode,
                    family,
                }
            })
            .collect()
    }

    /// Plans for every app, in ecosystem order
    pub fn for_ecosystem(ecosystem: &ResolvedEcosystem) -> Vec<LaunchPlan> {
        let family = ecosystem.platform().family();
        ecosystem
            .apps()
            .iter()
            .flat_map(|app| Self::for_app(app, family))
            .collect()
    }

    /// Run from `dir`; relative program and script paths resolve against it
    pub fn with_cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn instance(&self) -> usize {
        self.instance
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[PathBuf] {
        &self.args
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    pub fn mode(&self) -> RuntimeMode {
        self.mode
    }

    pub fn hot_reload(&self) -> bool {
        self.mode.hot_reload()
    }

    /// Build the command for this instance without spawning it
    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command.envs(&self.env);
        if let Some(ref cwd) = self.cwd {
            command.current_dir(cwd);
        }
        command
    }

    /// Shell-like rendering of the command, for display
    pub fn command_line(&self) -> String {
        let mut parts: Vec<String> = self
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        parts.push(self.program.display().to_string());
        parts.extend(self.args.iter().map(|arg| arg.display().to_string()));
        parts.join(" ")
    }

    /// Report interpreter and script paths missing on disk.
    ///
    /// Relative paths are joined onto the plan's working directory, or onto
    /// `base` when none is set. A bare interpreter name such as `python3` is
    /// looked up on `PATH` at spawn time and is not checked here. On Windows an
    /// interpreter also matches `<path>.exe` and the other `PATHEXT`
    /// extensions, as process spawning does there.
    pub async fn check_paths(&self, base: &Path) -> Result<Vec<MissingPath>> {
        let root = self.cwd.as_deref().unwrap_or(base);
        let mut missing = Vec::new();

        let mut candidates = Vec::new();
        if !is_bare_command(&self.program) {
            candidates.push((PathKind::Interpreter, &self.program));
        }
        if let Some(script) = self.args.first() {
            candidates.push((PathKind::Script, script));
        }

        for (kind, path) in candidates {
            let full = root.join(path);
            let alternatives = match (kind, self.family) {
                (PathKind::Interpreter, PlatformFamily::Windows) => windows_executables(&full),
                _ => Vec::new(),
            };
            if !any_exists(&full, &alternatives).await? {
                warn!(app = %self.app, %kind, path = %full.display(), "Launch path does not exist");
                missing.push(MissingPath {
                    kind,
                    path: path.clone(),
                });
            }
        }

        Ok(missing)
    }

    /// Fail with the first missing launch path
    pub async fn ensure_paths_exist(&self, base: &Path) -> Result<()> {
        match self.check_paths(base).await?.into_iter().next() {
            Some(missing) => Err(LaunchSpecError::MissingPath {
                app: self.app.clone(),
                kind: missing.kind.to_string(),
                path: missing.path.display().to_string(),
            }),
            None => Ok(()),
        }
    }
}

async fn any_exists(path: &Path, alternatives: &[PathBuf]) -> Result<bool> {
    if tokio::fs::try_exists(path).await? {
        return Ok(true);
    }
    for alternative in alternatives {
        if tokio::fs::try_exists(alternative).await? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// `path` with each `PATHEXT` extension appended
fn windows_executables(path: &Path) -> Vec<PathBuf> {
    let pathext = std::env::var("PATHEXT").unwrap_or_else(|_| DEFAULT_PATHEXT.to_string());
    pathext_candidates(path, &pathext)
}

fn pathext_candidates(path: &Path, pathext: &str) -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    for ext in pathext.split(';').map(str::trim).filter(|ext| !ext.is_empty()) {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        let mut name = path.as_os_str().to_os_string();
        name.push(".");
        name.push(&ext);
        let candidate = PathBuf::from(name);
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates
}

fn is_bare_command(path: &Path) -> bool {
    let mut components = path.components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
