use crate::platform::{Platform, PlatformFamily};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const VENV_WINDOWS_PYTHON: &str = "./venv/Scripts/python";
const VENV_UNIX_PYTHON: &str = "./venv/bin/python";

/// Executable used to run an app's script.
///
/// In files this is either a plain path or a table keyed by platform family:
///
/// ```toml
/// interpreter = { windows = "./venv/Scripts/python", unix = "./venv/bin/python" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InterpreterSpec {
    /// Same interpreter on every platform
    Fixed(PathBuf),

    /// Interpreter chosen by platform family
    PerPlatform {
        windows: PathBuf,
        #[serde(alias = "default")]
        unix: PathBuf,
    },
}

impl InterpreterSpec {
    /// Python inside a project-local `venv`, whose layout differs on Windows
    pub fn venv() -> Self {
        InterpreterSpec::PerPlatform {
            windows: PathBuf::from(VENV_WINDOWS_PYTHON),
            unix: PathBuf::from(VENV_UNIX_PYTHON),
        }
    }

    /// Resolve the interpreter path for a platform
    pub fn resolve(&self, platform: &Platform) -> &Path {
        match self {
            InterpreterSpec::Fixed(path) => path,
            InterpreterSpec::PerPlatform { windows, unix } => match platform.family() {
                PlatformFamily::Windows => windows,
                PlatformFamily::Unix => unix,
            },
        }
    }

    pub(crate) fn paths(&self) -> Vec<(&'static str, &Path)> {
        match self {
            InterpreterSpec::Fixed(path) => vec![("interpreter", path.as_path())],
            InterpreterSpec::PerPlatform { windows, unix } => vec![
                ("interpreter.windows", windows.as_path()),
                ("interpreter.unix", unix.as_path()),
            ],
        }
    }

    pub(crate) fn map_paths(self, mut f: impl FnMut(&Path) -> PathBuf) -> Self {
        match self {
            InterpreterSpec::Fixed(path) => InterpreterSpec::Fixed(f(&path)),
            InterpreterSpec::PerPlatform { windows, unix } => InterpreterSpec::PerPlatform {
                windows: f(&windows),
                unix: f(&unix),
            },
        }
    }
}
