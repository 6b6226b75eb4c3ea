mod builtin;
pub mod interpreter;
pub mod memory;

pub use builtin::PDF_EXTRACTOR_API;
pub use interpreter::InterpreterSpec;
pub use memory::MemoryQuantity;

use crate::error::{LaunchSpecError, Result};
use crate::platform::Platform;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Upper bound on `instances` accepted by validation
pub const MAX_INSTANCES: usize = 100;

/// Top-level configuration record: an ordered list of apps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ecosystem {
    pub apps: Vec<ProcessLaunchSpec>,
}

/// How to launch and supervise one application, as authored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessLaunchSpec {
    /// Logical process name (unique within an ecosystem)
    pub name: String,

    /// Entry point passed to the interpreter
    pub script: PathBuf,

    /// Executable that runs `script`
    pub interpreter: InterpreterSpec,

    /// Number of copies to supervise
    #[serde(default = "default_instances")]
    pub instances: usize,

    /// Relaunch the process whenever it exits
    #[serde(default = "default_autorestart")]
    pub autorestart: bool,

    /// Restart on filesystem changes
    #[serde(default)]
    pub watch: bool,

    /// Resident memory ceiling that forces a restart
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_memory_restart: Option<MemoryQuantity>,

    /// Environment variables injected into the process
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

// Default value functions for serde
fn default_instances() -> usize {
    1
}

fn default_autorestart() -> bool {
    true
}

impl Ecosystem {
    /// Load an ecosystem from a file (supports TOML and JSON)
    pub fn from_file(path: &Path) -> Result<Ecosystem> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            LaunchSpecError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        let ecosystem = match extension {
            "toml" => Self::from_toml_str(&contents)?,
            "json" => Self::from_json_str(&contents)?,
            _ => {
                return Err(LaunchSpecError::InvalidConfig(format!(
                    "Unsupported file format: {}. Use .toml or .json",
                    extension
                )))
            }
        };

        info!(
            path = %path.display(),
            apps = ecosystem.apps.len(),
            "Loaded ecosystem configuration"
        );
        Ok(ecosystem)
    }

    /// Parse, expand and validate a TOML ecosystem
    pub fn from_toml_str(contents: &str) -> Result<Ecosystem> {
        let table: toml::Table = contents
            .parse()
            .map_err(|e| LaunchSpecError::InvalidConfig(format!("Failed to parse TOML: {}", e)))?;

        let has_apps = table.contains_key("apps");
        let value = toml::Value::Table(table);
        let ecosystem = if has_apps {
            value.try_into::<Ecosystem>()
        } else {
            value
                .try_into::<ProcessLaunchSpec>()
                .map(|app| Ecosystem { apps: vec![app] })
        }
        .map_err(|e| LaunchSpecError::InvalidConfig(format!("Failed to parse TOML: {}", e)))?;

        ecosystem.finish()
    }

    /// Parse, expand and validate a JSON ecosystem
    pub fn from_json_str(contents: &str) -> Result<Ecosystem> {
        let value: serde_json::Value = serde_json::from_str(contents)
            .map_err(|e| LaunchSpecError::InvalidConfig(format!("Failed to parse JSON: {}", e)))?;

        let has_apps = value.get("apps").is_some();
        let ecosystem = if has_apps {
            serde_json::from_value::<Ecosystem>(value)
        } else {
            serde_json::from_value::<ProcessLaunchSpec>(value)
                .map(|app| Ecosystem { apps: vec![app] })
        }
        .map_err(|e| LaunchSpecError::InvalidConfig(format!("Failed to parse JSON: {}", e)))?;

        ecosystem.finish()
    }

    fn finish(mut self) -> Result<Ecosystem> {
        if self.apps.is_empty() {
            return Err(LaunchSpecError::InvalidConfig(
                "No app configuration found in file".to_string(),
            ));
        }

        self.apps = self
            .apps
            .into_iter()
            .map(|app| app.expand_env_vars(&process_env))
            .collect();

        self.validate()?;
        Ok(self)
    }

    /// Validate every app and check that names are unique
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for app in &self.apps {
            app.validate()?;
            if !seen.insert(app.name.as_str()) {
                return Err(LaunchSpecError::ConfigValidationError(format!(
                    "Duplicate app name: {}",
                    app.name
                )));
            }
        }
        Ok(())
    }

    /// Evaluate platform-conditional fields once for the given platform
    pub fn resolve(&self, platform: &Platform) -> ResolvedEcosystem {
        debug!(%platform, "Resolving ecosystem");
        ResolvedEcosystem {
            platform: platform.clone(),
            apps: self
                .apps
                .iter()
                .map(|app| app.resolve(platform))
                .collect(),
        }
    }

    /// Resolved ecosystem as pretty JSON, interpreter written as a plain path
    pub fn to_json_string(&self, platform: &Platform) -> Result<String> {
        serde_json::to_string_pretty(&self.resolve(platform))
            .map_err(|e| LaunchSpecError::SerializationError(e.to_string()))
    }

    /// Resolved ecosystem as TOML, interpreter written as a plain path
    pub fn to_toml_string(&self, platform: &Platform) -> Result<String> {
        toml::to_string_pretty(&self.resolve(platform))
            .map_err(|e| LaunchSpecError::SerializationError(e.to_string()))
    }
}

impl ProcessLaunchSpec {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(LaunchSpecError::MissingConfigField("name".to_string()));
        }

        if self.name.chars().any(char::is_whitespace) {
            return Err(LaunchSpecError::ConfigValidationError(format!(
                "name must not contain whitespace: '{}'",
                self.name
            )));
        }

        if self.script.as_os_str().is_empty() {
            return Err(LaunchSpecError::MissingConfigField("script".to_string()));
        }

        for (field, path) in self.interpreter.paths() {
            if path.as_os_str().is_empty() {
                return Err(LaunchSpecError::MissingConfigField(field.to_string()));
            }
        }

        if self.instances == 0 {
            return Err(LaunchSpecError::ConfigValidationError(
                "instances must be at least 1".to_string(),
            ));
        }

        if self.instances > MAX_INSTANCES {
            return Err(LaunchSpecError::ConfigValidationError(format!(
                "instances cannot exceed {}",
                MAX_INSTANCES
            )));
        }

        for key in self.env.keys() {
            if key.is_empty() || key.contains('=') || key.contains('\0') {
                return Err(LaunchSpecError::ConfigValidationError(format!(
                    "Invalid environment variable name: '{}'",
                    key
                )));
            }
        }

        Ok(())
    }

    /// Resolve this app for a platform
    pub fn resolve(&self, platform: &Platform) -> ResolvedLaunchSpec {
        ResolvedLaunchSpec {
            name: self.name.clone(),
            script: self.script.clone(),
            interpreter: self.interpreter.resolve(platform).to_path_buf(),
            instances: self.instances,
            autorestart: self.autorestart,
            watch: self.watch,
            max_memory_restart: self.max_memory_restart,
            env: self.env.clone(),
        }
    }

    /// Expand `$VAR` and `${VAR}` in script, interpreter and env values
    fn expand_env_vars(mut self, lookup: &impl Fn(&str) -> Option<String>) -> Self {
        self.script = expand_env_in_path(&self.script, lookup);
        self.interpreter = self
            .interpreter
            .map_paths(|path| expand_env_in_path(path, lookup));
        self.env = self
            .env
            .into_iter()
            .map(|(k, v)| {
                let expanded = expand_env_in_string(&v, lookup);
                (k, expanded)
            })
            .collect();
        self
    }
}

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Expand environment variable references, leaving unknown ones as written
fn expand_env_in_string(s: &str, lookup: &impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find('$') {
        result.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .char_indices()
                .find(|&(i, c)| {
                    !(c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit()))
                })
                .map(|(i, _)| i)
                .unwrap_or(after.len());
            (&after[..end], end)
        };

        match (name.is_empty(), lookup(name)) {
            (false, Some(value)) => result.push_str(&value),
            _ => result.push_str(&rest[pos..pos + 1 + consumed]),
        }
        rest = &after[consumed..];
    }

    result.push_str(rest);
    result
}

fn expand_env_in_path(path: &Path, lookup: &impl Fn(&str) -> Option<String>) -> PathBuf {
    let path_str = path.to_string_lossy();
    PathBuf::from(expand_env_in_string(&path_str, lookup))
}

/// Ecosystem with every platform-conditional field evaluated.
///
/// Immutable: a changed configuration is picked up by loading and resolving
/// again, never by mutating this value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedEcosystem {
    #[serde(skip)]
    platform: Platform,
    apps: Vec<ResolvedLaunchSpec>,
}

impl ResolvedEcosystem {
    /// Platform the ecosystem was resolved for
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn apps(&self) -> &[ResolvedLaunchSpec] {
        &self.apps
    }

    /// Look up an app by name
    pub fn app(&self, name: &str) -> Result<&ResolvedLaunchSpec> {
        self.apps
            .iter()
            .find(|app| app.name == name)
            .ok_or_else(|| LaunchSpecError::AppNotFound(name.to_string()))
    }
}

/// One app with its interpreter resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedLaunchSpec {
    name: String,
    script: PathBuf,
    interpreter: PathBuf,
    instances: usize,
    autorestart: bool,
    watch: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_memory_restart: Option<MemoryQuantity>,
    env: BTreeMap<String, String>,
}

impl ResolvedLaunchSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    pub fn instances(&self) -> usize {
        self.instances
    }

    pub fn autorestart(&self) -> bool {
        self.autorestart
    }

    pub fn watch(&self) -> bool {
        self.watch
    }

    pub fn max_memory_restart(&self) -> Option<MemoryQuantity> {
        self.max_memory_restart
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn test_app(name: &str) -> ProcessLaunchSpec {
        ProcessLaunchSpec {
            name: name.to_string(),
            script: PathBuf::from("run.py"),
            interpreter: InterpreterSpec::venv(),
            instances: default_instances(),
            autorestart: default_autorestart(),
            watch: false,
            max_memory_restart: None,
            env: BTreeMap::new(),
        }
    }

    fn lookup(key: &str) -> Option<String> {
        match key {
            "APP_HOME" => Some("/srv/app".to_string()),
            "MODE" => Some("production".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(test_app("api").validate().is_ok());
    }

    #[test]
    fn test_validate_empty_name() {
        assert!(matches!(
            test_app("").validate(),
            Err(LaunchSpecError::MissingConfigField(_))
        ));
    }

    #[test]
    fn test_validate_name_with_whitespace() {
        assert!(matches!(
            test_app("pdf api").validate(),
            Err(LaunchSpecError::ConfigValidationError(_))
        ));
    }

    #[test]
    fn test_validate_empty_script() {
        let mut app = test_app("api");
        app.script = PathBuf::new();
        assert!(matches!(
            app.validate(),
            Err(LaunchSpecError::MissingConfigField(field)) if field == "script"
        ));
    }

    #[test]
    fn test_validate_empty_interpreter_branch() {
        let mut app = test_app("api");
        app.interpreter = InterpreterSpec::PerPlatform {
            windows: PathBuf::new(),
            unix: PathBuf::from("./venv/bin/python"),
        };
        assert!(matches!(
            app.validate(),
            Err(LaunchSpecError::MissingConfigField(field)) if field == "interpreter.windows"
        ));
    }

    #[test]
    fn test_validate_instance_bounds() {
        let mut app = test_app("api");
        app.instances = 0;
        assert!(app.validate().is_err());
        app.instances = MAX_INSTANCES + 1;
        assert!(app.validate().is_err());
        app.instances = MAX_INSTANCES;
        assert!(app.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_env_key() {
        let mut app = test_app("api");
        app.env.insert("A=B".to_string(), "x".to_string());
        assert!(matches!(
            app.validate(),
            Err(LaunchSpecError::ConfigValidationError(_))
        ));
    }

    #[test]
    fn test_validate_duplicate_names() {
        let ecosystem = Ecosystem {
            apps: vec![test_app("api"), test_app("api")],
        };
        assert!(matches!(
            ecosystem.validate(),
            Err(LaunchSpecError::ConfigValidationError(msg)) if msg.contains("Duplicate")
        ));
    }

    #[test]
    fn test_expand_env_in_string() {
        assert_eq!(expand_env_in_string("$APP_HOME/run.py", &lookup), "/srv/app/run.py");
        assert_eq!(expand_env_in_string("${MODE}-1", &lookup), "production-1");
        assert_eq!(expand_env_in_string("$MODEX", &lookup), "$MODEX");
        assert_eq!(expand_env_in_string("${UNSET}", &lookup), "${UNSET}");
        assert_eq!(expand_env_in_string("cost: $5", &lookup), "cost: $5");
        assert_eq!(expand_env_in_string("${MODE", &lookup), "${MODE");
        assert_eq!(expand_env_in_string("plain", &lookup), "plain");
    }

    #[test]
    fn test_expand_env_vars_in_app() {
        let mut app = test_app("api");
        app.script = PathBuf::from("${APP_HOME}/run.py");
        app.interpreter = InterpreterSpec::Fixed(PathBuf::from("$APP_HOME/venv/bin/python"));
        app.env.insert("NODE_ENV".to_string(), "$MODE".to_string());

        let app = app.expand_env_vars(&lookup);

        assert_eq!(app.script, PathBuf::from("/srv/app/run.py"));
        assert_eq!(
            app.interpreter,
            InterpreterSpec::Fixed(PathBuf::from("/srv/app/venv/bin/python"))
        );
        assert_eq!(app.env.get("NODE_ENV"), Some(&"production".to_string()));
    }

    #[test]
    fn test_parse_toml_single() {
        let ecosystem = Ecosystem::from_toml_str(
            r#"
            name = "my-app"
            script = "app.py"
            interpreter = "python3"
            instances = 2
        "#,
        )
        .unwrap();
        assert_eq!(ecosystem.apps.len(), 1);
        assert_eq!(ecosystem.apps[0].name, "my-app");
        assert_eq!(ecosystem.apps[0].instances, 2);
        assert!(ecosystem.apps[0].autorestart);
        assert!(!ecosystem.apps[0].watch);
    }

    #[test]
    fn test_parse_toml_apps() {
        let ecosystem = Ecosystem::from_toml_str(
            r#"
            [[apps]]
            name = "app1"
            script = "a.py"
            interpreter = { windows = "py.exe", unix = "python3" }
            max_memory_restart = "512M"

            [[apps]]
            name = "app2"
            script = "b.py"
            interpreter = "python3"
        "#,
        )
        .unwrap();
        assert_eq!(ecosystem.apps.len(), 2);
        assert_eq!(ecosystem.apps[0].name, "app1");
        assert_eq!(
            ecosystem.apps[0].max_memory_restart,
            Some(MemoryQuantity::parse("512M").unwrap())
        );
        assert_eq!(ecosystem.apps[1].name, "app2");
    }

    #[test]
    fn test_parse_toml_missing_interpreter() {
        let result = Ecosystem::from_toml_str(
            r#"
            name = "my-app"
            script = "app.py"
        "#,
        );
        assert!(matches!(result, Err(LaunchSpecError::InvalidConfig(_))));
    }

    #[test]
    fn test_parse_json_single() {
        let ecosystem = Ecosystem::from_json_str(
            r#"{ "name": "my-app", "script": "app.py", "interpreter": "python3" }"#,
        )
        .unwrap();
        assert_eq!(ecosystem.apps.len(), 1);
        assert_eq!(ecosystem.apps[0].name, "my-app");
    }

    #[test]
    fn test_parse_json_empty_apps() {
        let result = Ecosystem::from_json_str(r#"{ "apps": [] }"#);
        assert!(matches!(result, Err(LaunchSpecError::InvalidConfig(_))));
    }

    #[test]
    fn test_parse_json_bad_memory() {
        let result = Ecosystem::from_json_str(
            r#"{ "apps": [{ "name": "a", "script": "a.py", "interpreter": "python3",
                 "max_memory_restart": "1T" }] }"#,
        );
        assert!(matches!(result, Err(LaunchSpecError::InvalidConfig(_))));
    }

    #[test]
    fn test_resolve_keeps_order_and_platform() {
        let ecosystem = Ecosystem {
            apps: vec![test_app("first"), test_app("second")],
        };
        let resolved = ecosystem.resolve(&Platform::Windows);
        assert_eq!(resolved.platform(), &Platform::Windows);
        let names: Vec<&str> = resolved.apps().iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(
            resolved.apps()[0].interpreter(),
            Path::new("./venv/Scripts/python")
        );
    }

    #[test]
    fn test_resolved_app_lookup() {
        let resolved = Ecosystem {
            apps: vec![test_app("api")],
        }
        .resolve(&Platform::Linux);
        assert!(resolved.app("api").is_ok());
        assert!(matches!(
            resolved.app("missing"),
            Err(LaunchSpecError::AppNotFound(_))
        ));
    }

    #[test]
    fn test_from_file_unsupported_format() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("ecosystem.yaml");
        fs::write(&config_path, "name: test").unwrap();

        let result = Ecosystem::from_file(&config_path);
        assert!(matches!(result, Err(LaunchSpecError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_file_missing() {
        let temp_dir = TempDir::new().unwrap();
        let result = Ecosystem::from_file(&temp_dir.path().join("absent.toml"));
        assert!(matches!(result, Err(LaunchSpecError::ConfigError(_))));
    }
}
