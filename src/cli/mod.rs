// CLI module - inspect, validate and export launch specifications

mod output;

pub use output::print_error;

use crate::config::{Ecosystem, ResolvedEcosystem, ResolvedLaunchSpec};
use crate::error::{LaunchSpecError, Result};
use crate::launch::LaunchPlan;
use crate::platform::Platform;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;

/// launchspec - process launch specifications for external supervisors
#[derive(Parser)]
#[command(name = "launchspec")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Ecosystem file (.toml or .json); the built-in record is used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Platform to resolve for (win32, linux, darwin, ...); defaults to the host
    #[arg(short, long, global = true)]
    platform: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the resolved apps
    Show,

    /// Print the resolved interpreter path
    Interpreter {
        /// App to resolve (required when the ecosystem has several)
        #[arg(short, long)]
        app: Option<String>,
    },

    /// Validate the configuration
    Validate {
        /// Also fail when an interpreter or script is missing on disk
        #[arg(long)]
        check_paths: bool,
    },

    /// Write the resolved ecosystem for a supervisor to consume
    Export {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the command each instance would be launched with
    Plan,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Json,
    Toml,
}

impl Cli {
    /// Run the CLI application
    pub async fn run() -> Result<()> {
        let cli = Cli::parse();
        cli.execute().await
    }

    /// Execute the parsed command
    async fn execute(&self) -> Result<()> {
        let ecosystem = self.load()?;
        let platform = self.platform();
        let resolved = ecosystem.resolve(&platform);

        match &self.command {
            Commands::Show => {
                output::print_app_table(&resolved);
                Ok(())
            }

            Commands::Interpreter { app } => {
                let app = select_app(&resolved, app.as_deref())?;
                println!("{}", app.interpreter().display());
                Ok(())
            }

            Commands::Validate { check_paths } => {
                if *check_paths {
                    let base = self.base_dir();
                    for app in resolved.apps() {
                        if let Some(plan) = LaunchPlan::for_app(app, platform.family()).first() {
                            plan.ensure_paths_exist(&base).await?;
                        }
                    }
                }
                output::print_success_msg(&format!(
                    "Configuration is valid ({} app(s), platform {})",
                    resolved.apps().len(),
                    platform
                ));
                Ok(())
            }

            Commands::Export {
                format,
                output: destination,
            } => {
                let rendered = match format {
                    ExportFormat::Json => ecosystem.to_json_string(&platform)?,
                    ExportFormat::Toml => ecosystem.to_toml_string(&platform)?,
                };

                match destination {
                    Some(path) => {
                        tokio::fs::write(path, rendered).await?;
                        info!(path = %path.display(), "Exported ecosystem");
                        output::print_success_msg(&format!(
                            "Exported ecosystem to {}",
                            path.display()
                        ));
                    }
                    None => println!("{}", rendered),
                }
                Ok(())
            }

            Commands::Plan => {
                output::print_plans(&LaunchPlan::for_ecosystem(&resolved));
                Ok(())
            }
        }
    }

    fn load(&self) -> Result<Ecosystem> {
        match &self.config {
            Some(path) => Ecosystem::from_file(path),
            None => Ok(Ecosystem::builtin()),
        }
    }

    fn platform(&self) -> Platform {
        self.platform
            .as_deref()
            .map(Platform::from_identifier)
            .unwrap_or_else(Platform::current)
    }

    /// Directory relative launch paths are checked against
    fn base_dir(&self) -> PathBuf {
        self.config
            .as_deref()
            .and_then(Path::parent)
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Pick an app by name, or the only app when no name is given
fn select_app<'a>(
    resolved: &'a ResolvedEcosystem,
    name: Option<&str>,
) -> Result<&'a ResolvedLaunchSpec> {
    match (name, resolved.apps()) {
        (Some(name), _) => resolved.app(name),
        (None, [only]) => Ok(only),
        (None, apps) => Err(LaunchSpecError::Other(format!(
            "Ecosystem has {} apps; choose one with --app",
            apps.len()
        ))),
    }
}
