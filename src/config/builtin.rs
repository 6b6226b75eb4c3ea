use super::{Ecosystem, InterpreterSpec, MemoryQuantity, ProcessLaunchSpec};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const PDF_EXTRACTOR_API: &str = "pdf-extractor-api";

impl Ecosystem {
    /// The `pdf-extractor-api` record, as shipped in `ecosystem.toml`
    pub fn builtin() -> Self {
        let mut env = BTreeMap::new();
        env.insert("NODE_ENV".to_string(), "production".to_string());

        Ecosystem {
            apps: vec![ProcessLaunchSpec {
                name: PDF_EXTRACTOR_API.to_string(),
                script: PathBuf::from("run.py"),
                interpreter: InterpreterSpec::venv(),
                instances: 1,
                autorestart: true,
                watch: false,
                max_memory_restart: Some(MemoryQuantity::ONE_GIB),
                env,
            }],
        }
    }
}
