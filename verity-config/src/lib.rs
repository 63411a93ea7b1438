//! Settings and schema-document loading for Verity
//!
//! A [`ValidationService`] bundles an engine configured from [`Settings`]
//! with a [`SchemaSet`] loaded from schema documents, so records can be
//! validated by schema name.
//!
//! ```
//! use verity_config::{FileFormat, SchemaLoader, ValidationService};
//! use serde_json::json;
//!
//! let document = SchemaLoader::parse(
//!     r#"{"schemas": [{"name": "Ping", "fields": [{"name": "seq", "type": "int"}]}]}"#,
//!     FileFormat::Json,
//! )
//! .unwrap();
//!
//! let service = ValidationService::builder()
//!     .schema_document(document)
//!     .build()
//!     .unwrap();
//!
//! let err = service.validate("Ping", &json!({"seq": "seven"})).unwrap_err();
//! assert_eq!(err.validation_errors().unwrap().len(), 1);
//! assert!(service.validate("Ping", &json!({"seq": 7})).is_ok());
//! ```

pub mod env;
pub mod error;
pub mod loader;
pub mod schemas;
pub mod settings;

pub use env::{DEFAULT_PREFIX, EnvLoader};
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use schemas::SchemaLoader;
pub use settings::{EngineSettings, LogSettings, Settings};

use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use verity_log::debug;
use verity_validation::{Engine, Record, Schema, SchemaDocument, SchemaSet, ValidationErrors};

/// Validates records against named schemas
#[derive(Debug, Clone)]
pub struct ValidationService {
    settings: Settings,
    engine: Engine,
    schemas: Arc<SchemaSet>,
}

impl ValidationService {
    /// Service with default settings and the given schemas
    pub fn new(schemas: SchemaSet) -> Self {
        Self::from_parts(Settings::default(), schemas)
    }

    pub fn from_parts(settings: Settings, schemas: SchemaSet) -> Self {
        Self {
            engine: settings.engine(),
            settings,
            schemas: Arc::new(schemas),
        }
    }

    pub fn builder() -> ValidationServiceBuilder {
        ValidationServiceBuilder::new()
    }

    /// Look up a schema by name
    pub fn schema(&self, name: &str) -> Result<Arc<Schema>> {
        self.schemas
            .get(name)
            .ok_or_else(|| ConfigError::UnknownSchema(name.to_string()))
    }

    /// Validate a record; a rejected record carries the full report
    pub fn validate(&self, schema: &str, input: &Value) -> Result<Record> {
        self.check(schema, input)?
            .map_err(|errors| ConfigError::Rejected {
                schema: schema.to_string(),
                errors,
            })
    }

    /// Validate a record, keeping the report separate from lookup failures
    pub fn check(
        &self,
        schema: &str,
        input: &Value,
    ) -> Result<std::result::Result<Record, ValidationErrors>> {
        let schema = self.schema(schema)?;
        Ok(self.engine.run(&schema, input))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn schemas(&self) -> &SchemaSet {
        &self.schemas
    }
}

/// Builder for [`ValidationService`]
///
/// Settings files load first, then `.env` files, then environment
/// variables, so the environment always wins.
pub struct ValidationServiceBuilder {
    env: EnvLoader,
    load_env: bool,
    dotenv_path: Option<PathBuf>,
    settings_files: Vec<PathBuf>,
    settings: Option<Settings>,
    schema_loader: SchemaLoader,
    schema_files: Vec<PathBuf>,
    schema_dirs: Vec<PathBuf>,
    schemas: Vec<Arc<Schema>>,
    install_logging: bool,
}

impl ValidationServiceBuilder {
    pub fn new() -> Self {
        Self {
            env: EnvLoader::default(),
            load_env: false,
            dotenv_path: None,
            settings_files: Vec::new(),
            settings: None,
            schema_loader: SchemaLoader::new(),
            schema_files: Vec::new(),
            schema_dirs: Vec::new(),
            schemas: Vec::new(),
            install_logging: false,
        }
    }

    /// Read overrides under this prefix instead of `VERITY`
    ///
    /// Enables environment overrides; variables injected through
    /// [`ValidationServiceBuilder::env_loader`] are kept.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env = std::mem::take(&mut self.env).with_prefix(prefix);
        self.load_env = true;
        self
    }

    /// Read overrides from this loader instead of the process environment
    pub fn env_loader(mut self, env: EnvLoader) -> Self {
        self.env = env;
        self.load_env = true;
        self
    }

    /// Enable environment variable overrides
    pub fn load_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Enable overrides from a `.env` file
    pub fn load_dotenv(mut self, path: impl Into<PathBuf>) -> Self {
        self.dotenv_path = Some(path.into());
        self.load_env = true;
        self
    }

    /// Start from explicit settings instead of defaults
    ///
    /// Settings files are layered over these, key by key.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Add a JSON or TOML settings file
    ///
    /// Files are layered in the order added: each one overrides only the keys
    /// it sets.
    pub fn settings_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_files.push(path.into());
        self
    }

    pub fn schema_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_files.push(path.into());
        self
    }

    pub fn schema_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_dirs.push(path.into());
        self
    }

    pub fn schema_document(mut self, document: SchemaDocument) -> Self {
        self.schema_loader.add_document(document);
        self
    }

    /// Register a schema built in code
    pub fn schema(mut self, schema: impl Into<Arc<Schema>>) -> Self {
        self.schemas.push(schema.into());
        self
    }

    /// Configure the global logger from the final settings
    pub fn install_logging(mut self) -> Self {
        self.install_logging = true;
        self
    }

    /// Build the validation service
    pub fn build(mut self) -> Result<ValidationService> {
        let mut settings = self.settings.take().unwrap_or_default();
        for path in &self.settings_files {
            settings = settings.merge_file(path)?;
        }

        if let Some(path) = &self.dotenv_path {
            self.env.merge_dotenv(path)?;
        }
        if self.load_env {
            settings.apply_env(&self.env)?;
        }

        if self.install_logging {
            settings.install_logging()?;
        }

        for dir in &self.schema_dirs {
            self.schema_loader.load_dir(dir)?;
        }
        for path in &self.schema_files {
            self.schema_loader.load_file(path)?;
        }

        let mut schemas = self.schema_loader.build()?;
        for schema in self.schemas {
            schemas.insert(schema)?;
        }

        debug!(
            target: "verity::config",
            "validation service ready with {} schemas ({:?})",
            schemas.len(),
            settings.engine
        );
        Ok(ValidationService::from_parts(settings, schemas))
    }
}

impl Default for ValidationServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
