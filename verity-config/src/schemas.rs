// Schema document loading

use crate::{ConfigError, ConfigLoader, FileFormat, Result};
use std::fs;
use std::path::{Path, PathBuf};
use verity_log::{debug, info};
use verity_validation::{SchemaDefinition, SchemaDocument, SchemaSet};

/// Loads schema documents from JSON or TOML files
///
/// Definitions from every file handed to one call are compiled together, so
/// a schema in `user.toml` may name a schema declared in `address.toml`.
#[derive(Debug, Clone, Default)]
pub struct SchemaLoader {
    definitions: Vec<SchemaDefinition>,
}

impl SchemaLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a document held in memory
    pub fn parse(content: &str, format: FileFormat) -> Result<SchemaDocument> {
        if format == FileFormat::Env {
            return Err(ConfigError::LoadError(
                "schema documents must be JSON or TOML".to_string(),
            ));
        }

        let value = ConfigLoader::new(format).parse(content)?;
        serde_json::from_value(value).map_err(|e| ConfigError::DeserializationError(e.to_string()))
    }

    /// Read one document file
    pub fn read_file(path: impl AsRef<Path>) -> Result<SchemaDocument> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::LoadError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content, FileFormat::from_path(path)?)
    }

    /// Queue the definitions of a document
    pub fn add_document(&mut self, document: SchemaDocument) -> &mut Self {
        self.definitions.extend(document.schemas);
        self
    }

    /// Queue the definitions of a file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let path = path.as_ref();
        let document = Self::read_file(path)?;
        debug!(
            target: "verity::config",
            "loaded {} schema definitions from {}",
            document.schemas.len(),
            path.display()
        );
        Ok(self.add_document(document))
    }

    /// Queue every `.json` and `.toml` file of a directory, in name order
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<&mut Self> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir.as_ref())?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && matches!(
                        FileFormat::from_path(path),
                        Ok(FileFormat::Json) | Ok(FileFormat::Toml)
                    )
            })
            .collect();
        paths.sort();

        for path in paths {
            self.load_file(&path)?;
        }
        Ok(self)
    }

    /// Names of the queued definitions
    pub fn pending(&self) -> Vec<&str> {
        self.definitions.iter().map(|d| d.name.as_str()).collect()
    }

    /// Compile every queued definition
    pub fn build(&self) -> Result<SchemaSet> {
        let set = SchemaSet::from_definitions(&self.definitions)?;
        info!(target: "verity::config", "schema set ready: {}", set.names().join(", "));
        Ok(set)
    }
}
