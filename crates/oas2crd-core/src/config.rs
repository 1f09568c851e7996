use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::resource::ResourceDescriptor;

/// Project configuration loaded from `.oas2crd.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DefinitionConfig {
    /// OpenAPI document to read.
    pub input: String,
    /// Directory receiving the generated schema files.
    pub output: String,
    /// API group of the generated resources.
    pub group: String,
    pub resources: Vec<ResourceDescriptor>,
}

impl Default for DefinitionConfig {
    fn default() -> Self {
        Self {
            input: "openapi.yaml".to_string(),
            output: "generated".to_string(),
            group: "example.krateo.io".to_string(),
            resources: Vec::new(),
        }
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".oas2crd.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<DefinitionConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&content)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
}

pub fn parse_config(content: &str) -> Result<DefinitionConfig, serde_yaml_ng::Error> {
    serde_yaml_ng::from_str(content)
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# oas2crd configuration
input: openapi.yaml
output: generated
group: example.krateo.io

resources:
  - kind: Widget
    identifier: id          # status field carrying the remote id
    verbsDescription:
      - action: create      # create | update | list | get | delete
        method: POST
        path: /widgets      # literal path from the document
      # - action: get
      #   method: GET
      #   path: /widgets/{id}
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DefinitionConfig::default();
        assert_eq!(config.input, "openapi.yaml");
        assert_eq!(config.output, "generated");
        assert!(config.resources.is_empty());
    }

    #[test]
    fn test_parse_default_content() {
        let config = parse_config(default_config_content()).unwrap();
        assert_eq!(config.resources.len(), 1);
        let widget = &config.resources[0];
        assert_eq!(widget.kind, "Widget");
        assert_eq!(widget.identifier, "id");
        assert_eq!(widget.verbs[0].path, "/widgets");
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = parse_config("input: api.yaml\n").unwrap();
        assert_eq!(config.input, "api.yaml");
        // Defaults applied
        assert_eq!(config.output, "generated");
        assert_eq!(config.group, "example.krateo.io");
    }

    #[test]
    fn test_missing_file_is_none() {
        let loaded = load_config(Path::new("/definitely/not/here/.oas2crd.yaml")).unwrap();
        assert!(loaded.is_none());
    }
}
