//! Demo configuration
//!
//! Every field has a default, an empty JSON object is a valid configuration.

use std::{
    fs::File,
    io::{self, BufReader},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::{
    inject::{Dependency, FileDependency, OutputDependency, WriteMode},
    output::Console,
    table::Model,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot read \"{path}\"")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid JSON in \"{path}\"")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Where the injected dependency writes
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sink {
    #[default]
    Console,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    pub path: PathBuf,
    pub mode: WriteMode,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("output.txt"),
            mode: WriteMode::Truncate,
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DemoConfig {
    pub sink: Sink,

    pub output: FileOutputConfig,

    /// A JSON [Model] replacing the built-in ducks
    pub model: Option<PathBuf>,

    /// Print the resolved dispatch table
    pub dump_table: bool,
}

impl DemoConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        read_json(path.as_ref())
    }

    /// The dependency selected by [DemoConfig::sink]
    pub fn dependency(&self) -> Box<dyn Dependency> {
        match self.sink {
            Sink::Console => Box::new(OutputDependency::new(Console)),
            Sink::File => Box::new(FileDependency::new(&self.output.path, self.output.mode)),
        }
    }

    /// Load the configured model, if any
    pub fn load_model(&self) -> Result<Option<Model>, Error> {
        self.model.as_deref().map(read_json).transpose()
    }
}

fn read_json<T>(path: &Path) -> Result<T, Error>
where
    T: for<'de> Deserialize<'de>,
{
    let file = File::open(path).map_err(|source| Error::Io {
        path: path.to_owned(),
        source,
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|source| Error::Json {
        path: path.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn empty_object_is_default() {
        let config: DemoConfig = serde_json::from_value(json!({})).unwrap();

        assert_eq!(config, DemoConfig::default());
        assert_eq!(config.output.path, PathBuf::from("output.txt"));
        assert_eq!(config.output.mode, WriteMode::Truncate);
    }

    #[test]
    fn partial_output() {
        let config: DemoConfig = serde_json::from_value(json!({
            "sink": "file",
            "output": { "mode": "append" },
            "dumpTable": true,
        }))
        .unwrap();

        assert_eq!(
            config,
            DemoConfig {
                sink: Sink::File,
                output: FileOutputConfig {
                    path: PathBuf::from("output.txt"),
                    mode: WriteMode::Append,
                },
                model: None,
                dump_table: true,
            }
        );
    }

    #[test]
    fn serialize_skips_missing_model() {
        let value = serde_json::to_value(DemoConfig::default()).unwrap();

        assert_eq!(
            value,
            json!({
                "sink": "console",
                "output": { "path": "output.txt", "mode": "truncate" },
                "dumpTable": false,
            })
        );
    }

    #[test]
    fn load_model_from_file() {
        let model_file = NamedTempFile::new().unwrap();
        serde_json::to_writer(
            model_file.as_file(),
            &json!({
                "interfaces": [{ "name": "Quack", "methods": ["quack"] }],
                "types": [{ "name": "Duck", "implements": "Quack", "normal": { "quack": "q" } }],
            }),
        )
        .unwrap();

        let config = DemoConfig {
            model: Some(model_file.path().to_owned()),
            ..Default::default()
        };
        let model = config.load_model().unwrap().unwrap();

        assert_eq!(model.types.len(), 1);
        assert!(DemoConfig::default().load_model().unwrap().is_none());
    }

    #[test]
    fn missing_and_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            DemoConfig::from_path(&missing),
            Err(Error::Io { path, .. }) if path == missing
        ));

        let invalid = dir.path().join("invalid.json");
        std::fs::write(&invalid, "{ not json").unwrap();
        assert!(matches!(
            DemoConfig::from_path(&invalid),
            Err(Error::Json { .. })
        ));
    }

    #[test]
    fn file_sink_writes_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = DemoConfig {
            sink: Sink::File,
            output: FileOutputConfig {
                path: dir.path().join("out.txt"),
                mode: WriteMode::Append,
            },
            ..Default::default()
        };

        let mut dependency = config.dependency();
        dependency.accept("x").unwrap();
        dependency.accept("y").unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("out.txt")).unwrap(),
            "xy"
        );
    }
}
