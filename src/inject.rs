//! Constructor injection
//!
//! A [Dependent] receives its [Dependency] when it is built and never decides where the text
//! goes. The dependency writes either to an [Output] or to a file.

use std::{
    fs::OpenOptions,
    io::{self, Write},
    path::PathBuf,
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::output::{Console, Output};

/// The greeting handed to the dependency
pub const GREETING: &str = "Hello";

/// The line the dependent emits once the dependency is done
pub const TRAILER: &str = "!!!";

/// A collaborator accepting text
pub trait Dependency {
    fn accept(&mut self, text: &str) -> io::Result<()>;
}

impl<D> Dependency for Box<D>
where
    D: Dependency + ?Sized,
{
    #[inline]
    fn accept(&mut self, text: &str) -> io::Result<()> {
        (**self).accept(text)
    }
}

impl<D> Dependency for &mut D
where
    D: Dependency + ?Sized,
{
    #[inline]
    fn accept(&mut self, text: &str) -> io::Result<()> {
        (**self).accept(text)
    }
}

/// Forward the text to an [Output], one line per call
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OutputDependency<O = Console> {
    out: O,
}

impl<O> OutputDependency<O> {
    pub fn new(out: O) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> O {
        self.out
    }
}

impl<O> Dependency for OutputDependency<O>
where
    O: Output,
{
    fn accept(&mut self, text: &str) -> io::Result<()> {
        self.out.emit(text);
        Ok(())
    }
}

/// How a [FileDependency] opens its file
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Replace the previous content on every call
    #[default]
    Truncate,

    /// Keep the previous content
    Append,
}

/// Write the text to a file
///
/// The file is opened and closed on every call, no handle outlives [Dependency::accept].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDependency {
    path: PathBuf,
    mode: WriteMode,
}

impl FileDependency {
    pub fn new(path: impl Into<PathBuf>, mode: WriteMode) -> Self {
        Self {
            path: path.into(),
            mode,
        }
    }
}

impl Dependency for FileDependency {
    fn accept(&mut self, text: &str) -> io::Result<()> {
        let mut options = OpenOptions::new();
        options.create(true);
        match self.mode {
            WriteMode::Truncate => options.write(true).truncate(true),
            WriteMode::Append => options.append(true),
        };

        let mut file = options.open(&self.path)?;
        file.write_all(text.as_bytes())?;
        file.flush()?;

        debug!(path = %self.path.display(), bytes = text.len(), mode = ?self.mode, "written");
        Ok(())
    }
}

/// Something that needs a [Dependency] to do its job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependent<D> {
    dependency: D,
}

impl<D> Dependent<D>
where
    D: Dependency,
{
    pub fn new(dependency: D) -> Self {
        Self { dependency }
    }

    /// Hand the greeting to the dependency, then emit the trailer
    pub fn run(&mut self, out: &mut dyn Output) -> io::Result<()> {
        self.dependency.accept(GREETING)?;
        out.emit(TRAILER);
        Ok(())
    }

    pub fn into_inner(self) -> D {
        self.dependency
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;
    use crate::output::Recorder;

    #[test]
    fn dependent_uses_injected_output() {
        let mut out = Recorder::new();
        let mut dependent = Dependent::new(OutputDependency::new(Recorder::new()));
        dependent.run(&mut out).unwrap();
        dependent.run(&mut out).unwrap();

        assert_eq!(
            dependent.into_inner().into_inner().into_lines(),
            vec![GREETING, GREETING]
        );
        assert_eq!(out.into_lines(), vec![TRAILER, TRAILER]);
    }

    #[test]
    fn file_dependency_truncates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("output.txt");
        fs::write(&path, "previous content").unwrap();

        let mut dependent = Dependent::new(FileDependency::new(&path, WriteMode::Truncate));
        let mut out = Recorder::new();
        dependent.run(&mut out).unwrap();
        dependent.run(&mut out).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), GREETING);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn file_dependency_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("output.txt");

        let mut dependency = FileDependency::new(&path, WriteMode::Append);
        dependency.accept("a").unwrap();
        dependency.accept("b").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "ab");
    }

    #[test]
    fn failed_write_skips_the_trailer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("output.txt");

        let boxed: Box<dyn Dependency> = Box::new(FileDependency::new(path, WriteMode::Truncate));
        let mut dependent = Dependent::new(boxed);
        let mut out = Recorder::new();

        assert!(dependent.run(&mut out).is_err());
        assert!(out.is_empty());
    }
}
