// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! External collaborator seams: module source loading and parsing.
//!
//! The interpreter core never touches the file system or a parser
//! directly. Imports resolve `<source-name>.grace` through a
//! [`SourceLoader`] and hand the text to a [`ModuleParser`].

use std::collections::HashMap;
use std::io;

use grace_ast::Node;

/// Produces module source text (and file contents for the
/// `getFileContents` built-in).
pub trait SourceLoader {
    fn read_file(&self, path: &str) -> io::Result<String>;
}

/// Reads files relative to the process working directory.
#[derive(Debug, Default)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn read_file(&self, path: &str) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// In-memory loader for tests and embedders.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    files: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }
}

impl SourceLoader for MemoryLoader {
    fn read_file(&self, path: &str) -> io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }
}

/// Turns module source text into an object-constructor AST.
///
/// The parser lives outside this workspace; any implementation producing
/// the node shapes in `grace-ast` is consumable. Closures implement this
/// directly, which is how tests stub module parsing.
pub trait ModuleParser {
    fn parse(&self, source: &str) -> Result<Node, String>;
}

impl<F> ModuleParser for F
where
    F: Fn(&str) -> Result<Node, String>,
{
    fn parse(&self, source: &str) -> Result<Node, String> {
        self(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_loader_round_trip() {
        let mut loader = MemoryLoader::new();
        loader.insert("util.grace", "object {}");
        assert_eq!(loader.read_file("util.grace").unwrap(), "object {}");
        assert!(loader.read_file("missing.grace").is_err());
    }
}
