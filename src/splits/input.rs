use std::fmt::Display;

use anyhow::anyhow;
use itertools::Itertools;

use crate::result::Result;

/// A declared, named data source of a query, possibly spanning several paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalInput {
    pub name: String,
    /// Identifier of the physical format, see [super::FormatRegistry].
    pub format: String,
    pub paths: Vec<String>,
}

impl LogicalInput {
    pub fn new(name: impl Into<String>, format: impl Into<String>, paths: Vec<String>) -> Self {
        Self {
            name: name.into(),
            format: format.into(),
            paths,
        }
    }

    /// Parses a `name:format:path[;path...]` declaration. The path part may be omitted
    /// for formats that are not rooted in a file system.
    pub fn parse(declaration: &str) -> Result<Self> {
        let mut parts = declaration.splitn(3, ':');
        let (Some(name), Some(format)) = (parts.next(), parts.next()) else {
            return Err(anyhow!("Invalid input declaration: {declaration}").into());
        };
        if name.is_empty() || format.is_empty() {
            return Err(anyhow!("Invalid input declaration: {declaration}").into());
        }
        let paths = parts
            .next()
            .map(|p| {
                p.split(';')
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self::new(name, format, paths))
    }
}

impl Display for LogicalInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.format)?;
        if !self.paths.is_empty() {
            write!(f, ":{}", self.paths.iter().join(";"))?;
        }
        Ok(())
    }
}
