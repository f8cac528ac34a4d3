mod assigner;
mod file;
mod input;

use std::{collections::HashMap, fmt::Display, sync::Arc};

use anyhow::anyhow;
use async_trait::async_trait;
use object_store::path::Path;

pub use assigner::{SplitAssigner, SplitRecord};
pub use file::FileFormat;
pub use input::LogicalInput;

use crate::result::Result;

/// One physical piece of work for a map task.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InputSplit {
    /// Byte range of an object discovered under a declared path.
    File {
        location: Path,
        offset: u64,
        length: u64,
    },
    /// Split of a format that is not rooted in a file system, opaque to the planner.
    Opaque(String),
}

impl InputSplit {
    pub fn location(&self) -> Option<&Path> {
        match self {
            InputSplit::File { location, .. } => Some(location),
            InputSplit::Opaque(_) => None,
        }
    }
}

impl Display for InputSplit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputSplit::File {
                location,
                offset,
                length,
            } => write!(f, "{location}:{offset}+{length}"),
            InputSplit::Opaque(s) => write!(f, "{s}"),
        }
    }
}

/// What a format gets to see when asked for its splits.
#[derive(Debug, Clone)]
pub struct SplitContext<'a> {
    /// The logical input the splits are requested for.
    pub input: &'a LogicalInput,
    /// Every declared path of the job's path-rooted inputs, in declaration order.
    /// File formats list all of them, not only the ones of `input`.
    pub paths: &'a [String],
    /// Upper bound in bytes of a single file split.
    pub split_size: usize,
}

/// Physical format of a logical input.
#[async_trait]
pub trait InputFormat: Send + Sync {
    /// Identifier logical inputs refer to this format by.
    fn id(&self) -> &str;

    /// Whether the format reads from file system paths. Splits of such formats are
    /// matched back to their logical input by path.
    fn is_path_rooted(&self) -> bool;

    async fn splits(&self, ctx: &SplitContext<'_>) -> Result<Vec<InputSplit>>;
}

/// Known physical formats by identifier.
#[derive(Clone, Default)]
pub struct FormatRegistry {
    formats: HashMap<String, Arc<dyn InputFormat>>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, format: impl InputFormat + 'static) -> Self {
        self.register(Arc::new(format));
        self
    }

    pub fn register(&mut self, format: Arc<dyn InputFormat>) {
        self.formats.insert(format.id().to_owned(), format);
    }

    /// Instantiates the physical format of a logical input.
    pub fn format(&self, id: &str) -> Result<Arc<dyn InputFormat>> {
        self.formats.get(id).cloned().ok_or_else(|| {
            anyhow!(
                "Unsupported input format: {id}. Registered formats are: {}",
                itertools::join(self.formats.keys(), ", ")
            )
            .into()
        })
    }
}

impl std::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.formats.keys()).finish()
    }
}
