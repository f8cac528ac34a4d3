use async_trait::async_trait;

use crate::result::Result;
use crate::splits::{InputFormat, InputSplit, SplitContext};

/// Non path-rooted [InputFormat] producing a fixed number of opaque splits per input.
#[derive(Debug, Clone)]
pub struct StaticFormat {
    id: String,
    splits: usize,
}

impl StaticFormat {
    pub fn new(id: impl Into<String>, splits: usize) -> Self {
        Self {
            id: id.into(),
            splits,
        }
    }
}

#[async_trait]
impl InputFormat for StaticFormat {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_path_rooted(&self) -> bool {
        false
    }

    async fn splits(&self, ctx: &SplitContext<'_>) -> Result<Vec<InputSplit>> {
        Ok((0..self.splits)
            .map(|i| InputSplit::Opaque(format!("{}-{i}", ctx.input.name)))
            .collect())
    }
}
