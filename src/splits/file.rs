use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use futures::TryStreamExt;
use object_store::{path::Path, ObjectStore};

use super::{InputFormat, InputSplit, SplitContext};
use crate::{logging::trace, result::Result};

/// Format identifier of [FileFormat].
pub const FILE_FORMAT_ID: &str = "file";

/// Path-rooted format over an [ObjectStore].
///
/// Like any file input format it is configured with the input paths of the whole job,
/// so it lists every declared path and cuts each object into `split_size` chunks. The
/// [super::SplitAssigner] then matches the chunks back to the logical input owning them.
#[derive(Debug, Clone)]
pub struct FileFormat {
    id: String,
    store: Arc<dyn ObjectStore>,
}

impl FileFormat {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self::with_id(FILE_FORMAT_ID, store)
    }

    pub fn with_id(id: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            id: id.into(),
            store,
        }
    }
}

/// Store path of a declared input path, which may also be given as a URL.
pub(crate) fn declared_path(declared: &str) -> Path {
    match url::Url::parse(declared) {
        Ok(url) => Path::from(url.path()),
        Err(_) => Path::from(declared),
    }
}

#[async_trait]
impl InputFormat for FileFormat {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_path_rooted(&self) -> bool {
        true
    }

    async fn splits(&self, ctx: &SplitContext<'_>) -> Result<Vec<InputSplit>> {
        let split_size = ctx.split_size.max(1) as u64;
        let mut splits = vec![];
        // declared paths may nest, an object is only cut once
        let mut seen = HashSet::new();
        for declared in ctx.paths {
            let prefix = declared_path(declared);
            let mut objects: Vec<_> = self.store.list(Some(&prefix)).try_collect().await?;
            objects.sort_by(|a, b| a.location.cmp(&b.location));
            trace!("Listed {} objects under {prefix}", objects.len());

            for object in objects {
                if !seen.insert(object.location.clone()) {
                    continue;
                }
                let mut offset = 0;
                // empty objects still yield a single, empty split
                loop {
                    let length = split_size.min(object.size - offset);
                    splits.push(InputSplit::File {
                        location: object.location.clone(),
                        offset,
                        length,
                    });
                    offset += length;
                    if offset >= object.size {
                        break;
                    }
                }
            }
        }
        Ok(splits)
    }
}
