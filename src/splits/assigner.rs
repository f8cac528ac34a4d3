use std::sync::Arc;

use itertools::Itertools;

use super::{file::declared_path, FormatRegistry, InputSplit, LogicalInput, SplitContext};
use crate::{
    logging::debug,
    result::{MrError, Result},
};

/// A physical split tagged with the logical input it belongs to, so that the record
/// reader can demultiplex the job's splits again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitRecord {
    pub split: InputSplit,
    pub format_id: String,
    pub input_index: usize,
}

/// Collects the physical splits of every logical input a job declares.
#[derive(Debug, Clone)]
pub struct SplitAssigner {
    registry: Arc<FormatRegistry>,
    split_size: usize,
}

impl SplitAssigner {
    pub fn new(registry: Arc<FormatRegistry>, split_size: usize) -> Self {
        Self {
            registry,
            split_size,
        }
    }

    /// Assigns splits to `inputs`, tagging each with its position in the slice.
    pub async fn assign(&self, inputs: &[LogicalInput]) -> Result<Vec<SplitRecord>> {
        let indexed = inputs.iter().enumerate().collect_vec();
        self.assign_indexed(&indexed).await
    }

    /// Assigns splits to logical inputs given together with the index they are tagged
    /// with, which is their position in the static context.
    pub async fn assign_indexed(
        &self,
        inputs: &[(usize, &LogicalInput)],
    ) -> Result<Vec<SplitRecord>> {
        let mut formats = Vec::with_capacity(inputs.len());
        for (_, input) in inputs {
            formats.push(self.registry.format(&input.format)?);
        }

        // file formats are handed the paths of the whole job
        let paths = inputs
            .iter()
            .zip(&formats)
            .filter(|(_, format)| format.is_path_rooted())
            .flat_map(|((_, input), _)| input.paths.iter().cloned())
            .collect_vec();

        let mut records = vec![];
        for ((index, input), format) in inputs.iter().zip(formats) {
            let ctx = SplitContext {
                input,
                paths: &paths,
                split_size: self.split_size,
            };
            let discovered = format.splits(&ctx).await?;

            let before = records.len();
            if format.is_path_rooted() {
                let declared = input.paths.iter().map(|p| declared_path(p)).collect_vec();
                let mut matched = vec![false; declared.len()];
                for split in discovered.into_iter().unique() {
                    let Some(location) = split.location() else {
                        continue;
                    };
                    let mut owned = false;
                    for (path, hit) in declared.iter().zip(matched.iter_mut()) {
                        if location.prefix_matches(path) {
                            *hit = true;
                            owned = true;
                        }
                    }
                    if owned {
                        records.push(SplitRecord {
                            split,
                            format_id: format.id().to_owned(),
                            input_index: *index,
                        });
                    }
                }
                // every declared path has to contribute, not just the input as a whole
                let unmatched = if input.paths.is_empty() {
                    Some(String::new())
                } else {
                    input
                        .paths
                        .iter()
                        .zip(&matched)
                        .find(|(_, hit)| !**hit)
                        .map(|(path, _)| path.clone())
                };
                if let Some(path) = unmatched {
                    return Err(MrError::UnmatchedInput {
                        index: *index,
                        name: input.name.clone(),
                        path,
                    });
                }
            } else {
                records.extend(discovered.into_iter().unique().map(|split| SplitRecord {
                    split,
                    format_id: format.id().to_owned(),
                    input_index: *index,
                }));
            }
            debug!(
                "Assigned {} splits to input {index} ({})",
                records.len() - before,
                input.name
            );
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splits::FileFormat;
    use crate::test_utils::splits::StaticFormat;
    use object_store::{memory::InMemory, path::Path, ObjectStore};

    async fn store_with(paths: &[&str]) -> Result<Arc<InMemory>> {
        let store = Arc::new(InMemory::new());
        for path in paths {
            store.put(&Path::from(*path), vec![1u8; 8].into()).await?;
        }
        Ok(store)
    }

    #[tokio::test]
    async fn test_file_splits_follow_declared_paths() -> Result<()> {
        let store = store_with(&["data/l/0", "data/l/1", "data/o/0"]).await?;
        let registry = FormatRegistry::new().with_format(FileFormat::new(store));
        let assigner = SplitAssigner::new(Arc::new(registry), 1024);

        let inputs = vec![
            LogicalInput::parse("lineitem:file:/data/l")?,
            LogicalInput::parse("orders:file:/data/o")?,
        ];
        let records = assigner.assign(&inputs).await?;
        assert_eq!(records.len(), 3);
        for record in &records {
            let location = record.split.location().unwrap().to_string();
            let expected = if location.starts_with("data/l/") { 0 } else { 1 };
            assert_eq!(record.input_index, expected, "{location}");
            assert_eq!(record.format_id, "file");
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_non_path_formats_attach_everything() -> Result<()> {
        let registry = FormatRegistry::new().with_format(StaticFormat::new("static", 3));
        let assigner = SplitAssigner::new(Arc::new(registry), 1024);

        let records = assigner
            .assign_indexed(&[(4, &LogicalInput::parse("numbers:static")?)])
            .await?;
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.input_index == 4));
        Ok(())
    }

    #[tokio::test]
    async fn test_unmatched_declared_input_is_an_error() -> Result<()> {
        let store = store_with(&["data/l/0"]).await?;
        let registry = FormatRegistry::new().with_format(FileFormat::new(store));
        let assigner = SplitAssigner::new(Arc::new(registry), 1024);

        let inputs = vec![
            LogicalInput::parse("lineitem:file:/data/l")?,
            LogicalInput::parse("missing:file:/data/nothing")?,
        ];
        let err = assigner.assign(&inputs).await.unwrap_err();
        assert!(matches!(err, MrError::UnmatchedInput { index: 1, .. }), "{err}");
        Ok(())
    }

    #[tokio::test]
    async fn test_every_declared_path_must_match() -> Result<()> {
        let store = store_with(&["data/a/0"]).await?;
        let registry = FormatRegistry::new().with_format(FileFormat::new(store));
        let assigner = SplitAssigner::new(Arc::new(registry), 1024);

        let inputs = vec![LogicalInput::parse("a:file:/data/a;/data/missing")?];
        let err = assigner.assign(&inputs).await.unwrap_err();
        let MrError::UnmatchedInput { index, path, .. } = &err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(*index, 0);
        assert_eq!(path, "/data/missing");
        Ok(())
    }

    #[tokio::test]
    async fn test_nested_declared_paths_yield_each_split_once() -> Result<()> {
        let store = store_with(&["data/a/0", "data/a/sub/1"]).await?;
        let registry = FormatRegistry::new().with_format(FileFormat::new(store));
        let assigner = SplitAssigner::new(Arc::new(registry), 1024);

        let inputs = vec![LogicalInput::parse("a:file:/data/a;/data/a/sub")?];
        let records = assigner.assign(&inputs).await?;
        let locations = records
            .iter()
            .map(|r| r.split.location().unwrap().to_string())
            .collect_vec();
        assert_eq!(locations, vec!["data/a/0", "data/a/sub/1"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_format() -> Result<()> {
        let assigner = SplitAssigner::new(Arc::new(FormatRegistry::new()), 1024);
        let err = assigner
            .assign(&[LogicalInput::parse("x:parquet:/data/x")?])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unsupported input format: parquet"));
        Ok(())
    }
}
