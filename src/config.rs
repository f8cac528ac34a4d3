use std::{env, sync::Arc};

use datafusion::common::{extensions_options, plan_err, DataFusionError};
use datafusion::config::{ConfigExtension, ConfigOptions, ExtensionOptions};
use object_store::{path::Path, ObjectStore};
use url::Url;

use crate::{logging::debug, result::Result};

extensions_options! {
    /// Configuration of the MapReduce job driver.
    pub struct MrConfig {
        /// Base location every job writes its output under, as an object store URL.
        /// Job `n` writes to `<output_dir>/job-<n>`.
        pub output_dir: String, default = "memory:///mapreduce".to_string()
        /// Deletes whatever is stored under a job's output location before submitting it.
        pub delete_existing: bool, default = false
        /// Upper bound in bytes of a single file split.
        pub split_size: usize, default = split_size_default()
    }
}

fn split_size_default() -> usize {
    if cfg!(test) || cfg!(feature = "integration") {
        16
    } else {
        128 * 1024 * 1024
    }
}

/// Environment variables overriding [MrConfig] fields.
const ENV_VARS: [(&str, &str); 3] = [
    ("MR_OUTPUT_DIR", "output_dir"),
    ("MR_DELETE_EXISTING", "delete_existing"),
    ("MR_SPLIT_SIZE", "split_size"),
];

impl MrConfig {
    /// Gets the [MrConfig] from the [ConfigOptions]'s extensions.
    pub fn from_config_options(cfg: &ConfigOptions) -> Result<&Self, DataFusionError> {
        let Some(mr_cfg) = cfg.extensions.get::<MrConfig>() else {
            return plan_err!("MrConfig is not in ConfigOptions.extensions");
        };
        Ok(mr_cfg)
    }

    /// Default configuration overridden by any `MR_*` environment variable set.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        for (var, key) in ENV_VARS {
            if let Ok(value) = env::var(var) {
                debug!("Setting mapreduce.{key} from {var}");
                cfg.set(key, &value)?;
            }
        }
        Ok(cfg)
    }

    /// Object store and base path `output_dir` points at.
    pub fn output_store(&self) -> Result<(Arc<dyn ObjectStore>, Path)> {
        let url = Url::parse(&self.output_dir).map_err(|e| {
            anyhow::anyhow!("Invalid mapreduce.output_dir {}: {e}", self.output_dir)
        })?;
        let (store, path) = object_store::parse_url(&url)?;
        Ok((Arc::from(store), path))
    }
}

impl ConfigExtension for MrConfig {
    const PREFIX: &'static str = "mapreduce";
}
