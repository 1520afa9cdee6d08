use std::collections::HashMap;
use std::env;
use std::error::Error;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use convert_case::Case;
use eyre::{Context, Result};
use serde::de::DeserializeOwned;

use self::case_adapter::CaseAdapter;

mod case_adapter;

/// Load a settings object from the config locations.
/// Further documentation can be found in the `settings` module.
pub fn load_settings_object<T>(agent_prefix: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let config_files: Vec<String> = env::var("CONFIG_FILES")
        .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
        .unwrap_or_default();
    load_settings_from(
        &PathBuf::from("./config"),
        &config_files,
        env::vars().collect(),
        agent_prefix,
    )
}

/// Load from an explicit config directory, extra files, and environment.
pub(crate) fn load_settings_from<T>(
    config_dir: &Path,
    config_files: &[String],
    env: HashMap<String, String>,
    agent_prefix: &str,
) -> Result<T>
where
    T: DeserializeOwned,
{
    let prefix = format!("TELEPORT_{}", agent_prefix).to_ascii_uppercase();

    let mut base_config_sources = vec![];
    let mut builder = Config::builder();

    // Always load the default config files (`./config/*.json`) when there are any
    if config_dir.is_dir() {
        let mut paths = config_dir
            .read_dir()
            .with_context(|| format!("Failed to open config directory {config_dir:?}"))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && path.extension().map_or(false, |e| e == "json"))
            .collect::<Vec<_>>();
        paths.sort();
        for path in paths {
            base_config_sources.push(format!("{:?}", path));
            builder = builder.add_source(File::from(path));
        }
    }

    // Load a set of additional user specified config files
    let builder = config_files
        .iter()
        .filter(|path| !path.is_empty())
        .fold(builder, |builder, path| {
            builder.add_source(File::with_name(path))
        });

    let config_deserializer = builder
        // Use a base configuration env variable prefix
        .add_source(CaseAdapter::new(
            Environment::with_prefix("TELEPORT_BASE")
                .prefix_separator("_")
                .separator("__")
                .source(Some(env.clone())),
            Case::Camel,
        ))
        .add_source(CaseAdapter::new(
            Environment::with_prefix(&prefix)
                .prefix_separator("_")
                .separator("__")
                .source(Some(env)),
            Case::Camel,
        ))
        .build()?;

    match Config::try_deserialize::<T>(config_deserializer) {
        Ok(cfg) => Ok(cfg),
        Err(err) => {
            let mut err = if let Some(source_err) = err.source() {
                let source = format!("Config error source: {source_err}");
                Err(err).context(source)
            } else {
                Err(err.into())
            };

            for cfg_path in base_config_sources.iter().chain(config_files.iter()) {
                err = err.with_context(|| format!("Config loaded: {cfg_path}"));
            }

            err.context("Config deserialization error, please check the settings documentation")
        }
    }
}
