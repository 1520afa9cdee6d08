use std::fmt::Debug;

use config::{ConfigError, Map, Source, Value};
use convert_case::{Case, Casing};
use derive_new::new;
use itertools::Itertools;

/// Re-cases every key component of the wrapped source, e.g. env var keys
/// arrive as `relay.gas_limit` and need to become `relay.gasLimit`.
#[derive(Clone, Debug, new)]
pub struct CaseAdapter<S> {
    inner: S,
    casing: Case,
}

impl<S> Source for CaseAdapter<S>
where
    S: Source + Clone + Send + Sync + 'static,
{
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> Result<Map<String, Value>, ConfigError> {
        self.inner.collect().map(|config| {
            config
                .into_iter()
                .map(|(k, v)| (recase_key(&k, self.casing), v))
                .collect()
        })
    }
}

/// Re-case each `.` separated component of `key`.
fn recase_key(key: &str, case: Case) -> String {
    key.split('.').map(|s| s.to_case(case)).join(".")
}
