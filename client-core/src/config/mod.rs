use crate::error::ClientError;
use config::{Config as Cfg, File};
use serde::de::DeserializeOwned;

/// Loads a settings struct from `configuration.{toml,yaml,json}` (optional)
/// and environment variables with the given prefix, `__` separated.
///
/// A `.env` file in the working directory is applied first if present.
pub fn load<T: DeserializeOwned>(env_prefix: &str) -> Result<T, ClientError> {
    dotenvy::dotenv().ok();

    let config = Cfg::builder()
        .add_source(File::with_name("configuration").required(false))
        .add_source(config::Environment::with_prefix(env_prefix).separator("__"))
        .build()?;

    Ok(config.try_deserialize()?)
}
