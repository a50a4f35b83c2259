use anode::{Configuration, Configurator, Container, StdError, TypeCatalog};

use crate::{Config, TracingConfig, init_tracing};

/// Builds a container from an application config.
///
/// Tracing is initialized first when the config has a `tracing` section, then
/// the `container` section, if any, is applied through a [`Configurator`].
pub fn bootstrap(config: &Config, types: TypeCatalog) -> Result<Container, StdError> {
    if let Some(tracing_config) = config.section::<TracingConfig>()? {
        init_tracing(&tracing_config)?;
    }
    let container = Container::new(types);
    if let Some(configuration) = config.section::<Configuration>()? {
        container.use_configurator(&Configurator::new(configuration))?;
    }
    tracing::info!("Container bootstrapped");
    Ok(container)
}
