use std::sync::OnceLock;

use pullmux_demux::DemuxConfig;

static CONFIG: OnceLock<DemuxConfig> = OnceLock::new();

/// Configuration shared by every context created in this process.
pub(crate) fn current() -> DemuxConfig {
    *CONFIG.get_or_init(DemuxConfig::default)
}

/// Load configuration from the environment the first time this is called.
/// Later calls keep the first result.
pub(crate) fn init_from_env() -> Result<DemuxConfig, String> {
    init_with(DemuxConfig::from_env)
}

fn init_with(
    load: impl FnOnce() -> pullmux_demux::Result<DemuxConfig>,
) -> Result<DemuxConfig, String> {
    if let Some(config) = CONFIG.get() {
        return Ok(*config);
    }
    let config = load().map_err(|err| err.to_string())?;
    Ok(*CONFIG.get_or_init(|| config))
}

#[cfg(test)]
mod tests {
    use pullmux_demux::{INITIAL_CAPACITY_ENV, MAX_PROBE_SIZE_ENV};

    use super::*;

    #[test]
    fn first_load_wins() {
        let first = init_with(|| Ok(DemuxConfig::default())).unwrap();
        let second = init_with(|| Ok(DemuxConfig::default().with_initial_capacity(16))).unwrap();
        assert_eq!(first, second);
        assert_eq!(current(), first);
    }

    #[test]
    fn env_errors_name_the_variable() {
        let err = DemuxConfig::from_lookup(|name| {
            (name == INITIAL_CAPACITY_ENV).then(|| "lots".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains(INITIAL_CAPACITY_ENV));

        let config =
            DemuxConfig::from_lookup(|name| (name == MAX_PROBE_SIZE_ENV).then(|| "0".to_string()))
                .unwrap();
        assert_eq!(config.max_capacity, None);
    }
}
