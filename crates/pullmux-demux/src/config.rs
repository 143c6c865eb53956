use pullmux_queue::{QueueError, DEFAULT_INITIAL_CAPACITY};

use crate::error::Result;

/// Default ceiling on queue growth while probing: 64 MiB.
pub const DEFAULT_MAX_CAPACITY: usize = 64 * 1024 * 1024;

/// Environment variable overriding [`DemuxConfig::initial_capacity`].
pub const INITIAL_CAPACITY_ENV: &str = "PULLMUX_INITIAL_CAPACITY";

/// Environment variable overriding [`DemuxConfig::max_capacity`]. `0`
/// disables the ceiling.
pub const MAX_PROBE_SIZE_ENV: &str = "PULLMUX_MAX_PROBE_SIZE";

/// Buffer sizing for a demux context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemuxConfig {
    /// Initial queue capacity, which is also the first probe size.
    pub initial_capacity: usize,
    /// Largest capacity probing may grow to. `None` disables the ceiling.
    pub max_capacity: Option<usize>,
}

impl Default for DemuxConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_capacity: Some(DEFAULT_MAX_CAPACITY),
        }
    }
}

impl DemuxConfig {
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    pub fn with_max_capacity(mut self, max_capacity: Option<usize>) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    /// Apply a probe-size ceiling given as a byte count, where `0` means
    /// unlimited.
    pub fn with_max_probe_size(self, max_probe_size: usize) -> Self {
        self.with_max_capacity((max_probe_size > 0).then_some(max_probe_size))
    }

    /// Defaults overridden by [`INITIAL_CAPACITY_ENV`] and
    /// [`MAX_PROBE_SIZE_ENV`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through
    /// `lookup`. Unset or blank variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(value) = parse_size(&lookup, INITIAL_CAPACITY_ENV)? {
            config.initial_capacity = value;
        }
        if let Some(value) = parse_size(&lookup, MAX_PROBE_SIZE_ENV)? {
            config = config.with_max_probe_size(value);
        }
        config.validate()?;
        Ok(config)
    }

    /// Check the sizing is usable: a non-zero initial capacity that does not
    /// exceed the ceiling.
    pub fn validate(&self) -> Result<()> {
        if self.initial_capacity == 0 {
            return Err(QueueError::InvalidCapacity(
                "initial capacity must be greater than zero".to_string(),
            )
            .into());
        }
        match self.max_capacity {
            Some(max) if max < self.initial_capacity => Err(QueueError::InvalidCapacity(format!(
                "max probe size {max} is below initial capacity {}",
                self.initial_capacity
            ))
            .into()),
            _ => Ok(()),
        }
    }
}

fn parse_size(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<usize>> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.trim().parse::<usize>().map(Some).map_err(|_| {
            QueueError::InvalidCapacity(format!("{name} must be a byte count, got {raw:?}")).into()
        }),
    }
}
