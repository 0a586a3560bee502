/// How the image file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    ReadOnly,
    #[default]
    ReadWrite,
}

/// What a record's `instruction_count` holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountMode {
    /// Units copied for that section alone.
    #[default]
    PerSection,
    /// Running total of units copied so far in the load, snapshotted per record.
    Cumulative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    pub access: AccessMode,
    pub count_mode: CountMode,
    /// Stage `SHT_NOBITS` sections as zeros instead of leaving them empty.
    pub zero_fill_nobits: bool,
    /// Most zero bytes a single load may stage; larger loads fail before any write.
    pub max_zero_fill: u64,
}

/// Default cap on zero-filled bytes per load.
pub const DEFAULT_MAX_ZERO_FILL: u64 = 64 << 20;

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            access: AccessMode::default(),
            count_mode: CountMode::default(),
            zero_fill_nobits: true,
            max_zero_fill: DEFAULT_MAX_ZERO_FILL,
        }
    }
}

impl LoaderConfig {
    pub fn access(mut self, access: AccessMode) -> Self {
        self.access = access;
        self
    }

    pub fn count_mode(mut self, count_mode: CountMode) -> Self {
        self.count_mode = count_mode;
        self
    }

    pub fn zero_fill_nobits(mut self, zero_fill: bool) -> Self {
        self.zero_fill_nobits = zero_fill;
        self
    }

    pub fn max_zero_fill(mut self, limit: u64) -> Self {
        self.max_zero_fill = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = LoaderConfig::default();
        assert_eq!(config.access, AccessMode::ReadWrite);
        assert_eq!(config.count_mode, CountMode::PerSection);
        assert!(config.zero_fill_nobits);
        assert_eq!(config.max_zero_fill, 64 << 20);
    }

    #[test]
    fn setters() {
        let config = LoaderConfig::default()
            .access(AccessMode::ReadOnly)
            .count_mode(CountMode::Cumulative)
            .zero_fill_nobits(false)
            .max_zero_fill(4096);
        assert_eq!(config.access, AccessMode::ReadOnly);
        assert_eq!(config.count_mode, CountMode::Cumulative);
        assert!(!config.zero_fill_nobits);
        assert_eq!(config.max_zero_fill, 4096);
    }
}
