use serde::{Deserialize, Serialize};

/// Metamodel-wide settings
///
/// Read from the `settings` block of a mapping document, or built in code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetamodelSettings {
    /// Build cache regions for collections whose mapping declares one
    pub second_level_cache: bool,

    /// Region capacity used when a cache mapping gives none
    pub default_cache_capacity: usize,

    /// Owner ids per generated load statement
    pub batch_fetch_size: usize,

    /// NULL slots a single list row may pad past the current list length
    pub max_list_position_gap: usize,
}

impl Default for MetamodelSettings {
    fn default() -> Self {
        Self {
            second_level_cache: true,
            default_cache_capacity: 1024,
            batch_fetch_size: 16,
            max_list_position_gap: 1024,
        }
    }
}

impl MetamodelSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable second-level collection caching
    pub fn second_level_cache(mut self, enabled: bool) -> Self {
        self.second_level_cache = enabled;
        self
    }

    /// Set the default cache region capacity
    pub fn default_cache_capacity(mut self, capacity: usize) -> Self {
        self.default_cache_capacity = capacity;
        self
    }

    /// Set the number of owners loaded per statement
    pub fn batch_fetch_size(mut self, size: usize) -> Self {
        self.batch_fetch_size = size;
        self
    }

    /// Set how far past the current list length a row's position may land
    pub fn max_list_position_gap(mut self, gap: usize) -> Self {
        self.max_list_position_gap = gap;
        self
    }

    /// Batch size never drops below one owner per statement.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_fetch_size.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let settings: MetamodelSettings =
            serde_json::from_str(r#"{ "batch_fetch_size": 4 }"#).unwrap();
        assert_eq!(settings.batch_fetch_size, 4);
        assert!(settings.second_level_cache);
        assert_eq!(settings.default_cache_capacity, 1024);
        assert_eq!(settings.max_list_position_gap, 1024);
    }

    #[test]
    fn test_builder_and_zero_batch() {
        let settings = MetamodelSettings::new()
            .second_level_cache(false)
            .batch_fetch_size(0)
            .max_list_position_gap(0);
        assert!(!settings.second_level_cache);
        assert_eq!(settings.max_list_position_gap, 0);
        assert_eq!(settings.effective_batch_size(), 1);
    }
}
