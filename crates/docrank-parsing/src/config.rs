use docrank_core::config_file::HeadingsConfig;

use crate::ParsingError;

/// How headings are recognised in the page layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadingStrategy {
    /// Per-page rule: large font relative to the page maximum, title case,
    /// short, printable, starting with a letter.
    #[default]
    Layout,
    /// Document-wide rule: font size at least `average_size_threshold` times
    /// the average line size.
    AverageSize,
}

impl std::str::FromStr for HeadingStrategy {
    type Err = ParsingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "layout" => Ok(HeadingStrategy::Layout),
            "average-size" | "average_size" | "average" => Ok(HeadingStrategy::AverageSize),
            other => Err(ParsingError::InvalidConfig(format!(
                "unknown heading strategy: {other}"
            ))),
        }
    }
}

/// Thresholds for heading detection and section body extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingConfig {
    pub(crate) strategy: HeadingStrategy,
    /// Minimum line font size as a fraction of the page's largest font (default: 0.9).
    pub(crate) size_ratio: f32,
    /// Headings must be strictly shorter than this many characters (default: 80).
    pub(crate) max_heading_chars: usize,
    /// Body collection stops once it exceeds this many characters (default: 1200).
    pub(crate) max_section_chars: usize,
    /// Require the line to equal its own title-cased form (default: true).
    pub(crate) require_title_case: bool,
    /// Multiplier over the average font size for [`HeadingStrategy::AverageSize`] (default: 1.5).
    pub(crate) average_size_threshold: f32,
}

impl Default for HeadingConfig {
    fn default() -> Self {
        Self {
            strategy: HeadingStrategy::Layout,
            size_ratio: 0.9,
            max_heading_chars: 80,
            max_section_chars: 1200,
            require_title_case: true,
            average_size_threshold: 1.5,
        }
    }
}

impl HeadingConfig {
    pub fn strategy(&self) -> HeadingStrategy {
        self.strategy
    }

    pub fn max_section_chars(&self) -> usize {
        self.max_section_chars
    }
}

/// Builder for [`HeadingConfig`]. Fails fast in [`build()`](Self::build) on
/// out-of-range thresholds.
#[derive(Debug, Clone, Default)]
pub struct HeadingConfigBuilder {
    strategy: Option<HeadingStrategy>,
    size_ratio: Option<f32>,
    max_heading_chars: Option<usize>,
    max_section_chars: Option<usize>,
    require_title_case: Option<bool>,
    average_size_threshold: Option<f32>,
}

impl HeadingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the builder from the `[headings]` section of a config file.
    pub fn from_file(file: &HeadingsConfig) -> Result<Self, ParsingError> {
        let strategy = file.strategy.as_deref().map(str::parse).transpose()?;
        Ok(Self {
            strategy,
            size_ratio: file.size_ratio,
            max_heading_chars: file.max_heading_chars,
            max_section_chars: file.max_section_chars,
            require_title_case: file.require_title_case,
            average_size_threshold: file.average_size_threshold,
        })
    }

    pub fn strategy(mut self, strategy: HeadingStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn size_ratio(mut self, ratio: f32) -> Self {
        self.size_ratio = Some(ratio);
        self
    }

    pub fn max_heading_chars(mut self, n: usize) -> Self {
        self.max_heading_chars = Some(n);
        self
    }

    pub fn max_section_chars(mut self, n: usize) -> Self {
        self.max_section_chars = Some(n);
        self
    }

    pub fn require_title_case(mut self, yes: bool) -> Self {
        self.require_title_case = Some(yes);
        self
    }

    pub fn average_size_threshold(mut self, threshold: f32) -> Self {
        self.average_size_threshold = Some(threshold);
        self
    }

    pub fn build(self) -> Result<HeadingConfig, ParsingError> {
        let defaults = HeadingConfig::default();
        let config = HeadingConfig {
            strategy: self.strategy.unwrap_or(defaults.strategy),
            size_ratio: self.size_ratio.unwrap_or(defaults.size_ratio),
            max_heading_chars: self.max_heading_chars.unwrap_or(defaults.max_heading_chars),
            max_section_chars: self.max_section_chars.unwrap_or(defaults.max_section_chars),
            require_title_case: self.require_title_case.unwrap_or(defaults.require_title_case),
            average_size_threshold: self
                .average_size_threshold
                .unwrap_or(defaults.average_size_threshold),
        };

        if !(config.size_ratio > 0.0 && config.size_ratio <= 1.0) {
            return Err(ParsingError::InvalidConfig(format!(
                "size_ratio must be in (0, 1], got {}",
                config.size_ratio
            )));
        }
        if config.max_heading_chars == 0 {
            return Err(ParsingError::InvalidConfig(
                "max_heading_chars must be positive".into(),
            ));
        }
        if !(config.average_size_threshold > 0.0) {
            return Err(ParsingError::InvalidConfig(format!(
                "average_size_threshold must be positive, got {}",
                config.average_size_threshold
            )));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = HeadingConfigBuilder::new().build().unwrap();
        assert_eq!(config, HeadingConfig::default());
        assert_eq!(config.size_ratio, 0.9);
        assert_eq!(config.max_section_chars(), 1200);
    }

    #[test]
    fn rejects_out_of_range_ratio() {
        assert!(HeadingConfigBuilder::new().size_ratio(1.5).build().is_err());
        assert!(HeadingConfigBuilder::new().size_ratio(0.0).build().is_err());
    }

    #[test]
    fn from_file_parses_strategy() {
        let file = HeadingsConfig {
            strategy: Some("average-size".into()),
            max_section_chars: Some(500),
            ..Default::default()
        };
        let config = HeadingConfigBuilder::from_file(&file).unwrap().build().unwrap();
        assert_eq!(config.strategy(), HeadingStrategy::AverageSize);
        assert_eq!(config.max_section_chars(), 500);
    }

    #[test]
    fn from_file_rejects_unknown_strategy() {
        let file = HeadingsConfig {
            strategy: Some("fonts".into()),
            ..Default::default()
        };
        assert!(HeadingConfigBuilder::from_file(&file).is_err());
    }
}
