//! Strongly typed report configuration and the three-tier merge.
//!
//! Configuration comes from three places, applied field by field in order:
//!
//! 1. [`ReportConfig::default`]: built-in defaults
//! 2. an external document, usually a JSON file (see [`ReportConfigOverrides::from_path`])
//! 3. explicit overrides from the caller, such as CLI flags
//!
//! [`merge`] applies the tiers and validates the result once. A config that
//! fails validation never reaches the renderer.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

/// Default line width of the rendered report.
pub const DEFAULT_LINE_WIDTH: usize = 146;
/// Narrowest line width a report may be configured with.
pub const MIN_LINE_WIDTH: usize = 40;

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Throughput cutoffs in records/second. A rate must be strictly greater than
/// a cutoff to reach its band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub excellent: f64,
    pub good: f64,
    pub average: f64,
    pub slow: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            excellent: 1000.0,
            good: 500.0,
            average: 100.0,
            slow: 10.0,
        }
    }
}

impl ThresholdConfig {
    /// Check `excellent > good > average > slow >= 0`, all finite.
    pub fn validate(&self) -> Result<()> {
        let values = [self.excellent, self.good, self.average, self.slow];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ReportError::config("rate thresholds must be finite"));
        }
        if self.slow < 0.0 {
            return Err(ReportError::config("slow threshold must not be negative"));
        }
        if !(self.excellent > self.good && self.good > self.average && self.average > self.slow) {
            return Err(ReportError::config(format!(
                "rate thresholds must be strictly descending \
                 (excellent {} > good {} > average {} > slow {})",
                self.excellent, self.good, self.average, self.slow
            )));
        }
        Ok(())
    }
}

/// Memory-per-record cutoffs in bytes. Above `excessive` is critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryThresholds {
    pub efficient: u64,
    pub acceptable: u64,
    pub concerning: u64,
    pub excessive: u64,
}

impl Default for MemoryThresholds {
    fn default() -> Self {
        Self {
            efficient: 1024,
            acceptable: 5 * 1024,
            concerning: 20 * 1024,
            excessive: 100 * 1024,
        }
    }
}

impl MemoryThresholds {
    /// Check `0 < efficient < acceptable < concerning < excessive`.
    pub fn validate(&self) -> Result<()> {
        if self.efficient == 0 {
            return Err(ReportError::config("efficient memory threshold must be positive"));
        }
        if !(self.efficient < self.acceptable
            && self.acceptable < self.concerning
            && self.concerning < self.excessive)
        {
            return Err(ReportError::config(format!(
                "memory thresholds must be strictly ascending \
                 (efficient {} < acceptable {} < concerning {} < excessive {})",
                self.efficient, self.acceptable, self.concerning, self.excessive
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Display, progress and sections
// ---------------------------------------------------------------------------

/// Layout of the rendered report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub line_width: usize,
    pub styling: bool,
    pub filler: char,
    /// Rows in the top-N chart.
    pub top_n: usize,
    /// Longest bar in the distribution section.
    pub distribution_bar_chars: usize,
    /// Longest bar in the top-N chart.
    pub chart_bar_chars: usize,
    /// Job name column in the chart and detailed table.
    pub name_width: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            line_width: DEFAULT_LINE_WIDTH,
            styling: true,
            filler: '.',
            top_n: 5,
            distribution_bar_chars: 50,
            chart_bar_chars: 60,
            name_width: 28,
        }
    }
}

impl DisplayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.line_width < MIN_LINE_WIDTH {
            return Err(ReportError::config(format!(
                "line width {} is below the minimum of {MIN_LINE_WIDTH}",
                self.line_width
            )));
        }
        if self.filler.is_control() {
            return Err(ReportError::config("filler must be a printable character"));
        }
        for (name, value) in [
            ("top_n", self.top_n),
            ("distribution_bar_chars", self.distribution_bar_chars),
            ("chart_bar_chars", self.chart_bar_chars),
            ("name_width", self.name_width),
        ] {
            if value == 0 {
                return Err(ReportError::config(format!("{name} must be positive")));
            }
        }
        Ok(())
    }
}

/// Live progress bar settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Template with `{bar}`, `{percent}`, `{elapsed}`, `{remaining}` and `{memory}` tokens.
    pub template: String,
    pub bar_width: usize,
    /// Redraw every N advances; `None` derives it from the job size.
    pub redraw_every: Option<u64>,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            template: "{bar} {percent} | {elapsed} elapsed | {remaining} remaining | {memory}"
                .to_string(),
            bar_width: 30,
            redraw_every: None,
        }
    }
}

impl ProgressConfig {
    pub fn validate(&self) -> Result<()> {
        if self.bar_width == 0 {
            return Err(ReportError::config("progress bar width must be positive"));
        }
        if self.redraw_every == Some(0) {
            return Err(ReportError::config("progress redraw interval must be positive"));
        }
        Ok(())
    }
}

/// Optional report sections. The summary is always rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    PerformanceDistribution,
    PerformanceCharts,
    DetailedTable,
    SystemInfo,
    Recommendations,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::PerformanceDistribution,
        Section::PerformanceCharts,
        Section::DetailedTable,
        Section::SystemInfo,
        Section::Recommendations,
    ];

    /// Configuration key of the section.
    pub fn key(self) -> &'static str {
        match self {
            Self::PerformanceDistribution => "performance_distribution",
            Self::PerformanceCharts => "performance_charts",
            Self::DetailedTable => "detailed_table",
            Self::SystemInfo => "system_info",
            Self::Recommendations => "recommendations",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Section {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim();
        Self::ALL
            .into_iter()
            .find(|section| section.key() == key)
            .ok_or_else(|| ReportError::config(format!("unknown report section '{key}'")))
    }
}

/// Per-section enable switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionConfig {
    pub detailed_table: bool,
    pub system_info: bool,
    pub performance_distribution: bool,
    pub performance_charts: bool,
    pub recommendations: bool,
}

impl Default for SectionConfig {
    fn default() -> Self {
        Self::all()
    }
}

impl SectionConfig {
    /// Every section enabled.
    pub fn all() -> Self {
        Self {
            detailed_table: true,
            system_info: true,
            performance_distribution: true,
            performance_charts: true,
            recommendations: true,
        }
    }

    /// Every optional section disabled (summary only).
    pub fn none() -> Self {
        Self {
            detailed_table: false,
            system_info: false,
            performance_distribution: false,
            performance_charts: false,
            recommendations: false,
        }
    }

    pub fn is_enabled(&self, section: Section) -> bool {
        match section {
            Section::DetailedTable => self.detailed_table,
            Section::SystemInfo => self.system_info,
            Section::PerformanceDistribution => self.performance_distribution,
            Section::PerformanceCharts => self.performance_charts,
            Section::Recommendations => self.recommendations,
        }
    }

    pub fn set(&mut self, section: Section, enabled: bool) {
        let slot = match section {
            Section::DetailedTable => &mut self.detailed_table,
            Section::SystemInfo => &mut self.system_info,
            Section::PerformanceDistribution => &mut self.performance_distribution,
            Section::PerformanceCharts => &mut self.performance_charts,
            Section::Recommendations => &mut self.recommendations,
        };
        *slot = enabled;
    }

    /// Build from `(key, enabled)` pairs on top of the defaults. Unknown keys fail.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, bool)>) -> Result<Self> {
        let mut sections = Self::default();
        for (key, enabled) in pairs {
            sections.set(key.parse()?, enabled);
        }
        Ok(sections)
    }
}

// ---------------------------------------------------------------------------
// Aggregate config
// ---------------------------------------------------------------------------

/// Complete, validated report configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    pub thresholds: ThresholdConfig,
    pub memory: MemoryThresholds,
    pub display: DisplayConfig,
    pub sections: SectionConfig,
    pub progress: ProgressConfig,
}

impl ReportConfig {
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        self.memory.validate()?;
        self.display.validate()?;
        self.progress.validate()
    }

    /// Apply one tier of overrides field by field.
    pub fn apply(&mut self, o: &ReportConfigOverrides) {
        if let Some(t) = &o.thresholds {
            set(&mut self.thresholds.excellent, t.excellent);
            set(&mut self.thresholds.good, t.good);
            set(&mut self.thresholds.average, t.average);
            set(&mut self.thresholds.slow, t.slow);
        }
        if let Some(m) = &o.memory {
            set(&mut self.memory.efficient, m.efficient);
            set(&mut self.memory.acceptable, m.acceptable);
            set(&mut self.memory.concerning, m.concerning);
            set(&mut self.memory.excessive, m.excessive);
        }
        if let Some(d) = &o.display {
            set(&mut self.display.line_width, d.line_width);
            set(&mut self.display.styling, d.styling);
            set(&mut self.display.filler, d.filler);
            set(&mut self.display.top_n, d.top_n);
            set(&mut self.display.distribution_bar_chars, d.distribution_bar_chars);
            set(&mut self.display.chart_bar_chars, d.chart_bar_chars);
            set(&mut self.display.name_width, d.name_width);
        }
        if let Some(s) = &o.sections {
            set(&mut self.sections.detailed_table, s.detailed_table);
            set(&mut self.sections.system_info, s.system_info);
            set(
                &mut self.sections.performance_distribution,
                s.performance_distribution,
            );
            set(&mut self.sections.performance_charts, s.performance_charts);
            set(&mut self.sections.recommendations, s.recommendations);
        }
        if let Some(p) = &o.progress {
            if let Some(template) = &p.template {
                self.progress.template = template.clone();
            }
            set(&mut self.progress.bar_width, p.bar_width);
            if p.redraw_every.is_some() {
                self.progress.redraw_every = p.redraw_every;
            }
        }
    }
}

fn set<T: Copy>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

/// Merge `defaults <- external <- overrides` and validate the result.
pub fn merge(
    defaults: ReportConfig,
    external: &ReportConfigOverrides,
    overrides: &ReportConfigOverrides,
) -> Result<ReportConfig> {
    let mut config = defaults;
    config.apply(external);
    config.apply(overrides);
    config.validate()?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThresholdOverrides {
    pub excellent: Option<f64>,
    pub good: Option<f64>,
    pub average: Option<f64>,
    pub slow: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemoryOverrides {
    pub efficient: Option<u64>,
    pub acceptable: Option<u64>,
    pub concerning: Option<u64>,
    pub excessive: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayOverrides {
    pub line_width: Option<usize>,
    pub styling: Option<bool>,
    pub filler: Option<char>,
    pub top_n: Option<usize>,
    pub distribution_bar_chars: Option<usize>,
    pub chart_bar_chars: Option<usize>,
    pub name_width: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SectionOverrides {
    pub detailed_table: Option<bool>,
    pub system_info: Option<bool>,
    pub performance_distribution: Option<bool>,
    pub performance_charts: Option<bool>,
    pub recommendations: Option<bool>,
}

impl SectionOverrides {
    /// Switch one section by key. Unknown keys fail.
    pub fn set_key(&mut self, key: &str, enabled: bool) -> Result<()> {
        let slot = match key.parse::<Section>()? {
            Section::DetailedTable => &mut self.detailed_table,
            Section::SystemInfo => &mut self.system_info,
            Section::PerformanceDistribution => &mut self.performance_distribution,
            Section::PerformanceCharts => &mut self.performance_charts,
            Section::Recommendations => &mut self.recommendations,
        };
        *slot = Some(enabled);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProgressOverrides {
    pub template: Option<String>,
    pub bar_width: Option<usize>,
    pub redraw_every: Option<u64>,
}

/// One tier of partial configuration. Absent fields leave the lower tier untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfigOverrides {
    pub thresholds: Option<ThresholdOverrides>,
    pub memory: Option<MemoryOverrides>,
    pub display: Option<DisplayOverrides>,
    pub sections: Option<SectionOverrides>,
    pub progress: Option<ProgressOverrides>,
}

impl ReportConfigOverrides {
    /// Parse overrides from a JSON document. An unknown section key is a
    /// configuration error; any other unknown or malformed field is a parse error.
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| ReportError::Parse(format!("failed to parse config JSON: {e}")))?;
        if let Some(sections) = value.get("sections").and_then(|v| v.as_object()) {
            for key in sections.keys() {
                key.parse::<Section>()?;
            }
        }
        serde_json::from_value(value)
            .map_err(|e| ReportError::Parse(format!("failed to parse config JSON: {e}")))
    }

    /// Load overrides from a JSON file on disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn display_mut(&mut self) -> &mut DisplayOverrides {
        self.display.get_or_insert_with(DisplayOverrides::default)
    }

    pub fn sections_mut(&mut self) -> &mut SectionOverrides {
        self.sections.get_or_insert_with(SectionOverrides::default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ReportConfig::default();
        config.validate().unwrap();
        assert_eq!(config.display.line_width, 146);
        assert_eq!(config.thresholds.excellent, 1000.0);
        assert_eq!(config.thresholds.slow, 10.0);
    }

    #[test]
    fn thresholds_must_descend() {
        let t = ThresholdConfig {
            excellent: 500.0,
            good: 500.0,
            average: 100.0,
            slow: 10.0,
        };
        assert!(matches!(t.validate(), Err(ReportError::Configuration(_))));
        let t = ThresholdConfig {
            slow: -1.0,
            ..ThresholdConfig::default()
        };
        assert!(t.validate().is_err());
        let t = ThresholdConfig {
            good: f64::NAN,
            ..ThresholdConfig::default()
        };
        assert!(t.validate().is_err());
    }

    #[test]
    fn memory_thresholds_must_ascend() {
        let m = MemoryThresholds {
            acceptable: 100,
            ..MemoryThresholds::default()
        };
        assert!(m.validate().is_err());
    }

    #[test]
    fn narrow_width_is_rejected() {
        let mut config = ReportConfig::default();
        config.display.line_width = 39;
        assert!(config.validate().is_err());
        config.display.line_width = 40;
        config.validate().unwrap();
    }

    #[test]
    fn merge_applies_tiers_in_order() {
        let external = ReportConfigOverrides::from_json(
            r#"{"thresholds": {"excellent": 2000, "good": 800}, "display": {"line_width": 100}}"#,
        )
        .unwrap();
        let mut overrides = ReportConfigOverrides::default();
        overrides.display_mut().line_width = Some(80);
        overrides.display_mut().styling = Some(false);

        let config = merge(ReportConfig::default(), &external, &overrides).unwrap();
        assert_eq!(config.thresholds.excellent, 2000.0);
        assert_eq!(config.thresholds.good, 800.0);
        // untouched fields keep their defaults
        assert_eq!(config.thresholds.average, 100.0);
        assert_eq!(config.display.line_width, 80);
        assert!(!config.display.styling);
        assert_eq!(config.display.top_n, 5);
    }

    #[test]
    fn merge_validates_result() {
        let external =
            ReportConfigOverrides::from_json(r#"{"thresholds": {"good": 5000}}"#).unwrap();
        let err = merge(
            ReportConfig::default(),
            &external,
            &ReportConfigOverrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ReportError::Configuration(_)));
    }

    #[test]
    fn unknown_fields_are_parse_errors() {
        let err = ReportConfigOverrides::from_json(r#"{"colours": true}"#).unwrap_err();
        assert!(matches!(err, ReportError::Parse(_)));
    }

    #[test]
    fn unknown_section_key_is_a_configuration_error() {
        let err = ReportConfigOverrides::from_json(r#"{"sections": {"bogus": true}}"#).unwrap_err();
        assert!(matches!(err, ReportError::Configuration(_)));
        assert!(err.to_string().contains("bogus"));
        let ok = ReportConfigOverrides::from_json(r#"{"sections": {"system_info": false}}"#).unwrap();
        assert_eq!(ok.sections.unwrap().system_info, Some(false));
    }

    #[test]
    fn section_keys() {
        assert_eq!(
            "detailed_table".parse::<Section>().unwrap(),
            Section::DetailedTable
        );
        assert!("histogram".parse::<Section>().is_err());

        let sections =
            SectionConfig::from_pairs([("system_info", false), ("recommendations", false)])
                .unwrap();
        assert!(!sections.is_enabled(Section::SystemInfo));
        assert!(!sections.is_enabled(Section::Recommendations));
        assert!(sections.is_enabled(Section::DetailedTable));
        assert!(SectionConfig::from_pairs([("bogus", true)]).is_err());
    }

    #[test]
    fn section_override_by_key() {
        let mut overrides = ReportConfigOverrides::default();
        overrides
            .sections_mut()
            .set_key("performance_charts", false)
            .unwrap();
        assert!(overrides.sections_mut().set_key("nope", false).is_err());
        let config = merge(
            ReportConfig::default(),
            &ReportConfigOverrides::default(),
            &overrides,
        )
        .unwrap();
        assert!(!config.sections.performance_charts);
    }

    #[test]
    fn config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seedmetrics.json");
        std::fs::write(&path, r#"{"memory": {"excessive": 204800}}"#).unwrap();
        let loaded = ReportConfigOverrides::from_path(&path).unwrap();
        assert_eq!(loaded.memory.unwrap().excessive, Some(204_800));

        let missing = ReportConfigOverrides::from_path(&dir.path().join("absent.json"));
        assert!(matches!(missing, Err(ReportError::Io(_))));
    }
}
