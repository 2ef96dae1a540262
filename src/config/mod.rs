//! Study configuration.
//!
//! All analysis constants are externalized here rather than scattered through
//! the pipeline: target counties, discretionary categories, tier cut
//! thresholds, the demographic subgroup definition, and the crime-subset
//! keyword. Defaults reproduce the Charleston/Berkeley study.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, StudyError};

/// Demographic subgroup used for the focused risk analysis
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SubgroupConfig {
    /// Inclusive minimum age
    pub min_age: i32,
    /// Inclusive maximum age
    pub max_age: i32,
    /// Gender label as recorded in the arrest data
    pub gender: String,
    /// Estimated share of each tier's population belonging to the subgroup.
    /// This is an approximation, not a measured count; outputs that use it
    /// are labeled as estimates.
    pub population_fraction: f64,
}

impl Default for SubgroupConfig {
    fn default() -> Self {
        Self {
            min_age: 18,
            max_age: 35,
            gender: "Male".to_string(),
            population_fraction: 0.20,
        }
    }
}

/// Configuration for the full analysis run
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    /// Two-digit state FIPS code
    pub state_code: String,
    /// County FIPS codes (three digits) defining the study area; exactly two
    pub target_counties: [String; 2],
    /// Crime categories treated as discretionary
    pub discretionary_categories: Vec<String>,
    /// Cumulative-population percentage at which the first cut rate is taken
    pub cut1_pop_pct: f64,
    /// Cumulative-population percentage at which the second cut rate is taken.
    /// Must be greater than `cut1_pop_pct`.
    pub cut2_pop_pct: f64,
    /// Demographic subgroup for the focused risk analysis
    pub subgroup: SubgroupConfig,
    /// Substring selecting the crime-subset categories (e.g. "Drug")
    pub crime_keyword: String,
    /// ACS 5-year vintage used for the census fetch
    pub acs_year: u16,
    /// Whether block groups present in the population table but with no
    /// recorded arrests enter the analysis with rate 0. The default (false)
    /// matches the historical inner-join behavior; flipping it changes every
    /// cumulative percentage downstream.
    pub include_zero_arrest_block_groups: bool,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            state_code: "45".to_string(),
            target_counties: ["019".to_string(), "015".to_string()],
            discretionary_categories: vec![
                "Drug Poss".to_string(),
                "Property".to_string(),
                "Traffic".to_string(),
                "Other Offenses".to_string(),
                "Theft".to_string(),
            ],
            cut1_pop_pct: 6.6,
            cut2_pop_pct: 22.0,
            subgroup: SubgroupConfig::default(),
            crime_keyword: "Drug".to_string(),
            acs_year: 2019,
            include_zero_arrest_block_groups: false,
        }
    }
}

impl StudyConfig {
    /// Load configuration from a JSON file, falling back to defaults for
    /// omitted fields
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.cut2_pop_pct <= self.cut1_pop_pct {
            return Err(StudyError::InvalidConfig(format!(
                "cut2_pop_pct ({}) must be greater than cut1_pop_pct ({})",
                self.cut2_pop_pct, self.cut1_pop_pct
            )));
        }
        if self.cut1_pop_pct <= 0.0 || self.cut2_pop_pct > 100.0 {
            return Err(StudyError::InvalidConfig(format!(
                "cut thresholds must lie in (0, 100]: got {} and {}",
                self.cut1_pop_pct, self.cut2_pop_pct
            )));
        }
        if self.target_counties.iter().any(|c| c.len() != 3) {
            return Err(StudyError::InvalidConfig(
                "county codes must be three-digit FIPS codes".to_string(),
            ));
        }
        if self.discretionary_categories.is_empty() {
            return Err(StudyError::InvalidConfig(
                "at least one discretionary category is required".to_string(),
            ));
        }
        if self.subgroup.population_fraction <= 0.0 || self.subgroup.population_fraction > 1.0 {
            return Err(StudyError::InvalidConfig(format!(
                "subgroup population fraction must lie in (0, 1]: got {}",
                self.subgroup.population_fraction
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(StudyConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_cut_thresholds() {
        let config = StudyConfig {
            cut1_pop_pct: 22.0,
            cut2_pop_pct: 6.6,
            ..StudyConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(StudyError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_bad_county_codes() {
        let config = StudyConfig {
            target_counties: ["19".to_string(), "015".to_string()],
            ..StudyConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
