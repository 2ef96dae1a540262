//! Geographic scoping of arrest records.
//!
//! Block-group codes are the first 12 characters of the address GEOID; the
//! county FIPS code sits at characters 2..5 of the block-group code. The
//! filter keeps only arrests whose county code is in the configured two-code
//! study area. Identifiers too short for the extraction are rejected rather
//! than truncated, so a mangled identifier can never bin a record into the
//! wrong county.

use log::info;

use crate::config::StudyConfig;
use crate::error::{Result, StudyError};
use crate::models::ArrestRecord;

/// Length of a block-group GEOID: 2 state + 3 county + 6 tract + 1 block group
pub const BLOCK_GROUP_ID_LEN: usize = 12;

/// Extract the 12-character block-group code from a geographic identifier
pub fn block_group_id(geoid: &str) -> Result<&str> {
    geoid
        .get(..BLOCK_GROUP_ID_LEN)
        .ok_or_else(|| StudyError::MalformedIdentifier(geoid.to_string()))
}

/// Extract the three-digit county FIPS code from a block-group code
pub fn county_code(blockgroup_id: &str) -> Result<&str> {
    blockgroup_id
        .get(2..5)
        .ok_or_else(|| StudyError::MalformedIdentifier(blockgroup_id.to_string()))
}

/// Filter restricting arrests to the configured study counties
#[derive(Debug, Clone)]
pub struct GeoFilter {
    counties: [String; 2],
}

impl GeoFilter {
    /// Build the filter from the study configuration
    #[must_use]
    pub fn new(config: &StudyConfig) -> Self {
        Self {
            counties: config.target_counties.clone(),
        }
    }

    /// Whether an arrest's county code is in the study area.
    /// Fails on identifiers too short for extraction.
    pub fn matches(&self, record: &ArrestRecord) -> Result<bool> {
        let bg = block_group_id(&record.geoid)?;
        let county = county_code(bg)?;
        Ok(self.counties.iter().any(|c| c == county))
    }

    /// Keep only arrests inside the study area. Records outside the allow-set
    /// are silently excluded; that exclusion is what bounds the analysis to
    /// the study area. Applying the filter twice removes nothing further.
    pub fn filter(&self, arrests: Vec<ArrestRecord>) -> Result<Vec<ArrestRecord>> {
        let before = arrests.len();
        let mut kept = Vec::with_capacity(arrests.len());
        for record in arrests {
            if self.matches(&record)? {
                kept.push(record);
            }
        }
        info!(
            "Geographic filter: kept {} of {} arrests in counties {:?}",
            kept.len(),
            before,
            self.counties
        );
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn arrest(geoid: &str) -> ArrestRecord {
        ArrestRecord {
            defendant_id: "d1".to_string(),
            arrest_date: NaiveDate::from_ymd_opt(2015, 6, 1).unwrap(),
            geoid: geoid.to_string(),
            crime_category: "Theft".to_string(),
            age: Some(25),
            gender: Some("Male".to_string()),
        }
    }

    fn filter() -> GeoFilter {
        GeoFilter::new(&StudyConfig::default())
    }

    #[test]
    fn extracts_block_group_and_county() {
        let bg = block_group_id("450190001001001").unwrap();
        assert_eq!(bg, "450190001001");
        assert_eq!(county_code(bg).unwrap(), "019");
    }

    #[test]
    fn short_identifier_is_an_error() {
        assert!(matches!(
            block_group_id("45019"),
            Err(StudyError::MalformedIdentifier(_))
        ));
        let result = filter().filter(vec![arrest("4501")]);
        assert!(matches!(result, Err(StudyError::MalformedIdentifier(_))));
    }

    #[test]
    fn keeps_only_target_counties() {
        let records = vec![
            arrest("450190001001001"), // Charleston
            arrest("450150002002002"), // Berkeley
            arrest("450130003003003"), // other county, dropped
        ];
        let kept = filter().filter(records).unwrap();
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn filtering_twice_is_idempotent() {
        let records = vec![
            arrest("450190001001001"),
            arrest("450130003003003"),
            arrest("450150002002002"),
        ];
        let once = filter().filter(records).unwrap();
        let twice = filter().filter(once.clone()).unwrap();
        assert_eq!(once.len(), twice.len());
    }
}
