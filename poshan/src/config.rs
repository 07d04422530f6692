use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::COL;

/// Columns the chart objectives read as numbers regardless of configuration.
const OBJECTIVE_NUMERIC_COLUMNS: [&str; 13] = [
    COL::AWC_INFRA_DWS,
    COL::AWC_INFRA_FUN_TOILETS,
    COL::AWC_INFRA_OWN_BUIL,
    COL::PREGNANT_WOMEN,
    COL::LACT_MOTHERS,
    COL::ADOLESCENT_GIRLS,
    COL::CHILDREN_0_6_MONTHS,
    COL::CHILDREN_3_6_YEARS,
    COL::CHILDREN_AWC_21DAYS,
    COL::AWC_OPEN_1DAY,
    COL::AWC_OPEN_21DAY,
    COL::AADHAR_VERF_BENF,
    COL::HEALTH_ID_CREATED,
];

fn names(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Categorical column every objective groups by.
    pub key_column: String,
    /// Numeric columns whose missing values are filled with the column mean.
    pub fill_columns: Vec<String>,
    /// Substrings selecting the beneficiary columns.
    pub beneficiary_keywords: Vec<String>,
    /// Health check-up frequency bands. Validated against the loaded schema, not reconciled.
    pub hcm_columns: Vec<String>,
    /// Columns plotted to inspect skewness.
    pub skewness_columns: Vec<String>,
    pub histogram_bins: usize,
    pub skewness_bins: usize,
    /// Upper bound on panels for multi-panel objectives.
    pub max_panels: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            key_column: COL::STATE_NAME.into(),
            fill_columns: names(&[
                COL::AWC_INFRA_DWS,
                COL::AWC_INFRA_FUN_TOILETS,
                COL::AWC_INFRA_OWN_BUIL,
                COL::PREGNANT_WOMEN,
                COL::LACT_MOTHERS,
                COL::ADOLESCENT_GIRLS,
                COL::CHILDREN_0_6_MONTHS,
                COL::CHILDREN_6MONTHS_3YEARS,
                COL::CHILDREN_3_6_YEARS,
                COL::AWC_OPEN_1DAY,
                COL::AWC_OPEN_21DAY,
                COL::HCM_1_6DAYS,
                COL::HCM_7_14DAYS,
                COL::HCM_15_20DAYS,
                COL::HCM_ATLEAST_21DAYS,
                COL::AADHAR_VERF_BENF,
                COL::HEALTH_ID_CREATED,
            ]),
            beneficiary_keywords: names(&["pregnant", "lactating", "adolescent", "children"]),
            hcm_columns: names(&[
                COL::HCM_1_6DAYS,
                COL::HCM_7_14DAYS,
                COL::HCM_15_30_DAYS,
                COL::HCM_30_PLUS_DAYS,
                COL::HCM_NOT_DONE,
            ]),
            skewness_columns: names(&[
                COL::AADHAR_VERF_BENF,
                COL::HEALTH_ID_CREATED,
                COL::AWC_OPEN_LESS_THAN_1_DAY,
                COL::AWC_OPEN_EXACTLY_21_DAYS,
            ]),
            histogram_bins: 20,
            skewness_bins: 30,
            max_panels: 6,
        }
    }
}

impl Config {
    /// Every column read as numbers: the fill, HCM and skewness lists plus the fixed objective
    /// inputs, first occurrence kept.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.fill_columns
            .iter()
            .chain(&self.hcm_columns)
            .chain(&self.skewness_columns)
            .map(String::as_str)
            .chain(OBJECTIVE_NUMERIC_COLUMNS)
            .unique()
            .map(String::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str("histogram_bins = 10\n").unwrap();
        assert_eq!(config.histogram_bins, 10);
        assert_eq!(config.key_column, COL::STATE_NAME);
        assert_eq!(config.fill_columns.len(), 17);
    }

    #[test]
    fn numeric_columns_cover_every_numeric_input() {
        let config = Config {
            hcm_columns: vec![COL::HCM_NOT_DONE.into(), COL::HCM_1_6DAYS.into()],
            ..Config::default()
        };
        let numeric = config.numeric_columns();
        for column in [
            COL::HCM_NOT_DONE,
            COL::AWC_OPEN_LESS_THAN_1_DAY,
            COL::CHILDREN_AWC_21DAYS,
            COL::AWC_INFRA_DWS,
        ] {
            assert!(numeric.iter().any(|c| c == column), "{column}");
        }
        assert_eq!(numeric.iter().filter(|c| *c == COL::HCM_1_6DAYS).count(), 1);
        assert!(!numeric.iter().any(|c| c == COL::STATE_NAME));
    }
}
