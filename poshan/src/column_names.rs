//! This module stores the column names of the Poshan tracker dataset that the pipeline refers to.
//! Note that these must match the header of the input file exactly!

pub const STATE_NAME: &str = "state_name";

pub const AWC_INFRA_DWS: &str = "awc_infra_dws";
pub const AWC_INFRA_FUN_TOILETS: &str = "awc_infra_fun_toilets";
pub const AWC_INFRA_OWN_BUIL: &str = "awc_infra_own_buil";

pub const PREGNANT_WOMEN: &str = "pregnant_women";
pub const LACT_MOTHERS: &str = "lact_mothers";
pub const ADOLESCENT_GIRLS: &str = "adolescent_girls";

pub const CHILDREN_0_6_MONTHS: &str = "children_0_6_months";
pub const CHILDREN_6MONTHS_3YEARS: &str = "children_6months_3years";
pub const CHILDREN_3_6_YEARS: &str = "children_3_6_years";
pub const CHILDREN_AWC_21DAYS: &str = "children_awc_21days";

pub const AWC_OPEN_1DAY: &str = "awc_open_1day";
pub const AWC_OPEN_21DAY: &str = "awc_open_21day";
pub const AWC_OPEN_LESS_THAN_1_DAY: &str = "awc_open_less_than_1_day";
pub const AWC_OPEN_EXACTLY_21_DAYS: &str = "awc_open_exactly_21_days";

pub const HCM_1_6DAYS: &str = "hcm_1_6days";
pub const HCM_7_14DAYS: &str = "hcm_7_14days";
pub const HCM_15_20DAYS: &str = "hcm_15_20days";
pub const HCM_ATLEAST_21DAYS: &str = "hcm_atleast_21days";
pub const HCM_15_30_DAYS: &str = "hcm_15_30_days";
pub const HCM_30_PLUS_DAYS: &str = "hcm_30_plus_days";
pub const HCM_NOT_DONE: &str = "hcm_not_done";

pub const AADHAR_VERF_BENF: &str = "aadhar_verf_benf";
pub const HEALTH_ID_CREATED: &str = "health_id_created";

/// Appended by the feature deriver.
pub const CHILDREN_COVERAGE_RATIO: &str = "children_coverage_ratio";

/// Columns of a long-form (melted) table besides the key.
pub const METRIC: &str = "metric";
pub const VALUE: &str = "value";

/// Columns of the missing-value report.
pub const REPORT_COLUMN: &str = "column";
pub const REPORT_MISSING: &str = "missing";

/// First column of the summary statistics table.
pub const STATISTIC: &str = "statistic";

/// Columns of a histogram table.
pub const BIN_START: &str = "bin_start";
pub const BIN_END: &str = "bin_end";
pub const COUNT: &str = "count";

/// Columns of a box-plot summary table.
pub const BOX_MIN: &str = "min";
pub const BOX_Q1: &str = "q1";
pub const BOX_MEDIAN: &str = "median";
pub const BOX_Q3: &str = "q3";
pub const BOX_MAX: &str = "max";
pub const BOX_LOWER_WHISKER: &str = "lower_whisker";
pub const BOX_UPPER_WHISKER: &str = "upper_whisker";
pub const BOX_OUTLIERS: &str = "outliers";
