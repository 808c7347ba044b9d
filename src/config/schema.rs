use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_API_URL;
use crate::model::Period;
use crate::scoring::ScoringConfig;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// API root of the rating server
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Request timeout in seconds (default: 30)
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Period to show when none is given on the command line (default: current month)
    #[serde(default)]
    pub period: Option<Period>,

    #[serde(default)]
    pub scoring: Option<ScoringConfig>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: None,
            period: None,
            scoring: None,
        }
    }
}
