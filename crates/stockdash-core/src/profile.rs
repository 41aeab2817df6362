//! Company profile pass-through

use crate::normalize::parse_number;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sentinel shown wherever optional data is missing
pub const UNAVAILABLE: &str = "N/A";

/// Characters of the business summary used when no name is provided
const SUMMARY_NAME_CHARS: usize = 50;

/// Company information, every field optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub trailing_eps: Option<f64>,
}

impl CompanyProfile {
    /// Read the fields the dashboard shows from a free-form provider mapping.
    ///
    /// The mapping may be flat or nested under the symbol key. Anything that
    /// is not an object yields an empty profile.
    pub fn from_raw(raw: Option<&Value>, symbol: &str) -> Self {
        let Some(Value::Object(map)) = raw else {
            return Self::default();
        };
        let map = map
            .iter()
            .find(|(key, value)| key.eq_ignore_ascii_case(symbol) && value.is_object())
            .and_then(|(_, nested)| nested.as_object())
            .unwrap_or(map);

        let name = text(map, &["longName", "shortName", "name"]).or_else(|| {
            text(map, &["longBusinessSummary", "description"]).map(|summary| {
                let head: String = summary.chars().take(SUMMARY_NAME_CHARS).collect();
                format!("{head}...")
            })
        });

        Self {
            name,
            sector: text(map, &["sector"]),
            industry: text(map, &["industry"]),
            trailing_eps: lookup(map, &["trailingEps", "eps"]).and_then(parse_number),
        }
    }

    /// Company name, or the symbol when the provider gave none
    pub fn display_name<'a>(&'a self, symbol: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(symbol)
    }

    pub fn sector_or_na(&self) -> &str {
        self.sector.as_deref().unwrap_or(UNAVAILABLE)
    }

    pub fn industry_or_na(&self) -> &str {
        self.industry.as_deref().unwrap_or(UNAVAILABLE)
    }

    pub fn trailing_eps_display(&self) -> String {
        self.trailing_eps
            .map_or_else(|| UNAVAILABLE.to_string(), |eps| format!("{eps:.2}"))
    }
}

fn lookup<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|wanted| {
        map.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(wanted))
            .map(|(_, value)| value)
    })
}

fn text(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| lookup(map, &[*key]))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|value| !value.is_empty() && *value != "None")
        .map(str::to_string)
}
