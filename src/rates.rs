//! Regional reference tables
//!
//! Flat reference data the cost model and aggregator read: construction
//! market-rate tiers, the regional-risk registry, and currency presentation
//! tuples. Rates are Q4 2024 / Q1 2025 estimates anchored on published
//! international construction cost indices; base currency USD.
//!
//! A read-only reference store can overlay these built-ins with JSON files
//! written by the (out-of-scope) ingestion subsystem. The store is loaded
//! once at startup and immutable afterwards; the ingestion side uses
//! write-then-rename so a reader never observes a partial file.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Construction market rates for a region
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketRates {
    /// Steel price (USD per tonne)
    #[serde(rename = "steelPriceUsd")]
    pub steel_price_usd: f64,

    /// Concrete price (USD per m³)
    #[serde(rename = "concretePriceUsd")]
    pub concrete_price_usd: f64,

    /// Labour cost multiplier (1.0 = industrial baseline)
    #[serde(rename = "laborFactor")]
    pub labor_factor: f64,

    /// Logistics/transport multiplier (1.0 = baseline)
    #[serde(rename = "logisticsFactor")]
    pub logistics_factor: f64,

    /// Human-readable tier description
    pub description: String,
}

impl MarketRates {
    fn tier(steel: f64, concrete: f64, labor: f64, logistics: f64, description: &str) -> Self {
        Self {
            steel_price_usd: steel,
            concrete_price_usd: concrete,
            labor_factor: labor,
            logistics_factor: logistics,
            description: description.to_string(),
        }
    }

    /// Tier 1: high labour cost and regulation (USA / Western Europe)
    pub fn tier1_us_eu() -> Self {
        Self::tier(1450.0, 165.0, 5.5, 1.1, "Tier 1: High Labor Cost & Regulation (USA/EU)")
    }

    /// Tier 2: industrial/manufacturing hubs (China, India, Vietnam)
    pub fn tier2_industrial() -> Self {
        Self::tier(750.0, 95.0, 1.0, 0.9, "Tier 2: Industrial/Manufacturing Hubs")
    }

    /// Tier 3: import-dependent / developing
    pub fn tier3_import() -> Self {
        Self::tier(1150.0, 180.0, 1.5, 1.4, "Tier 3: Import Dependent / Developing")
    }

    /// Tier 4: GCC / oil economies
    pub fn tier4_gulf() -> Self {
        Self::tier(950.0, 85.0, 1.8, 1.0, "Tier 4: GCC / Oil Economies")
    }

    /// Conservative default when the country is unknown
    pub fn global_default() -> Self {
        Self::tier(1300.0, 150.0, 2.0, 1.3, "Global Default (Conservative)")
    }
}

/// Built-in rates for a country code
pub fn rates_for_country(country_code: Option<&str>) -> MarketRates {
    let Some(code) = country_code else {
        return MarketRates::global_default();
    };

    match code.to_ascii_uppercase().as_str() {
        "US" | "DE" | "FR" => MarketRates::tier1_us_eu(),
        "CA" => MarketRates {
            labor_factor: 5.0,
            ..MarketRates::tier1_us_eu()
        },
        "GB" => MarketRates {
            labor_factor: 4.8,
            steel_price_usd: 1300.0,
            ..MarketRates::tier1_us_eu()
        },
        "JP" => MarketRates {
            steel_price_usd: 1200.0,
            labor_factor: 4.5,
            ..MarketRates::tier1_us_eu()
        },
        "AU" => MarketRates {
            labor_factor: 6.0,
            logistics_factor: 1.3,
            ..MarketRates::tier1_us_eu()
        },
        "PL" => MarketRates {
            labor_factor: 2.5,
            ..MarketRates::tier1_us_eu()
        },
        "CN" | "VN" | "ID" => MarketRates::tier2_industrial(),
        "IN" => MarketRates {
            steel_price_usd: 850.0,
            ..MarketRates::tier2_industrial()
        },
        "MX" => MarketRates {
            labor_factor: 1.8,
            ..MarketRates::tier2_industrial()
        },
        "BR" => MarketRates {
            labor_factor: 1.4,
            logistics_factor: 1.2,
            ..MarketRates::tier2_industrial()
        },
        "SA" | "AE" | "QA" => MarketRates::tier4_gulf(),
        "ZA" => MarketRates {
            steel_price_usd: 1000.0,
            logistics_factor: 1.1,
            ..MarketRates::tier3_import()
        },
        "NG" => MarketRates {
            logistics_factor: 1.6,
            ..MarketRates::tier3_import()
        },
        "KE" => MarketRates::tier3_import(),
        _ => MarketRates::global_default(),
    }
}

/// Region-specific risks the design does not automatically model
///
/// Keyed by country; surfaced as advisories, never as feasibility inputs.
pub fn regional_risks(country_code: Option<&str>) -> Vec<String> {
    let risks: &[&str] = match country_code.map(|c| c.to_ascii_uppercase()) {
        Some(ref c) => match c.as_str() {
            "IN" => &[
                "Monsoon flooding (river crossings)",
                "Cyclonic wind (coastal corridors)",
                "Seismic activity (Himalayan belt)",
                "High ambient temperature (conductor derating)",
            ],
            "US" | "CA" => &[
                "Ice storms (northern corridors)",
                "Tornado alley wind exposure",
                "Wildfire exposure (western regions)",
            ],
            "BR" => &[
                "Lightning activity",
                "High humidity and corrosion",
                "Remote access logistics (Amazon)",
                "Flooding (river basins)",
            ],
            "AR" => &[
                "High wind exposure (Patagonia)",
                "Seismic activity (western regions)",
                "Extreme cold (southern regions)",
            ],
            "CL" => &[
                "Seismic activity",
                "Volcanic activity",
                "High wind exposure",
                "Mountainous terrain access challenges",
            ],
            "JP" => &[
                "Seismic activity",
                "Typhoon wind loading",
                "Salt contamination (coastal)",
            ],
            "AU" => &[
                "Bushfire exposure",
                "Cyclonic wind (northern coast)",
                "Remote outback logistics",
            ],
            "NO" | "SE" | "FI" => &[
                "Heavy ice accretion",
                "Extreme cold",
                "Frost-heave foundations",
            ],
            _ => &[],
        },
        None => &[],
    };

    risks.iter().map(|s| s.to_string()).collect()
}

/// Currency presentation tuple
///
/// Carried on the wire for display only; the core applies no FX conversion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurrencyContext {
    /// ISO-4217 code
    pub code: String,
    pub symbol: String,
    pub label: String,
}

impl CurrencyContext {
    fn new(code: &str, symbol: &str, label: &str) -> Self {
        Self {
            code: code.to_string(),
            symbol: symbol.to_string(),
            label: label.to_string(),
        }
    }

    pub fn usd() -> Self {
        Self::new("USD", "$", "US Dollar")
    }
}

/// Resolve the presentation currency for a country code
pub fn resolve_currency(country_code: Option<&str>) -> CurrencyContext {
    let eurozone = [
        "AT", "BE", "CY", "DE", "EE", "ES", "FI", "FR", "GR", "IE", "IT", "LT", "LU", "LV", "MT",
        "NL", "PT", "SI", "SK", "HR",
    ];

    let Some(code) = country_code else {
        return CurrencyContext::usd();
    };

    match code.to_ascii_uppercase().as_str() {
        "IN" => CurrencyContext::new("INR", "\u{20b9}", "Indian Rupee"),
        "GB" => CurrencyContext::new("GBP", "\u{a3}", "Pound Sterling"),
        "JP" => CurrencyContext::new("JPY", "\u{a5}", "Japanese Yen"),
        "CA" => CurrencyContext::new("CAD", "$", "Canadian Dollar"),
        "AU" => CurrencyContext::new("AUD", "$", "Australian Dollar"),
        "CN" => CurrencyContext::new("CNY", "\u{a5}", "Chinese Yuan"),
        "BR" => CurrencyContext::new("BRL", "R$", "Brazilian Real"),
        c if eurozone.contains(&c) => CurrencyContext::new("EUR", "\u{20ac}", "Euro"),
        _ => CurrencyContext::usd(),
    }
}

/// Read-only snapshot of externally ingested reference data
///
/// The ingestion subsystem (crawlers, validator, approval queue) is the sole
/// writer; the core only ever reads a snapshot at request start.
#[derive(Debug, Clone, Default)]
pub struct ReferenceStore {
    rate_overrides: HashMap<String, MarketRates>,
    status: HashMap<String, String>,
}

impl ReferenceStore {
    /// Load overrides from a reference-data directory
    ///
    /// Missing or unreadable files fall back to the built-in tables; a load
    /// never fails the request.
    pub fn load<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        let mut store = Self::default();

        let rates_path = dir.join("market_rates.json");
        match fs::read_to_string(&rates_path) {
            Ok(data) => match serde_json::from_str::<HashMap<String, MarketRates>>(&data) {
                Ok(map) => {
                    store
                        .status
                        .insert("cost_index".to_string(), format!("{} regions loaded", map.len()));
                    store.rate_overrides = map;
                }
                Err(e) => {
                    store
                        .status
                        .insert("cost_index".to_string(), format!("parse error: {}", e));
                }
            },
            Err(_) => {
                store
                    .status
                    .insert("cost_index".to_string(), "built-in".to_string());
            }
        }

        store
            .status
            .entry("risk_registry".to_string())
            .or_insert_with(|| "built-in".to_string());
        store
            .status
            .entry("code_revision".to_string())
            .or_insert_with(|| "built-in".to_string());

        store
    }

    /// Built-in-only store
    pub fn builtin() -> Self {
        let mut status = HashMap::new();
        status.insert("cost_index".to_string(), "built-in".to_string());
        status.insert("risk_registry".to_string(), "built-in".to_string());
        status.insert("code_revision".to_string(), "built-in".to_string());
        Self {
            rate_overrides: HashMap::new(),
            status,
        }
    }

    /// Market rates for a country, preferring ingested overrides
    pub fn rates_for(&self, country_code: Option<&str>) -> MarketRates {
        if let Some(code) = country_code {
            if let Some(rates) = self.rate_overrides.get(&code.to_ascii_uppercase()) {
                return rates.clone();
            }
        }
        rates_for_country(country_code)
    }

    /// Reference-data version strings echoed in the result
    pub fn status(&self) -> HashMap<String, String> {
        self.status.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_country_rates() {
        let india = rates_for_country(Some("IN"));
        assert_eq!(india.steel_price_usd, 850.0);
        assert_eq!(india.labor_factor, 1.0);

        let us = rates_for_country(Some("US"));
        assert_eq!(us.steel_price_usd, 1450.0);
    }

    #[test]
    fn test_unknown_country_falls_back() {
        let rates = rates_for_country(Some("XX"));
        assert_eq!(rates.steel_price_usd, 1300.0);
        assert!(rates.description.contains("Global Default"));
        assert_eq!(rates_for_country(None), MarketRates::global_default());
    }

    #[test]
    fn test_currency_resolution() {
        assert_eq!(resolve_currency(Some("IN")).code, "INR");
        assert_eq!(resolve_currency(Some("DE")).code, "EUR");
        assert_eq!(resolve_currency(Some("US")).code, "USD");
        assert_eq!(resolve_currency(Some("ZZ")).code, "USD");
        assert_eq!(resolve_currency(None).code, "USD");
    }

    #[test]
    fn test_regional_risks_lookup() {
        assert!(regional_risks(Some("IN")).len() >= 4);
        assert!(regional_risks(Some("XX")).is_empty());
        assert!(regional_risks(None).is_empty());
    }

    #[test]
    fn test_reference_store_builtin_passthrough() {
        let store = ReferenceStore::builtin();
        assert_eq!(store.rates_for(Some("IN")), rates_for_country(Some("IN")));
        assert_eq!(store.status().get("cost_index").unwrap(), "built-in");
    }
}
