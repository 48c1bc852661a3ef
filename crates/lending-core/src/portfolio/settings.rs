//! Typed configuration parameters.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::access::Requester;
use crate::error::LendingError;
use crate::interest::FALLBACK_RATE;
use crate::models::{ConfigParameter, ConfigValueType};
use crate::types::{Date, Percent};
use crate::LendingResult;

use super::session::require_admin;
use super::Portfolio;

/// Key of the rate pre-filled on new loan forms.
pub const DEFAULT_RATE_KEY: &str = "tasa_interes_default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ConfigValue {
    Text(String),
    Number(Decimal),
    Boolean(bool),
    Date(Date),
}

impl ConfigValue {
    /// Parse a stored string according to its declared type.
    pub fn parse(key: &str, value_type: ConfigValueType, raw: &str) -> LendingResult<Self> {
        let trimmed = raw.trim();
        let invalid = |reason: String| LendingError::InvalidConfig {
            key: key.to_string(),
            reason,
        };
        match value_type {
            ConfigValueType::Text => Ok(ConfigValue::Text(raw.to_string())),
            ConfigValueType::Number => Decimal::from_str(trimmed)
                .map(ConfigValue::Number)
                .map_err(|_| invalid(format!("'{trimmed}' is not a number"))),
            ConfigValueType::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(ConfigValue::Boolean(true)),
                "false" | "0" => Ok(ConfigValue::Boolean(false)),
                _ => Err(invalid(format!("'{trimmed}' is not true or false"))),
            },
            ConfigValueType::Date => Date::parse_from_str(trimmed, "%Y-%m-%d")
                .map(ConfigValue::Date)
                .map_err(|_| invalid(format!("'{trimmed}' is not a YYYY-MM-DD date"))),
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            ConfigValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl ConfigParameter {
    pub fn typed_value(&self) -> LendingResult<ConfigValue> {
        ConfigValue::parse(&self.key, self.value_type, &self.value)
    }
}

impl Portfolio {
    /// All parameters ordered by key.
    pub fn config_parameters(&self) -> Vec<&ConfigParameter> {
        let mut params: Vec<&ConfigParameter> = self.config.iter().collect();
        params.sort_by(|a, b| a.key.cmp(&b.key));
        params
    }

    pub fn config_parameter(&self, key: &str) -> Option<&ConfigParameter> {
        self.config.iter().find(|p| p.key == key)
    }

    /// Rate pre-filled on new loans. Falls back to 5% when unset.
    pub fn default_interest_rate(&self) -> LendingResult<Percent> {
        let Some(param) = self.config_parameter(DEFAULT_RATE_KEY) else {
            return Ok(FALLBACK_RATE);
        };
        // The form treats the stored text as a number regardless of declared type.
        let value = ConfigValue::parse(&param.key, ConfigValueType::Number, &param.value)?;
        match value.as_number() {
            Some(rate) if rate >= Decimal::ZERO => Ok(rate),
            _ => Err(LendingError::InvalidConfig {
                key: param.key.clone(),
                reason: "default interest rate cannot be negative".into(),
            }),
        }
    }

    /// Replace a parameter value after checking it against the declared type.
    pub fn set_config_value(
        &mut self,
        requester: &Requester,
        key: &str,
        value: &str,
    ) -> LendingResult<ConfigParameter> {
        require_admin(requester, "change configuration")?;
        let param = self
            .config
            .iter_mut()
            .find(|p| p.key == key)
            .ok_or_else(|| LendingError::NotFound {
                entity: "ConfigParameter".into(),
                id: key.to_string(),
            })?;
        ConfigValue::parse(key, param.value_type, value)?;
        param.value = value.trim().to_string();
        param.updated_at = Utc::now();
        tracing::info!(key, value = %param.value, "configuration updated");
        Ok(param.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::portfolio::PortfolioSnapshot;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn param(key: &str, value: &str, value_type: ConfigValueType) -> ConfigParameter {
        ConfigParameter {
            id: Uuid::new_v4(),
            key: key.into(),
            value: value.into(),
            value_type,
            description: None,
            created_at: Default::default(),
            updated_at: Default::default(),
        }
    }

    fn portfolio_with(params: Vec<ConfigParameter>) -> Portfolio {
        Portfolio::from_snapshot(PortfolioSnapshot {
            config: params,
            ..Default::default()
        })
    }

    #[test]
    fn test_parse_by_declared_type() {
        assert_eq!(
            ConfigValue::parse("k", ConfigValueType::Number, " 7.5 ").unwrap(),
            ConfigValue::Number(dec!(7.5))
        );
        assert_eq!(
            ConfigValue::parse("k", ConfigValueType::Boolean, "false").unwrap(),
            ConfigValue::Boolean(false)
        );
        assert!(ConfigValue::parse("k", ConfigValueType::Boolean, "yes").is_err());
        assert!(ConfigValue::parse("k", ConfigValueType::Date, "2024-02-30").is_err());
    }

    #[test]
    fn test_default_rate_fallback_and_override() {
        assert_eq!(Portfolio::new().default_interest_rate().unwrap(), dec!(5.0));
        let portfolio = portfolio_with(vec![param(DEFAULT_RATE_KEY, "12", ConfigValueType::Number)]);
        assert_eq!(portfolio.default_interest_rate().unwrap(), dec!(12));
    }

    #[test]
    fn test_malformed_default_rate_is_config_error() {
        let portfolio = portfolio_with(vec![param(DEFAULT_RATE_KEY, "doce", ConfigValueType::Text)]);
        assert!(matches!(
            portfolio.default_interest_rate(),
            Err(LendingError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_set_value_checks_type_and_role() {
        let mut portfolio = portfolio_with(vec![param(DEFAULT_RATE_KEY, "5", ConfigValueType::Number)]);
        let admin = Requester::new(Uuid::new_v4(), Role::Admin);
        let lender = Requester::new(Uuid::new_v4(), Role::Lender);

        assert!(portfolio.set_config_value(&lender, DEFAULT_RATE_KEY, "8").is_err());
        assert!(portfolio.set_config_value(&admin, DEFAULT_RATE_KEY, "ocho").is_err());
        portfolio.set_config_value(&admin, DEFAULT_RATE_KEY, "8").unwrap();
        assert_eq!(portfolio.default_interest_rate().unwrap(), dec!(8));
    }
}
