pub mod calculator;
pub mod portfolio;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Parse an enum flag through its serde names, so the stored Spanish values
/// (`compuesto`, `moroso`, ...) are accepted alongside the English ones.
pub fn parse_choice<T: DeserializeOwned>(flag: &str, raw: &str) -> Result<T, Box<dyn std::error::Error>> {
    let normalized = raw.trim().to_lowercase().replace('-', "_");
    serde_json::from_value(Value::String(normalized))
        .map_err(|_| format!("--{} does not accept '{}'", flag, raw).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lending_core::models::{InterestKind, LoanStatus};
    use lending_core::status::CustomerFilter;

    #[test]
    fn test_parse_choice_accepts_aliases() {
        let kind: InterestKind = parse_choice("kind", "compuesto").unwrap();
        assert_eq!(kind, InterestKind::Compound);
        let status: LoanStatus = parse_choice("status", "Moroso").unwrap();
        assert_eq!(status, LoanStatus::Delinquent);
        let filter: CustomerFilter = parse_choice("filter", "in-arrears").unwrap();
        assert_eq!(filter, CustomerFilter::InArrears);
        assert!(parse_choice::<LoanStatus>("status", "lost").is_err());
    }
}
