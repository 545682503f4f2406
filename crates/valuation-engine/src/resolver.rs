//! Fuzzy lookup of a metric among loosely-labeled statement line items.
//!
//! Precedence, first hit wins:
//! 1. per candidate, the first item whose `key_name` contains the candidate;
//! 2. per candidate, the first item whose `display_name` contains it;
//! 3. per candidate, the first item whose key + display text contains any
//!    whitespace token of the candidate.
//!
//! A hit only counts when its value parses as a number; otherwise the search
//! moves on to the next tier or candidate.

use valuation_core::{LineItem, LineValue};

pub fn resolve<S: AsRef<str>>(items: &[LineItem], candidates: &[S]) -> Option<f64> {
    let candidates: Vec<String> = candidates
        .iter()
        .map(|c| c.as_ref().trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect();

    for cand in &candidates {
        let by_key = items
            .iter()
            .find(|it| label_contains(it.key_name.as_deref(), cand));
        if let Some(v) = by_key.and_then(item_value) {
            return Some(v);
        }

        let by_display = items
            .iter()
            .find(|it| label_contains(it.display_name.as_deref(), cand));
        if let Some(v) = by_display.and_then(item_value) {
            return Some(v);
        }
    }

    // Token fallback trades precision for availability.
    for cand in &candidates {
        let tokens: Vec<&str> = cand.split_whitespace().collect();
        let hit = items.iter().find(|it| {
            let text = format!(
                "{} {}",
                it.key_name.as_deref().unwrap_or("").to_lowercase(),
                it.display_name.as_deref().unwrap_or("").to_lowercase()
            );
            tokens.iter().any(|t| text.contains(t))
        });
        if let Some(v) = hit.and_then(item_value) {
            return Some(v);
        }
    }

    None
}

/// Numeric reading of a raw value. Text keeps only digits, `.` and `-`
/// before parsing, so "₹1,234.5cr" reads as 1234.5.
pub fn parse_value(value: &LineValue) -> Option<f64> {
    match value {
        LineValue::Number(v) => Some(*v).filter(|v| v.is_finite()),
        LineValue::Text(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
        }
    }
}

fn label_contains(label: Option<&str>, candidate: &str) -> bool {
    match label {
        Some(l) if !l.is_empty() => l.to_lowercase().contains(candidate),
        _ => false,
    }
}

fn item_value(item: &LineItem) -> Option<f64> {
    item.value.as_ref().and_then(parse_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use valuation_core::Category;

    fn item(key: &str, display: &str, value: Option<LineValue>) -> LineItem {
        LineItem {
            category: Category::Income,
            key_name: Some(key.to_string()),
            display_name: Some(display.to_string()),
            value,
        }
    }

    #[test]
    fn test_key_name_match() {
        let items = vec![item("Total Revenue", "Revenue", Some(LineValue::Number(500.0)))];
        assert_eq!(resolve(&items, &["total revenue", "revenue"]), Some(500.0));
    }

    #[test]
    fn test_strips_currency_and_separators() {
        let items = vec![item("TotalRevenue", "Total Revenue", Some("₹1,234.5cr".into()))];
        assert_eq!(resolve(&items, &["total revenue"]), Some(1234.5));
    }

    #[test]
    fn test_negative_text_value() {
        let v = parse_value(&LineValue::Text("(-42.5)".to_string()));
        assert_eq!(v, Some(-42.5));
    }

    #[test]
    fn test_unparseable_text_is_unavailable() {
        assert_eq!(parse_value(&LineValue::Text("n/a".to_string())), None);
        assert_eq!(parse_value(&LineValue::Text("1.2.3".to_string())), None);
        assert_eq!(parse_value(&LineValue::Text(String::new())), None);
        assert_eq!(parse_value(&LineValue::Number(f64::NAN)), None);
    }

    #[test]
    fn test_key_match_preferred_over_display_match() {
        let items = vec![
            item("OtherIncome", "Net Income", Some(LineValue::Number(1.0))),
            item("net income", "Profit", Some(LineValue::Number(2.0))),
        ];
        assert_eq!(resolve(&items, &["net income"]), Some(2.0));
    }

    #[test]
    fn test_falls_back_to_display_name_when_key_value_missing() {
        let items = vec![
            item("Total Assets", "Assets (old)", None),
            item("TA", "Total Assets", Some(LineValue::Number(900.0))),
        ];
        assert_eq!(resolve(&items, &["total assets"]), Some(900.0));
    }

    #[test]
    fn test_candidate_priority_order() {
        let items = vec![
            item("Sales", "Sales", Some(LineValue::Number(10.0))),
            item("TotalRevenue", "Total Revenue", Some(LineValue::Number(20.0))),
        ];
        assert_eq!(resolve(&items, &["total revenue", "sales"]), Some(20.0));
        assert_eq!(resolve(&items, &["sales", "total revenue"]), Some(10.0));
    }

    #[test]
    fn test_token_fallback() {
        let items = vec![
            item("Depreciation", "Depreciation", Some(LineValue::Number(3.0))),
            item("CashFromOps", "Cash generated by operations", Some(LineValue::Number(77.0))),
        ];
        // No item contains the whole phrase.
        assert_eq!(resolve(&items, &["net cash from operations"]), Some(77.0));
    }

    #[test]
    fn test_no_match_is_unavailable() {
        let items = vec![item("Inventory", "Inventory", Some(LineValue::Number(5.0)))];
        assert_eq!(resolve(&items, &["total revenue"]), None);
        assert_eq!(resolve::<&str>(&[], &["total revenue"]), None);
    }

    #[test]
    fn test_empty_candidates_ignored() {
        let items = vec![item("Inventory", "Inventory", Some(LineValue::Number(5.0)))];
        assert_eq!(resolve(&items, &["", "   "]), None);
    }
}
