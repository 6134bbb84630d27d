//! Conversions from loosely-typed digest fields to numbers and display text.
//!
//! Every function here is total: malformed input yields `None`, the input
//! itself, or the em dash placeholder, never an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::models::{AmountValue, CompanyDigest};

/// Placeholder for values that cannot be displayed.
pub const EM_DASH: &str = "—";

/// Separator between month labels spanning several months.
const MONTH_SEPARATOR: &str = " – ";

/// Currency assumed when a figure carries no currency code.
const DEFAULT_CURRENCY: &str = "EUR";

/// Coerces an amount value into a number.
///
/// Numbers pass through when finite. Text is stripped of everything except
/// digits, `.` and `-` before parsing, so `"€1,000,000"` becomes `1000000`.
pub fn amount_to_number(value: Option<&AmountValue>) -> Option<f64> {
    match value? {
        AmountValue::Number(n) => n.is_finite().then_some(*n),
        AmountValue::Text(s) => {
            let stripped: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            if stripped.is_empty() {
                return None;
            }
            stripped.parse::<f64>().ok().filter(|n| n.is_finite())
        }
    }
}

fn currency_symbol(currency: &str) -> &'static str {
    match currency {
        "EUR" => "€",
        "USD" => "$",
        _ => "",
    }
}

/// One fractional digit, ties rounded away from zero.
fn one_decimal(value: f64) -> String {
    format!("{:.1}", (value * 10.0).round() / 10.0)
}

/// Plain number with comma grouping and at most three fractional digits.
fn grouped(value: f64) -> String {
    let fixed = format!("{:.3}", value);
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let digits: Vec<char> = int_part.chars().collect();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 4);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(*c);
    }
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

/// Formats a money figure compactly, e.g. `€8.0M` or `-$1.5K`.
///
/// Non-finite input renders as the em dash. A missing currency is treated
/// as EUR; codes other than EUR and USD get no symbol.
pub fn format_currency_short(value: f64, currency: Option<&str>) -> String {
    if !value.is_finite() {
        return EM_DASH.to_string();
    }
    let abs = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };
    let symbol = currency_symbol(currency.unwrap_or(DEFAULT_CURRENCY));

    let body = if abs >= 1_000_000_000.0 {
        format!("{}B", one_decimal(abs / 1_000_000_000.0))
    } else if abs >= 1_000_000.0 {
        format!("{}M", one_decimal(abs / 1_000_000.0))
    } else if abs >= 1_000.0 {
        format!("{}K", one_decimal(abs / 1_000.0))
    } else {
        grouped(abs)
    };

    format!("{}{}{}", sign, symbol, body)
}

/// Parses the date formats found in digests: plain dates, year-month,
/// RFC 3339 timestamps and naive timestamps.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(&format!("{}-01", value), "%Y-%m-%d").ok()
}

/// Renders a date as `Mar 05, 2025`.
///
/// Missing or empty values render as the em dash; text that is not a date
/// is returned verbatim.
pub fn format_date(value: Option<&str>) -> String {
    match value {
        None | Some("") => EM_DASH.to_string(),
        Some(raw) => match parse_date(raw) {
            Some(date) => date.format("%b %d, %Y").to_string(),
            None => raw.to_string(),
        },
    }
}

/// Builds the period label of a digest from its announcement dates.
///
/// Distinct `Month Year` labels are kept in encounter order. A single label
/// is returned as-is, several are joined with an en dash.
pub fn month_label(digests: &[CompanyDigest]) -> Option<String> {
    let mut labels: Vec<String> = Vec::new();

    let dates = digests
        .iter()
        .flat_map(|c| c.funding_events.iter())
        .filter_map(|e| e.announced_date.as_deref())
        .filter_map(parse_date);

    for date in dates {
        let label = date.format("%B %Y").to_string();
        if !labels.contains(&label) {
            labels.push(label);
        }
    }

    match labels.len() {
        0 => None,
        1 => labels.pop(),
        _ => Some(labels.join(MONTH_SEPARATOR)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompanyInfo, FundingEvent};

    fn text(s: &str) -> AmountValue {
        AmountValue::Text(s.to_string())
    }

    fn dated(dates: &[&str]) -> CompanyDigest {
        CompanyDigest::new(CompanyInfo::new("Dated")).with_events(
            dates
                .iter()
                .map(|d| FundingEvent::empty().with_announced_date(*d))
                .collect(),
        )
    }

    #[test]
    fn test_amount_to_number_passes_numbers() {
        assert_eq!(amount_to_number(Some(&AmountValue::Number(42.5))), Some(42.5));
        assert_eq!(amount_to_number(Some(&AmountValue::Number(f64::NAN))), None);
        assert_eq!(amount_to_number(Some(&AmountValue::Number(f64::INFINITY))), None);
        assert_eq!(amount_to_number(None), None);
    }

    #[test]
    fn test_amount_to_number_strips_symbols() {
        assert_eq!(amount_to_number(Some(&text("€1,000,000"))), Some(1_000_000.0));
        assert_eq!(amount_to_number(Some(&text("USD 2.5"))), Some(2.5));
        assert_eq!(amount_to_number(Some(&text("-300 EUR"))), Some(-300.0));
    }

    #[test]
    fn test_amount_to_number_rejects_garbage() {
        assert_eq!(amount_to_number(Some(&text("undisclosed"))), None);
        assert_eq!(amount_to_number(Some(&text(""))), None);
        assert_eq!(amount_to_number(Some(&text("1.2.3"))), None);
        assert_eq!(amount_to_number(Some(&text("--"))), None);
    }

    #[test]
    fn test_format_currency_short_scales() {
        assert_eq!(format_currency_short(1_000.0, Some("EUR")), "€1.0K");
        assert_eq!(format_currency_short(1_000_000.0, Some("EUR")), "€1.0M");
        assert_eq!(format_currency_short(1_000_000_000.0, Some("EUR")), "€1.0B");
        assert_eq!(format_currency_short(8_000_000.0, Some("EUR")), "€8.0M");
        assert_eq!(format_currency_short(2_450_000.0, Some("USD")), "$2.5M");
    }

    #[test]
    fn test_format_currency_short_symbols() {
        assert_eq!(format_currency_short(1_500.0, Some("GBP")), "1.5K");
        assert_eq!(format_currency_short(1_500.0, None), "€1.5K");
        assert_eq!(format_currency_short(-1_500.0, Some("USD")), "-$1.5K");
    }

    #[test]
    fn test_format_currency_short_small_values() {
        assert_eq!(format_currency_short(999.0, Some("EUR")), "€999");
        assert_eq!(format_currency_short(0.0, Some("EUR")), "€0");
        assert_eq!(format_currency_short(12.3456, Some("USD")), "$12.346");
    }

    #[test]
    fn test_format_currency_short_non_finite() {
        assert_eq!(format_currency_short(f64::NAN, Some("EUR")), "—");
        assert_eq!(format_currency_short(f64::INFINITY, None), "—");
        assert_eq!(format_currency_short(f64::NEG_INFINITY, None), "—");
    }

    #[test]
    fn test_grouped() {
        assert_eq!(grouped(1234567.0), "1,234,567");
        assert_eq!(grouped(999.5), "999.5");
        assert_eq!(grouped(100.0), "100");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(Some("2025-03-05")), "Mar 05, 2025");
        assert_eq!(format_date(Some("2025-08-07T10:00:00Z")), "Aug 07, 2025");
        assert_eq!(format_date(Some("sometime in spring")), "sometime in spring");
        assert_eq!(format_date(None), "—");
        assert_eq!(format_date(Some("")), "—");
    }

    #[test]
    fn test_parse_date_formats() {
        let march = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(parse_date("2025-03-01"), Some(march));
        assert_eq!(parse_date("2025-03"), Some(march));
        assert_eq!(parse_date("2025-03-01T08:30:00"), Some(march));
        assert_eq!(parse_date("2025-03-01T08:30:00.250"), Some(march));
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("   "), None);
    }

    #[test]
    fn test_month_label_single_month() {
        let digests = vec![dated(&["2025-03-03", "2025-03-20"]), dated(&["2025-03-31"])];
        assert_eq!(month_label(&digests).as_deref(), Some("March 2025"));
    }

    #[test]
    fn test_month_label_spanning_months() {
        let digests = vec![dated(&["2025-03-03"]), dated(&["2025-04-02", "2025-03-15"])];
        assert_eq!(
            month_label(&digests).as_deref(),
            Some("March 2025 – April 2025")
        );
    }

    #[test]
    fn test_month_label_keeps_encounter_order() {
        let digests = vec![dated(&["2025-04-02", "2025-03-03"])];
        assert_eq!(
            month_label(&digests).as_deref(),
            Some("April 2025 – March 2025")
        );
    }

    #[test]
    fn test_month_label_without_dates() {
        assert_eq!(month_label(&[]), None);

        let mut undated = dated(&["garbage"]);
        undated.funding_events.push(FundingEvent::empty());
        assert_eq!(month_label(&[undated]), None);
    }
}
