//! Summary statistics over the funding events of a digest.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::coerce::amount_to_number;
use crate::models::{CompanyDigest, FundingEvent};

/// Round key used for events without a round.
pub const UNKNOWN_ROUND: &str = "unknown";

/// The event with the largest numeric amount and the company it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct Largest<'a> {
    pub event: Option<&'a FundingEvent>,
    pub company: Option<&'a CompanyDigest>,
    /// Numeric amount of `event`; `-inf` when it has none.
    pub numeric: f64,
}

impl Default for Largest<'_> {
    fn default() -> Self {
        Self {
            event: None,
            company: None,
            numeric: f64::NEG_INFINITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopInvestor {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone)]
pub struct DigestStats<'a> {
    pub event_count: usize,
    pub total: f64,
    pub median: f64,
    pub currency: Option<&'a str>,
    pub largest: Largest<'a>,
    pub by_round: BTreeMap<String, usize>,
    pub top_investor: Option<TopInvestor>,
}

fn median(mut amounts: Vec<f64>) -> f64 {
    if amounts.is_empty() {
        return 0.0;
    }
    amounts.sort_by(|a, b| a.total_cmp(b));
    let mid = amounts.len() / 2;
    if amounts.len() % 2 == 1 {
        amounts[mid]
    } else {
        (amounts[mid - 1] + amounts[mid]) / 2.0
    }
}

fn round_key(event: &FundingEvent) -> String {
    match event.round.as_deref() {
        None | Some("") => UNKNOWN_ROUND.to_string(),
        Some(round) => round.to_lowercase(),
    }
}

/// Counts investor mentions, keeping names in first-seen order so that ties
/// go to the earliest name.
fn top_investor<'a>(events: impl Iterator<Item = &'a FundingEvent>) -> Option<TopInvestor> {
    let mut order: Vec<(&'a str, usize)> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();

    for investor in events.flat_map(|e| e.investors.iter()) {
        let name = investor.name.trim();
        if name.is_empty() {
            continue;
        }
        match index.get(name) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(name, order.len());
                order.push((name, 1));
            }
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (name, count) in order {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((name, count));
        }
    }

    best.map(|(name, count)| TopInvestor {
        name: name.to_string(),
        count,
    })
}

/// Computes digest statistics.
///
/// Events are taken in company order, then event order. Amounts that do not
/// coerce to a number are left out of `total`, `median` and `largest`, but
/// still counted per round.
pub fn compute_stats(digests: &[CompanyDigest]) -> DigestStats<'_> {
    let events: Vec<(&CompanyDigest, &FundingEvent)> = digests
        .iter()
        .flat_map(|c| c.funding_events.iter().map(move |e| (c, e)))
        .collect();

    let amounts: Vec<f64> = events
        .iter()
        .filter_map(|(_, e)| amount_to_number(e.amount_value()))
        .collect();

    let total: f64 = amounts.iter().sum();
    let currency = events.iter().find_map(|&(_, e)| e.currency());

    let mut largest = Largest::default();
    for &(company, event) in &events {
        let numeric = amount_to_number(event.amount_value()).unwrap_or(f64::NEG_INFINITY);
        if largest.event.is_none() || numeric > largest.numeric {
            largest = Largest {
                event: Some(event),
                company: Some(company),
                numeric,
            };
        }
    }

    let mut by_round = BTreeMap::new();
    for (_, event) in &events {
        *by_round.entry(round_key(event)).or_insert(0) += 1;
    }

    DigestStats {
        event_count: events.len(),
        total,
        median: median(amounts),
        currency,
        largest,
        by_round,
        top_investor: top_investor(events.iter().map(|(_, e)| *e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::format_currency_short;
    use crate::models::{AmountValue, CompanyInfo, Investor};

    fn event(value: f64) -> FundingEvent {
        FundingEvent::empty().with_amount(AmountValue::Number(value), Some("EUR"))
    }

    fn company(name: &str, events: Vec<FundingEvent>) -> CompanyDigest {
        CompanyDigest::new(CompanyInfo::new(name)).with_events(events)
    }

    fn with_investors(names: &[&str]) -> FundingEvent {
        FundingEvent::empty().with_investors(names.iter().map(|n| Investor::new(*n)).collect())
    }

    #[test]
    fn test_median() {
        assert_eq!(median(vec![1.0, 3.0]), 2.0);
        assert_eq!(median(vec![3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(vec![]), 0.0);
    }

    #[test]
    fn test_end_to_end_totals() {
        let digests = vec![
            company("A", vec![event(1_000_000.0), event(5_000_000.0)]),
            company("B", vec![event(2_000_000.0)]),
        ];

        let stats = compute_stats(&digests);

        assert_eq!(stats.total, 8_000_000.0);
        assert_eq!(stats.median, 2_000_000.0);
        assert_eq!(stats.largest.numeric, 5_000_000.0);
        assert_eq!(stats.largest.company.unwrap().company.name, "A");
        assert_eq!(stats.currency, Some("EUR"));
        assert_eq!(format_currency_short(stats.total, stats.currency), "€8.0M");
        assert_eq!(format_currency_short(stats.median, stats.currency), "€2.0M");
    }

    #[test]
    fn test_empty_digest() {
        let stats = compute_stats(&[]);
        assert_eq!(stats.event_count, 0);
        assert_eq!(stats.total, 0.0);
        assert_eq!(stats.median, 0.0);
        assert!(stats.currency.is_none());
        assert!(stats.largest.event.is_none());
        assert_eq!(stats.largest.numeric, f64::NEG_INFINITY);
        assert!(stats.by_round.is_empty());
        assert!(stats.top_investor.is_none());
    }

    #[test]
    fn test_largest_tie_keeps_earliest() {
        let digests = vec![
            company("First", vec![event(10.0).with_round("seed")]),
            company("Second", vec![event(10.0).with_round("series-a")]),
        ];

        let stats = compute_stats(&digests);

        assert_eq!(stats.largest.event.unwrap().round.as_deref(), Some("seed"));
        assert_eq!(stats.largest.company.unwrap().company.name, "First");
    }

    #[test]
    fn test_largest_with_unparseable_amounts() {
        let undisclosed = FundingEvent::empty()
            .with_amount(AmountValue::Text("undisclosed".to_string()), None)
            .with_round("seed");
        let digests = vec![company("Quiet", vec![undisclosed])];

        let stats = compute_stats(&digests);

        assert_eq!(stats.largest.event.unwrap().round.as_deref(), Some("seed"));
        assert_eq!(stats.largest.numeric, f64::NEG_INFINITY);
        assert_eq!(stats.total, 0.0);
    }

    #[test]
    fn test_text_amounts_are_coerced() {
        let digests = vec![company(
            "Text",
            vec![
                FundingEvent::empty().with_amount(AmountValue::Text("€1,500,000".to_string()), None),
                event(500_000.0),
            ],
        )];

        let stats = compute_stats(&digests);

        assert_eq!(stats.total, 2_000_000.0);
        assert_eq!(stats.largest.numeric, 1_500_000.0);
    }

    #[test]
    fn test_currency_from_first_event_with_one() {
        let digests = vec![company(
            "Mixed",
            vec![
                FundingEvent::empty(),
                FundingEvent::empty().with_amount(AmountValue::Number(1.0), Some("USD")),
                event(2.0),
            ],
        )];

        assert_eq!(compute_stats(&digests).currency, Some("USD"));
    }

    #[test]
    fn test_by_round_counts_every_event() {
        let digests = vec![
            company(
                "A",
                vec![
                    event(1.0).with_round("Seed"),
                    event(2.0).with_round("seed"),
                    FundingEvent::empty(),
                ],
            ),
            company(
                "B",
                vec![
                    FundingEvent::empty().with_round(""),
                    FundingEvent::empty().with_round("Series-A"),
                ],
            ),
        ];

        let stats = compute_stats(&digests);

        assert_eq!(stats.by_round.get("seed"), Some(&2));
        assert_eq!(stats.by_round.get("unknown"), Some(&2));
        assert_eq!(stats.by_round.get("series-a"), Some(&1));
        assert_eq!(stats.by_round.values().sum::<usize>(), stats.event_count);
        assert_eq!(stats.event_count, 5);
    }

    #[test]
    fn test_top_investor() {
        let digests = vec![
            company("A", vec![with_investors(&["A", "B"])]),
            company("B", vec![with_investors(&[" A "])]),
        ];

        let top = compute_stats(&digests).top_investor.unwrap();

        assert_eq!(top.name, "A");
        assert_eq!(top.count, 2);
    }

    #[test]
    fn test_top_investor_tie_goes_to_first_seen() {
        let digests = vec![company(
            "A",
            vec![with_investors(&["Beta", "Alpha"]), with_investors(&["Alpha", "Beta"])],
        )];

        let top = compute_stats(&digests).top_investor.unwrap();

        assert_eq!(top.name, "Beta");
        assert_eq!(top.count, 2);
    }

    #[test]
    fn test_top_investor_skips_blank_names() {
        let digests = vec![company("A", vec![with_investors(&["", "   "])])];
        assert!(compute_stats(&digests).top_investor.is_none());
    }
}
