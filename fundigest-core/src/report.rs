//! Display strings for a digest report.
//!
//! [`ReportView`] derives every figure shown on the report page from a
//! [`DigestRoot`]. It can be serialized for JSON output or rendered as plain
//! text through `Display`.

use std::fmt;

use serde::Serialize;

use crate::coerce::{amount_to_number, format_currency_short, format_date, month_label, EM_DASH};
use crate::models::{CompanyDigest, CompanyInfo, DigestRoot, FundingEvent, SourceDocument};
use crate::stats::{compute_stats, DigestStats};

/// Rounds shown as pills, in display order.
const ROUND_ORDER: [&str; 9] = [
    "pre-seed", "seed", "series-a", "series-b", "series-c", "series-d", "grant", "debt", "unknown",
];

const UNTITLED_COMPANY: &str = "Untitled company";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundPill {
    pub key: String,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLink {
    pub label: String,
    pub url: Option<String>,
}

impl From<&SourceDocument> for SourceLink {
    fn from(source: &SourceDocument) -> Self {
        let label = [&source.publisher, &source.title]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .cloned()
            .unwrap_or_else(|| "Source".to_string());
        Self {
            label,
            url: source.url.clone().filter(|u| !u.is_empty()),
        }
    }
}

/// One company as shown on the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyCard {
    pub name: String,
    pub website: Option<String>,
    pub founders: String,
    pub industry: String,
    pub location: String,
    pub employees: String,
    pub amount: String,
    pub round_label: Option<String>,
    pub announced: Option<String>,
    pub investor_count: usize,
    pub investors: Vec<String>,
    pub lead_investor: Option<String>,
    pub sources: Vec<SourceLink>,
}

fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => EM_DASH.to_string(),
    }
}

/// Host of a website without a leading `www.`, or the raw text when it is
/// not a URL.
fn website_domain(website: &str) -> String {
    match reqwest::Url::parse(website) {
        Ok(url) => match url.host_str() {
            Some(host) => host.trim_start_matches("www.").to_string(),
            None => website.to_string(),
        },
        Err(_) => website.to_string(),
    }
}

/// Headline amount of a company: the sum across rounds when it has several
/// with at least one numeric amount, otherwise the first round's figure.
fn highlight_amount(events: &[FundingEvent]) -> (String, bool) {
    let numeric: Vec<f64> = events
        .iter()
        .filter_map(|e| amount_to_number(e.amount_value()))
        .collect();

    if events.len() > 1 && !numeric.is_empty() {
        let currency = events.iter().find_map(|e| e.currency());
        return (format_currency_short(numeric.iter().sum(), currency), true);
    }

    let Some(first) = events.first() else {
        return (EM_DASH.to_string(), false);
    };
    if let Some(value) = amount_to_number(first.amount_value()) {
        return (format_currency_short(value, first.currency()), false);
    }
    match first.amount.as_ref().and_then(|a| a.as_reported.as_deref()) {
        Some(reported) if !reported.is_empty() => (reported.to_string(), false),
        _ => (EM_DASH.to_string(), false),
    }
}

impl CompanyCard {
    pub fn build(digest: &CompanyDigest) -> Self {
        let info: &CompanyInfo = &digest.company;
        let events = &digest.funding_events;
        let first = events.first();
        let (amount, summed) = highlight_amount(events);

        let round_label = if summed {
            Some(format!("{} rounds", events.len()))
        } else {
            first
                .and_then(|e| e.round.as_deref())
                .filter(|r| !r.is_empty())
                .map(str::to_uppercase)
        };

        let investors: Vec<String> = first
            .map(|e| {
                e.investors
                    .iter()
                    .map(|i| match (i.name.is_empty(), &i.website) {
                        (false, _) => i.name.clone(),
                        (true, Some(site)) if !site.is_empty() => site.clone(),
                        _ => "Investor".to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let owners: Vec<&str> = info
            .owners
            .iter()
            .flatten()
            .map(String::as_str)
            .filter(|o| !o.is_empty())
            .collect();

        Self {
            name: if info.name.is_empty() {
                UNTITLED_COMPANY.to_string()
            } else {
                info.name.clone()
            },
            website: info.website.clone().filter(|w| !w.is_empty()),
            founders: if owners.is_empty() {
                EM_DASH.to_string()
            } else {
                owners.join(" · ")
            },
            industry: or_dash(info.industry.as_deref()),
            location: or_dash(info.country()),
            employees: match info.num_employees {
                Some(n) if n != 0 => n.to_string(),
                _ => EM_DASH.to_string(),
            },
            amount,
            round_label,
            announced: first
                .and_then(|e| e.announced_date.as_deref())
                .filter(|d| !d.is_empty())
                .map(|d| format_date(Some(d))),
            investor_count: investors.len(),
            investors,
            lead_investor: first
                .and_then(|e| e.lead_investor.as_ref())
                .map(|l| l.name.clone())
                .filter(|n| !n.is_empty()),
            sources: events
                .iter()
                .flat_map(|e| e.source_documents.iter())
                .map(SourceLink::from)
                .collect(),
        }
    }
}

/// Everything the report page displays, as text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    pub month_label: Option<String>,
    pub summary: Option<String>,
    pub deals_count: usize,
    pub total_display: String,
    pub total_subtitle: Option<String>,
    pub median_display: String,
    pub largest_display: String,
    pub largest_subtitle: Option<String>,
    pub round_pills: Vec<RoundPill>,
    pub top_investor: Option<String>,
    pub companies: Vec<CompanyCard>,
}

fn round_pills(stats: &DigestStats<'_>) -> Vec<RoundPill> {
    ROUND_ORDER
        .iter()
        .filter_map(|&round| {
            let count = stats.by_round.get(round).copied().unwrap_or(0);
            (count > 0).then(|| RoundPill {
                key: round.to_string(),
                label: format!("Rounds: {}", round.replacen('-', " ", 1)),
                value: count.to_string(),
            })
        })
        .collect()
}

fn largest_subtitle(stats: &DigestStats<'_>) -> Option<String> {
    let event = stats.largest.event?;
    let parts: Vec<String> = [
        event.round.as_deref().map(str::to_uppercase),
        stats.largest.company.map(|c| c.company.name.clone()),
    ]
    .into_iter()
    .flatten()
    .filter(|p| !p.is_empty())
    .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" — "))
    }
}

impl ReportView {
    pub fn build(root: &DigestRoot) -> Self {
        let digests = &root.company_funding_digests;
        let stats = compute_stats(digests);
        let has_deals = !digests.is_empty();

        let money = |value: f64| {
            if has_deals {
                format_currency_short(value, stats.currency)
            } else {
                EM_DASH.to_string()
            }
        };

        Self {
            month_label: month_label(digests),
            summary: root.summary.clone().filter(|s| !s.is_empty()),
            deals_count: digests.len(),
            total_display: money(stats.total),
            total_subtitle: stats.currency.filter(|_| has_deals).map(str::to_string),
            median_display: money(stats.median),
            largest_display: if stats.largest.numeric.is_finite() {
                format_currency_short(stats.largest.numeric, stats.currency)
            } else {
                EM_DASH.to_string()
            },
            largest_subtitle: largest_subtitle(&stats),
            round_pills: round_pills(&stats),
            top_investor: stats
                .top_investor
                .as_ref()
                .map(|t| format!("{} ({})", t.name, t.count)),
            companies: digests.iter().map(CompanyCard::build).collect(),
        }
    }
}

impl fmt::Display for CompanyCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}", "-".repeat(self.name.chars().count()))?;

        match &self.round_label {
            Some(round) => writeln!(f, "Round size: {} ({})", self.amount, round)?,
            None => writeln!(f, "Round size: {}", self.amount)?,
        }
        if let Some(announced) = &self.announced {
            writeln!(f, "Announced: {}", announced)?;
        }

        writeln!(f, "Founders: {}", self.founders)?;
        writeln!(f, "Industry: {}", self.industry)?;
        writeln!(f, "Location: {}", self.location)?;
        writeln!(f, "Employees: {}", self.employees)?;
        match &self.website {
            Some(site) => writeln!(f, "Website: {}", website_domain(site))?,
            None => writeln!(f, "Website: {}", EM_DASH)?,
        }

        if self.investors.is_empty() {
            writeln!(f, "Investors: {}", EM_DASH)?;
        } else {
            writeln!(f, "Investors ({}):", self.investor_count)?;
            for investor in &self.investors {
                if self.lead_investor.as_ref() == Some(investor) {
                    writeln!(f, "  - {} [lead]", investor)?;
                } else {
                    writeln!(f, "  - {}", investor)?;
                }
            }
        }

        if !self.sources.is_empty() {
            writeln!(f, "Sources:")?;
            for source in &self.sources {
                match &source.url {
                    Some(url) => writeln!(f, "  - {} <{}>", source.label, url)?,
                    None => writeln!(f, "  - {}", source.label)?,
                }
            }
        }

        Ok(())
    }
}

impl fmt::Display for ReportView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = self.month_label.as_deref().unwrap_or("Monthly digest");
        writeln!(f, "{}", title)?;
        writeln!(f, "{}", "=".repeat(title.chars().count()))?;

        if let Some(summary) = &self.summary {
            writeln!(f, "\n{}", summary)?;
        }

        writeln!(f)?;
        writeln!(f, "Deals tracked: {}", self.deals_count)?;
        match &self.total_subtitle {
            Some(currency) => writeln!(f, "Total raised: {} ({})", self.total_display, currency)?,
            None => writeln!(f, "Total raised: {}", self.total_display)?,
        }
        writeln!(f, "Median round: {}", self.median_display)?;
        match &self.largest_subtitle {
            Some(subtitle) => writeln!(f, "Largest round: {} ({})", self.largest_display, subtitle)?,
            None => writeln!(f, "Largest round: {}", self.largest_display)?,
        }

        let pills: Vec<String> = self
            .round_pills
            .iter()
            .map(|p| format!("{}: {}", p.label, p.value))
            .chain(
                self.top_investor
                    .iter()
                    .map(|t| format!("Top mentioned investor: {}", t)),
            )
            .collect();
        if !pills.is_empty() {
            writeln!(f, "{}", pills.join(" | "))?;
        }

        if self.companies.is_empty() {
            writeln!(f, "\nNo funding announcements matched the criteria for this period.")?;
        }
        for card in &self.companies {
            writeln!(f)?;
            write!(f, "{}", card)?;
        }

        Ok(())
    }
}
