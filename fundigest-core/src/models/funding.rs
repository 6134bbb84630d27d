use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw funding value as it appears in a digest.
///
/// Generated digests carry a number when the amount could be parsed and the
/// original text otherwise, so both shapes are kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for AmountValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountValue::Number(n) => write!(f, "{}", n),
            AmountValue::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Amount {
    pub as_reported: Option<String>,
    pub value: Option<AmountValue>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investor {
    pub name: String,
    pub website: Option<String>,
}

impl Investor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            website: None,
        }
    }

    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub url: Option<String>,
    pub title: Option<String>,
    pub publisher: Option<String>,
    pub published_at: Option<String>,
    pub snippet: Option<String>,
}

impl SourceDocument {
    /// A source with every field unset, as appended by the editor.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// One funding round announcement attached to a company.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundingEvent {
    pub round: Option<String>,
    pub announced_date: Option<String>,
    pub amount: Option<Amount>,
    #[serde(default)]
    pub investors: Vec<Investor>,
    pub lead_investor: Option<Investor>,
    #[serde(default)]
    pub source_documents: Vec<SourceDocument>,
}

impl FundingEvent {
    /// A blank event. The amount object is present with all fields unset.
    pub fn empty() -> Self {
        Self {
            amount: Some(Amount::default()),
            ..Self::default()
        }
    }

    pub fn with_round(mut self, round: impl Into<String>) -> Self {
        self.round = Some(round.into());
        self
    }

    pub fn with_announced_date(mut self, date: impl Into<String>) -> Self {
        self.announced_date = Some(date.into());
        self
    }

    pub fn with_amount(mut self, value: AmountValue, currency: Option<&str>) -> Self {
        self.amount = Some(Amount {
            as_reported: None,
            value: Some(value),
            currency: currency.map(str::to_string),
        });
        self
    }

    pub fn with_investors(mut self, investors: Vec<Investor>) -> Self {
        self.investors = investors;
        self
    }

    /// Value field of the amount, if any.
    pub fn amount_value(&self) -> Option<&AmountValue> {
        self.amount.as_ref().and_then(|a| a.value.as_ref())
    }

    /// Currency of the amount, if set and non-empty.
    pub fn currency(&self) -> Option<&str> {
        self.amount
            .as_ref()
            .and_then(|a| a.currency.as_deref())
            .filter(|c| !c.is_empty())
    }
}
