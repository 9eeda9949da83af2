//! Domain models for the quotation pipeline.
//!
//! - [`ClientDetails`] - The insured person and the cover they want
//! - [`PremiumOption`] - One insurer/plan row of the comparison
//! - [`FinalNotes`] - Optional advisory text
//! - [`Money`] - Currency amount
//! - [`ModelWarning`] - Non-fatal data inconsistencies
//!
//! All records are built once per pipeline run and never mutated afterwards.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Money
// =============================================================================

/// A non-negative currency amount in rupees.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(f64);

impl Money {
    /// Largest accepted amount. Paise stay exact in `f64` below this.
    pub const MAX: f64 = 1e13;

    /// Build from a parsed amount. Negative, non-finite or larger than
    /// [`Money::MAX`] values are rejected.
    pub fn new(amount: f64) -> Option<Self> {
        (amount.is_finite() && (0.0..=Self::MAX).contains(&amount)).then_some(Self(amount))
    }

    pub fn amount(&self) -> f64 {
        self.0
    }

    /// Amount rounded to paise.
    pub fn paise(&self) -> i64 {
        (self.0 * 100.0).round() as i64
    }
}

// =============================================================================
// Client Details
// =============================================================================

/// The client the quote is prepared for.
///
/// Only the name is mandatory; every other field is `None` when its cell was
/// blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDetails {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    /// Age as supplied in the workbook.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum_assured: Option<Money>,
    /// Policy term in years.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_term: Option<u32>,
    /// Premium payment term in years.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ppt: Option<u32>,
    /// Other filled client-sheet columns, as (header, value).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<(String, String)>,
}

impl ClientDetails {
    /// Create a client with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            date_of_birth: None,
            age: None,
            city: None,
            sum_assured: None,
            policy_term: None,
            ppt: None,
            extra: Vec::new(),
        }
    }

    /// PPT/policy-term discrepancy, if both are known and PPT is longer.
    pub fn term_warning(&self) -> Option<ModelWarning> {
        match (self.ppt, self.policy_term) {
            (Some(ppt), Some(policy_term)) if ppt > policy_term => {
                Some(ModelWarning::PptExceedsPolicyTerm { ppt, policy_term })
            }
            _ => None,
        }
    }
}

// =============================================================================
// Premium Option
// =============================================================================

/// One quoted plan.
///
/// At least one of the two premiums is always present: rows without any are
/// dropped during extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumOption {
    /// 1-based row in the source sheet.
    pub row: usize,
    pub insurance_company: String,
    pub plan_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regular_premium: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ten_pay_premium: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_notes: Option<String>,
}

// =============================================================================
// Final Notes
// =============================================================================

/// Advisory text from the optional notes sheet, one entry per paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalNotes {
    pub paragraphs: Vec<String>,
}

impl FinalNotes {
    /// `None` when there is nothing to say.
    pub fn from_paragraphs(paragraphs: Vec<String>) -> Option<Self> {
        let paragraphs: Vec<String> = paragraphs
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        (!paragraphs.is_empty()).then_some(Self { paragraphs })
    }
}

// =============================================================================
// Warnings
// =============================================================================

/// Why a premium row was left out of the comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DropReason {
    /// Neither premium column has a value.
    NoPremium,
    /// The plan name cell is blank.
    NoPlanName,
}

/// A data inconsistency that does not stop the document from being produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ModelWarning {
    /// Premiums are paid for longer than the policy runs.
    #[serde(rename_all = "camelCase")]
    PptExceedsPolicyTerm { ppt: u32, policy_term: u32 },
    /// A premium row was not included.
    #[serde(rename_all = "camelCase")]
    PremiumOptionDropped {
        row: usize,
        plan: Option<String>,
        reason: DropReason,
    },
}

impl fmt::Display for ModelWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelWarning::PptExceedsPolicyTerm { ppt, policy_term } => write!(
                f,
                "Premium payment term ({} years) exceeds policy term ({} years)",
                ppt, policy_term
            ),
            ModelWarning::PremiumOptionDropped { row, plan, reason } => {
                let what = match plan {
                    Some(p) => format!("Premium row {} ('{}')", row, p),
                    None => format!("Premium row {}", row),
                };
                match reason {
                    DropReason::NoPremium => write!(f, "{} omitted: no premium provided", what),
                    DropReason::NoPlanName => write!(f, "{} omitted: no plan name", what),
                }
            }
        }
    }
}
