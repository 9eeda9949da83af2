//! Logical document structure and the builder that derives it.
//!
//! The builder is pure: given the same extraction, config and timestamp it
//! returns the same [`QuoteDocument`]. All display strings (currency, dates,
//! derived ages) are computed here so the renderer only lays text out.

use chrono::NaiveDateTime;
use serde::Serialize;

use super::format::{age_on, format_date, format_money, format_timestamp, format_years};
use crate::config::QuoteConfig;
use crate::models::{ClientDetails, ModelWarning, Money, PremiumOption};
use crate::transform::extract::Extraction;

/// Placeholder for values that were not provided.
pub const NOT_PROVIDED: &str = "-";

pub const CLIENT_HEADING: &str = "Client Details";
pub const COVER_HEADING: &str = "Cover Details";
pub const PREMIUM_HEADING: &str = "Premium Comparison (Regular/10 Pay)";
pub const NOTES_HEADING: &str = "Advisory Note";
pub const DATA_NOTES_HEADING: &str = "Data Notes";
pub const CONTACT_HEADING: &str = "Contact Now";

/// Firm, title, client and timestamp lines at the top of the quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderSection {
    pub firm_name: String,
    pub title: String,
    pub client_name: String,
    pub generated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabeledValue {
    pub label: String,
    pub value: String,
}

/// Field/value table of the client, with any discrepancies to show the reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientSection {
    pub heading: String,
    pub rows: Vec<LabeledValue>,
    pub warnings: Vec<ModelWarning>,
}

/// A simple table: header row plus data rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSection {
    pub heading: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Heading followed by plain paragraphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextSection {
    pub heading: String,
    pub paragraphs: Vec<String>,
}

/// One block of the quote, in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Section {
    Header(HeaderSection),
    ClientDetails(ClientSection),
    CoverDetails(TableSection),
    PremiumComparison(TableSection),
    FinalNotes(TextSection),
    DataNotes(TextSection),
    Contact(TextSection),
}

/// Discriminant of [`Section`], handy for structural comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionKind {
    Header,
    ClientDetails,
    CoverDetails,
    PremiumComparison,
    FinalNotes,
    DataNotes,
    Contact,
}

impl Section {
    pub fn kind(&self) -> SectionKind {
        match self {
            Section::Header(_) => SectionKind::Header,
            Section::ClientDetails(_) => SectionKind::ClientDetails,
            Section::CoverDetails(_) => SectionKind::CoverDetails,
            Section::PremiumComparison(_) => SectionKind::PremiumComparison,
            Section::FinalNotes(_) => SectionKind::FinalNotes,
            Section::DataNotes(_) => SectionKind::DataNotes,
            Section::Contact(_) => SectionKind::Contact,
        }
    }
}

/// The logical quote: an ordered section list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuoteDocument {
    pub sections: Vec<Section>,
}

impl QuoteDocument {
    pub fn section_kinds(&self) -> Vec<SectionKind> {
        self.sections.iter().map(Section::kind).collect()
    }

    pub fn client_details(&self) -> Option<&ClientSection> {
        self.sections.iter().find_map(|s| match s {
            Section::ClientDetails(c) => Some(c),
            _ => None,
        })
    }

    pub fn premium_table(&self) -> Option<&TableSection> {
        self.sections.iter().find_map(|s| match s {
            Section::PremiumComparison(t) => Some(t),
            _ => None,
        })
    }

    /// Same sections with the generation timestamp blanked, for comparing runs.
    pub fn without_timestamp(&self) -> Self {
        let sections = self
            .sections
            .iter()
            .cloned()
            .map(|s| match s {
                Section::Header(h) => Section::Header(HeaderSection {
                    generated_at: String::new(),
                    ..h
                }),
                other => other,
            })
            .collect();
        Self { sections }
    }
}

/// Document plus every warning raised while reading and building it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuiltDocument {
    pub document: QuoteDocument,
    pub warnings: Vec<ModelWarning>,
}

/// Assembles a [`QuoteDocument`] from extracted records.
#[derive(Debug, Clone, Copy)]
pub struct DocumentModelBuilder<'c> {
    config: &'c QuoteConfig,
}

impl<'c> DocumentModelBuilder<'c> {
    pub fn new(config: &'c QuoteConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, extraction: &Extraction, generated_at: NaiveDateTime) -> BuiltDocument {
        let client = &extraction.client;
        let age = effective_age(client, generated_at);
        let term_warning = client.term_warning();

        let mut sections = vec![
            Section::Header(self.header(client, generated_at)),
            Section::ClientDetails(self.client_section(client, age, term_warning.clone())),
            Section::CoverDetails(self.cover_section(client, age)),
            Section::PremiumComparison(self.premium_table(&extraction.premiums)),
        ];

        if let Some(notes) = &extraction.notes {
            sections.push(Section::FinalNotes(TextSection {
                heading: NOTES_HEADING.to_string(),
                paragraphs: notes.paragraphs.clone(),
            }));
        }

        if self.config.append_warnings && !extraction.warnings.is_empty() {
            sections.push(Section::DataNotes(TextSection {
                heading: DATA_NOTES_HEADING.to_string(),
                paragraphs: extraction.warnings.iter().map(ToString::to_string).collect(),
            }));
        }

        if !self.config.branding.contact_lines.is_empty() {
            sections.push(Section::Contact(TextSection {
                heading: CONTACT_HEADING.to_string(),
                paragraphs: self.config.branding.contact_lines.clone(),
            }));
        }

        let warnings = term_warning
            .into_iter()
            .chain(extraction.warnings.iter().cloned())
            .collect();

        BuiltDocument {
            document: QuoteDocument { sections },
            warnings,
        }
    }

    fn header(&self, client: &ClientDetails, generated_at: NaiveDateTime) -> HeaderSection {
        HeaderSection {
            firm_name: self.config.branding.firm_name.clone(),
            title: self.config.branding.title.clone(),
            client_name: client.name.clone(),
            generated_at: format_timestamp(generated_at, &self.config.format),
        }
    }

    fn client_section(
        &self,
        client: &ClientDetails,
        age: Option<u32>,
        warning: Option<ModelWarning>,
    ) -> ClientSection {
        let cols = &self.config.schema.client_columns;
        let fmt = &self.config.format;

        let values = [
            (&cols.client_name.name, Some(client.name.clone())),
            (&cols.dob.name, client.date_of_birth.map(|d| format_date(d, fmt))),
            (&cols.age.name, age.map(|a| a.to_string())),
            (&cols.city.name, client.city.clone()),
            (&cols.sum_assured.name, client.sum_assured.map(|m| format_money(m, fmt))),
            (&cols.policy_term.name, client.policy_term.map(format_years)),
            (&cols.ppt.name, client.ppt.map(format_years)),
        ];

        ClientSection {
            heading: CLIENT_HEADING.to_string(),
            rows: values
                .into_iter()
                .map(|(label, value)| LabeledValue {
                    label: label.clone(),
                    value: or_placeholder(value),
                })
                .chain(client.extra.iter().map(|(label, value)| LabeledValue {
                    label: label.clone(),
                    value: value.clone(),
                }))
                .collect(),
            warnings: warning.into_iter().collect(),
        }
    }

    fn cover_section(&self, client: &ClientDetails, age: Option<u32>) -> TableSection {
        let cols = &self.config.schema.client_columns;
        let cover_till_age = age
            .zip(client.policy_term)
            .and_then(|(age, term)| age.checked_add(term))
            .map(|till| till.to_string());

        TableSection {
            heading: COVER_HEADING.to_string(),
            columns: vec![
                cols.sum_assured.name.clone(),
                cols.policy_term.name.clone(),
                "Cover Till Age".to_string(),
                cols.ppt.name.clone(),
            ],
            rows: vec![vec![
                or_placeholder(client.sum_assured.map(|m| format_money(m, &self.config.format))),
                or_placeholder(client.policy_term.map(format_years)),
                or_placeholder(cover_till_age),
                or_placeholder(client.ppt.map(format_years)),
            ]],
        }
    }

    fn premium_table(&self, premiums: &[PremiumOption]) -> TableSection {
        let money = |m: Option<Money>| or_placeholder(m.map(|m| format_money(m, &self.config.format)));

        TableSection {
            heading: PREMIUM_HEADING.to_string(),
            columns: vec![
                "Company".to_string(),
                "Plan".to_string(),
                "Regular Premium".to_string(),
                "10 Pay Premium".to_string(),
                "Notes".to_string(),
            ],
            rows: premiums
                .iter()
                .map(|p| {
                    vec![
                        or_placeholder(Some(p.insurance_company.clone()).filter(|c| !c.is_empty())),
                        p.plan_name.clone(),
                        money(p.regular_premium),
                        money(p.ten_pay_premium),
                        p.special_notes.clone().unwrap_or_default(),
                    ]
                })
                .collect(),
        }
    }
}

/// Supplied age wins; otherwise derive from DOB as of the generation date.
fn effective_age(client: &ClientDetails, generated_at: NaiveDateTime) -> Option<u32> {
    client
        .age
        .or_else(|| client.date_of_birth.and_then(|dob| age_on(dob, generated_at.date())))
}

fn or_placeholder(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_PROVIDED.to_string())
}
