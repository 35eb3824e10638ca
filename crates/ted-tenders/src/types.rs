//! Core data types: what the portal shows and what gets exported.

use serde::{Deserialize, Serialize};

/// One line of a search result page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchHit {
    pub notice_number: String,
    pub description: Option<String>,
    pub country: Option<String>,
    pub publication_date: Option<String>,
    pub deadline: Option<String>,
}

/// An organisation involved in a notice, with its roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organisation {
    pub id: String,
    pub name: String,
    pub registration_number: Option<String>,
    /// Deduplicated and sorted.
    pub roles: Vec<String>,
}

/// One procurement notice as read from its detail page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Notice {
    pub notice_number: String,
    /// Original-language description.
    pub description: Option<String>,
    pub buyer_name: Option<String>,
    pub buyer_email: Option<String>,
    pub organisations: Vec<Organisation>,
    /// Value text exactly as shown on the page.
    pub value_text: Option<String>,
    /// Parsed value, when `value_text` is a number.
    pub estimated_value: Option<f64>,
    pub currency: Option<String>,
    pub procedure_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub pdf_link: Option<String>,
}

/// Exported record for one notice. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub notice_number: String,
    pub description: String,
    /// Converted amount, or the original amount when conversion failed.
    pub value: Option<f64>,
    pub currency: Option<String>,
    pub buyer_name: Option<String>,
    /// JSON array of [`Organisation`].
    pub organisations: String,
    pub pdf_link: Option<String>,
    pub value_converted: bool,
    pub original_value: Option<String>,
    pub original_currency: Option<String>,
    pub conversion_note: Option<String>,
    pub buyer_email: Option<String>,
    pub procedure_id: Option<String>,
    pub country: Option<String>,
    pub publication_date: Option<String>,
    pub deadline: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Column names, in the order fields are serialized.
pub const ROW_COLUMNS: [&str; 18] = [
    "notice_number",
    "description",
    "value",
    "currency",
    "buyer_name",
    "organisations",
    "pdf_link",
    "value_converted",
    "original_value",
    "original_currency",
    "conversion_note",
    "buyer_email",
    "procedure_id",
    "country",
    "publication_date",
    "deadline",
    "start_date",
    "end_date",
];
