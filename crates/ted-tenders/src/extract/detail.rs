//! Notice detail page parsing.
//!
//! Pure function over markup: the same HTML always yields the same
//! [`Notice`]. Only the publication number is required; every other field
//! degrades to `None` when the portal omits it.

use std::collections::BTreeSet;

use scraper::{ElementRef, Html};

use super::dom::{
    find_label, find_section, label_data_spans, label_value, non_empty, section_content,
    select_all, select_first, stripped_text,
};
use crate::currency::parse_amount;
use crate::error::ExtractError;
use crate::types::{Notice, Organisation};

const NOTICE_INFO_KEY: &str = "auxiliary|text|notice-information";
const BUYER_KEY: &str = "auxiliary|text|buyer";
const PROCEDURE_KEY: &str = "auxiliary|text|procedure";

const PUBLICATION_NUMBER_LABELS: [&str; 2] = ["Notice publication number", "Publication number"];

const VALUE_LABELS: [&str; 3] = ["Estimated value", "Estimated total value", "Total value"];

/// Extract a [`Notice`] from a rendered detail page.
pub fn extract_notice(html: &str) -> Result<Notice, ExtractError> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let notice_info = find_section(root, NOTICE_INFO_KEY).and_then(section_content);
    let notice_number = PUBLICATION_NUMBER_LABELS
        .iter()
        .find_map(|label| {
            notice_info
                .and_then(|content| label_value(content, label))
                .or_else(|| label_value(root, label))
        })
        .ok_or(ExtractError::MissingField("notice publication number"))?;

    let procedure = find_section(root, PROCEDURE_KEY).map(|s| section_content(s).unwrap_or(s));
    let summary = select_first(root, "section#summary");

    let (buyer_name, buyer_email) = extract_buyer(root, summary);
    let (value_text, currency) = extract_value(summary, procedure);
    let estimated_value = value_text.as_deref().and_then(parse_amount);
    let (start_date, end_date) = extract_dates(root, summary);

    let description = procedure
        .and_then(|p| label_value(p, "Description"))
        .or_else(|| label_value(root, "Description"))
        .or_else(|| label_value(root, "Title"));

    let procedure_id = notice_info.and_then(|content| {
        let parts = label_data_spans(content, "Notice identifier/version");
        let joined = parts
            .iter()
            .take(2)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" - ");
        non_empty(joined.trim_matches(|c| c == ' ' || c == '-').to_string())
    });

    Ok(Notice {
        notice_number,
        description,
        buyer_name,
        buyer_email,
        organisations: extract_organisations(root),
        value_text,
        estimated_value,
        currency,
        procedure_id,
        start_date,
        end_date,
        pdf_link: extract_pdf_link(root),
    })
}

fn extract_buyer(
    root: ElementRef<'_>,
    summary: Option<ElementRef<'_>>,
) -> (Option<String>, Option<String>) {
    if let Some(block) = summary.and_then(|s| select_first(s, "div.summary-section")) {
        let name = label_value(block, "Buyer");
        if name.is_some() {
            return (name, label_value(block, "Email"));
        }
    }

    // First organisation block after the buyer section header.
    let org = find_section(root, BUYER_KEY)
        .and_then(section_content)
        .filter(|content| org_id(*content).is_some());
    match org {
        Some(content) => (
            label_value(content, "Official name"),
            label_value(content, "Email"),
        ),
        None => (None, None),
    }
}

fn extract_value(
    summary: Option<ElementRef<'_>>,
    procedure: Option<ElementRef<'_>>,
) -> (Option<String>, Option<String>) {
    for scope in [summary, procedure].into_iter().flatten() {
        for label in VALUE_LABELS {
            let spans = label_data_spans(scope, label);
            if spans.len() >= 2 {
                return (non_empty(spans[0].clone()), non_empty(spans[1].clone()));
            }
        }
    }
    (None, None)
}

fn extract_dates(
    root: ElementRef<'_>,
    summary: Option<ElementRef<'_>>,
) -> (Option<String>, Option<String>) {
    let scope = summary
        .filter(|s| find_label(*s, "Start date").is_some())
        .unwrap_or(root);
    let start = label_value(scope, "Start date");
    let end = label_value(scope, "Duration end date").or_else(|| label_value(scope, "End date"));
    (start, end)
}

fn extract_pdf_link(root: ElementRef<'_>) -> Option<String> {
    select_first(root, r#"#formats-accordion a.download-pdf[id="EN"]"#)
        .and_then(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
}

/// `ORG-0001` style identifier of an organisation block.
fn org_id(section: ElementRef<'_>) -> Option<String> {
    select_all(section, "span.bold")
        .into_iter()
        .map(stripped_text)
        .find(|t| t.starts_with("ORG-"))
}

fn extract_organisations(root: ElementRef<'_>) -> Vec<Organisation> {
    let mut seen = BTreeSet::new();
    let mut organisations = Vec::new();

    for section in select_all(root, "div.section-content") {
        let Some(id) = org_id(section) else {
            continue;
        };
        let Some(name) = label_value(section, "Official name") else {
            continue;
        };
        if !seen.insert(id.clone()) {
            continue;
        }
        organisations.push(Organisation {
            id,
            name,
            registration_number: label_value(section, "Registration number"),
            roles: extract_roles(section),
        });
    }

    organisations
}

fn extract_roles(section: ElementRef<'_>) -> Vec<String> {
    let Some(header) = select_all(section, "span.bold")
        .into_iter()
        .find(|el| stripped_text(*el).contains("Roles of this organisation"))
    else {
        return Vec::new();
    };

    let has_labels = |el: ElementRef<'_>| select_first(el, "span.label").is_some();
    let mut container = header
        .parent()
        .and_then(ElementRef::wrap)
        .filter(|el| el.value().name() == "div");
    if !container.is_some_and(has_labels) {
        let sibling = header
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "div");
        if let Some(div) = sibling.filter(|div| has_labels(*div)) {
            container = Some(div);
        }
    }

    let roles: BTreeSet<String> = container
        .map(|c| select_all(c, "span.label"))
        .unwrap_or_default()
        .into_iter()
        .map(stripped_text)
        .filter(|r| !r.is_empty())
        .collect();
    roles.into_iter().collect()
}
