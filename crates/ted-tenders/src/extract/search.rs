//! Search result page parsing.

use scraper::{ElementRef, Html};

use super::dom::{has_class, non_empty, select_all, select_first, stripped_text};
use crate::error::ExtractError;
use crate::types::SearchHit;

const RESULTS_BODY: &str = "tbody.CustomReactClasses-MuiTableBody-root";
const RESULT_ROW: &str = "CustomReactClasses-MuiTableRow-root";

/// Parse every notice listed on one rendered search result page.
///
/// An empty vector means the page is past the last result. A page without
/// the results table fails with `MissingField("results table")`.
pub fn parse_search_results(html: &str) -> Result<Vec<SearchHit>, ExtractError> {
    let document = Html::parse_document(html);
    let body = select_first(document.root_element(), RESULTS_BODY)
        .ok_or(ExtractError::MissingField("results table"))?;

    let hits = body
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "tr" && has_class(*el, RESULT_ROW))
        .filter_map(parse_row)
        .collect();
    Ok(hits)
}

fn parse_row(row: ElementRef<'_>) -> Option<SearchHit> {
    let cells: Vec<ElementRef<'_>> = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "td")
        .collect();
    if cells.len() < 6 {
        return None;
    }

    let notice_number = select_first(cells[1], "a")
        .map(stripped_text)
        .unwrap_or_default();

    let description = select_first(cells[2], "ul li").and_then(|item| {
        let parts: String = item
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "span")
            .map(stripped_text)
            .collect();
        non_empty(parts)
    });

    if notice_number.is_empty() && description.is_none() {
        return None;
    }

    let country = non_empty(stripped_text(cells[3]));
    let publication_date = select_first(cells[4], "ul li")
        .map(stripped_text)
        .and_then(non_empty);

    let deadline = if select_first(cells[5], "ul").is_some() {
        let dates: Vec<String> = select_all(cells[5], "ul li")
            .into_iter()
            .map(stripped_text)
            .filter(|d| !d.is_empty())
            .collect();
        non_empty(dates.join(" / "))
    } else {
        select_first(cells[5], "span")
            .map(stripped_text)
            .and_then(non_empty)
    };

    Some(SearchHit {
        notice_number,
        description,
        country,
        publication_date,
        deadline,
    })
}
