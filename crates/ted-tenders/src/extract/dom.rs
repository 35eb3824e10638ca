//! Small DOM helpers over `scraper` for the portal's label/data markup.
//!
//! The portal renders most fields as `<span class="label">Name</span>`
//! followed by one or more `<span class="data">value</span>` siblings.

use scraper::{ElementRef, Selector};

/// All descendants of `scope` matching `css`. Empty on an invalid selector.
pub fn select_all<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(sel) => scope.select(&sel).collect(),
        Err(_) => Vec::new(),
    }
}

/// First descendant of `scope` matching `css`.
pub fn select_first<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let sel = Selector::parse(css).ok()?;
    scope.select(&sel).next()
}

pub fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

/// Concatenated text with every fragment trimmed.
pub fn stripped_text(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).collect::<String>()
}

/// Trimmed text fragments joined with `sep`, skipping empty ones.
pub fn joined_text(el: ElementRef<'_>, sep: &str) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

/// Text of a data element, preferring the text of its first link.
pub fn data_text(el: ElementRef<'_>) -> String {
    match select_first(el, "a") {
        Some(link) => stripped_text(link),
        None => stripped_text(el),
    }
}

pub fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// First `span.label` under `scope` whose text contains `label`.
///
/// Matching is case-sensitive, so `Description` does not hit
/// `Short description`.
pub fn find_label<'a>(scope: ElementRef<'a>, label: &str) -> Option<ElementRef<'a>> {
    select_all(scope, "span.label")
        .into_iter()
        .find(|el| stripped_text(*el).contains(label))
}

/// The value belonging to a label.
///
/// Tried in order: the next `span.data` sibling, a bare text node right
/// after the label, then the next `div` sibling (its text joined with `", "`).
pub fn label_value(scope: ElementRef<'_>, label: &str) -> Option<String> {
    let label_el = find_label(scope, label)?;

    let data = label_el
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "span" && has_class(*el, "data"));
    if let Some(data) = data {
        return non_empty(data_text(data));
    }

    if let Some(text) = label_el.next_sibling().and_then(|n| n.value().as_text()) {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }

    label_el
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "div")
        .and_then(|div| non_empty(joined_text(div, ", ")))
}

/// Texts of all `span.data` elements under the label's parent.
pub fn label_data_spans(scope: ElementRef<'_>, label: &str) -> Vec<String> {
    let Some(parent) = find_label(scope, label)
        .and_then(|el| el.parent())
        .and_then(ElementRef::wrap)
    else {
        return Vec::new();
    };
    select_all(parent, "span.data")
        .into_iter()
        .map(data_text)
        .collect()
}

/// The `div[id^=section]` that contains the `span[data-labels-key=key]` marker.
pub fn find_section<'a>(scope: ElementRef<'a>, key: &str) -> Option<ElementRef<'a>> {
    let marker = select_all(scope, "span[data-labels-key]")
        .into_iter()
        .find(|el| el.value().attr("data-labels-key") == Some(key))?;
    marker.ancestors().filter_map(ElementRef::wrap).find(|el| {
        el.value().name() == "div"
            && el
                .value()
                .attr("id")
                .is_some_and(|id| id.starts_with("section"))
    })
}

/// The `div.section-content` following a section header div.
pub fn section_content<'a>(section: ElementRef<'a>) -> Option<ElementRef<'a>> {
    section
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "div" && has_class(*el, "section-content"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn root(doc: &Html) -> ElementRef<'_> {
        doc.root_element()
    }

    #[test]
    fn test_label_value_prefers_data_span() {
        let doc = Html::parse_fragment(
            r#"<div><span class="label">Official name</span> <span class="data"><a href="/x"> Hospital A </a></span></div>"#,
        );
        assert_eq!(
            label_value(root(&doc), "Official name").as_deref(),
            Some("Hospital A")
        );
    }

    #[test]
    fn test_label_value_falls_back_to_text_node() {
        let doc = Html::parse_fragment(
            r#"<div><span class="label">Email</span> buyer@example.org </div>"#,
        );
        assert_eq!(
            label_value(root(&doc), "Email").as_deref(),
            Some("buyer@example.org")
        );
    }

    #[test]
    fn test_label_value_falls_back_to_div() {
        let doc = Html::parse_fragment(
            r#"<div><span class="label">Address</span><div><p>Main St 1</p><p>Paris</p></div></div>"#,
        );
        assert_eq!(
            label_value(root(&doc), "Address").as_deref(),
            Some("Main St 1, Paris")
        );
    }

    #[test]
    fn test_label_match_is_case_sensitive() {
        let doc = Html::parse_fragment(
            r#"<div>
            <div><span class="label">Subtitle</span><span class="data">Lot 2</span></div>
            <div><span class="label">Short description</span><span class="data">Short</span></div>
            <div><span class="label">Title</span><span class="data">Adalimumab</span></div>
            <div><span class="label">Description</span><span class="data">Long</span></div>
            </div>"#,
        );
        assert_eq!(label_value(root(&doc), "Title").as_deref(), Some("Adalimumab"));
        assert_eq!(label_value(root(&doc), "Description").as_deref(), Some("Long"));
    }

    #[test]
    fn test_label_value_missing() {
        let doc = Html::parse_fragment(r#"<div><span class="label">Other</span></div>"#);
        assert_eq!(label_value(root(&doc), "Email"), None);
    }

    #[test]
    fn test_label_data_spans() {
        let doc = Html::parse_fragment(
            r#"<div><span class="label">Estimated value excluding VAT</span><span class="data">1 000,50</span><span class="data">EUR</span></div>"#,
        );
        assert_eq!(
            label_data_spans(root(&doc), "Estimated value"),
            vec!["1 000,50".to_string(), "EUR".to_string()]
        );
    }

    #[test]
    fn test_find_section_and_content() {
        let doc = Html::parse_document(
            r#"<html><body>
            <div id="section7_notice"><span data-labels-key="auxiliary|text|notice-information">Notice information</span></div>
            <div class="section-content"><span class="label">Publication number</span><span class="data">1-2024</span></div>
            </body></html>"#,
        );
        let section = find_section(doc.root_element(), "auxiliary|text|notice-information").unwrap();
        assert_eq!(section.value().attr("id"), Some("section7_notice"));
        let content = section_content(section).unwrap();
        assert_eq!(
            label_value(content, "Publication number").as_deref(),
            Some("1-2024")
        );
    }
}
