use scraper::{Html, Selector};

/// Title and outbound links extracted from one response body. Both are
/// read from a single parsed `Html` document so the body only needs to be
/// buffered once.
pub struct ExtractedPage {
    pub title: String,
    pub links: Vec<String>,
}

/// Scans HTML tokens for the first `<title>` element and returns the text
/// of its immediate text node, or an empty string if there is none.
pub fn extract(body: &str) -> ExtractedPage {
    let document = Html::parse_document(body);

    let title_selector = Selector::parse("title").expect("static selector");
    let title = document
        .select(&title_selector)
        .next()
        .and_then(|element| element.text().next())
        .unwrap_or_default()
        .to_string();

    let link_selector = Selector::parse("a[href]").expect("static selector");
    let links = document
        .select(&link_selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect();

    ExtractedPage { title, links }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_title_and_links() {
        let page = extract(
            r#"<html><head><title>Hello</title></head>
               <body><a href="/a">a</a><a href="https://other.example/b">b</a></body></html>"#,
        );
        assert_eq!(page.title, "Hello");
        assert_eq!(page.links, vec!["/a", "https://other.example/b"]);
    }

    #[test]
    fn missing_title_is_empty() {
        let page = extract("<html><body>no title here</body></html>");
        assert_eq!(page.title, "");
        assert!(page.links.is_empty());
    }
}
