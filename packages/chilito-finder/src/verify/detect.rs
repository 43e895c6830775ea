//! Menu item detection.
//!
//! Three heuristics, cheapest first, stopping at the first hit:
//! keyword anywhere in the raw page, keyword inside a product element
//! (text normalized), then a transposition-tolerant regex.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};

use crate::types::outcome::Heuristic;

/// Names the item goes by on menu pages.
pub const DEFAULT_KEYWORDS: [&str; 4] = [
    "chili cheese burrito",
    "chilito burrito",
    "chilito",
    "chili burrito",
];

lazy_static! {
    static ref ITEM_SELECTOR: Selector =
        Selector::parse(".product-name, .product-title, .menu-item, .food-item-name").unwrap();
    static ref DEFAULT_PATTERN: Regex =
        Regex::new(r"(?i)chil(i|ito).*burrito|burrito.*chil(i|ito)").unwrap();
}

/// A heuristic hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub heuristic: Heuristic,
    pub matched_text: String,
}

/// What counts as "the item is on this page".
#[derive(Debug, Clone)]
pub struct MenuPredicate {
    /// Lowercased
    keywords: Vec<String>,
    pattern: Regex,
}

impl Default for MenuPredicate {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS, DEFAULT_PATTERN.clone())
    }
}

impl MenuPredicate {
    pub fn new(keywords: impl IntoIterator<Item = impl Into<String>>, pattern: Regex) -> Self {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| Into::<String>::into(k).to_lowercase())
                .filter(|k| !k.trim().is_empty())
                .collect(),
            pattern,
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    fn keyword_in(&self, lowercase_text: &str) -> Option<&str> {
        self.keywords
            .iter()
            .find(|k| lowercase_text.contains(k.as_str()))
            .map(|k| k.as_str())
    }

    /// Run the heuristics in order against one page.
    pub fn detect(&self, page: &str) -> Option<Detection> {
        self.detect_keyword(page)
            .or_else(|| self.detect_item_element(page))
            .or_else(|| self.detect_pattern(page))
    }

    fn detect_keyword(&self, page: &str) -> Option<Detection> {
        let lower = page.to_lowercase();
        self.keyword_in(&lower).map(|k| Detection {
            heuristic: Heuristic::Keyword,
            matched_text: k.to_string(),
        })
    }

    fn detect_item_element(&self, page: &str) -> Option<Detection> {
        let document = Html::parse_document(page);

        document.select(&ITEM_SELECTOR).find_map(|element| {
            // split_whitespace also splits on NBSP
            let text = element
                .text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ");
            self.keyword_in(&text.to_lowercase())
                .is_some()
                .then(|| Detection {
                    heuristic: Heuristic::ItemElement,
                    matched_text: text,
                })
        })
    }

    fn detect_pattern(&self, page: &str) -> Option<Detection> {
        self.pattern.find(page).map(|m| Detection {
            heuristic: Heuristic::Pattern,
            matched_text: m.as_str().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heuristic(page: &str) -> Option<Heuristic> {
        MenuPredicate::default().detect(page).map(|d| d.heuristic)
    }

    #[test]
    fn test_keyword() {
        let detection = MenuPredicate::default()
            .detect("<p>Try the CHILITO today</p>")
            .unwrap();
        assert_eq!(detection.heuristic, Heuristic::Keyword);
        assert_eq!(detection.matched_text, "chilito");
    }

    #[test]
    fn test_item_element_with_nbsp() {
        let page = "<ul><li><h3 class=\"product-name\">Chili&nbsp;Cheese\n   Burrito</h3></li></ul>";
        let detection = MenuPredicate::default().detect(page).unwrap();

        assert_eq!(detection.heuristic, Heuristic::ItemElement);
        assert_eq!(detection.matched_text, "Chili Cheese Burrito");
    }

    #[test]
    fn test_pattern_transposed() {
        assert_eq!(
            heuristic("<p>Burrito smothered in chili sauce</p>"),
            Some(Heuristic::Pattern)
        );
        assert_eq!(heuristic("<p>chili-lime burrito bowl</p>"), Some(Heuristic::Pattern));
    }

    #[test]
    fn test_pattern_stays_on_one_line() {
        assert_eq!(heuristic("<p>Chili fries</p>\n<p>Bean Burrito</p>"), None);
    }

    #[test]
    fn test_no_match() {
        assert_eq!(heuristic("<p>Crunchwrap Supreme, Bean Burrito</p>"), None);
        assert_eq!(heuristic(""), None);
    }

    #[test]
    fn test_custom_predicate() {
        let predicate = MenuPredicate::new(["Enchirito"], Regex::new("(?i)enchi.*rito").unwrap());
        assert_eq!(predicate.keywords(), &["enchirito".to_string()]);
        assert!(predicate.detect("<p>The ENCHIRITO is back</p>").is_some());
        assert!(predicate.detect("<p>Chilito</p>").is_none());
    }
}
