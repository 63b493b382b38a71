use crate::domain::{
    DateRewrite, FieldLocator, Rating, RatingLocator, ReviewRecord, SelectorConfig, TextTake,
};
use chrono::NaiveDate;
use harvest_errors::CrawlError;
use scraper::{ElementRef, Html, Selector};
use std::fmt::Write;

/// Reviews found in one document snapshot.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub records: Vec<ReviewRecord>,
    /// Review containers matched, usable or not.
    pub candidates: usize,
    pub dropped: usize,
    /// Flattened text of the last container. The collector compares it
    /// across advances to tell whether the page actually changed.
    pub trailing_text: Option<String>,
}

enum RatingSelector {
    Count(Selector),
    Text(Selector),
}

struct FieldSelector {
    selector: Selector,
    take: TextTake,
}

/// Turns a rendered document into review records using one site's
/// selectors. Holds compiled selectors only and never touches the browser.
pub struct ReviewExtractor {
    container: Selector,
    rating: Option<RatingSelector>,
    date: Option<FieldSelector>,
    content: FieldSelector,
    multiline: bool,
    date_rewrite: Option<DateRewrite>,
}

impl ReviewExtractor {
    pub fn new(config: &SelectorConfig) -> Result<Self, CrawlError> {
        let rating = match &config.rating {
            Some(RatingLocator::Count { selector }) => {
                Some(RatingSelector::Count(parse_selector(selector)?))
            }
            Some(RatingLocator::Text { selector }) => {
                Some(RatingSelector::Text(parse_selector(selector)?))
            }
            None => None,
        };

        Ok(Self {
            container: parse_selector(&config.container)?,
            rating,
            date: config.date.as_ref().map(compile_field).transpose()?,
            content: compile_field(&config.content)?,
            multiline: config.multiline,
            date_rewrite: config.date_rewrite.clone(),
        })
    }

    pub fn extract(&self, html: &str) -> Extraction {
        let document = Html::parse_document(html);
        let mut extraction = Extraction::default();

        for container in document.select(&self.container) {
            extraction.candidates += 1;
            extraction.trailing_text = Some(flatten(container.text()));

            match self.extract_one(container) {
                Ok(record) => extraction.records.push(record),
                Err(e) => {
                    extraction.dropped += 1;
                    tracing::debug!("Dropping review candidate #{}: {}", extraction.candidates, e);
                }
            }
        }

        extraction
    }

    /// Text of the last review container only, without building records.
    pub fn trailing_text(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let text = document
            .select(&self.container)
            .last()
            .map(|container| flatten(container.text()));
        text
    }

    fn extract_one(&self, container: ElementRef<'_>) -> Result<ReviewRecord, CrawlError> {
        let content = field_text(container, &self.content, self.multiline)
            .ok_or_else(|| CrawlError::ExtractionFieldMissing("content".to_string()))?;

        let date = match &self.date {
            Some(field) => {
                let raw = field_text(container, field, false)
                    .ok_or_else(|| CrawlError::ExtractionFieldMissing("date".to_string()))?;
                Some(match &self.date_rewrite {
                    Some(rule) => rewrite_date(&raw, rule),
                    None => raw,
                })
            }
            None => None,
        };

        let rating = match &self.rating {
            Some(RatingSelector::Count(selector)) => {
                Some(Rating::Stars(container.select(selector).count() as u32))
            }
            Some(RatingSelector::Text(selector)) => container
                .select(selector)
                .next()
                .map(|el| flatten(el.text()))
                .filter(|text| !text.is_empty())
                .map(Rating::Text),
            None => None,
        };

        Ok(ReviewRecord::new(content)
            .with_rating(rating)
            .with_date(date))
    }
}

/// Number of elements matching `selector`, used to enumerate filter tabs.
pub fn count_matches(html: &str, selector: &str) -> Result<usize, CrawlError> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);
    Ok(document.select(&selector).count())
}

fn parse_selector(selector: &str) -> Result<Selector, CrawlError> {
    Selector::parse(selector)
        .map_err(|e| CrawlError::InvalidSelector(format!("{}: {}", selector, e)))
}

fn compile_field(locator: &FieldLocator) -> Result<FieldSelector, CrawlError> {
    Ok(FieldSelector {
        selector: parse_selector(&locator.selector)?,
        take: locator.take,
    })
}

fn field_text(container: ElementRef<'_>, field: &FieldSelector, multiline: bool) -> Option<String> {
    let element = container.select(&field.selector).next()?;

    let text = match field.take {
        TextTake::Last => element
            .text()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .last()
            .map(|s| flatten(std::iter::once(s)))
            .unwrap_or_default(),
        TextTake::All if multiline => element
            .text()
            .map(|s| flatten(std::iter::once(s)))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        TextTake::All => flatten(element.text()),
    };

    Some(text).filter(|t| !t.is_empty())
}

/// Rendered text of adjacent nodes with whitespace runs collapsed, so inline
/// markup such as `<b>좋</b>아요` reads as `좋아요`.
fn flatten<'a>(segments: impl Iterator<Item = &'a str>) -> String {
    let joined: String = segments.collect();
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn rewrite_date(raw: &str, rule: &DateRewrite) -> String {
    let trimmed = raw.trim();
    let body = rule
        .strip_prefix
        .as_deref()
        .and_then(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed)
        .trim();

    let Ok(date) = NaiveDate::parse_from_str(body, &rule.input_format) else {
        return raw.to_string();
    };

    let mut out = String::new();
    if write!(out, "{}", date.format(&rule.output_format)).is_err() {
        tracing::warn!("Invalid date output format '{}'", rule.output_format);
        return raw.to_string();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kakao_selectors() -> SelectorConfig {
        SelectorConfig {
            container: "ul.list_review > li".into(),
            rating: Some(RatingLocator::Count {
                selector: "span.figure_star.on".into(),
            }),
            date: Some(FieldLocator::css("span.txt_date")),
            content: FieldLocator::css("p.desc_review"),
            multiline: false,
            date_rewrite: None,
        }
    }

    fn kakao_item(stars: usize, date: Option<&str>, content: Option<&str>) -> String {
        let mut html = String::from("<li>");
        for i in 0..5 {
            let class = if i < stars { "figure_star on" } else { "figure_star" };
            html.push_str(&format!("<span class=\"{}\"></span>", class));
        }
        if let Some(date) = date {
            html.push_str(&format!("<span class=\"txt_date\">{}</span>", date));
        }
        if let Some(content) = content {
            html.push_str(&format!("<p class=\"desc_review\">{}</p>", content));
        }
        html.push_str("</li>");
        html
    }

    fn page(items: &[String]) -> String {
        format!(
            "<html><body><ul class=\"list_review\">{}</ul></body></html>",
            items.concat()
        )
    }

    #[test]
    fn test_counts_lit_stars() {
        let extractor = ReviewExtractor::new(&kakao_selectors()).unwrap();
        let html = page(&[kakao_item(4, Some("2024.05.01."), Some("분위기 좋아요"))]);

        let extraction = extractor.extract(&html);
        assert_eq!(extraction.records.len(), 1);
        let record = &extraction.records[0];
        assert_eq!(record.rating, Some(Rating::Stars(4)));
        assert_eq!(record.date.as_deref(), Some("2024.05.01."));
        assert_eq!(record.content, "분위기 좋아요");
    }

    #[test]
    fn test_candidate_missing_content_is_dropped() {
        let extractor = ReviewExtractor::new(&kakao_selectors()).unwrap();
        let html = page(&[
            kakao_item(5, Some("2024.05.01."), Some("first")),
            kakao_item(3, Some("2024.05.02."), None),
            kakao_item(4, Some("2024.05.03."), Some("third")),
            kakao_item(1, Some("2024.05.04."), Some("fourth")),
        ]);

        let extraction = extractor.extract(&html);
        assert_eq!(extraction.candidates, 4);
        assert_eq!(extraction.dropped, 1);
        assert_eq!(extraction.records.len(), 3);
    }

    #[test]
    fn test_candidate_missing_date_is_dropped() {
        let extractor = ReviewExtractor::new(&kakao_selectors()).unwrap();
        let html = page(&[
            kakao_item(5, None, Some("no date here")),
            kakao_item(5, Some("2024.05.01."), Some("dated")),
        ]);

        let extraction = extractor.extract(&html);
        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.records[0].content, "dated");
    }

    #[test]
    fn test_whitespace_only_content_is_dropped() {
        let extractor = ReviewExtractor::new(&kakao_selectors()).unwrap();
        let html = page(&[kakao_item(5, Some("2024.05.01."), Some("   \n  "))]);

        let extraction = extractor.extract(&html);
        assert!(extraction.records.is_empty());
        assert_eq!(extraction.dropped, 1);
    }

    #[test]
    fn test_content_flattened_by_default() {
        let extractor = ReviewExtractor::new(&kakao_selectors()).unwrap();
        let html = page(&[kakao_item(
            5,
            Some("2024.05.01."),
            Some("  줄은 길지만<br>\n   재밌어요  "),
        )]);

        let extraction = extractor.extract(&html);
        assert_eq!(extraction.records[0].content, "줄은 길지만 재밌어요");
    }

    #[test]
    fn test_inline_markup_is_not_split() {
        let extractor = ReviewExtractor::new(&kakao_selectors()).unwrap();
        let html = page(&[kakao_item(
            5,
            Some("2024.05.01."),
            Some("<b>좋</b>아요 <em>또</em> 갈게요"),
        )]);

        let extraction = extractor.extract(&html);
        assert_eq!(extraction.records[0].content, "좋아요 또 갈게요");
    }

    #[test]
    fn test_multiline_content_keeps_segments() {
        let selectors = SelectorConfig {
            container: "div.offer-review__list--content".into(),
            rating: None,
            date: None,
            content: FieldLocator::css("div.with-more"),
            multiline: true,
            date_rewrite: None,
        };
        let extractor = ReviewExtractor::new(&selectors).unwrap();
        let html = r#"
            <div class="offer-review__list--content">
              <div class="with-more"><p> 첫 줄 </p><p>둘째   줄</p></div>
            </div>
        "#;

        let extraction = extractor.extract(html);
        assert_eq!(extraction.records[0].content, "첫 줄\n둘째 줄");
        assert_eq!(extraction.records[0].rating, None);
        assert_eq!(extraction.records[0].date, None);
    }

    #[test]
    fn test_take_last_segment() {
        let selectors = SelectorConfig {
            container: "div.card".into(),
            rating: None,
            date: Some(FieldLocator {
                selector: "div.purpose".into(),
                take: TextTake::Last,
            }),
            content: FieldLocator::css("p"),
            multiline: false,
            date_rewrite: None,
        };
        let extractor = ReviewExtractor::new(&selectors).unwrap();
        let html = r#"<div class="card">
            <div class="purpose"><span>가족여행</span> <span> 2024.03.02 </span></div>
            <p>good</p>
        </div>"#;

        let extraction = extractor.extract(html);
        assert_eq!(extraction.records[0].date.as_deref(), Some("2024.03.02"));
    }

    #[test]
    fn test_text_rating_and_date_rewrite() {
        let selectors = SelectorConfig {
            container: "div.review-item".into(),
            rating: Some(RatingLocator::Text {
                selector: ".review_score".into(),
            }),
            date: Some(FieldLocator::css("span.create-time")),
            content: FieldLocator::css("p.hover-pointer"),
            multiline: false,
            date_rewrite: Some(DateRewrite {
                strip_prefix: Some("작성일:".into()),
                input_format: "%Y년 %m월 %d일".into(),
                output_format: "%Y.%m.%d".into(),
            }),
        };
        let extractor = ReviewExtractor::new(&selectors).unwrap();
        let html = r#"
            <div class="review-item">
              <span class="review_score">4.5</span>
              <span class="create-time">작성일: 2024년 3월 5일</span>
              <p class="hover-pointer">Fun rides</p>
            </div>
            <div class="review-item">
              <span class="review_score"> </span>
              <span class="create-time">어제</span>
              <p class="hover-pointer">Crowded</p>
            </div>
        "#;

        let extraction = extractor.extract(html);
        assert_eq!(extraction.records.len(), 2);
        assert_eq!(extraction.records[0].rating, Some(Rating::Text("4.5".into())));
        assert_eq!(extraction.records[0].date.as_deref(), Some("2024.03.05"));
        assert_eq!(extraction.records[1].rating, None);
        assert_eq!(extraction.records[1].date.as_deref(), Some("어제"));
    }

    #[test]
    fn test_trailing_text_is_last_container() {
        let extractor = ReviewExtractor::new(&kakao_selectors()).unwrap();
        let html = page(&[
            kakao_item(5, Some("2024.05.01."), Some("first")),
            kakao_item(5, Some("2024.05.02."), Some("last one")),
        ]);

        let extraction = extractor.extract(&html);
        assert_eq!(extraction.trailing_text.as_deref(), Some("2024.05.02.last one"));
    }

    #[test]
    fn test_no_containers_yields_empty_extraction() {
        let extractor = ReviewExtractor::new(&kakao_selectors()).unwrap();
        let extraction = extractor.extract("<html><body><p>loading...</p></body></html>");
        assert_eq!(extraction.candidates, 0);
        assert!(extraction.records.is_empty());
        assert!(extraction.trailing_text.is_none());
    }

    #[test]
    fn test_invalid_selector_is_escalated() {
        let mut selectors = kakao_selectors();
        selectors.container = "ul.list_review >>> li[".into();
        assert!(matches!(
            ReviewExtractor::new(&selectors),
            Err(CrawlError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_count_matches() {
        let html = r#"<div class="switch-item">전체</div><div class="switch-item">사진</div><div class="switch-item">최신</div>"#;
        assert_eq!(count_matches(html, "div.switch-item").unwrap(), 3);
        assert_eq!(count_matches(html, "div.missing").unwrap(), 0);
    }
}
