//! Listing markup fixtures.

use std::fmt::Write;

/// Builds one job card list item in listing markup.
///
/// Only the parts that are set are rendered, so a bare builder yields a card
/// with nothing but its job identifier. Text is inserted verbatim.
#[derive(Debug, Clone)]
pub struct JobCardBuilder {
    id: String,
    full_link: Option<String>,
    title: Option<String>,
    company: Option<String>,
    location: Option<String>,
    posted: Option<(String, String)>,
    benefits: Vec<String>,
    raw: Vec<String>,
}

impl JobCardBuilder {
    /// Starts a card for a job identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            full_link: None,
            title: None,
            company: None,
            location: None,
            posted: None,
            benefits: Vec::new(),
            raw: Vec::new(),
        }
    }

    /// Sets the title heading content.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the company subtitle, optionally wrapped in a company link.
    #[must_use]
    pub fn company(mut self, name: &str, href: Option<&str>) -> Self {
        self.company = Some(match href {
            Some(href) => format!(r#"<a class="hidden-nested-link" href="{href}">{name}</a>"#),
            None => name.to_string(),
        });
        self
    }

    /// Sets the company subtitle to plain text.
    #[must_use]
    pub fn company_text(self, name: &str) -> Self {
        self.company(name, None)
    }

    /// Sets the location.
    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Sets the posting date attribute and its display text.
    #[must_use]
    pub fn posted(mut self, datetime: impl Into<String>, text: impl Into<String>) -> Self {
        self.posted = Some((datetime.into(), text.into()));
        self
    }

    /// Sets the full-card link.
    #[must_use]
    pub fn full_link(mut self, href: impl Into<String>) -> Self {
        self.full_link = Some(href.into());
        self
    }

    /// Adds a benefit badge.
    #[must_use]
    pub fn benefit(mut self, benefit: impl Into<String>) -> Self {
        self.benefits.push(benefit.into());
        self
    }

    /// Appends raw markup inside the card.
    #[must_use]
    pub fn raw(mut self, markup: impl Into<String>) -> Self {
        self.raw.push(markup.into());
        self
    }

    /// Renders the card.
    #[must_use]
    pub fn build(&self) -> String {
        let mut html = String::new();
        let _ = writeln!(html, "<li>");
        let _ = writeln!(
            html,
            r#"  <div class="base-card job-search-card" data-entity-urn="urn:li:jobPosting:{}">"#,
            self.id
        );
        if let Some(href) = &self.full_link {
            let _ = writeln!(
                html,
                r#"    <a class="base-card__full-link absolute top-0" href="{href}"><span class="sr-only">link</span></a>"#
            );
        }
        let _ = writeln!(html, r#"    <div class="base-search-card__info">"#);
        if let Some(title) = &self.title {
            let _ = writeln!(html, r#"      <h3 class="base-search-card__title">{title}</h3>"#);
        }
        if let Some(company) = &self.company {
            let _ = writeln!(html, r#"      <h4 class="base-search-card__subtitle">{company}</h4>"#);
        }
        let _ = writeln!(html, r#"      <div class="base-search-card__metadata">"#);
        if let Some(location) = &self.location {
            let _ = writeln!(html, r#"        <span class="job-search-card__location">{location}</span>"#);
        }
        for benefit in &self.benefits {
            let _ = writeln!(
                html,
                r#"        <div class="job-posting-benefits"><span class="job-posting-benefits__text">{benefit}</span></div>"#
            );
        }
        if let Some((datetime, text)) = &self.posted {
            let _ = writeln!(
                html,
                r#"        <time class="job-search-card__listdate" datetime="{datetime}">{text}</time>"#
            );
        }
        let _ = writeln!(html, "      </div>");
        let _ = writeln!(html, "    </div>");
        for markup in &self.raw {
            let _ = writeln!(html, "    {markup}");
        }
        let _ = writeln!(html, "  </div>");
        let _ = writeln!(html, "</li>");
        html
    }
}

/// Joins rendered cards into one listing page body.
#[must_use]
pub fn page_html(cards: &[String]) -> String {
    cards.concat()
}

/// A listing page of `count` titled cards with identifiers starting at
/// `first_id`.
#[must_use]
pub fn job_page(first_id: usize, count: usize) -> String {
    let cards: Vec<String> = (first_id..first_id + count)
        .map(|id| {
            JobCardBuilder::new(id.to_string())
                .title(format!("Rust Engineer {id}"))
                .company_text("Acme")
                .location("Remote")
                .build()
        })
        .collect();
    page_html(&cards)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_card_has_only_identifier() {
        let card = JobCardBuilder::new("77").build();
        assert!(card.contains(r#"data-entity-urn="urn:li:jobPosting:77""#));
        assert!(!card.contains("href"));
        assert!(!card.contains("<h3"));
        assert!(!card.contains("<time"));
    }

    #[test]
    fn test_job_page_card_count() {
        let page = job_page(100, 3);
        assert_eq!(page.matches("<li>").count(), 3);
        assert!(page.contains("urn:li:jobPosting:102"));
    }
}
