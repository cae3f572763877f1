use std::path::Path;

use anyhow::Context as _;
use scraper::{ElementRef, Html, Selector};

/// A parsed markup document addressable by element id and by table position.
#[derive(Debug)]
pub struct MarkupDocument {
    html: Html,
}

impl MarkupDocument {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let markup = std::fs::read_to_string(path)
            .with_context(|| format!("read document: {}", path.display()))?;
        Ok(Self::parse(&markup))
    }

    /// Trimmed text of the first element carrying `id`; `None` when missing or blank.
    pub fn text_by_id(&self, id: &str) -> anyhow::Result<Option<String>> {
        let with_id = selector("[id]")?;
        let element = self
            .html
            .select(&with_id)
            .find(|element| element.value().id() == Some(id));
        Ok(element.and_then(|element| non_empty(element_text(element))))
    }

    /// Trimmed cell texts of every row of the first table, in document order.
    pub fn first_table_rows(&self) -> anyhow::Result<Vec<Vec<String>>> {
        let table = selector("table")?;
        let row = selector("tr")?;
        let cell = selector("td")?;

        let Some(first_table) = self.html.select(&table).next() else {
            return Ok(Vec::new());
        };

        let rows = first_table
            .select(&row)
            .map(|tr| {
                tr.select(&cell)
                    .map(|td| element_text(td).trim().to_owned())
                    .collect::<Vec<_>>()
            })
            .collect();
        Ok(rows)
    }

    pub fn title(&self) -> anyhow::Result<Option<String>> {
        let title = selector("title")?;
        Ok(self.html.select(&title).next().map(element_text))
    }
}

fn selector(css: &'static str) -> anyhow::Result<Selector> {
    Selector::parse(css).map_err(|err| anyhow::anyhow!("parse selector {css:?}: {err}"))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
