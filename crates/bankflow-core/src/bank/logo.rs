//! Bank identifier → logo URL lookup table.

use std::collections::HashMap;

/// Logo used for every bank missing from the table.
pub const DEFAULT_LOGO_URL: &str = "https://static.thenounproject.com/png/95203-200.png";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogoTable {
    links: HashMap<String, String>,
}

impl LogoTable {
    /// Parses the delimited lookup text.
    ///
    /// The first line is a header. Rows are `identifier,url`; the delimiter is `;`
    /// instead when the header has a semicolon and no comma. Quoted fields are
    /// unquoted by the reader. Rows without an identifier or a URL are ignored.
    pub fn parse(content: &str) -> Self {
        let header = content.lines().next().unwrap_or_default();
        let delimiter = if !header.contains(',') && header.contains(';') {
            b';'
        } else {
            b','
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .delimiter(delimiter)
            .from_reader(content.as_bytes());

        let links = reader
            .records()
            .filter_map(|record| record.ok())
            .filter_map(|record| {
                let id = record.get(0)?;
                let url = record.get(1)?;
                if id.is_empty() || url.is_empty() {
                    return None;
                }
                Some((id.to_string(), url.to_string()))
            })
            .collect();
        Self { links }
    }

    pub fn get(&self, bank_id: &str) -> Option<&str> {
        self.links.get(bank_id).map(String::as_str)
    }

    /// URL for `bank_id`, falling back to [`DEFAULT_LOGO_URL`].
    pub fn link_for(&self, bank_id: &str) -> &str {
        self.get(bank_id).unwrap_or(DEFAULT_LOGO_URL)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
