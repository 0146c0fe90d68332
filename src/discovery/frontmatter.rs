//! Minimal `---` delimited frontmatter reader.
//!
//! Only flat `key: value` lines are understood. Values may be wrapped in
//! single or double quotes.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontmatter {
    pub data: BTreeMap<String, String>,
    pub body: String,
}

impl Frontmatter {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

pub fn parse_frontmatter(content: &str) -> Frontmatter {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let normalized;
    let content = if content.contains("\r\n") {
        normalized = content.replace("\r\n", "\n");
        normalized.as_str()
    } else {
        content
    };

    let Some(rest) = content.strip_prefix("---\n") else {
        return Frontmatter {
            data: BTreeMap::new(),
            body: content.to_string(),
        };
    };

    let (header, body) = match rest.find("\n---\n") {
        Some(end) => (&rest[..end], &rest[end + 5..]),
        None => match rest.strip_suffix("\n---") {
            Some(header) => (header, ""),
            None => {
                return Frontmatter {
                    data: BTreeMap::new(),
                    body: content.to_string(),
                }
            }
        },
    };

    let data = header
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            let key = key.trim();
            if key.is_empty() || key.starts_with('#') {
                return None;
            }
            Some((key.to_string(), unquote(value.trim()).to_string()))
        })
        .collect();

    Frontmatter {
        data,
        body: body.to_string(),
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
