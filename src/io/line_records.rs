//! Grouping of a logical file into named line record sections.
//!
//! ODB++ line record files mark sections with comment lines:
//!
//! ```text
//! UNITS=MM
//! #
//! #Feature symbol names
//! #
//! $0 r120
//! #
//! #Layer features
//! #
//! P 1.0 2.0 0 P 0 8 0
//! ```
//!
//! A `#` line with text opens a section of that name; bare `#` lines and
//! blank lines are skipped. Lines before the first section belong to
//! `"Header"`.

use indexmap::IndexMap;

/// Name of the implicit section holding lines before the first `#` marker
pub const HEADER_SECTION: &str = "Header";

/// Named sections of a line record file, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineRecords {
    sections: IndexMap<String, Vec<String>>,
}

impl LineRecords {
    /// Split `lines` into sections
    pub fn from_lines<I>(lines: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut sections: IndexMap<String, Vec<String>> = IndexMap::new();
        let mut current: Option<String> = None;

        for line in lines {
            let line = line.as_ref().trim();
            if line.is_empty() {
                continue;
            }
            if let Some(marker) = line.strip_prefix('#') {
                let name = marker.trim();
                if !name.is_empty() {
                    sections.entry(name.to_string()).or_default();
                    current = Some(name.to_string());
                }
                continue;
            }
            let section = current.as_deref().unwrap_or(HEADER_SECTION);
            match sections.get_mut(section) {
                Some(lines) => lines.push(line.to_string()),
                None => {
                    sections.insert(section.to_string(), vec![line.to_string()]);
                }
            }
        }

        Self { sections }
    }

    /// Lines of a section, if the section exists
    pub fn section(&self, name: &str) -> Option<&[String]> {
        self.sections.get(name).map(|v| v.as_slice())
    }

    /// Lines of a section, or an empty slice
    pub fn lines(&self, name: &str) -> &[String] {
        self.section(name).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// Section names in file order
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
