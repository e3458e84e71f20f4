use serde::{Deserialize, Serialize};

/// One selectable report recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBookEntry {
    pub label: String,
    pub address: String,
}

impl AddressBookEntry {
    /// Parses `Name <email>` or a bare `email`.
    ///
    /// A named entry is labelled `Name (email)`; a bare entry uses the address
    /// as its label.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        let (label, address) = match (raw.find('<'), raw.rfind('>')) {
            (Some(open), Some(close)) if open < close => {
                let name = raw[..open].trim().trim_matches('"').trim();
                let address = raw[open + 1..close].trim();
                let label = if name.is_empty() {
                    address.to_string()
                } else {
                    format!("{} ({})", name, address)
                };
                (label, address.to_string())
            }
            _ => (raw.to_string(), raw.to_string()),
        };

        if !is_plausible_address(&address) {
            return Err(format!("invalid email address in entry '{}'", raw));
        }

        Ok(Self { label, address })
    }
}

fn is_plausible_address(address: &str) -> bool {
    match address.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !address.chars().any(|c| c.is_whitespace() || c == '<' || c == '>')
        }
        None => false,
    }
}

/// The configured recipient list. Built once at startup; read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBook {
    entries: Vec<AddressBookEntry>,
}

impl AddressBook {
    /// Parses a comma-separated list such as
    /// `QA Team <qa@example.com>, dev@example.com`. Empty items are skipped.
    pub fn parse(list: &str) -> Result<Self, String> {
        let entries = list
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(AddressBookEntry::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[AddressBookEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, index: usize) -> Option<&AddressBookEntry> {
        self.entries.get(index)
    }

    /// Finds an entry by zero-based index, address or label (case-insensitive).
    pub fn resolve(&self, selector: &str) -> Option<&AddressBookEntry> {
        let selector = selector.trim();
        if let Ok(index) = selector.parse::<usize>() {
            return self.get(index);
        }
        self.entries.iter().find(|entry| {
            entry.address.eq_ignore_ascii_case(selector)
                || entry.label.eq_ignore_ascii_case(selector)
        })
    }
}
