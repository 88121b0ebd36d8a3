use std::collections::BTreeMap;

/// A single ICS content-line property: `NAME(;PARAM=VALUE)*:VALUE`.
///
/// Parameter map keys are uppercased; values are kept verbatim (quoting,
/// casing) exactly as upstream wrote them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub params: BTreeMap<String, String>,
    pub value: String,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Property {
            name: name.into(),
            params: BTreeMap::new(),
            value: value.into(),
        }
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

/// A parsed VEVENT block: an ordered property list plus the verbatim
/// upstream UID value. The raw lines are kept only for diagnostics.
#[derive(Debug, Clone, Default)]
pub struct ParsedEvent {
    pub properties: Vec<Property>,
    pub original_uid: String,
    pub raw_lines: Vec<String>,
}

impl ParsedEvent {
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn get_value(&self, name: &str) -> Option<&str> {
        self.get(name).map(|p| p.value.as_str())
    }
}

/// The four ordered sequences a parsed calendar is decomposed into.
#[derive(Debug, Clone, Default)]
pub struct ParsedCalendar {
    pub header: Vec<String>,
    pub timezones: Vec<String>,
    pub events: Vec<ParsedEvent>,
    pub footer: Vec<String>,
}
