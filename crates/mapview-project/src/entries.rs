//! Scoped key/value properties stored in a project.
//!
//! Mirrors the `<properties>` block of a project file: the first level of
//! elements names the scope, deeper levels form a `/`-separated key.

use std::collections::BTreeMap;

use mapview_core::dom::XmlElement;

/// Project property store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectEntries {
    values: BTreeMap<(String, String), String>,
}

fn normalize_key(key: &str) -> String {
    key.split('/')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

impl ProjectEntries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten a `<properties>` element.
    pub fn from_xml(properties: &XmlElement) -> Self {
        let mut entries = Self::new();
        for scope in &properties.children {
            for child in &scope.children {
                entries.collect(&scope.name, "", child);
            }
        }
        entries
    }

    fn collect(&mut self, scope: &str, prefix: &str, element: &XmlElement) {
        let key = if prefix.is_empty() {
            element.name.clone()
        } else {
            format!("{}/{}", prefix, element.name)
        };

        if element.attribute("type") == Some("QStringList") {
            let items: Vec<&str> = element
                .children_named("value")
                .map(|v| v.text.trim())
                .collect();
            self.values
                .insert((scope.to_string(), key), items.join(","));
            return;
        }

        if element.children.is_empty() {
            self.values
                .insert((scope.to_string(), key), element.text.trim().to_string());
        } else {
            for child in &element.children {
                self.collect(scope, &key, child);
            }
        }
    }

    /// Raw string value, if the entry exists.
    pub fn read_entry(&self, scope: &str, key: &str) -> Option<&str> {
        self.values
            .get(&(scope.to_string(), normalize_key(key)))
            .map(String::as_str)
    }

    /// Integer value; `default` when missing or not an integer.
    pub fn read_num_entry(&self, scope: &str, key: &str, default: i64) -> i64 {
        self.read_entry(scope, key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Floating point value; `default` when missing or unparseable.
    pub fn read_double_entry(&self, scope: &str, key: &str, default: f64) -> f64 {
        self.read_entry(scope, key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Boolean value; `default` when missing or unparseable.
    pub fn read_bool_entry(&self, scope: &str, key: &str, default: bool) -> bool {
        self.read_entry(scope, key)
            .and_then(parse_bool)
            .unwrap_or(default)
    }

    /// Store a value. Returns the previous value, if any.
    pub fn write_entry(&mut self, scope: &str, key: &str, value: impl ToString) -> Option<String> {
        self.values
            .insert((scope.to_string(), normalize_key(key)), value.to_string())
    }

    pub fn remove_entry(&mut self, scope: &str, key: &str) -> Option<String> {
        self.values.remove(&(scope.to_string(), normalize_key(key)))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapview_core::XmlDocument;

    fn sample() -> ProjectEntries {
        let doc = XmlDocument::parse(
            r#"<properties>
                 <Gui>
                   <CanvasColorRedPart type="int">10</CanvasColorRedPart>
                   <SelectionColorAlphaPart type="int">255</SelectionColorAlphaPart>
                 </Gui>
                 <Paths><Absolute type="bool">false</Absolute></Paths>
                 <Measure><Ellipsoid type="QString">EPSG:7030</Ellipsoid></Measure>
                 <WMS><CrsList type="QStringList"><value>EPSG:4326</value><value>EPSG:3857</value></CrsList></WMS>
               </properties>"#,
        )
        .unwrap();
        ProjectEntries::from_xml(doc.root())
    }

    #[test]
    fn test_read_typed_entries() {
        let entries = sample();
        assert_eq!(entries.read_num_entry("Gui", "/CanvasColorRedPart", 255), 10);
        assert_eq!(entries.read_num_entry("Gui", "/CanvasColorBluePart", 255), 255);
        assert!(!entries.read_bool_entry("Paths", "/Absolute", true));
        assert_eq!(entries.read_entry("Measure", "Ellipsoid"), Some("EPSG:7030"));
    }

    #[test]
    fn test_string_list_is_joined() {
        let entries = sample();
        assert_eq!(entries.read_entry("WMS", "/CrsList"), Some("EPSG:4326,EPSG:3857"));
        assert_eq!(entries.len(), 5);
    }

    #[test]
    fn test_write_and_normalize_keys() {
        let mut entries = ProjectEntries::new();
        assert_eq!(entries.write_entry("Gui", "//Canvas//Width/", 800), None);
        assert_eq!(entries.read_num_entry("Gui", "/Canvas/Width", 0), 800);
        assert_eq!(entries.write_entry("Gui", "Canvas/Width", 640), Some("800".to_string()));
        assert_eq!(entries.remove_entry("Gui", "/Canvas/Width"), Some("640".to_string()));
        assert!(entries.is_empty());
    }

    #[test]
    fn test_unparseable_numbers_fall_back() {
        let mut entries = ProjectEntries::new();
        entries.write_entry("Gui", "/CanvasColorRedPart", "red");
        assert_eq!(entries.read_num_entry("Gui", "/CanvasColorRedPart", 255), 255);
        assert_eq!(entries.read_double_entry("Gui", "/CanvasColorRedPart", 1.5), 1.5);
    }
}
