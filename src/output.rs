//! Non-interactive output: one flavor per line, as JSON or `key=value` text.

use crate::Result;
use flavor_core::{Flavor, FlavorCollection, SortKey};
use std::io::Write;

/// Filtered flavors, sorted when a key is given, otherwise in load order
pub fn select(
    flavors: &FlavorCollection,
    sort_by: Option<SortKey>,
    descending: bool,
) -> Vec<&Flavor> {
    match sort_by {
        Some(key) => flavors.sorted(key, descending),
        None if descending => {
            let mut list = flavors.list();
            list.reverse();
            list
        }
        None => flavors.list(),
    }
}

/// Write each flavor as a single-line JSON object
pub fn write_json<W: Write>(out: &mut W, flavors: &[&Flavor]) -> Result<()> {
    for flavor in flavors {
        serde_json::to_writer(&mut *out, flavor)?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

/// Write each flavor as a single line of `key=value` pairs
pub fn write_text<W: Write>(out: &mut W, flavors: &[&Flavor]) -> Result<()> {
    for flavor in flavors {
        writeln!(out, "{}", flavor)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flavor_core::{ExtraSpecs, RawFlavor};
    use serde_json::Value;

    fn sample() -> FlavorCollection {
        let raw = |id: &str, name: &str, vcpus: u32, ram: u64| RawFlavor {
            id: id.to_string(),
            name: name.to_string(),
            vcpus,
            ram,
            disk: 10,
            swap: 0,
            ephemeral: 0,
            description: String::new(),
            is_public: true,
            rxtx_factor: 1.0,
            extra_specs: ExtraSpecs::new(),
        };
        vec![
            raw("2", "m1.large", 4, 8192),
            raw("1", "m1.tiny", 1, 512),
            raw("3", "m1.small", 1, 2048),
        ]
        .into_iter()
        .collect()
    }

    fn names(flavors: &[&Flavor]) -> Vec<String> {
        flavors.iter().map(|f| f.name.clone()).collect()
    }

    #[test]
    fn test_select_keeps_load_order_without_key() {
        let flavors = sample();
        assert_eq!(
            names(&select(&flavors, None, false)),
            vec!["m1.large", "m1.tiny", "m1.small"]
        );
        assert_eq!(
            names(&select(&flavors, None, true)),
            vec!["m1.small", "m1.tiny", "m1.large"]
        );
    }

    #[test]
    fn test_select_sorted_and_filtered() {
        let mut flavors = sample();
        flavors.filter_mut().set_vcpu_range(0, 1);

        assert_eq!(
            names(&select(&flavors, Some(SortKey::Memory), true)),
            vec!["m1.small", "m1.tiny"]
        );
    }

    #[test]
    fn test_write_json_one_object_per_line() {
        let flavors = sample();
        let selected = select(&flavors, Some(SortKey::Vcpus), false);

        let mut out = Vec::new();
        write_json(&mut out, &selected).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["name"], "m1.small");
        assert_eq!(first["memory"], 2.0);
        assert_eq!(first["extra_specs"], serde_json::json!({}));
        assert!(lines[0].starts_with("{\"id\":\"3\",\"name\":\"m1.small\""));
    }

    #[test]
    fn test_write_text_key_value_lines() {
        let flavors = sample();
        let selected = select(&flavors, Some(SortKey::Name), false);

        let mut out = Vec::new();
        write_text(&mut out, &selected).unwrap();
        let text = String::from_utf8(out).unwrap();

        let first = text.lines().next().unwrap();
        assert!(first.starts_with("id=\"2\" name=\"m1.large\" vcpus=4"));
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_empty_selection_writes_nothing() {
        let flavors = FlavorCollection::default();
        let mut out = Vec::new();
        write_json(&mut out, &select(&flavors, None, false)).unwrap();
        assert!(out.is_empty());
    }
}
