//! Display names for the well-known slots of the resource array.
//!
//! Saves carry more slots than are listed here; those are shown by index.

struct WellKnownResource {
    index: usize,
    key: &'static str,
    name: &'static str,
}

#[rustfmt::skip]
const WELL_KNOWN_RESOURCES: &[WellKnownResource] = &[
    WellKnownResource { index: 0, key: "credits",   name: "Credits" },
    WellKnownResource { index: 1, key: "intel",     name: "Intel" },
    WellKnownResource { index: 2, key: "authority", name: "Authority" },
    WellKnownResource { index: 3, key: "materiel",  name: "Materiel" },
    WellKnownResource { index: 4, key: "influence", name: "Influence" },
];

pub fn resource_name(index: usize) -> Option<&'static str> {
    WELL_KNOWN_RESOURCES
        .iter()
        .find(|r| r.index == index)
        .map(|r| r.name)
}

/// Display label, falling back to `#<index>`.
pub fn resource_label(index: usize) -> String {
    resource_name(index).map_or_else(|| format!("#{index}"), str::to_string)
}

/// Resolve a key such as `intel`, or a plain index.
pub fn resource_index(key: &str) -> Option<usize> {
    let key = key.trim();
    WELL_KNOWN_RESOURCES
        .iter()
        .find(|r| r.key.eq_ignore_ascii_case(key) || r.name.eq_ignore_ascii_case(key))
        .map(|r| r.index)
        .or_else(|| key.parse().ok())
}
