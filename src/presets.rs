// Built-in industry descriptions.
//
// A preset bundles a corpus with the states and threshold it is usually
// run with. Explicit settings always override the preset's values.

use colored::Colorize;

pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub corpus: &'static str,
    pub states: &'static [&'static str],
    pub threshold: f64,
}

pub const PRESETS: &[Preset] = &[Preset {
    name: "light-industrial",
    description: "Assembly, packaging, warehouse and machine-operation jobs",
    corpus: include_str!("../corpora/light_industrial.txt"),
    states: &[
        "Florida",
        "Texas",
        "Ohio",
        "Georgia",
        "Tennessee",
        "Michigan",
        "Indiana",
        "North Carolina",
        "South Carolina",
        "Arizona",
        "Nevada",
    ],
    threshold: 0.55,
}];

/// Look up a preset by name (case-insensitive).
pub fn find(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Print the preset list.
pub fn display() {
    println!("\n{}", "=== Corpus Presets ===".bold());
    for preset in PRESETS {
        println!(
            "  {:<20} {} (threshold {:.2}, {} states)",
            preset.name.bold(),
            preset.description,
            preset.threshold,
            preset.states.len()
        );
    }
}
