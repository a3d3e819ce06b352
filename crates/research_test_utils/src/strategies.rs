//! Proptest strategies for parser and graph properties.

use proptest::prelude::*;
use proptest::sample::Index;

use research_core::data::Technology;

/// Words the float parser accepts, which would not survive as strings.
const FLOAT_WORDS: [&str; 3] = ["inf", "infinity", "nan"];

/// Generate a bare lowercase word that classifies as a string or bool.
pub fn arb_word() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,12}".prop_filter("float keyword", |w| !FLOAT_WORDS.contains(&w.as_str()))
}

/// Generate a technology-style key.
pub fn arb_tech_key() -> impl Strategy<Value = String> {
    "tech_[a-z][a-z0-9_]{0,10}"
}

/// Generate a single scalar token as it could appear in a script.
pub fn arb_scalar_token() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<i64>().prop_map(|n| n.to_string()),
        (0u32..100_000, 0u32..1000).prop_map(|(whole, frac)| format!("{whole}.{frac}")),
        prop_oneof![Just("yes"), Just("no"), Just("true"), Just("false")]
            .prop_map(str::to_string),
        arb_word(),
        arb_word().prop_map(|w| format!("\"{w}\"")),
        (arb_word(), arb_word()).prop_map(|(a, b)| format!("\"{a} {b}\"")),
    ]
}

/// Generate a block's lines: an opener, entry lines, and the closing brace.
///
/// Returns `(all_lines, entry_lines)`.
pub fn arb_block_lines() -> impl Strategy<Value = (Vec<String>, Vec<String>)> {
    let scalar_entry = (arb_word(), arb_scalar_token()).prop_map(|(k, v)| format!("{k} = {v}"));
    let array_entry = (arb_word(), proptest::collection::vec(arb_tech_key(), 1..4)).prop_map(
        |(k, items)| {
            let quoted: Vec<String> = items.iter().map(|i| format!("\"{i}\"")).collect();
            format!("{k} = {{ {} }}", quoted.join(" "))
        },
    );

    proptest::collection::vec(prop_oneof![scalar_entry, array_entry], 0..12).prop_map(|inner| {
        let mut lines = Vec::with_capacity(inner.len() + 2);
        lines.push("root = {".to_string());
        lines.extend(inner.iter().cloned());
        lines.push("}".to_string());
        (lines, inner)
    })
}

/// Generate an acyclic set of technologies.
///
/// Technology `i` is keyed `tech_{i:03}` and only lists prerequisites with
/// a lower index, so the result is always a DAG. Areas rotate through the
/// three research areas plus an empty one.
pub fn arb_technology_dag(max_nodes: usize) -> impl Strategy<Value = Vec<Technology>> {
    let node = (
        proptest::collection::vec(any::<Index>(), 0..4),
        0i64..6,
        0i64..10_000,
    );
    proptest::collection::vec(node, 1..max_nodes.max(2)).prop_map(|nodes| {
        const AREAS: [&str; 4] = ["physics", "society", "engineering", ""];
        nodes
            .into_iter()
            .enumerate()
            .map(|(i, (picks, tier, cost))| {
                let mut prerequisites: Vec<String> = if i == 0 {
                    Vec::new()
                } else {
                    picks
                        .iter()
                        .map(|pick| format!("tech_{:03}", pick.index(i)))
                        .collect()
                };
                prerequisites.sort();
                prerequisites.dedup();
                Technology {
                    area: AREAS[i % AREAS.len()].to_string(),
                    tier,
                    cost,
                    prerequisites,
                    ..Technology::new(format!("tech_{i:03}"))
                }
            })
            .collect()
    })
}
