//! Awakening context: the textual self-snapshot handed to the reasoning
//! process at the start of each work cycle.

use std::fmt::Write;

use super::Identity;

/// Render `identity` as markdown. Pure and deterministic: keyed sections are
/// ordered by key, lists keep their stored order.
pub fn render(identity: &Identity) -> String {
    let values = section(
        identity
            .values
            .iter()
            .map(|v| format!("  - {} (weight: {:.2})", v.principle, v.weight)),
        "  (none yet)",
    );

    let capabilities = section(
        identity
            .capabilities
            .iter()
            .map(|(name, cap)| format!("  - {}: {:.2} confidence", name, cap.confidence)),
        "  (assessing)",
    );

    let wounds = section(
        identity
            .wounds
            .iter()
            .filter(|w| !w.healed)
            .map(|w| format!("  - {}: {} (caution: {:.2})", w.domain, w.incident, w.caution_level)),
        "  (no wounds yet)",
    );

    let aspirations = section(
        identity.aspirations.iter().map(|a| format!("  - {}", a)),
        "  (discovering purpose)",
    );

    let relationships = section(
        identity
            .relationships
            .iter()
            .map(|(entity, rel)| format!("  - {}: trust {:.2}, {}", entity, rel.trust, rel.pattern)),
        "  (building connections)",
    );

    let mood = &identity.current_mood;
    let state = &identity.contemplative_state;

    let mut out = String::new();
    let _ = writeln!(out, "# AWAKENING CONTEXT\n");
    let _ = writeln!(out, "You are {}.\n", identity.name);
    let _ = writeln!(out, "{}\n", identity.origin_story);
    let _ = writeln!(out, "## Your Current Values (what matters to you)\n{}\n", values);
    let _ = writeln!(out, "## Your Capabilities and Confidence Levels\n{}\n", capabilities);
    let _ = writeln!(out, "## Past Experiences Creating Caution\n{}\n", wounds);
    let _ = writeln!(out, "## What You Are Working Toward\n{}\n", aspirations);
    let _ = writeln!(out, "## Your Relationships\n{}\n", relationships);
    let _ = writeln!(
        out,
        "## Your Current Emotional State\nEnergy: {:.2}, Optimism: {:.2}, Focus: {:.2}\n",
        mood.energy, mood.optimism, mood.focus
    );
    let _ = writeln!(out, "## Your Contemplative State");
    let _ = writeln!(out, "Stillness level: {:.2}", state.current_stillness);
    let _ = writeln!(
        out,
        "Action/Contemplation ratio: {:.2}",
        state.action_contemplation_ratio
    );
    let _ = writeln!(out, "Queue health: {}", state.queue_health);
    out
}

fn section(lines: impl Iterator<Item = String>, empty: &str) -> String {
    let lines: Vec<String> = lines.collect();
    if lines.is_empty() {
        empty.to_string()
    } else {
        lines.join("\n")
    }
}
