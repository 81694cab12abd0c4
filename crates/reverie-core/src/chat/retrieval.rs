//! Keyword-driven selection of memories and lore entries.
//!
//! Both selectors are pure: they filter an already-ordered candidate list and
//! preserve its order. Persistence side effects (touching selected memories)
//! belong to the composer, not here.

use reverie_types::lorebook::LoreEntry;
use reverie_types::memory::Memory;

/// Select up to `limit` memories whose content mentions any keyword.
///
/// Candidates must arrive pre-ranked (importance, then recency). Matching is
/// case-insensitive substring containment. When no candidate matches, the
/// selection falls back to the ranked list as-is so a character never loses
/// its memory outright on an off-topic message.
pub fn select_memories(candidates: &[Memory], keywords: &[String], limit: u32) -> Vec<Memory> {
    let limit = limit as usize;
    if limit == 0 || candidates.is_empty() {
        return Vec::new();
    }
    let matched: Vec<&Memory> = if keywords.is_empty() {
        candidates.iter().collect()
    } else {
        candidates
            .iter()
            .filter(|m| {
                let content = m.content.to_lowercase();
                keywords.iter().any(|k| content.contains(k.as_str()))
            })
            .collect()
    };
    let pool = if matched.is_empty() {
        candidates.iter().collect()
    } else {
        matched
    };
    pool.into_iter().take(limit).cloned().collect()
}

/// Select up to `limit` lore entries triggered by the message keywords.
///
/// An entry with no declared keywords always matches. A declared keyword
/// matches a message token if either contains the other, so "dragons" in a
/// message still triggers an entry keyed on "dragon". When nothing matches,
/// the selection falls back to the full candidate list.
pub fn select_lore(candidates: &[LoreEntry], keywords: &[String], limit: u32) -> Vec<LoreEntry> {
    let limit = limit as usize;
    if limit == 0 || candidates.is_empty() {
        return Vec::new();
    }
    let matched: Vec<&LoreEntry> = candidates
        .iter()
        .filter(|entry| {
            let declared = entry.declared_keywords();
            if declared.is_empty() {
                return true;
            }
            declared
                .iter()
                .any(|k| keywords.iter().any(|t| k.contains(t.as_str()) || t.contains(k.as_str())))
        })
        .collect();
    let pool = if matched.is_empty() {
        candidates.iter().collect()
    } else {
        matched
    };
    pool.into_iter().take(limit).cloned().collect()
}
