//! Prompt composition.
//!
//! Builds the full message list for one generation: a single system message
//! assembled from persona facets, relevance-selected memories and lore, then
//! the replayed history window. Selecting memories refreshes their
//! `last_used` timestamps as a side effect.

use reverie_types::character::CharacterProfile;
use reverie_types::chat::TurnRole;
use reverie_types::error::ChatError;
use reverie_types::llm::{Message, MessageRole};
use reverie_types::lorebook::LoreEntry;
use reverie_types::settings::GenerationSettings;
use tracing::debug;
use uuid::Uuid;

use crate::chat::keywords::extract_keywords;
use crate::chat::retrieval::{select_lore, select_memories};
use crate::repository::{
    CharacterRepository, ConversationRepository, LorebookRepository, MemoryRepository,
};

/// Memory candidates are overfetched at this multiple of the injection limit
/// so keyword filtering has a wider ranked pool to draw from.
const MEMORY_OVERFETCH: usize = 3;

/// Compose the message list for one generation request.
///
/// The system message is built from ordered text blocks, each omitted when
/// empty, joined by blank lines. History replays only user and assistant
/// turns; stored system turns never re-enter the prompt.
pub async fn compose<Co, Ch, Me, Lo>(
    conversations: &Co,
    characters: &Ch,
    memories: &Me,
    lorebooks: &Lo,
    conversation_id: &Uuid,
    settings: &GenerationSettings,
) -> Result<Vec<Message>, ChatError>
where
    Co: ConversationRepository,
    Ch: CharacterRepository,
    Me: MemoryRepository,
    Lo: LorebookRepository,
{
    let conversation = conversations
        .get(conversation_id)
        .await?
        .ok_or(ChatError::ConversationNotFound)?;
    let character = characters
        .get(&conversation.character_id)
        .await?
        .ok_or(ChatError::CharacterNotFound)?;

    let mut window = conversations
        .list_recent_turns(conversation_id, settings.context_limit)
        .await?;
    window.reverse();

    // Relevance keys off the most recent user turn in the window (the one
    // just persisted by send, or the one being answered again by regenerate).
    let keywords = window
        .iter()
        .rev()
        .find(|t| t.role == TurnRole::User)
        .map(|t| extract_keywords(&t.content))
        .unwrap_or_default();

    let memory_candidates = memories
        .list_for_pair(
            &conversation.user_id,
            &conversation.character_id,
            settings.memory_limit * MEMORY_OVERFETCH,
        )
        .await?;
    let selected_memories =
        select_memories(&memory_candidates, &keywords, settings.memory_limit as u32);
    if !selected_memories.is_empty() {
        let ids: Vec<Uuid> = selected_memories.iter().map(|m| m.id).collect();
        memories.touch_memories(&ids).await?;
    }

    let lore_candidates = collect_lore_candidates(lorebooks, &character).await?;
    let selected_lore = select_lore(&lore_candidates, &keywords, settings.lorebook_limit as u32);

    debug!(
        conversation_id = %conversation_id,
        turns = window.len(),
        memories = selected_memories.len(),
        lore = selected_lore.len(),
        "composed prompt"
    );

    let mut blocks: Vec<String> = Vec::new();
    if !settings.global_system_prefix.is_empty() {
        blocks.push(settings.global_system_prefix.clone());
    }
    blocks.push(format!("You are roleplaying as: {}.", character.name));
    if !character.description.is_empty() {
        blocks.push(character.description.clone());
    }
    let facet_lines = character.facets.labeled_lines();
    if !facet_lines.is_empty() {
        blocks.push(format!(
            "Character details:\n{}",
            bullet_list(facet_lines.iter().map(String::as_str))
        ));
    }
    if !selected_memories.is_empty() {
        blocks.push(format!(
            "Memory snippets:\n{}",
            bullet_list(selected_memories.iter().map(|m| m.content.as_str()))
        ));
    }
    if !selected_lore.is_empty() {
        let lines: Vec<String> = selected_lore
            .iter()
            .map(|e| format!("{} {}", e.title, e.content))
            .collect();
        blocks.push(format!(
            "Lorebook:\n{}",
            bullet_list(lines.iter().map(String::as_str))
        ));
    }
    if !character.guidelines.is_empty() {
        blocks.push(format!("Guidelines:\n{}", character.guidelines));
    }
    if !character.example_dialogue.is_empty() {
        blocks.push(format!("Example dialogue:\n{}", character.example_dialogue));
    }

    let mut messages = vec![Message::new(MessageRole::System, blocks.join("\n\n"))];
    for turn in &window {
        let role = match turn.role {
            TurnRole::User => MessageRole::User,
            TurnRole::Assistant => MessageRole::Assistant,
            TurnRole::System => continue,
        };
        messages.push(Message::new(role, turn.content.clone()));
    }
    Ok(messages)
}

/// Flatten the character's lorebooks into a single candidate list, in
/// lorebook-id order and each book's storage order. Entry titles are
/// rewritten into display prefixes so the prompt line reads
/// `- [book] title: content`, or `- [book] content` for untitled entries.
async fn collect_lore_candidates<Lo: LorebookRepository>(
    lorebooks: &Lo,
    character: &CharacterProfile,
) -> Result<Vec<LoreEntry>, ChatError> {
    if character.lorebook_ids.is_empty() {
        return Ok(Vec::new());
    }
    let books = lorebooks.list_by_ids(&character.lorebook_ids).await?;
    let mut candidates = Vec::new();
    for book in &books {
        for entry in &book.entries {
            let title = if entry.title.is_empty() {
                format!("[{}]", book.name)
            } else {
                format!("[{}] {}:", book.name, entry.title)
            };
            candidates.push(LoreEntry {
                title,
                content: entry.content.clone(),
                keywords: entry.keywords.clone(),
            });
        }
    }
    Ok(candidates)
}

fn bullet_list<'a>(lines: impl Iterator<Item = &'a str>) -> String {
    lines
        .map(|line| format!("- {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
