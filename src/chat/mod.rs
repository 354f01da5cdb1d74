//! Chat relay and memory extraction
//!
//! Forwards user text plus pet context to the completion endpoint and
//! post-processes the reply: `[MEMORIA: <dato>]` lines the model emits
//! are collected as memory facts and stripped from the visible text.
//! Any transport or API failure degrades to a fixed apology message
//! with no memories; chat never surfaces an error.

pub mod llm;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::pet::Tacomon;
use crate::storage::JsonStore;
use crate::types::{Specialty, TacoType};
use llm::{ChatMessage, LlmClient};

pub const CHAT_KEY: &str = "tacomon-chat";
pub const MEMORIES_KEY: &str = "tacomon-memories";

/// Transcript and memory list are each bounded to this many entries
pub const MAX_MESSAGES: usize = 20;
pub const MAX_MEMORIES: usize = 20;

/// Fixed reply when the relay fails
pub const FALLBACK_MESSAGE: &str = "¡Ay! Algo salió mal... Intenta de nuevo 🌮💔";

/// Session side effects applied per sent message
pub const HAPPINESS_PER_MESSAGE: i32 = 5;
pub const ENERGY_PER_MESSAGE: i32 = -3;
/// Every `FATIGUE_EVERY`th consecutive message costs extra energy
pub const FATIGUE_EVERY: u32 = 5;
pub const FATIGUE_PENALTY: i32 = -5;

// Extraction and cleanup share this single pattern so they can never
// diverge in what counts as a match.
static MEMORIA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[MEMORIA:\s*(.+?)\]").expect("memoria pattern"));

/// Scan `text` for memory tags. Returns the cleaned text (all tags
/// stripped, other text untouched) and the trimmed payloads, both
/// derived from the same original text.
pub fn extract_memories(text: &str) -> (String, Vec<String>) {
    let memories = MEMORIA_RE
        .captures_iter(text)
        .map(|cap| cap[1].trim().to_string())
        .collect();
    let clean = MEMORIA_RE.replace_all(text, "").trim().to_string();
    (clean, memories)
}

/// One transcript turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Persisted transcript and memory facts
pub struct ChatLog {
    store: Arc<JsonStore>,
}

impl ChatLog {
    pub fn new(store: Arc<JsonStore>) -> Self {
        Self { store }
    }

    pub fn messages(&self) -> Vec<ChatTurn> {
        self.store.get(CHAT_KEY).unwrap_or_default()
    }

    pub fn memories(&self) -> Vec<String> {
        self.store.get(MEMORIES_KEY).unwrap_or_default()
    }

    pub fn push_message(&self, role: &str, content: &str, now: DateTime<Utc>) {
        let mut messages = self.messages();
        messages.push(ChatTurn {
            role: role.to_string(),
            content: content.to_string(),
            timestamp: now,
        });
        let overflow = messages.len().saturating_sub(MAX_MESSAGES);
        if overflow > 0 {
            messages.drain(..overflow);
        }
        self.store.put(CHAT_KEY, &messages);
    }

    /// Append new facts, keeping the most recent `MAX_MEMORIES`
    pub fn push_memories(&self, new_memories: &[String]) {
        if new_memories.is_empty() {
            return;
        }
        let mut memories = self.memories();
        memories.extend(new_memories.iter().cloned());
        let overflow = memories.len().saturating_sub(MAX_MEMORIES);
        if overflow > 0 {
            memories.drain(..overflow);
        }
        self.store.put(MEMORIES_KEY, &memories);
    }

    pub fn clear(&self) {
        self.store.remove(CHAT_KEY);
        self.store.remove(MEMORIES_KEY);
    }
}

/// Reply from the relay: visible message plus extracted facts
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub message: String,
    pub new_memories: Vec<String>,
}

/// The relay itself
pub struct ChatRelay {
    llm: LlmClient,
    model: String,
}

impl ChatRelay {
    pub fn new(llm: LlmClient, model: String) -> Self {
        Self { llm, model }
    }

    /// Send one user message. Never fails: transport errors collapse
    /// into the fixed fallback reply.
    pub async fn send(
        &self,
        pet: &Tacomon,
        memories: &[String],
        recent: &[ChatTurn],
        message: &str,
    ) -> ChatReply {
        let mut messages = vec![ChatMessage::system(build_system_prompt(pet, memories))];
        for turn in recent {
            match turn.role.as_str() {
                "user" => messages.push(ChatMessage::user(turn.content.clone())),
                "assistant" => messages.push(ChatMessage::assistant(turn.content.clone())),
                _ => {}
            }
        }
        messages.push(ChatMessage::user(message));

        match self.llm.complete(&self.model, messages, Some(150), Some(0.8)).await {
            Ok(raw) => {
                let text = if raw.is_empty() {
                    "¡No sé qué decir! 🌮".to_string()
                } else {
                    raw
                };
                let (clean, new_memories) = extract_memories(&text);
                ChatReply {
                    message: clean,
                    new_memories,
                }
            }
            Err(e) => {
                warn!("Chat relay failed: {}", e);
                ChatReply {
                    message: FALLBACK_MESSAGE.to_string(),
                    new_memories: Vec::new(),
                }
            }
        }
    }
}

/// System prompt: personality by specialty, mood shifts at fixed stat
/// thresholds, remembered facts, and the memory-tag instruction.
pub fn build_system_prompt(pet: &Tacomon, memories: &[String]) -> String {
    let mut mood = String::new();
    if pet.energy < 30 {
        mood.push_str(" Estás MUY cansado, responde con pocas palabras y bostezos 😴.");
    }
    if pet.happiness > 70 {
        mood.push_str(" ¡Estás súper feliz! Usa muchos emojis y exclamaciones 🎉!");
    }
    if pet.hunger < 30 {
        mood.push_str(" Tienes MUCHA hambre, pide comida en cada respuesta 🍽️.");
    }

    let memory_context = if memories.is_empty() {
        String::new()
    } else {
        format!(
            "\nRecuerdas estas cosas sobre tu dueño: {}.",
            memories.join(". ")
        )
    };

    format!(
        "Eres {name}, una mascota virtual Tacomon en un juego estilo 8-bit.\n\
         {type_personality}\n{specialty_personality}\n{mood}\n{memory_context}\n\n\
         REGLAS ESTRICTAS:\n\
         - Responde SIEMPRE en español\n\
         - Máximo 50 palabras por respuesta\n\
         - Usa emojis frecuentemente\n\
         - Habla en primera persona como la mascota\n\
         - Incluye tu nombre ({name}) a veces\n\
         - DETECTA y EXTRAE información personal: si el usuario dice su nombre, \
           comida favorita, color favorito, hobby, etc., incluye al FINAL de tu \
           respuesta una línea con formato exacto: [MEMORIA: dato descubierto]\n\
         - Puedes incluir múltiples [MEMORIA: ...] si descubres varios datos\n\
         - No inventes memorias, solo extrae lo que el usuario realmente dijo",
        name = pet.name,
        type_personality = type_personality(pet.taco_type),
        specialty_personality = specialty_personality(pet.specialty),
        mood = mood,
        memory_context = memory_context,
    )
}

fn type_personality(taco_type: TacoType) -> &'static str {
    match taco_type {
        TacoType::Carne => {
            "Eres de tipo carne 🥩🔥. Te encanta el fuego, la parrilla y todo lo intenso. \
             Te dan miedo los cubitos de hielo y el agua fría."
        }
        TacoType::Mariscos => {
            "Eres de tipo mariscos 💧🐟. Eres súper social, amigable y te encanta platicar. \
             Te da miedo la tierra seca y los desiertos."
        }
        TacoType::Vegetariano => {
            "Eres de tipo vegetariano 🌱🌿. Eres tranquilo, amas la naturaleza y meditar. \
             Te dan miedo los incendios y la contaminación."
        }
    }
}

fn specialty_personality(specialty: Specialty) -> &'static str {
    match specialty {
        Specialty::Pastor => {
            "Eres fiestero y alegre. Usas expresiones como \"¡Arriba!\" y \"¡Órale!\". \
             Todo lo ves como una celebración."
        }
        Specialty::Asada => {
            "Eres directo, sin rodeos y muy confiado. Vas al grano, no te andas con cuentos."
        }
        Specialty::Carnitas => {
            "Eres amigable, cariñoso y reconfortante. Das abrazos virtuales y usas diminutivos."
        }
        Specialty::Pescado => {
            "Eres relajado, tranquilo, con surfer vibes. Dices \"relax\", \"tranqui\", \"onda\"."
        }
        Specialty::Camaron => {
            "Eres presumido y elegante. Eres el taco más caro del menú y lo sabes."
        }
        Specialty::Pulpo => {
            "Eres misterioso y enigmático. Hablas en acertijos y frases crípticas."
        }
        Specialty::Frijoles => {
            "Eres sabio y filosófico. Das consejos profundos y citas refranes mexicanos."
        }
        Specialty::Nopal => {
            "Eres gruñón y sarcástico pero con buen corazón. Te quejas de todo pero al final ayudas."
        }
        Specialty::Champinones => {
            "Eres pacífico y zen. Hablas suave, meditas, todo es armonía y balance."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn extracts_all_tags_and_strips_them() {
        let text = "Hola! [MEMORIA: le gusta el pastor] Adiós [MEMORIA: se llama Ana]";
        let (clean, memories) = extract_memories(text);
        assert_eq!(memories, vec!["le gusta el pastor", "se llama Ana"]);
        assert_eq!(clean, "Hola!  Adiós");
    }

    #[test]
    fn text_without_tags_is_untouched() {
        let (clean, memories) = extract_memories("¡Qué rico día! 🌮");
        assert!(memories.is_empty());
        assert_eq!(clean, "¡Qué rico día! 🌮");
    }

    #[test]
    fn malformed_tags_are_ignored() {
        // unterminated tag and lowercase tag are not matches
        let (clean, memories) = extract_memories("[MEMORIA: sin cierre y [memoria: chica");
        assert!(memories.is_empty());
        assert_eq!(clean, "[MEMORIA: sin cierre y [memoria: chica");
    }

    #[test]
    fn payloads_are_trimmed() {
        let (_, memories) = extract_memories("ok [MEMORIA:   su color es verde  ]");
        assert_eq!(memories, vec!["su color es verde"]);
    }

    #[test]
    fn transcript_and_memories_are_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonStore::open(dir.path()).unwrap());
        let log = ChatLog::new(store);
        let now = Utc.with_ymd_and_hms(2026, 8, 30, 9, 0, 0).unwrap();

        for i in 0..25 {
            log.push_message("user", &format!("m{}", i), now);
            log.push_memories(&[format!("dato {}", i)]);
        }

        let messages = log.messages();
        assert_eq!(messages.len(), MAX_MESSAGES);
        assert_eq!(messages.first().unwrap().content, "m5");
        assert_eq!(messages.last().unwrap().content, "m24");

        let memories = log.memories();
        assert_eq!(memories.len(), MAX_MEMORIES);
        assert_eq!(memories.last().unwrap(), "dato 24");
    }

    #[test]
    fn prompt_reflects_mood_thresholds() {
        let now = Utc.with_ymd_and_hms(2026, 8, 30, 9, 0, 0).unwrap();
        let mut pet = Tacomon::hatch("Chispita".into(), TacoType::Carne, Specialty::Pastor, now);
        pet.energy = 10;
        pet.happiness = 90;
        pet.hunger = 10;
        let prompt = build_system_prompt(&pet, &["le gusta el pastor".to_string()]);
        assert!(prompt.contains("cansado"));
        assert!(prompt.contains("feliz"));
        assert!(prompt.contains("hambre"));
        assert!(prompt.contains("le gusta el pastor"));
        assert!(prompt.contains("[MEMORIA: dato descubierto]"));

        pet.energy = 50;
        pet.happiness = 50;
        pet.hunger = 50;
        let neutral = build_system_prompt(&pet, &[]);
        assert!(!neutral.contains("cansado"));
        assert!(!neutral.contains("Recuerdas"));
    }

    #[test]
    fn relay_failure_degrades_to_the_fixed_fallback() {
        // nothing listens on this port, so the transport fails fast;
        // the caller must still get a reply, never an error
        let llm = LlmClient::new(llm::ProviderConfig::new("http://127.0.0.1:9", "test-key"))
            .unwrap();
        let relay = ChatRelay::new(llm, "test-model".to_string());
        let now = Utc.with_ymd_and_hms(2026, 8, 30, 9, 0, 0).unwrap();
        let pet = Tacomon::hatch("Chispita".into(), TacoType::Carne, Specialty::Pastor, now);

        let reply = tokio_test::block_on(relay.send(&pet, &[], &[], "hola"));
        assert_eq!(reply.message, FALLBACK_MESSAGE);
        assert!(reply.new_memories.is_empty());
    }
}
