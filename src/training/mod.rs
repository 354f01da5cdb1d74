//! Training mini-game: image evaluation and stage progression
//!
//! An uploaded image is scored 0-100 by a vision model. The score maps
//! to training points (progression), $SALSA tokens (score/2) and a
//! tiered set of pet stat deltas. Points accumulate in a global
//! counter whose stage function (Baby/Young/Adult) pays a one-time
//! bonus per transition. A failed evaluation mutates nothing.

use anyhow::{bail, Context, Result};
use base64::Engine;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::chat::llm::{ChatMessage, ContentPart, LlmClient};
use crate::storage::JsonStore;
use crate::types::{Clock, Stat, SystemClock};

pub const TRAINING_KEY: &str = "tacomon-training";

/// History keeps the most recent entries only
pub const MAX_TRAINING_HISTORY: usize = 20;

/// Submissions are size-capped before leaving the machine
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Fixed feedback when the model returns none
pub const DEFAULT_FEEDBACK: &str = "¡Buen intento! Sigue practicando.";

/// Generic retry message for a failed evaluation
pub const EVAL_FAILED_MESSAGE: &str = "Error al evaluar. Intenta de nuevo.";

static SCORE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Score:\s*(\d+)/100\.?\s*").expect("score pattern"));

/// Training submission category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "codigo")]
    Code,
    #[serde(rename = "diseno")]
    Design,
    #[serde(rename = "proyecto")]
    Project,
    #[serde(rename = "aprendizaje")]
    Learning,
}

impl Category {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "codigo" | "code" => Some(Category::Code),
            "diseno" | "design" => Some(Category::Design),
            "proyecto" | "project" => Some(Category::Project),
            "aprendizaje" | "learning" => Some(Category::Learning),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Category::Code => "codigo",
            Category::Design => "diseno",
            Category::Project => "proyecto",
            Category::Learning => "aprendizaje",
        }
    }

    fn prompt(&self) -> &'static str {
        match self {
            Category::Code => {
                "Evalúa esta captura de código. Enfócate en: organización del código, \
                 buenas prácticas, complejidad y limpieza."
            }
            Category::Design => {
                "Evalúa esta captura de diseño. Enfócate en: estética, uso de colores, \
                 tipografía y creatividad."
            }
            Category::Project => {
                "Evalúa esta captura de proyecto. Enfócate en: funcionalidad, calidad, \
                 complejidad y completitud."
            }
            Category::Learning => {
                "Evalúa esta captura de aprendizaje. Enfócate en: esfuerzo, comprensión, \
                 aplicación práctica."
            }
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Pet growth stage, a pure function of total training points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Baby,
    Young,
    Adult,
}

impl Stage {
    pub fn of_points(points: u64, thresholds: [u64; 2]) -> Self {
        if points >= thresholds[1] {
            Stage::Adult
        } else if points >= thresholds[0] {
            Stage::Young
        } else {
            Stage::Baby
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Stage::Baby => "Bebé",
            Stage::Young => "Joven",
            Stage::Adult => "Adulto",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Stage::Baby => "🥚",
            Stage::Young => "🐣",
            Stage::Adult => "🐉",
        }
    }
}

/// One evaluation in the bounded history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingEntry {
    pub score: u8,
    pub category: String,
    pub timestamp: DateTime<Utc>,
}

/// Accumulated progression, persisted globally for the profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingProgress {
    pub total_points: u64,
    #[serde(default)]
    pub history: Vec<TrainingEntry>,
}

/// Result of a parsed evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub score: u8,
    pub feedback: String,
    /// Progression points awarded (= score)
    pub points: u64,
    /// $SALSA tokens awarded (= score / 2, rounded)
    pub tokens: u32,
}

/// Parse `Score: <n>/100. <feedback>`. A missing score falls back to
/// a pseudo-random value in [40,60]; any score is clamped to [0,100].
/// Empty feedback gets the fixed encouragement string.
pub fn parse_evaluation(text: &str, rng: &mut impl Rng) -> Evaluation {
    let score = match SCORE_RE.captures(text) {
        Some(cap) => {
            // the capture is all digits, so a parse failure can only
            // mean overflow; clamp it like any other huge score
            let n = cap[1].parse::<u32>().unwrap_or(u32::MAX);
            n.min(100) as u8
        }
        None => rng.random_range(40..=60),
    };

    let feedback = SCORE_RE.replace(text, "").trim().to_string();
    let feedback = if feedback.is_empty() {
        DEFAULT_FEEDBACK.to_string()
    } else {
        feedback
    };

    Evaluation {
        score,
        feedback,
        points: score as u64,
        tokens: ((score as f64) * 0.5).round() as u32,
    }
}

/// Tiered stat deltas per score band. Coarse on purpose so the
/// feedback stays legible to the player.
pub fn stat_deltas(score: u8) -> [(Stat, i32); 3] {
    if score >= 80 {
        [(Stat::Happiness, 15), (Stat::Energy, -20), (Stat::Hunger, 15)]
    } else if score >= 60 {
        [(Stat::Happiness, 8), (Stat::Energy, -15), (Stat::Hunger, 12)]
    } else if score >= 40 {
        [(Stat::Happiness, 3), (Stat::Energy, -12), (Stat::Hunger, 10)]
    } else {
        [(Stat::Happiness, -10), (Stat::Energy, -15), (Stat::Hunger, 10)]
    }
}

/// Outcome of awarding points, including a stage transition if one
/// happened on this award
#[derive(Debug, Clone)]
pub struct AwardOutcome {
    pub total_points: u64,
    pub stage_before: Stage,
    pub stage_after: Stage,
}

impl AwardOutcome {
    pub fn evolved(&self) -> bool {
        self.stage_before != self.stage_after
    }
}

/// Persistent store for training progression
pub struct TrainingStore {
    store: Arc<JsonStore>,
    clock: Arc<dyn Clock>,
    thresholds: [u64; 2],
}

impl TrainingStore {
    pub fn new(store: Arc<JsonStore>, thresholds: [u64; 2]) -> Self {
        Self::with_clock(store, thresholds, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<JsonStore>,
        thresholds: [u64; 2],
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            clock,
            thresholds,
        }
    }

    pub fn load(&self) -> TrainingProgress {
        self.store.get(TRAINING_KEY).unwrap_or_default()
    }

    pub fn stage(&self) -> Stage {
        Stage::of_points(self.load().total_points, self.thresholds)
    }

    /// Award points from one evaluation. Compares stage-before against
    /// stage-after so a transition bonus fires exactly once per
    /// crossing and never re-fires once past a threshold.
    pub fn award(&self, score: u8, category: Category, points: u64) -> AwardOutcome {
        let mut progress = self.load();
        let stage_before = Stage::of_points(progress.total_points, self.thresholds);
        progress.total_points += points;
        let stage_after = Stage::of_points(progress.total_points, self.thresholds);

        progress.history.push(TrainingEntry {
            score,
            category: category.key().to_string(),
            timestamp: self.clock.now(),
        });
        let overflow = progress.history.len().saturating_sub(MAX_TRAINING_HISTORY);
        if overflow > 0 {
            progress.history.drain(..overflow);
        }
        self.store.put(TRAINING_KEY, &progress);

        AwardOutcome {
            total_points: progress.total_points,
            stage_before,
            stage_after,
        }
    }

    pub fn reset(&self) {
        self.store.remove(TRAINING_KEY);
    }
}

/// The evaluation relay
pub struct TrainingRelay {
    llm: LlmClient,
    model: String,
}

impl TrainingRelay {
    pub fn new(llm: LlmClient, model: String) -> Self {
        Self { llm, model }
    }

    /// Evaluate an image file. An error here means nothing was
    /// mutated; callers show the generic retry message.
    pub async fn evaluate(
        &self,
        image_path: &Path,
        category: Category,
        rng: &mut impl Rng,
    ) -> Result<Evaluation> {
        let (encoded, media_type) = encode_image(image_path)?;

        let messages = vec![
            ChatMessage::system(
                "Eres un profesor amigable en un juego educativo de mascotas virtuales. \
                 Tu trabajo es evaluar capturas de pantalla que los estudiantes suben para \
                 entrenar a su mascota. SIEMPRE debes dar una evaluación, nunca rechaces \
                 evaluar. Sé alentador pero honesto. Responde SIEMPRE con este formato \
                 exacto:\n\nScore: [número entre 0 y 100]/100. [Tu feedback en español, \
                 máximo 2-3 oraciones. Sé específico sobre lo que ves en la imagen.]",
            ),
            ChatMessage::user_multimodal(vec![
                ContentPart::text(category.prompt()),
                ContentPart::image_base64(&encoded, media_type),
            ]),
        ];

        let content = self
            .llm
            .complete(&self.model, messages, Some(300), None)
            .await
            .context("Evaluation request failed")?;

        Ok(parse_evaluation(&content, rng))
    }
}

/// Read, size-check and base64-encode an image, sniffing the media
/// type from the bytes.
fn encode_image(path: &Path) -> Result<(String, &'static str)> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("No se pudo leer {}", path.display()))?;
    if metadata.len() > MAX_IMAGE_BYTES {
        bail!("La imagen debe ser menor a 5MB");
    }
    let bytes = std::fs::read(path)
        .with_context(|| format!("No se pudo leer {}", path.display()))?;
    let format = image::guess_format(&bytes).context("Formato de imagen no reconocido")?;
    let media_type = format.to_mime_type();
    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
    Ok((encoded, media_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(9)
    }

    #[test]
    fn parses_score_and_feedback() {
        let eval = parse_evaluation("Score: 85/100. Muy buen código, limpio y claro.", &mut rng());
        assert_eq!(eval.score, 85);
        assert_eq!(eval.feedback, "Muy buen código, limpio y claro.");
        assert_eq!(eval.points, 85);
        assert_eq!(eval.tokens, 43); // round(85 * 0.5)
    }

    #[test]
    fn missing_score_falls_back_to_mid_range() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let eval = parse_evaluation("No puedo evaluar esto.", &mut rng);
            assert!((40..=60).contains(&eval.score));
            assert_eq!(eval.feedback, "No puedo evaluar esto.");
        }
    }

    #[test]
    fn out_of_range_score_is_clamped() {
        let eval = parse_evaluation("Score: 250/100. Increíble.", &mut rng());
        assert_eq!(eval.score, 100);
    }

    #[test]
    fn overflowing_score_digits_still_clamp_to_100() {
        let eval = parse_evaluation(
            "Score: 99999999999999999999/100. Fuera de serie.",
            &mut rng(),
        );
        assert_eq!(eval.score, 100);
        assert_eq!(eval.feedback, "Fuera de serie.");
    }

    #[test]
    fn empty_feedback_gets_encouragement() {
        let eval = parse_evaluation("Score: 55/100.", &mut rng());
        assert_eq!(eval.feedback, DEFAULT_FEEDBACK);
    }

    #[test]
    fn stage_thresholds() {
        let t = [500, 1500];
        assert_eq!(Stage::of_points(0, t), Stage::Baby);
        assert_eq!(Stage::of_points(499, t), Stage::Baby);
        assert_eq!(Stage::of_points(500, t), Stage::Young);
        assert_eq!(Stage::of_points(1499, t), Stage::Young);
        assert_eq!(Stage::of_points(1500, t), Stage::Adult);
    }

    #[test]
    fn stat_deltas_are_tiered() {
        assert_eq!(stat_deltas(80)[0], (Stat::Happiness, 15));
        assert_eq!(stat_deltas(60)[0], (Stat::Happiness, 8));
        assert_eq!(stat_deltas(40)[0], (Stat::Happiness, 3));
        assert_eq!(stat_deltas(39)[0], (Stat::Happiness, -10));
    }

    fn training_store() -> (tempfile::TempDir, TrainingStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonStore::open(dir.path()).unwrap());
        (dir, TrainingStore::new(store, [500, 1500]))
    }

    #[test]
    fn award_accumulates_and_bounds_history() {
        let (_dir, store) = training_store();
        for _ in 0..25 {
            store.award(50, Category::Code, 50);
        }
        let progress = store.load();
        assert_eq!(progress.total_points, 25 * 50);
        assert_eq!(progress.history.len(), MAX_TRAINING_HISTORY);
    }

    #[test]
    fn crossing_a_threshold_evolves_exactly_once() {
        let (_dir, store) = training_store();
        // 499 points without evolving
        let outcome = store.award(90, Category::Project, 499);
        assert!(!outcome.evolved());

        // 499 -> 500: one transition
        let outcome = store.award(1, Category::Project, 1);
        assert!(outcome.evolved());
        assert_eq!(outcome.stage_before, Stage::Baby);
        assert_eq!(outcome.stage_after, Stage::Young);

        // further awards inside Young never re-fire
        let outcome = store.award(50, Category::Project, 50);
        assert!(!outcome.evolved());
    }

    #[test]
    fn jumping_past_a_threshold_is_still_one_transition() {
        let (_dir, store) = training_store();
        store.award(80, Category::Learning, 1400);
        // 1400 -> 1600 crosses 1500 in a single award
        let outcome = store.award(100, Category::Learning, 200);
        assert!(outcome.evolved());
        assert_eq!(outcome.stage_before, Stage::Young);
        assert_eq!(outcome.stage_after, Stage::Adult);
    }

    #[test]
    fn oversized_image_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        std::fs::write(&path, vec![0u8; (MAX_IMAGE_BYTES + 1) as usize]).unwrap();
        assert!(encode_image(&path).is_err());
    }

    #[test]
    fn png_bytes_become_a_png_data_uri() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dot.png");
        // 1x1 transparent PNG
        let png: &[u8] = &[
            0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49,
            0x48, 0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06,
            0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44,
            0x41, 0x54, 0x78, 0x9C, 0x62, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D,
            0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42,
            0x60, 0x82,
        ];
        std::fs::write(&path, png).unwrap();
        let (encoded, media_type) = encode_image(&path).unwrap();
        assert_eq!(media_type, "image/png");
        let part = ContentPart::image_base64(&encoded, media_type);
        let json = serde_json::to_value(&part).unwrap();
        assert!(json["image_url"]["url"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,"));
    }
}
