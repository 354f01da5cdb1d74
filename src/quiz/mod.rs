//! Quiz mini-game
//!
//! Each care action is gated behind one multiple-choice question drawn
//! uniformly from that action's pool. The action's effect is never
//! applied before the quiz resolves: correct pays the larger stat
//! reward and the action's cost, incorrect pays the smaller reward and
//! (for feed/play) a 30-second block.

use rand::Rng;
use std::time::Duration;

use crate::types::ActionKind;

/// How long the CLI holds the correct/incorrect reveal on screen
pub const REVEAL_DELAY: Duration = Duration::from_millis(2500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizOutcome {
    Correct,
    Incorrect,
}

/// One multiple-choice question. Exactly one option is correct,
/// marked by index.
#[derive(Debug, Clone)]
pub struct QuizQuestion {
    pub question: &'static str,
    pub options: [&'static str; 4],
    pub correct_index: usize,
}

impl QuizQuestion {
    /// Grade a selected option index
    pub fn grade(&self, answer: usize) -> QuizOutcome {
        if answer == self.correct_index {
            QuizOutcome::Correct
        } else {
            QuizOutcome::Incorrect
        }
    }
}

/// Uniformly pick a question from the action's pool
pub fn pick(rng: &mut impl Rng, action: ActionKind) -> &'static QuizQuestion {
    let pool = pool(action);
    &pool[rng.random_range(0..pool.len())]
}

/// The fixed question pool for an action
pub fn pool(action: ActionKind) -> &'static [QuizQuestion] {
    match action {
        ActionKind::Feed => FEED_QUESTIONS,
        ActionKind::Chat => CHAT_QUESTIONS,
        ActionKind::Play => PLAY_QUESTIONS,
    }
}

static FEED_QUESTIONS: &[QuizQuestion] = &[
    QuizQuestion {
        question: "¿Cuál es el ingrediente principal de los tacos al pastor?",
        options: [
            "Carne de cerdo marinada",
            "Pollo asado",
            "Carne de res",
            "Pescado frito",
        ],
        correct_index: 0,
    },
    QuizQuestion {
        question: "¿De dónde es originario el taco?",
        options: ["Estados Unidos", "España", "México", "Argentina"],
        correct_index: 2,
    },
    QuizQuestion {
        question: "¿Qué fruta se usa para hacer guacamole?",
        options: ["Mango", "Papaya", "Aguacate", "Plátano"],
        correct_index: 2,
    },
    QuizQuestion {
        question: "¿Cuál es la salsa típica verde de los tacos?",
        options: [
            "Salsa de tomate",
            "Salsa de tomatillo",
            "Salsa de mango",
            "Ketchup",
        ],
        correct_index: 1,
    },
];

static CHAT_QUESTIONS: &[QuizQuestion] = &[
    QuizQuestion {
        question: "¿Cuál es la capital de México?",
        options: ["Guadalajara", "Monterrey", "Ciudad de México", "Cancún"],
        correct_index: 2,
    },
    QuizQuestion {
        question: "¿Qué se celebra el Día de Muertos?",
        options: [
            "Halloween",
            "La vida de los difuntos",
            "El año nuevo",
            "La independencia",
        ],
        correct_index: 1,
    },
    QuizQuestion {
        question: "¿Cuál es la bebida típica mexicana hecha de agave?",
        options: ["Ron", "Vodka", "Tequila", "Whisky"],
        correct_index: 2,
    },
    QuizQuestion {
        question: "¿Qué animal aparece en la bandera de México?",
        options: ["Un jaguar", "Un águila", "Una serpiente", "Un quetzal"],
        correct_index: 1,
    },
];

static PLAY_QUESTIONS: &[QuizQuestion] = &[
    QuizQuestion {
        question: "¿Cuál es el deporte más popular en México?",
        options: ["Béisbol", "Basketball", "Fútbol", "Tenis"],
        correct_index: 2,
    },
    QuizQuestion {
        question: "¿Cómo se llama el juego mexicano donde rompes una figura con dulces?",
        options: ["Lotería", "Piñata", "Serpientes y escaleras", "Dominó"],
        correct_index: 1,
    },
    QuizQuestion {
        question: "¿Cuál es el chile más picante de México?",
        options: ["Jalapeño", "Serrano", "Habanero", "Poblano"],
        correct_index: 2,
    },
    QuizQuestion {
        question: "¿Qué instrumento es típico de los mariachis?",
        options: ["Piano", "Trompeta", "Batería", "Saxofón"],
        correct_index: 1,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn correct_index_always_grades_correct() {
        for action in [ActionKind::Feed, ActionKind::Chat, ActionKind::Play] {
            for q in pool(action) {
                assert_eq!(q.grade(q.correct_index), QuizOutcome::Correct);
                for i in 0..q.options.len() {
                    if i != q.correct_index {
                        assert_eq!(q.grade(i), QuizOutcome::Incorrect);
                    }
                }
            }
        }
    }

    #[test]
    fn every_pool_has_valid_correct_indexes() {
        for action in [ActionKind::Feed, ActionKind::Chat, ActionKind::Play] {
            let pool = pool(action);
            assert!(!pool.is_empty());
            for q in pool {
                assert!(q.correct_index < q.options.len());
            }
        }
    }

    #[test]
    fn pick_draws_from_the_right_pool() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let q = pick(&mut rng, ActionKind::Feed);
            assert!(pool(ActionKind::Feed)
                .iter()
                .any(|p| p.question == q.question));
        }
    }
}
