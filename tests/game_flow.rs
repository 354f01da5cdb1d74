//! End-to-end game flow tests against a temporary state directory.
//!
//! These drive the same stores the CLI wires together, with a
//! simulated clock so cooldowns, blocks and streaks are deterministic.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use tacomon::chat::ChatLog;
use tacomon::config::GameRules;
use tacomon::gate::{ActionGate, BlockBook, GateState};
use tacomon::ledger::{EntryType, SalsaLedger};
use tacomon::pet::PetStore;
use tacomon::storage::JsonStore;
use tacomon::training::{self, Category, Stage, TrainingStore};
use tacomon::types::{ActionKind, Clock, Specialty, Stat, TacoType};

struct FakeClock(Mutex<DateTime<Utc>>);

impl FakeClock {
    fn at(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self(Mutex::new(now)))
    }

    fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now = *now + by;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap()
}

fn rules() -> GameRules {
    GameRules::default()
}

#[test]
fn care_action_happy_path() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonStore::open(dir.path()).unwrap());
    let clock = FakeClock::at(start_time());

    let pets = PetStore::with_clock(store.clone(), clock.clone());
    let ledger = SalsaLedger::with_clock(store.clone(), rules(), None, clock.clone());
    let gate = ActionGate::new(rules(), clock.clone());
    let blocks = BlockBook::load(&store);

    let pet = pets
        .create("Paco", TacoType::Carne, Specialty::Pastor)
        .unwrap();
    assert_eq!(pet.hunger, 50);
    assert_eq!(ledger.balance(), 100);

    // gate open, correct answer: pay, boost the stat, start cooldown
    assert_eq!(
        gate.state(ActionKind::Feed, &pet, &blocks, ledger.balance()),
        GateState::Ready
    );
    assert!(ledger.spend(rules().action_cost, "alimentar"));
    let pet = pets.update_stat(Stat::Hunger, rules().correct_reward, true).unwrap();

    assert_eq!(ledger.balance(), 90);
    assert_eq!(pet.hunger, 65);
    assert!(matches!(
        gate.state(ActionKind::Feed, &pet, &blocks, ledger.balance()),
        GateState::OnCooldown { .. }
    ));
    // playing is still open, cooldowns are per action
    assert_eq!(
        gate.state(ActionKind::Play, &pet, &blocks, ledger.balance()),
        GateState::Ready
    );

    clock.advance(Duration::seconds(rules().cooldown_secs as i64));
    assert_eq!(
        gate.state(ActionKind::Feed, &pet, &blocks, ledger.balance()),
        GateState::Ready
    );
}

#[test]
fn failed_quiz_blocks_and_consoles() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonStore::open(dir.path()).unwrap());
    let clock = FakeClock::at(start_time());

    let pets = PetStore::with_clock(store.clone(), clock.clone());
    let ledger = SalsaLedger::with_clock(store.clone(), rules(), None, clock.clone());
    let gate = ActionGate::new(rules(), clock.clone());
    let mut blocks = BlockBook::load(&store);

    pets.create("Lupe", TacoType::Mariscos, Specialty::Camaron)
        .unwrap();

    // incorrect answer: no spend, small consolation, penalty block
    let pet = pets.update_stat(Stat::Energy, rules().incorrect_reward, true).unwrap();
    gate.record_block(ActionKind::Play, &mut blocks, &store);

    assert_eq!(ledger.balance(), 100);
    assert_eq!(pet.energy, 55);
    assert!(matches!(
        gate.state(ActionKind::Play, &pet, &blocks, ledger.balance()),
        GateState::Blocked { .. }
    ));

    // the block outlasts nothing: once it expires the cooldown shows
    clock.advance(Duration::seconds(rules().block_secs as i64));
    assert!(matches!(
        gate.state(ActionKind::Play, &pet, &blocks, ledger.balance()),
        GateState::OnCooldown { .. }
    ));

    // charlar never gets a penalty block
    let mut chat_blocks = BlockBook::load(&store);
    gate.record_block(ActionKind::Chat, &mut chat_blocks, &store);
    assert_eq!(
        gate.state(ActionKind::Chat, &pet, &chat_blocks, 0),
        GateState::Ready
    );
}

#[test]
fn broke_player_cannot_feed_but_can_chat() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonStore::open(dir.path()).unwrap());
    let clock = FakeClock::at(start_time());

    let pets = PetStore::with_clock(store.clone(), clock.clone());
    let ledger = SalsaLedger::with_clock(store.clone(), rules(), None, clock.clone());
    let gate = ActionGate::new(rules(), clock.clone());
    let blocks = BlockBook::load(&store);

    let pet = pets
        .create("Chuy", TacoType::Vegetariano, Specialty::Nopal)
        .unwrap();
    assert!(ledger.spend(95, "setup"));

    assert_eq!(
        gate.state(ActionKind::Feed, &pet, &blocks, ledger.balance()),
        GateState::InsufficientFunds
    );
    assert_eq!(
        gate.state(ActionKind::Chat, &pet, &blocks, ledger.balance()),
        GateState::Ready
    );
    // an overdraw is refused outright
    assert!(!ledger.spend(10, "alimentar"));
    assert_eq!(ledger.balance(), 5);
}

#[test]
fn training_award_pays_evolution_bonus_once() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonStore::open(dir.path()).unwrap());
    let clock = FakeClock::at(start_time());

    let ledger = SalsaLedger::with_clock(store.clone(), rules(), None, clock.clone());
    let training = TrainingStore::with_clock(store.clone(), rules().stage_thresholds, clock.clone());

    // five 90-point sessions reach Joven on the fifth
    let mut evolved_count = 0;
    for _ in 0..5 {
        let outcome = training.award(90, Category::Code, 100);
        if outcome.evolved() {
            evolved_count += 1;
            ledger.earn(rules().stage_bonus, "¡Evolución!");
            assert_eq!(outcome.stage_after, Stage::Young);
        }
    }
    assert_eq!(evolved_count, 1);
    assert_eq!(training.load().total_points, 500);
    assert_eq!(training.stage(), Stage::Young);
    assert_eq!(ledger.balance(), 200);

    // high score deltas are the top tier
    assert_eq!(
        training::stat_deltas(90),
        [(Stat::Happiness, 15), (Stat::Energy, -20), (Stat::Hunger, 15)]
    );
}

#[test]
fn chat_session_effects_clamp_and_persist() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonStore::open(dir.path()).unwrap());
    let clock = FakeClock::at(start_time());

    let pets = PetStore::with_clock(store.clone(), clock.clone());
    let log = ChatLog::new(store.clone());

    pets.create("Memo", TacoType::Carne, Specialty::Asada)
        .unwrap();

    // a long session: happiness saturates at 100, energy drains
    for i in 0..15 {
        log.push_message("user", &format!("hola {}", i), clock.now());
        pets.update_stat(Stat::Happiness, tacomon::chat::HAPPINESS_PER_MESSAGE, false);
        pets.update_stat(Stat::Energy, tacomon::chat::ENERGY_PER_MESSAGE, false);
    }
    let pet = pets.load().unwrap();
    assert_eq!(pet.happiness, 100);
    assert_eq!(pet.energy, 5);
    // boosts never started the charlar cooldown
    assert!(pet.last_chatted.is_none());

    log.push_memories(&["le gusta el futbol".to_string()]);
    assert_eq!(log.memories(), vec!["le gusta el futbol".to_string()]);
}

#[test]
fn state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::at(start_time());

    {
        let store = Arc::new(JsonStore::open(dir.path()).unwrap());
        let pets = PetStore::with_clock(store.clone(), clock.clone());
        let ledger = SalsaLedger::with_clock(store.clone(), rules(), None, clock.clone());
        pets.create("Nico", TacoType::Mariscos, Specialty::Pulpo)
            .unwrap();
        ledger.earn(25, "Entrenamiento codigo");
    }

    let store = Arc::new(JsonStore::open(dir.path()).unwrap());
    let pets = PetStore::with_clock(store.clone(), clock.clone());
    let ledger = SalsaLedger::with_clock(store.clone(), rules(), None, clock);

    let pet = pets.load().unwrap();
    assert_eq!(pet.name, "Nico");
    assert_eq!(pet.specialty, Specialty::Pulpo);
    assert_eq!(ledger.balance(), 125);
    let history = ledger.history();
    assert_eq!(history[0].entry_type, EntryType::Earn);
    assert_eq!(history[0].reason, "Entrenamiento codigo");
}

#[test]
fn reset_clears_pet_but_keeps_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonStore::open(dir.path()).unwrap());
    let clock = FakeClock::at(start_time());

    let pets = PetStore::with_clock(store.clone(), clock.clone());
    let ledger = SalsaLedger::with_clock(store.clone(), rules(), None, clock.clone());
    let training = TrainingStore::with_clock(store.clone(), rules().stage_thresholds, clock.clone());
    let log = ChatLog::new(store.clone());

    pets.create("Tito", TacoType::Vegetariano, Specialty::Frijoles)
        .unwrap();
    ledger.earn(50, "Quiz correcto");
    training.award(80, Category::Design, 80);
    log.push_message("user", "hola", clock.now());

    pets.reset();
    log.clear();
    training.reset();

    assert!(pets.load().is_none());
    assert!(log.messages().is_empty());
    assert_eq!(training.load().total_points, 0);
    // the wallet outlives the pet
    assert_eq!(ledger.balance(), 150);
}
