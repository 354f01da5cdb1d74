//! CLI interface for tacomon

use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::error::ReadlineError;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::chat::llm::LlmClient;
use crate::chat::{ChatLog, ChatRelay};
use crate::config::Config;
use crate::gate::{ActionGate, BlockBook, GateState};
use crate::hub::{HubClient, HubState, RegisterRequest, StatsPayload};
use crate::ledger::SalsaLedger;
use crate::pet::{PetStore, Tacomon};
use crate::quiz;
use crate::quiz::QuizOutcome;
use crate::storage::JsonStore;
use crate::tacodex::TacodexStore;
use crate::training::{self, Category, Stage, TrainingRelay, TrainingStore};
use crate::types::{ActionKind, Specialty, Stat, SystemClock, TacoType};

#[derive(Parser)]
#[command(name = "tacomon")]
#[command(about = "Tu mascota taco virtual: cuídala, chatea, entrena y colecciona", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create your Tacomon (name, type, specialty)
    Create {
        /// Pet name, 2-10 characters
        name: String,
        /// Taco type: vegetariano, mariscos or carne
        #[arg(short = 't', long = "type")]
        taco_type: String,
        /// Specialty within the type (defaults to the first one)
        #[arg(short, long)]
        specialty: Option<String>,
    },
    /// Show the pet, its stats and what's ready to do
    Status,
    /// Feed your Tacomon (quiz-gated, costs $SALSA)
    Feed,
    /// Play with your Tacomon (quiz-gated, costs $SALSA)
    Play,
    /// Have a quick chat moment (quiz-gated, free)
    Chat,
    /// Talk with your Tacomon through the LLM (interactive when no message)
    Talk {
        /// One-shot message; omit for an interactive session
        message: Option<String>,
    },
    /// Submit a screenshot for training evaluation
    Train {
        /// Path to the image (max 5MB)
        image: PathBuf,
        /// Category: codigo, diseno, proyecto or aprendizaje
        #[arg(short, long)]
        category: String,
    },
    /// Show the $SALSA balance and streak
    Balance,
    /// Show the $SALSA movement history
    History,
    /// Manage the tacodex collection
    Tacodex {
        #[command(subcommand)]
        command: TacodexCommands,
    },
    /// Hub registration, sync and leaderboard
    Hub {
        #[command(subcommand)]
        command: HubCommands,
    },
    /// Configure tacomon
    Config {
        /// Set the LLM API key
        #[arg(long)]
        set_api_key: Option<String>,
        /// Remove the stored LLM API key
        #[arg(long)]
        delete_api_key: bool,
        /// Set the active ledger identity
        #[arg(long)]
        set_identity: Option<String>,
        /// Clear the identity back to anonymous
        #[arg(long)]
        clear_identity: bool,
        /// Set the tacodex wallet address
        #[arg(long)]
        set_wallet: Option<String>,
        /// Show the current configuration
        #[arg(long)]
        show: bool,
    },
    /// Delete the pet forever
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum TacodexCommands {
    /// Log a real-world taco
    Add {
        /// What taco it was
        name: String,
        /// Where you ate it
        #[arg(short, long)]
        taqueria: String,
        /// City or neighborhood
        #[arg(short, long)]
        location: String,
        /// Photo to upload to the asset service
        #[arg(short, long)]
        image: Option<PathBuf>,
    },
    /// List logged tacos and collection stats
    List,
    /// Record the token id of a minted entry
    Mint {
        /// Entry id
        id: String,
        /// Token id from the mint transaction
        token_id: u64,
    },
}

#[derive(Subcommand)]
enum HubCommands {
    /// Register your Tacomon in the HUB
    Register {
        /// Your name as shown on the leaderboard
        #[arg(short, long)]
        owner: String,
        /// Optional contact email
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Push a snapshot to the HUB now
    Sync,
    /// Keep syncing every few minutes until interrupted
    Watch,
    /// Show the HUB leaderboard
    Leaderboard {
        #[arg(short, long, default_value = "1")]
        page: u32,
        #[arg(short, long, default_value = "10")]
        limit: u32,
    },
}

/// Shared handles for one invocation
struct Game {
    config: Config,
    store: Arc<JsonStore>,
    pets: PetStore,
    ledger: SalsaLedger,
}

impl Game {
    fn open() -> Result<Self> {
        let config = Config::load()?;
        let store = Arc::new(JsonStore::default_store()?);
        let pets = PetStore::new(store.clone());
        let ledger = SalsaLedger::new(store.clone(), config.rules.clone(), config.identity.clone());
        Ok(Self {
            config,
            store,
            pets,
            ledger,
        })
    }

    fn gate(&self) -> ActionGate {
        ActionGate::new(self.config.rules.clone(), Arc::new(SystemClock))
    }

    fn training(&self) -> TrainingStore {
        TrainingStore::new(self.store.clone(), self.config.rules.stage_thresholds)
    }

    fn require_pet(&self) -> Option<Tacomon> {
        match self.pets.load() {
            Some(pet) => Some(pet),
            None => {
                println!("Aún no tienes un Tacomon. Crea uno con 'tacomon create'.");
                None
            }
        }
    }
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let game = Game::open()?;

    match cli.command {
        Commands::Create {
            name,
            taco_type,
            specialty,
        } => create(&game, &name, &taco_type, specialty.as_deref()),
        Commands::Status => status(&game),
        Commands::Feed => gated_action(&game, ActionKind::Feed).await,
        Commands::Play => gated_action(&game, ActionKind::Play).await,
        Commands::Chat => gated_action(&game, ActionKind::Chat).await,
        Commands::Talk { message } => talk(&game, message).await,
        Commands::Train { image, category } => train(&game, &image, &category).await,
        Commands::Balance => {
            println!("🍅 Balance: {} $SALSA", game.ledger.balance());
            println!("🔥 Racha de chat: {}", game.ledger.streak());
            Ok(())
        }
        Commands::History => history(&game),
        Commands::Tacodex { command } => tacodex(&game, command).await,
        Commands::Hub { command } => hub(&game, command).await,
        Commands::Config {
            set_api_key,
            delete_api_key,
            set_identity,
            clear_identity,
            set_wallet,
            show,
        } => {
            if let Some(key) = set_api_key {
                crate::config::set_api_key(&key)?;
            }
            if delete_api_key {
                crate::security::delete_api_key()?;
                println!("API key eliminada.");
            }
            if let Some(id) = set_identity {
                crate::config::set_identity(Some(&id))?;
            }
            if clear_identity {
                crate::config::set_identity(None)?;
            }
            if let Some(wallet) = set_wallet {
                crate::config::set_wallet(&wallet)?;
            }
            if show {
                show_config(&game.config);
            }
            Ok(())
        }
        Commands::Reset { yes } => reset(&game, yes),
    }
}

fn create(game: &Game, name: &str, taco_type: &str, specialty: Option<&str>) -> Result<()> {
    if game.pets.load().is_some() {
        println!("Ya tienes un Tacomon. Usa 'tacomon reset' si quieres empezar de nuevo.");
        return Ok(());
    }
    let Some(taco_type) = TacoType::parse(taco_type) else {
        println!("Tipo desconocido. Opciones: vegetariano, mariscos, carne.");
        return Ok(());
    };
    let specialty = match specialty {
        Some(s) => match Specialty::parse(s) {
            Some(sp) => sp,
            None => {
                println!(
                    "Especialidad desconocida. Opciones para {}: {}",
                    taco_type,
                    taco_type
                        .specialties()
                        .iter()
                        .map(|s| s.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                return Ok(());
            }
        },
        None => Specialty::default_for(taco_type),
    };

    match game.pets.create(name, taco_type, specialty) {
        Ok(pet) => {
            println!("🌮 ¡{} ha nacido! ({}, {})", pet.name, pet.taco_type.label(), pet.specialty.label());
            println!("Empiezas con {} $SALSA. Cuídalo bien.", game.ledger.balance());
        }
        Err(e) => println!("{}", e),
    }
    Ok(())
}

fn status(game: &Game) -> Result<()> {
    let Some(pet) = game.require_pet() else {
        return Ok(());
    };
    let training = game.training();
    let progress = training.load();
    let stage = Stage::of_points(progress.total_points, game.config.rules.stage_thresholds);

    println!("🌮 {} — {} ({})", pet.name, pet.taco_type.label(), pet.specialty.label());
    println!("   Etapa: {} {} ({} puntos)", stage.emoji(), stage.label(), progress.total_points);
    println!("   Felicidad: {}", stat_bar(pet.happiness));
    println!("   Energía:   {}", stat_bar(pet.energy));
    println!("   Hambre:    {}", stat_bar(pet.hunger));
    println!("   $SALSA: {}", game.ledger.balance());

    let gate = game.gate();
    let blocks = BlockBook::load(&game.store);
    for action in [ActionKind::Feed, ActionKind::Play, ActionKind::Chat] {
        let state = gate.state(action, &pet, &blocks, game.ledger.balance());
        println!("   {} → {}", action.label(), describe_gate(state));
    }
    Ok(())
}

fn stat_bar(value: u8) -> String {
    let filled = (value as usize) / 10;
    format!("[{}{}] {}/100", "█".repeat(filled), "░".repeat(10 - filled), value)
}

fn describe_gate(state: GateState) -> String {
    match state {
        GateState::Ready => "listo".to_string(),
        GateState::OnCooldown { remaining_secs } => {
            format!("en cooldown ({})", format_time(remaining_secs))
        }
        GateState::Blocked { remaining_secs } => {
            format!("bloqueado por respuesta incorrecta ({})", format_time(remaining_secs))
        }
        GateState::InsufficientFunds => "sin $SALSA suficiente".to_string(),
    }
}

fn format_time(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// One gated care action: gate check, quiz, then effects. The stat
/// reward and cost are only applied after the quiz resolves.
async fn gated_action(game: &Game, action: ActionKind) -> Result<()> {
    let Some(pet) = game.require_pet() else {
        return Ok(());
    };
    let gate = game.gate();
    let mut blocks = BlockBook::load(&game.store);

    match gate.state(action, &pet, &blocks, game.ledger.balance()) {
        GateState::Ready => {}
        state => {
            println!("No puedes {} ahora: {}", action.label(), describe_gate(state));
            return Ok(());
        }
    }

    let mut rng = rand::rng();
    let question = quiz::pick(&mut rng, action);

    println!("❓ {}", question.question);
    for (i, option) in question.options.iter().enumerate() {
        println!("   {}. {}", i + 1, option);
    }

    let answer = loop {
        let line = read_line("Respuesta (1-4): ")?;
        let Some(line) = line else {
            println!("Quiz cancelado, no pasó nada.");
            return Ok(());
        };
        match line.trim().parse::<usize>() {
            Ok(n) if (1..=question.options.len()).contains(&n) => break n - 1,
            _ => println!("Elige un número entre 1 y {}.", question.options.len()),
        }
    };

    let outcome = question.grade(answer);
    tokio::time::sleep(quiz::REVEAL_DELAY).await;

    let rules = &game.config.rules;
    match outcome {
        QuizOutcome::Correct => {
            if action.has_cost() {
                // the gate pre-checked funds, so this should hold
                if !game.ledger.spend(rules.action_cost, action.label()) {
                    println!("Te quedaste sin $SALSA a medio camino. Inténtalo después.");
                    return Ok(());
                }
            }
            game.pets.update_stat(action.stat(), rules.correct_reward, true);
            println!("✅ ¡Correcto! +{} de {}", rules.correct_reward, stat_name(action.stat()));
            if action.has_cost() {
                println!("   -{} $SALSA (quedan {})", rules.action_cost, game.ledger.balance());
            }
        }
        QuizOutcome::Incorrect => {
            println!(
                "❌ Incorrecto. La respuesta era: {}",
                question.options[question.correct_index]
            );
            game.pets.update_stat(action.stat(), rules.incorrect_reward, true);
            println!("   +{} de {} como consuelo", rules.incorrect_reward, stat_name(action.stat()));
            if action.blockable() {
                gate.record_block(action, &mut blocks, &game.store);
                println!("   {} bloqueado por {} segundos", action.label(), rules.block_secs);
            }
        }
    }

    opportunistic_sync(game).await;
    Ok(())
}

fn stat_name(stat: Stat) -> &'static str {
    match stat {
        Stat::Happiness => "felicidad",
        Stat::Energy => "energía",
        Stat::Hunger => "hambre",
    }
}

/// LLM conversation with the pet. One-shot with a message argument,
/// interactive otherwise.
async fn talk(game: &Game, message: Option<String>) -> Result<()> {
    let Some(_) = game.require_pet() else {
        return Ok(());
    };
    let llm = match LlmClient::from_config(&game.config.llm) {
        Ok(llm) => llm,
        Err(e) => {
            println!("{}", e);
            return Ok(());
        }
    };
    let relay = ChatRelay::new(llm, game.config.llm.chat_model.clone());
    let log = ChatLog::new(game.store.clone());

    match message {
        Some(message) => {
            send_chat_message(game, &relay, &log, &message, 1).await;
        }
        None => {
            println!("Platica con tu Tacomon. Ctrl-D para salir.");
            let mut consecutive = 0u32;
            loop {
                let Some(line) = read_line("tú> ")? else {
                    println!("¡Hasta luego! 🌮");
                    break;
                };
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                consecutive += 1;
                send_chat_message(game, &relay, &log, trimmed, consecutive).await;
                if consecutive >= crate::chat::FATIGUE_EVERY {
                    consecutive = 0;
                }
            }
        }
    }

    opportunistic_sync(game).await;
    Ok(())
}

async fn send_chat_message(
    game: &Game,
    relay: &ChatRelay,
    log: &ChatLog,
    message: &str,
    consecutive: u32,
) {
    let Some(pet) = game.pets.load() else { return };
    // snapshot context before logging so the new message is not doubled
    // into the request
    let memories = log.memories();
    let recent = log.messages();
    log.push_message("user", message, chrono::Utc::now());

    // talking always cheers the pet a bit and tires it a little; these
    // boosts never start the charlar cooldown
    game.pets.update_stat(Stat::Happiness, crate::chat::HAPPINESS_PER_MESSAGE, false);
    game.pets.update_stat(Stat::Energy, crate::chat::ENERGY_PER_MESSAGE, false);
    if consecutive >= crate::chat::FATIGUE_EVERY {
        game.pets.update_stat(Stat::Energy, crate::chat::FATIGUE_PENALTY, false);
        println!("😴 {} se está cansando de tanto platicar...", pet.name);
    }

    let mut rng = rand::rng();
    let earned = game.ledger.earn_from_chat(&mut rng);

    let spinner = spinner(&format!("{} está pensando...", pet.name));
    let reply = relay.send(&pet, &memories, &recent, message).await;
    spinner.finish_and_clear();

    println!("🌮 {}: {}", pet.name, reply.message);
    if earned > 0 {
        println!("   +{} 🍅 $SALSA", earned);
    }
    if !reply.new_memories.is_empty() {
        for memory in &reply.new_memories {
            println!("   💭 {} recordará: {}", pet.name, memory);
        }
        log.push_memories(&reply.new_memories);
    }
    log.push_message("assistant", &reply.message, chrono::Utc::now());
}

/// Training submission: evaluate, then apply points, tokens and stat
/// effects. A failed evaluation changes nothing.
async fn train(game: &Game, image: &std::path::Path, category: &str) -> Result<()> {
    let Some(pet) = game.require_pet() else {
        return Ok(());
    };
    let Some(category) = Category::parse(category) else {
        println!("Categoría desconocida. Opciones: codigo, diseno, proyecto, aprendizaje.");
        return Ok(());
    };
    let llm = match LlmClient::from_config(&game.config.llm) {
        Ok(llm) => llm,
        Err(e) => {
            println!("{}", e);
            return Ok(());
        }
    };
    let relay = TrainingRelay::new(llm, game.config.llm.vision_model.clone());

    let spinner = spinner("Evaluando tu entrenamiento...");
    let mut rng = rand::rng();
    let evaluation = match relay.evaluate(image, category, &mut rng).await {
        Ok(eval) => {
            spinner.finish_and_clear();
            eval
        }
        Err(e) => {
            spinner.finish_and_clear();
            tracing::warn!("Evaluation failed: {}", e);
            println!("{}", training::EVAL_FAILED_MESSAGE);
            return Ok(());
        }
    };

    println!("{} Score: {}/100", score_emoji(evaluation.score), evaluation.score);
    println!("   {}", evaluation.feedback);

    for (stat, delta) in training::stat_deltas(evaluation.score) {
        game.pets.update_stat(stat, delta, false);
    }
    game.ledger.earn(
        evaluation.tokens,
        &format!("Entrenamiento {}", category.key()),
    );
    println!("   +{} puntos, +{} $SALSA", evaluation.points, evaluation.tokens);

    let outcome = game
        .training()
        .award(evaluation.score, category, evaluation.points);
    if outcome.evolved() {
        let stage = outcome.stage_after;
        game.ledger.earn(
            game.config.rules.stage_bonus,
            &format!("¡Evolución a {} {}!", stage.emoji(), stage.label()),
        );
        println!(
            "🎉 ¡{} evolucionó a {} {}! +{} $SALSA de bonus",
            pet.name,
            stage.emoji(),
            stage.label(),
            game.config.rules.stage_bonus
        );
    }

    opportunistic_sync(game).await;
    Ok(())
}

fn score_emoji(score: u8) -> &'static str {
    if score >= 80 {
        "🏆"
    } else if score >= 60 {
        "⭐"
    } else if score >= 40 {
        "👍"
    } else {
        "💪"
    }
}

fn history(game: &Game) -> Result<()> {
    let history = game.ledger.history();
    if history.is_empty() {
        println!("Sin movimientos todavía.");
        return Ok(());
    }
    for entry in &history {
        let sign = match entry.entry_type {
            crate::ledger::EntryType::Earn => "+",
            crate::ledger::EntryType::Spend => "-",
        };
        println!(
            "{} {}{} $SALSA · {}",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            sign,
            entry.amount,
            entry.reason
        );
    }
    Ok(())
}

async fn tacodex(game: &Game, command: TacodexCommands) -> Result<()> {
    let wallet = game.config.wallet.clone();
    let dex = TacodexStore::new(game.store.clone(), wallet.clone());

    match command {
        TacodexCommands::Add {
            name,
            taqueria,
            location,
            image,
        } => {
            let image_url = match image {
                Some(path) => {
                    let Some(wallet) = wallet.as_deref() else {
                        println!("Configura tu wallet primero: tacomon config --set-wallet <addr>");
                        return Ok(());
                    };
                    let spinner = spinner("Subiendo foto...");
                    match crate::tacodex::upload_photo(&game.config.hub.base_url, &path, wallet)
                        .await
                    {
                        Ok(asset) => {
                            spinner.finish_and_clear();
                            println!("📷 Foto subida: {}", asset.url);
                            asset.url
                        }
                        Err(e) => {
                            spinner.finish_and_clear();
                            println!("No se pudo subir la foto: {}", e);
                            String::new()
                        }
                    }
                }
                None => String::new(),
            };
            let entry = dex.add_entry(&name, &taqueria, &location, &image_url);
            println!("🌮 Taco registrado: {} en {} ({})", entry.name, entry.taqueria, entry.id);
        }
        TacodexCommands::List => {
            let entries = dex.entries();
            let stats = dex.stats();
            println!(
                "Tacodex: {} tacos, {} taquerías distintas, racha de {} días",
                stats.total_tacos, stats.unique_taquerias, stats.streak
            );
            for entry in entries {
                let minted = if entry.minted {
                    format!(" · minteado #{}", entry.token_id.unwrap_or_default())
                } else {
                    String::new()
                };
                println!("  {} — {} en {}, {}{}", entry.id, entry.name, entry.taqueria, entry.location, minted);
            }
        }
        TacodexCommands::Mint { id, token_id } => {
            if dex.mark_minted(&id, token_id) {
                println!("✨ Entrada {} marcada como minteada (token #{})", id, token_id);
            } else {
                println!("No hay ninguna entrada con id {}", id);
            }
        }
    }
    Ok(())
}

async fn hub(game: &Game, command: HubCommands) -> Result<()> {
    let client = match HubClient::new(game.config.hub.clone()) {
        Ok(client) => client,
        Err(e) => {
            println!("{}", e);
            return Ok(());
        }
    };
    let state = HubState::new(game.store.clone());

    match command {
        HubCommands::Register { owner, email } => {
            let Some(pet) = game.require_pet() else {
                return Ok(());
            };
            let request = RegisterRequest {
                name: pet.name.clone(),
                owner_name: owner,
                sprite_url: String::new(),
                app_url: "https://tacomon.app".to_string(),
                email,
                stats: StatsPayload::from(&pet),
                balance: game.ledger.balance(),
            };
            let spinner = spinner("Registrando en el HUB...");
            match client.register(&request).await {
                Ok(outcome) => {
                    spinner.finish_and_clear();
                    state.mark_registered(&outcome.id);
                    if outcome.already_registered {
                        println!("¡Ya estabas registrado! Bienvenido de vuelta 🌮 (id {})", outcome.id);
                    } else {
                        println!("¡Registro exitoso! Tu Tacomon está en el HUB 🎉 (id {})", outcome.id);
                    }
                    if let Some(payload) = crate::hub::payload_from_store(&game.store) {
                        client.sync(&payload).await;
                    }
                }
                Err(e) => {
                    spinner.finish_and_clear();
                    println!("{}", e);
                }
            }
        }
        HubCommands::Sync => {
            if !state.is_registered() {
                println!("Primero regístrate: tacomon hub register --owner <nombre>");
                return Ok(());
            }
            match crate::hub::payload_from_store(&game.store) {
                Some(payload) => {
                    client.sync(&payload).await;
                    println!("Snapshot enviado al HUB.");
                }
                None => println!("No hay nada que sincronizar todavía."),
            }
        }
        HubCommands::Watch => {
            if !state.is_registered() {
                println!("Primero regístrate: tacomon hub register --owner <nombre>");
                return Ok(());
            }
            println!(
                "Sincronizando cada {} minutos. Ctrl-C para salir.",
                game.config.hub.sync_interval_minutes
            );
            match crate::hub::spawn_sync_loop(client, game.store.clone()) {
                Some(handle) => {
                    tokio::signal::ctrl_c().await?;
                    handle.abort();
                }
                None => println!("El perfil no está registrado en el HUB."),
            }
        }
        HubCommands::Leaderboard { page, limit } => {
            let spinner = spinner("Consultando el HUB...");
            match client.leaderboard(page, limit).await {
                Ok(entries) => {
                    spinner.finish_and_clear();
                    if entries.is_empty() {
                        println!("El leaderboard está vacío por ahora.");
                    }
                    for (i, entry) in entries.iter().enumerate() {
                        let rank = page.saturating_sub(1) * limit + i as u32 + 1;
                        println!(
                            "{:>3}. {} ({}) — {} puntos, {} $SALSA",
                            rank, entry.name, entry.owner_name, entry.total_points, entry.balance
                        );
                    }
                }
                Err(e) => {
                    spinner.finish_and_clear();
                    println!("{}", e);
                }
            }
        }
    }
    Ok(())
}

fn reset(game: &Game, yes: bool) -> Result<()> {
    let Some(pet) = game.pets.load() else {
        println!("No hay ningún Tacomon que borrar.");
        return Ok(());
    };
    if !yes {
        let answer = read_line(&format!(
            "¿Seguro que quieres despedirte de {} para siempre? (escribe 'si'): ",
            pet.name
        ))?;
        if answer.as_deref().map(str::trim) != Some("si") {
            println!("{} sigue aquí. 🌮", pet.name);
            return Ok(());
        }
    }
    game.pets.reset();
    ChatLog::new(game.store.clone()).clear();
    game.training().reset();
    println!("Adiós, {}. Puedes crear un nuevo Tacomon cuando quieras.", pet.name);
    Ok(())
}

fn show_config(config: &Config) {
    println!("LLM: {} (chat: {}, visión: {})", config.llm.base_url, config.llm.chat_model, config.llm.vision_model);
    println!("HUB: {} (sync cada {} min)", config.hub.base_url, config.hub.sync_interval_minutes);
    println!(
        "Identidad: {}",
        config.identity.as_deref().unwrap_or("anónima")
    );
    println!(
        "Wallet: {}",
        config.wallet.as_deref().unwrap_or("sin configurar")
    );
    println!(
        "Reglas: costo {}, premio {}/{}, cooldown {}s, bloqueo {}s",
        config.rules.action_cost,
        config.rules.correct_reward,
        config.rules.incorrect_reward,
        config.rules.cooldown_secs,
        config.rules.block_secs
    );
    println!(
        "API key: {}",
        if crate::security::has_api_key() {
            "configurada"
        } else {
            "sin configurar"
        }
    );
}

/// Fire one best-effort sync if the profile is hub-registered
async fn opportunistic_sync(game: &Game) {
    let state = HubState::new(game.store.clone());
    if !state.is_registered() {
        return;
    }
    let Some(payload) = crate::hub::payload_from_store(&game.store) else {
        return;
    };
    if let Ok(client) = HubClient::new(game.config.hub.clone()) {
        client.sync(&payload).await;
    }
}

fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Read one line; `None` on Ctrl-C/Ctrl-D
fn read_line(prompt: &str) -> Result<Option<String>> {
    let mut editor = rustyline::DefaultEditor::new()?;
    match editor.readline(prompt) {
        Ok(line) => Ok(Some(line)),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
