use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::debug;

use wordup::config::Config;
use wordup::engine::achievements::AchievementCatalog;
use wordup::engine::{difficulty, spaced_repetition, stats};
use wordup::session::answer::check_spelling;
use wordup::session::result::{Difficulty, TestType};
use wordup::session::test::{TestCompletion, select_words};
use wordup::store::json_store::{ImportRecovery, JsonStore};
use wordup::store::schema::ExportData;
use wordup::{Clock, LearningPolicy, ProgressCoordinator, SystemClock, WordCorpus, WordId};

#[derive(Parser)]
#[command(name = "wordup", version, about = "Vocabulary learning progress tracker")]
struct Cli {
    #[arg(short, long, help = "Enable debug logging")]
    verbose: bool,

    #[arg(long, help = "Config file (defaults to the user config dir)")]
    config: Option<PathBuf>,

    #[arg(long, help = "Directory holding progress data")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show level, streak and overall statistics
    Status,

    /// Apply a finished test (JSON) to the stored progress
    Record {
        #[arg(help = "Path to a test completion JSON file")]
        file: PathBuf,
    },

    /// List the hardest words seen so far
    Words {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// List words due for review
    Due,

    /// List achievements and which are unlocked
    Achievements,

    /// Pick words for a new test
    NewTest {
        #[arg(
            short = 't',
            long = "type",
            help = "multipleChoice, fillBlank, matching, spelling or rapidFire"
        )]
        test_type: Option<String>,

        #[arg(short, long, help = "easy, medium or hard")]
        difficulty: Option<String>,

        #[arg(short, long)]
        count: Option<usize>,

        #[arg(long, help = "Seed for reproducible word selection")]
        seed: Option<u64>,
    },

    /// Check a typed spelling against a word
    Check {
        word_id: WordId,
        answer: String,
    },

    /// Show the config file, writing the defaults first if it does not exist
    Config,

    /// Write config and progress to a JSON file
    Export { out: PathBuf },

    /// Replace stored progress with an export file
    Import { file: PathBuf },
}

struct Env {
    config: Config,
    corpus: WordCorpus,
    catalog: AchievementCatalog,
    store: JsonStore,
}

impl Env {
    fn load(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        let corpus = match &config.word_list {
            Some(path) => WordCorpus::load(Path::new(path))?,
            None => WordCorpus::bundled()?,
        };
        let catalog = match &config.achievement_catalog {
            Some(path) => AchievementCatalog::load(Path::new(path))?,
            None => AchievementCatalog::standard()?,
        };
        let data_dir = cli
            .data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.data_dir));
        let store = JsonStore::with_base_dir(data_dir)?;
        match store.check_interrupted_import()? {
            ImportRecovery::Clean => {}
            ImportRecovery::DiscardedBackup => {
                eprintln!("Removed a backup left by an interrupted import.")
            }
            ImportRecovery::RestoredBackup => {
                eprintln!("Restored progress from a backup left by an interrupted import.")
            }
        }
        debug!(words = corpus.len(), achievements = catalog.len(), "environment loaded");
        Ok(Self {
            config,
            corpus,
            catalog,
            store,
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let env = Env::load(&cli)?;

    match cli.command {
        Command::Status => status(&env),
        Command::Record { ref file } => record(&env, file),
        Command::Words { limit } => words(&env, limit),
        Command::Due => due(&env),
        Command::Achievements => achievements(&env),
        Command::NewTest {
            ref test_type,
            ref difficulty,
            count,
            seed,
        } => new_test(&env, test_type.as_deref(), difficulty.as_deref(), count, seed),
        Command::Check {
            word_id,
            ref answer,
        } => check(&env, word_id, answer),
        Command::Config => show_config(&env, cli.config.as_deref()),
        Command::Export { ref out } => export(&env, out),
        Command::Import { ref file } => import(&env, file),
    }
}

fn status(env: &Env) -> Result<()> {
    let (progress, _) = env.store.load_progress();
    let s = stats::compute(&progress, env.corpus.len(), env.catalog.len(), SystemClock.now());

    println!(
        "Level {}  {}/{} XP ({}%)",
        s.level, s.experience, s.xp_to_next_level, s.level_progress_percent
    );
    println!("Streak: {} days (best {})", s.current_streak, s.best_streak);
    println!(
        "Words: {}/{} learned ({}%), {} mastered, {} due for review",
        s.learned_words, s.total_words, s.completion_percent, s.mastered_words, s.due_reviews
    );
    println!(
        "Tests: {} total, {} in the last 7 days, average score {:.1}, accuracy {}%",
        s.total_tests, s.tests_last_7_days, s.average_test_score, s.test_accuracy
    );
    for (test_type, count) in &s.tests_by_type {
        println!("  {:<18} {count}", test_type.label());
    }
    println!(
        "Achievements: {}/{}",
        s.achievements_unlocked, s.achievements_total
    );
    Ok(())
}

fn record(env: &Env, file: &Path) -> Result<()> {
    let content =
        fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let completion: TestCompletion = serde_json::from_str(&content)?;

    let (progress, _) = env.store.load_progress();
    let coordinator = ProgressCoordinator::new(
        &env.corpus,
        &env.catalog,
        LearningPolicy::from_config(&env.config),
        SystemClock,
    );
    let outcome = coordinator.apply_test_completion(&progress, &completion)?;
    env.store.save_progress(&outcome.progress)?;

    let result = &outcome.result;
    println!("{}", result.grade().headline());
    println!(
        "{}: {} / {} points ({}%)",
        result.test_type.label(),
        result.score,
        result.total_possible,
        result.percentage()
    );
    if outcome.levels_gained > 0 {
        println!("Level up! Now level {}", outcome.progress.level);
    }
    for word_id in &outcome.newly_learned {
        if let Some(word) = env.corpus.get(*word_id) {
            println!("Learned: {}", word.headword);
        }
    }
    for id in &outcome.newly_unlocked {
        if let Some(achievement) = env.catalog.get(id) {
            println!(
                "Achievement unlocked: {} (+{} XP)",
                achievement.title, achievement.xp_reward
            );
        }
    }
    Ok(())
}

fn words(env: &Env, limit: usize) -> Result<()> {
    let (progress, _) = env.store.load_progress();
    let hardest = difficulty::hardest(&progress.test_history, limit);
    if hardest.is_empty() {
        println!("No tests taken yet.");
        return Ok(());
    }
    for d in hardest {
        let headword = env
            .corpus
            .get(d.word_id)
            .map(|w| w.headword.as_str())
            .unwrap_or("?");
        println!(
            "{:<18} difficulty {:>3}  attempts {:>2}  success {:>3.0}%{}",
            headword,
            d.difficulty,
            d.attempts,
            d.success_rate * 100.0,
            if d.mastered() { "  mastered" } else { "" }
        );
    }
    Ok(())
}

fn due(env: &Env) -> Result<()> {
    let (progress, _) = env.store.load_progress();
    let now = SystemClock.now();
    let due = spaced_repetition::due_cards(&progress.review_cards, now);
    if due.is_empty() {
        println!("Nothing due for review.");
        return Ok(());
    }
    for card in due {
        let headword = env
            .corpus
            .get(card.word_id)
            .map(|w| w.headword.as_str())
            .unwrap_or("?");
        println!(
            "{:<18} due {}  interval {}d  ease {:.2}",
            headword,
            card.next_review.format("%Y-%m-%d"),
            card.interval,
            card.ease_factor
        );
    }
    Ok(())
}

fn achievements(env: &Env) -> Result<()> {
    let (progress, _) = env.store.load_progress();
    for achievement in env.catalog.iter() {
        let mark = if progress.achievements.contains(&achievement.id) {
            "x"
        } else {
            " "
        };
        println!(
            "[{mark}] {:<20} {:?}/{:?}  +{} XP  {}",
            achievement.title,
            achievement.category,
            achievement.tier,
            achievement.xp_reward,
            achievement.description
        );
    }
    Ok(())
}

fn new_test(
    env: &Env,
    test_type: Option<&str>,
    difficulty: Option<&str>,
    count: Option<usize>,
    seed: Option<u64>,
) -> Result<()> {
    let test_type = match test_type {
        Some(key) => match TestType::from_key(key) {
            Some(t) => t,
            None => bail!("unknown test type `{key}`"),
        },
        None => env.config.test_type(),
    };
    let difficulty = match difficulty {
        Some(key) => match Difficulty::from_key(key) {
            Some(d) => d,
            None => bail!("unknown difficulty `{key}`"),
        },
        None => env.config.difficulty(),
    };
    let count = count.unwrap_or(env.config.words_per_test);

    let (progress, _) = env.store.load_progress();
    let mut rng = match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };
    let words = select_words(
        &env.corpus,
        &progress.review_cards,
        SystemClock.now(),
        count,
        &mut rng,
    );

    println!(
        "{} ({:?}, {}s per question{})",
        test_type.label(),
        difficulty,
        difficulty.time_limit_secs(),
        if difficulty.hints_allowed() { ", hints allowed" } else { "" }
    );
    for id in words {
        if let Some(word) = env.corpus.get(id) {
            println!("{:>4}  {:<18} {}", id, word.headword, word.definition);
        }
    }
    Ok(())
}

fn check(env: &Env, word_id: WordId, answer: &str) -> Result<()> {
    let Some(word) = env.corpus.get(word_id) else {
        bail!("word {word_id} is not in the word list");
    };
    if check_spelling(answer, &word.headword) {
        println!("Correct!");
    } else {
        println!("Incorrect. The correct spelling is: {}", word.headword);
    }
    Ok(())
}

fn show_config(env: &Env, path: Option<&Path>) -> Result<()> {
    let path = path.map_or_else(Config::config_path, Path::to_path_buf);
    if !path.exists() {
        env.config.save_to(&path)?;
        println!("Wrote default config to {}", path.display());
    }
    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(&env.config)?);
    Ok(())
}

fn export(env: &Env, out: &Path) -> Result<()> {
    let data = env.store.export_all(&env.config);
    fs::write(out, serde_json::to_string_pretty(&data)?)
        .with_context(|| format!("writing {}", out.display()))?;
    println!("Exported to {}", out.display());
    Ok(())
}

fn import(env: &Env, file: &Path) -> Result<()> {
    let content =
        fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let data: ExportData = serde_json::from_str(&content)?;
    env.store.import_all(&data)?;
    println!("Imported progress from {}", file.display());
    Ok(())
}
