use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use vitalog_core::*;

#[derive(Parser)]
#[command(name = "vitalog")]
#[command(about = "Daily recovery scoring and health challenges", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the recovery score for a day (default today)
    Score {
        /// Day to score, YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
    },

    /// Log daily data (meals, water, steps, sleep, vitamins, activity)
    Log {
        #[command(subcommand)]
        entry: LogEntry,
    },

    /// Manage challenges
    Challenge {
        #[command(subcommand)]
        action: ChallengeAction,
    },

    /// Show or update the user profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Set the display name used on challenges and invites
    Username { name: String },

    /// Export the daily history to CSV
    Export {
        /// Output CSV path
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum LogEntry {
    /// Log a meal
    Meal {
        name: String,
        /// Calories in the meal
        #[arg(long)]
        calories: u32,
        /// Portion weight in grams
        #[arg(long, default_value_t = 0)]
        weight: u32,
        #[arg(long, default_value_t = 0.0)]
        proteins: f64,
        #[arg(long, default_value_t = 0.0)]
        fats: f64,
        #[arg(long, default_value_t = 0.0)]
        carbs: f64,
        #[arg(long, default_value_t = 0.0)]
        fiber: f64,
    },

    /// Add water in liters
    Water { liters: f64 },

    /// Update today's cumulative step count
    Steps { count: u32 },

    /// Record last night's sleep
    Sleep {
        /// Bedtime, HH:MM
        #[arg(long)]
        start: String,
        /// Wake time, HH:MM
        #[arg(long)]
        end: String,
        /// Hours slept
        #[arg(long)]
        hours: f64,
    },

    /// Mark vitamins as taken
    Vitamins {
        /// Unmark instead
        #[arg(long)]
        undo: bool,
    },

    /// Log an activity (walking, gym, running, other)
    Activity {
        kind: String,
        /// Duration in minutes
        #[arg(long)]
        minutes: u32,
    },
}

#[derive(Subcommand)]
enum ChallengeAction {
    /// List available challenges
    List,
    /// Join a challenge
    Join { id: String },
    /// Leave the active challenge
    Leave,
    /// Create a challenge and join it
    Create {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Tracked metric: step, calories, water, sleep, workout, custom, other
        #[arg(long, default_value = "custom")]
        kind: String,
        #[arg(long)]
        goal: f64,
        #[arg(long, default_value = "unit")]
        unit: String,
        #[arg(long, default_value_t = 30)]
        days: u32,
        #[arg(long, default_value = "emerald")]
        color: String,
        #[arg(long, default_value = "🏅")]
        icon: String,
    },
    /// Delete a user-created challenge
    Delete { id: String },
    /// Add progress toward the active challenge's goal
    Progress { amount: f64 },
    /// Print an invite link for the active challenge
    Invite,
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Print the stored profile and derived calorie targets
    Show,
    /// Store the profile
    Set {
        #[arg(long)]
        height: f64,
        #[arg(long)]
        weight: f64,
        #[arg(long)]
        age: u32,
        /// male or female
        #[arg(long)]
        gender: String,
        /// loss, maintenance or gain
        #[arg(long, default_value = "maintenance")]
        goal: String,
        #[arg(long)]
        step_goal: Option<u32>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    vitalog_core::logging::init();

    let cli = Cli::parse();

    // Determine data directory
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Commands::Score { date } => cmd_score(&data_dir, date),
        Commands::Log { entry } => cmd_log(&data_dir, &config, entry),
        Commands::Challenge { action } => cmd_challenge(&data_dir, &config, action),
        Commands::Profile { action } => cmd_profile(&data_dir, &config, action),
        Commands::Username { name } => cmd_username(&data_dir, &config, &name),
        Commands::Export { out } => cmd_export(&data_dir, &out),
    }
}

// ----------------------------------------------------------------------
// Wiring helpers
// ----------------------------------------------------------------------

fn open_journal(data_dir: &Path) -> Result<Journal> {
    Journal::open(Box::new(JsonFileStore::new(data_dir)))
}

fn open_engine(data_dir: &Path, config: &Config) -> Result<ChallengeEngine<SystemClock>> {
    let store = Box::new(JsonFileStore::new(data_dir));
    let mirror = config
        .sync
        .mirror_dir
        .as_ref()
        .map(|dir| Box::new(JsonFileStore::new(dir)) as Box<dyn StateStore>);
    ChallengeEngine::open(store, mirror, SystemClock, None)
}

fn load_profile(data_dir: &Path) -> Result<Option<UserProfile>> {
    let store = JsonFileStore::new(data_dir);
    match store.load("profile")? {
        Some(doc) => Ok(serde_json::from_value(doc).ok()),
        None => Ok(None),
    }
}

fn require_profile(data_dir: &Path) -> Result<UserProfile> {
    load_profile(data_dir)?.ok_or_else(|| {
        Error::State("No profile stored. Run `vitalog profile set` first.".into())
    })
}

fn save_profile(data_dir: &Path, profile: &UserProfile) -> Result<()> {
    let store = JsonFileStore::new(data_dir);
    store.save("profile", &serde_json::to_value(profile)?)
}

fn parse_time(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|e| Error::Other(format!("Invalid time '{}': {}", s, e)))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| Error::Other(format!("Invalid date '{}': {}", s, e)))
}

fn parse_gender(s: &str) -> Result<Gender> {
    match s.to_lowercase().as_str() {
        "male" | "m" => Ok(Gender::Male),
        "female" | "f" => Ok(Gender::Female),
        _ => Err(Error::Other(format!("Unknown gender: {}", s))),
    }
}

fn parse_goal(s: &str) -> Result<Goal> {
    match s.to_lowercase().as_str() {
        "loss" => Ok(Goal::Loss),
        "maintenance" => Ok(Goal::Maintenance),
        "gain" => Ok(Goal::Gain),
        _ => Err(Error::Other(format!("Unknown goal: {}", s))),
    }
}

fn parse_activity_kind(s: &str) -> Result<ActivityKind> {
    match s.to_lowercase().as_str() {
        "walking" => Ok(ActivityKind::Walking),
        "gym" => Ok(ActivityKind::Gym),
        "running" => Ok(ActivityKind::Running),
        "other" => Ok(ActivityKind::Other),
        _ => Err(Error::Other(format!("Unknown activity kind: {}", s))),
    }
}

fn parse_challenge_kind(s: &str) -> Result<ChallengeKind> {
    match s.to_lowercase().as_str() {
        "step" => Ok(ChallengeKind::Step),
        "calories" => Ok(ChallengeKind::Calories),
        "water" => Ok(ChallengeKind::Water),
        "sleep" => Ok(ChallengeKind::Sleep),
        "workout" => Ok(ChallengeKind::Workout),
        "custom" => Ok(ChallengeKind::Custom),
        "other" => Ok(ChallengeKind::Other),
        _ => Err(Error::Other(format!("Unknown challenge kind: {}", s))),
    }
}

/// Print and acknowledge a completion surfaced by the engine
fn celebrate_if_completed(engine: &mut ChallengeEngine<SystemClock>) {
    let title = engine.pending_celebration().map(|c| c.title.clone());
    if let Some(title) = title {
        println!();
        println!("🏆 Challenge complete: {}!", title);
        println!("  A trophy has been added to your shelf.");
        engine.dismiss_celebration();
    }
}

// ----------------------------------------------------------------------
// Commands
// ----------------------------------------------------------------------

fn cmd_score(data_dir: &Path, date: Option<String>) -> Result<()> {
    let profile = require_profile(data_dir)?;
    let journal = open_journal(data_dir)?;

    let day = match date {
        Some(s) => parse_date(&s)?,
        None => SystemClock.today(),
    };

    let stats = recovery_score(journal.record_for(day), &profile);

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  RECOVERY SCORE  {}", day);
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Sleep:     {:>5.1} / 40", stats.breakdown.sleep);
    println!("  Calories:  {:>5} / 20", stats.breakdown.calories);
    println!("  Water:     {:>5} / 15", stats.breakdown.water);
    println!("  Activity:  {:>5} / 15", stats.breakdown.activity);
    println!("  Vitamins:  {:>5} / 10", stats.breakdown.vitamins);
    if stats.breakdown.late_dinner_penalty {
        println!("  Late dinner: -7");
    }
    println!();
    println!("  Total: {:.0} / 100", stats.score);
    println!();

    Ok(())
}

fn cmd_log(data_dir: &Path, config: &Config, entry: LogEntry) -> Result<()> {
    let mut journal = open_journal(data_dir)?;
    let mut engine = open_engine(data_dir, config)?;
    let clock = SystemClock;
    let today = clock.today();

    match entry {
        LogEntry::Meal {
            name,
            calories,
            weight,
            proteins,
            fats,
            carbs,
            fiber,
        } => {
            let meal = journal.add_meal(
                today,
                NewMeal {
                    name,
                    weight_grams: weight,
                    calories,
                    proteins_g: proteins,
                    fats_g: fats,
                    carbs_g: carbs,
                    fiber_g: fiber,
                },
                clock.now(),
            )?;
            println!("✓ Logged meal '{}' ({} kcal)", meal.name, meal.calories);
            engine.auto_track(ChallengeKind::Calories, f64::from(meal.calories))?;
        }

        LogEntry::Water { liters } => {
            let delta = journal.add_water(today, liters)?;
            if delta > 0.0 {
                let total = journal.record_for(today).map(|d| d.water_liters).unwrap_or(0.0);
                println!("✓ Added {:.2} L of water (today: {:.2} L)", delta, total);
                engine.auto_track(ChallengeKind::Water, delta)?;
            } else {
                println!("Nothing logged (amount must be positive)");
            }
        }

        LogEntry::Steps { count } => {
            let delta = journal.set_steps(today, count)?;
            if delta > 0 {
                println!("✓ Steps today: {}", count);
                engine.auto_track(ChallengeKind::Step, f64::from(delta))?;
            } else {
                println!("Step count unchanged (already at or above {})", count);
            }
        }

        LogEntry::Sleep { start, end, hours } => {
            let start = parse_time(&start)?;
            let end = parse_time(&end)?;
            journal.set_sleep(today, start, end, hours)?;
            println!("✓ Logged {:.1} h of sleep ({} - {})", hours, start, end);
        }

        LogEntry::Vitamins { undo } => {
            journal.set_vitamins(today, !undo)?;
            if undo {
                println!("✓ Vitamins unmarked for today");
            } else {
                println!("✓ Vitamins taken today");
            }
        }

        LogEntry::Activity { kind, minutes } => {
            let kind = parse_activity_kind(&kind)?;
            let activity = journal.add_activity(today, kind, minutes, clock.now())?;
            println!(
                "✓ Logged {:?} for {} min (-{} kcal)",
                activity.kind, activity.duration_minutes, activity.calories_burned
            );
        }
    }

    celebrate_if_completed(&mut engine);
    Ok(())
}

fn cmd_challenge(data_dir: &Path, config: &Config, action: ChallengeAction) -> Result<()> {
    let mut engine = open_engine(data_dir, config)?;

    if engine.game_profile().username.is_empty() {
        println!("Tip: set a display name with `vitalog username <name>`");
    }

    match action {
        ChallengeAction::List => {
            let active_id = engine.active_challenge().map(|c| c.id.clone());
            println!("\nAvailable challenges:");
            for challenge in engine.available() {
                let marker = if active_id.as_deref() == Some(challenge.id.as_str()) {
                    "▶"
                } else if engine
                    .game_profile()
                    .completed_challenges
                    .contains(&challenge.id)
                {
                    "🏆"
                } else {
                    " "
                };
                println!(
                    "  {} {} {} — {} ({} {} in {} days)",
                    marker,
                    challenge.icon,
                    challenge.id,
                    challenge.title,
                    challenge.goal_value,
                    challenge.unit,
                    challenge.duration_days
                );
            }
            if let Some(participant) = engine.participant() {
                let goal = engine
                    .active_challenge()
                    .map(|c| c.goal_value)
                    .unwrap_or(0.0);
                println!(
                    "\n  Active progress: {:.1} / {:.1}",
                    participant.progress, goal
                );
            }
            let profile = engine.game_profile();
            println!(
                "\n  Trophies: {}  Streak: {} day(s)",
                profile.trophies, profile.streak
            );
        }

        ChallengeAction::Join { id } => {
            engine.join(&id)?;
            let title = engine
                .active_challenge()
                .map(|c| c.title.clone())
                .unwrap_or_default();
            println!("✓ Joined '{}'", title);
        }

        ChallengeAction::Leave => {
            engine.leave()?;
            println!("✓ Left the active challenge");
        }

        ChallengeAction::Create {
            title,
            description,
            kind,
            goal,
            unit,
            days,
            color,
            icon,
        } => {
            let id = engine.create_challenge(NewChallenge {
                title: title.clone(),
                description,
                kind: parse_challenge_kind(&kind)?,
                goal_value: goal,
                unit,
                duration_days: days,
                color,
                icon,
            })?;
            println!("✓ Created and joined '{}' ({})", title, id);
        }

        ChallengeAction::Delete { id } => {
            engine.delete_challenge(&id)?;
            println!("✓ Deleted '{}'", id);
        }

        ChallengeAction::Progress { amount } => {
            let completed = engine.log_progress(amount)?;
            match engine.participant() {
                Some(participant) if amount > 0.0 => {
                    println!("✓ Progress: {:.1}", participant.progress);
                }
                Some(_) => println!("Nothing logged (amount must be positive)"),
                None => println!("No active challenge - join one first"),
            }
            if completed {
                celebrate_if_completed(&mut engine);
            }
        }

        ChallengeAction::Invite => match engine.invite_link() {
            Some(link) => println!("{}", link),
            None => println!("No active challenge - join one first"),
        },
    }

    Ok(())
}

fn cmd_profile(data_dir: &Path, config: &Config, action: ProfileAction) -> Result<()> {
    match action {
        ProfileAction::Show => {
            let profile = require_profile(data_dir)?;
            println!("\nProfile:");
            println!("  Height:    {} cm", profile.height_cm);
            println!("  Weight:    {} kg", profile.weight_kg);
            println!("  Age:       {}", profile.age);
            println!("  Gender:    {:?}", profile.gender);
            println!("  Goal:      {:?}", profile.goal);
            println!("  Step goal: {}", profile.step_goal);
            println!();
            println!("  BMR:          {} kcal", basal_metabolic_rate(&profile));
            println!("  Daily target: {} kcal", daily_calorie_target(&profile));
        }

        ProfileAction::Set {
            height,
            weight,
            age,
            gender,
            goal,
            step_goal,
        } => {
            let profile = UserProfile {
                height_cm: height,
                weight_kg: weight,
                age,
                gender: parse_gender(&gender)?,
                goal: parse_goal(&goal)?,
                step_goal: step_goal.unwrap_or(config.tracking.default_step_goal),
            };
            save_profile(data_dir, &profile)?;
            println!(
                "✓ Profile saved (daily target: {} kcal)",
                daily_calorie_target(&profile)
            );
        }
    }

    Ok(())
}

fn cmd_username(data_dir: &Path, config: &Config, name: &str) -> Result<()> {
    let mut engine = open_engine(data_dir, config)?;
    engine.set_username(name)?;
    println!("✓ Username set to '{}'", name);
    Ok(())
}

fn cmd_export(data_dir: &Path, out: &Path) -> Result<()> {
    let profile = require_profile(data_dir)?;
    let journal = open_journal(data_dir)?;

    let count = history_to_csv(&journal, &profile, SystemClock.today(), out)?;
    if count == 0 {
        println!("No history to export yet.");
    } else {
        println!("✓ Exported {} day(s) to CSV", count);
        println!("  CSV: {}", out.display());
    }

    Ok(())
}
