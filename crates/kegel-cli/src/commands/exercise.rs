use std::io::BufRead;
use std::time::Duration;

use clap::Subcommand;
use kegel_core::exercises::{self, CATALOG};
use kegel_core::{
    interval_coach, run_live, Config, Control, Event, Exercise, ExerciseProtocol,
    IdentityProvider, LocalIdentity, LogNotifier, Notifier, NullNotifier, ProgressStore,
    SkillLevel, SqliteStore,
};
use tokio::sync::mpsc::{self, UnboundedSender};

#[derive(Subcommand)]
pub enum ExerciseAction {
    /// List the built-in exercises as JSON
    List {
        /// Filter by level (beginner, intermediate, advanced)
        #[arg(long)]
        level: Option<SkillLevel>,
    },
    /// Show one exercise as JSON
    Show {
        /// Exercise ID
        id: String,
    },
    /// Run an exercise in real time, printing events as JSON lines.
    ///
    /// While running, type `p` to pause, `r` to resume, `q` to quit.
    Run {
        /// Built-in exercise ID
        #[arg(long, conflicts_with_all = ["contract", "relax", "reps"])]
        exercise: Option<String>,
        /// Contraction seconds (defaults to config)
        #[arg(long)]
        contract: Option<u32>,
        /// Relaxation seconds (defaults to config)
        #[arg(long)]
        relax: Option<u32>,
        /// Repetitions (defaults to config)
        #[arg(long)]
        reps: Option<u32>,
        /// Length of one countdown second, in milliseconds
        #[arg(long, default_value = "1000")]
        period_ms: u64,
    },
}

pub fn run(action: ExerciseAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ExerciseAction::List { level } => {
            let list: Vec<&Exercise> = match level {
                Some(level) => exercises::by_level(level).collect(),
                None => CATALOG.iter().collect(),
            };
            println!("{}", serde_json::to_string_pretty(&list)?);
        }
        ExerciseAction::Show { id } => {
            let exercise =
                exercises::by_id(&id).ok_or_else(|| format!("unknown exercise: {id}"))?;
            println!("{}", serde_json::to_string_pretty(exercise)?);
        }
        ExerciseAction::Run {
            exercise,
            contract,
            relax,
            reps,
            period_ms,
        } => {
            let config = Config::load()?;
            let protocol = match exercise {
                Some(id) => exercises::by_id(&id)
                    .ok_or_else(|| format!("unknown exercise: {id}"))?
                    .protocol()?,
                None => ExerciseProtocol::new(
                    contract.unwrap_or(config.exercise.contraction_secs),
                    relax.unwrap_or(config.exercise.relaxation_secs),
                    reps.unwrap_or(config.exercise.repetitions),
                )?,
            };
            if period_ms == 0 {
                return Err("--period-ms must be greater than 0".into());
            }
            run_exercise(&config, protocol, Duration::from_millis(period_ms))?;
        }
    }
    Ok(())
}

fn run_exercise(
    config: &Config,
    protocol: ExerciseProtocol,
    period: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = SqliteStore::open()?;
    let ctx = LocalIdentity::new(&db).context();
    if !ctx.is_authenticated() {
        eprintln!("not signed in; this run is kept on this device only");
    }

    let notifier: &dyn Notifier = if config.notifications.enabled {
        &LogNotifier
    } else {
        &NullNotifier
    };
    let (mut coach, mut ticks) = interval_coach(
        protocol,
        ProgressStore::new(&db),
        notifier,
        ctx,
        config.progress,
        period,
    );

    let (controls_tx, mut controls) = mpsc::unbounded_channel();
    spawn_stdin_controls(controls_tx);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let session = runtime.block_on(run_live(
        &mut coach,
        &mut ticks,
        &mut controls,
        print_event,
    ));

    match session {
        Some(session) => eprintln!(
            "recorded session {} ({})",
            session.id,
            session.duration_label()
        ),
        None => eprintln!("exercise abandoned"),
    }
    Ok(())
}

fn print_event(event: &Event) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::warn!("unprintable event: {e}"),
    }
}

/// Forward `p`/`r`/`q` lines from stdin. The sender drops at EOF, which
/// leaves a running exercise to finish on its own.
fn spawn_stdin_controls(tx: UnboundedSender<Control>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let control = match line.trim() {
                "p" | "pause" => Control::Pause,
                "r" | "resume" => Control::Resume,
                "q" | "quit" | "reset" => Control::Reset,
                "" => continue,
                other => {
                    eprintln!("unknown command: {other} (p, r or q)");
                    continue;
                }
            };
            if tx.send(control).is_err() {
                break;
            }
        }
    });
}
