use chrono::Utc;
use clap::Subcommand;
use kegel_core::progress::summarize;
use kegel_core::{
    Config, IdentityProvider, LocalIdentity, ProgressStore, ProgressTracker, SqliteStore,
};

#[derive(Subcommand)]
pub enum ProgressAction {
    /// Aggregate progress as JSON
    Show,
    /// Session history, newest first, as JSON
    History {
        /// Only the N most recent sessions
        #[arg(long)]
        limit: Option<usize>,
    },
}

pub fn run(action: ProgressAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = SqliteStore::open()?;
    let ctx = LocalIdentity::new(&db).context();
    let store = ProgressStore::new(&db);

    match action {
        ProgressAction::Show => {
            let progress = ProgressTracker::new(&store)
                .with_strategy(config.progress.strategy)
                .with_policy(config.progress.policy)
                .with_weekly_goal(config.progress.weekly_goal)
                .progress(&ctx);
            println!("{}", serde_json::to_string_pretty(&progress)?);
        }
        ProgressAction::History { limit } => {
            let sessions = store.sessions_for(ctx.user_id());
            let mut summary = summarize(sessions, Utc::now(), config.progress.weekly_goal);
            if let Some(limit) = limit {
                summary.sessions.truncate(limit);
            }
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}
