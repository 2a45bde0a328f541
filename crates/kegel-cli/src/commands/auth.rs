use clap::Subcommand;
use kegel_core::identity::{validate_sign_in, validate_sign_up};
use kegel_core::{IdentityProvider, LocalIdentity, SqliteStore};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Create a local account and sign in
    SignUp {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Password confirmation
        #[arg(long)]
        confirm: String,
    },
    /// Sign in to an existing account
    SignIn {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out; later runs are recorded anonymously
    SignOut,
    /// Print the signed-in user as JSON
    Whoami,
}

pub fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = SqliteStore::open()?;
    let mut identity = LocalIdentity::new(&db);

    match action {
        AuthAction::SignUp {
            email,
            password,
            confirm,
        } => {
            validate_sign_up(&email, &password, &confirm)?;
            let user = identity.sign_up(&email, &password)?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        AuthAction::SignIn { email, password } => {
            validate_sign_in(&email, &password)?;
            let user = identity.sign_in(&email, &password)?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        AuthAction::SignOut => {
            identity.sign_out();
            println!("signed out");
        }
        AuthAction::Whoami => match identity.require_user() {
            Ok(user) => println!("{}", serde_json::to_string_pretty(user)?),
            Err(e) => println!("{e}"),
        },
    }
    Ok(())
}
