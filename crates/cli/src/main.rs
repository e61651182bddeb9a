use anyhow::Context;
use clap::{Parser, Subcommand};
use slotbook_app::{bootstrap, modules::auth::AccountService, AppContext};
use slotbook_kernel::settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "slotbook", version, about = "Operate the slotbook booking service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Migrate, then serve the HTTP API until interrupted
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Create an administrator account unless the email is already registered
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load slotbook settings")?;
    slotbook_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Serve => slotbook_app::run(settings).await,
        Command::Migrate => {
            let ctx = AppContext::from_settings(&settings).await?;
            let registry = bootstrap::build_registry(&ctx)?;
            bootstrap::migrate(&ctx, &registry).await?;
            tracing::info!("migrations applied");
            Ok(())
        }
        Command::CreateAdmin { email, password } => {
            let ctx = AppContext::from_settings(&settings).await?;
            let registry = bootstrap::build_registry(&ctx)?;
            bootstrap::migrate(&ctx, &registry).await?;

            let created = AccountService::new(&ctx)
                .ensure_administrator(&email, &password)
                .await?;
            if created {
                println!("administrator {email} created");
            } else {
                println!("{email} is already registered; nothing to do");
            }
            Ok(())
        }
    }
}
