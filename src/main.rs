use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use savekeep::{
    BootstrapSequencer, Difficulty, PersistenceConfig, SaveCoordinator, ServiceContainer,
    SharedRegistry, SlotStatus, StartupMode,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "savekeep")]
#[command(about = "Inspect and maintain multi-profile game saves")]
struct Cli {
    /// Save root; overrides the configuration file
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List profiles
    List,
    /// Create a profile and make it active
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "normal", value_parser = parse_difficulty)]
        difficulty: Difficulty,
    },
    /// Make a profile active
    Select {
        #[arg(long)]
        id: u32,
    },
    /// Delete a profile and all its saves
    Delete {
        #[arg(long)]
        id: u32,
    },
    /// Show the active profile's slots
    Slots,
    /// Remove or fix broken slot files of the active profile
    Repair,
    /// Run the startup sequence
    Start {
        #[command(subcommand)]
        mode: Option<StartCommand>,
    },
}

#[derive(Subcommand)]
enum StartCommand {
    New {
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value = "normal", value_parser = parse_difficulty)]
        difficulty: Difficulty,
    },
    Continue,
    Load {
        #[arg(long)]
        slot: u32,
    },
}

fn parse_difficulty(value: &str) -> std::result::Result<Difficulty, String> {
    Difficulty::parse(value).ok_or_else(|| format!("unknown difficulty '{}'", value))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = load_config(cli.root, cli.config)?;

    match cli.command {
        Command::List => list(config).await,
        Command::Create { name, difficulty } => create(config, &name, difficulty).await,
        Command::Select { id } => select(config, id).await,
        Command::Delete { id } => delete(config, id).await,
        Command::Slots => slots(config).await,
        Command::Repair => repair(config).await,
        Command::Start { mode } => {
            let mode = match mode {
                Some(StartCommand::New { name, difficulty }) => {
                    StartupMode::NewGame { name, difficulty }
                }
                Some(StartCommand::Load { slot }) => StartupMode::LoadSpecific(slot),
                Some(StartCommand::Continue) | None => StartupMode::Continue,
            };
            start(config, mode).await
        }
    }
}

fn load_config(root: Option<PathBuf>, path: Option<PathBuf>) -> Result<PersistenceConfig> {
    let mut config = match path {
        Some(path) => PersistenceConfig::from_file(&path)
            .with_context(|| format!("Failed to load configuration '{}'", path.display()))?,
        None => PersistenceConfig::default(),
    };
    if let Some(root) = root {
        config.save_root = root;
    }
    Ok(config)
}

async fn open(config: PersistenceConfig) -> Result<(SharedRegistry, SaveCoordinator)> {
    let services = ServiceContainer::new(config);
    let registry = services
        .start_registry()
        .await
        .context("Failed to open instance registry")?;
    let coordinator = services
        .start_coordinator()
        .await
        .context("Failed to start save coordinator")?;
    coordinator.attach_registry(registry.clone()).await;
    Ok((registry, coordinator))
}

async fn list(config: PersistenceConfig) -> Result<()> {
    let (registry, _) = open(config).await?;
    let registry = registry.lock().await;
    let active = registry.active_id();

    if registry.list_instances().is_empty() {
        println!("No profiles.");
        return Ok(());
    }
    for profile in registry.list_instances() {
        println!(
            "{} {:>3}  {:<24} {:<6} last slot {:<2} {:>6.1}h  {}",
            if Some(profile.id) == active { "*" } else { " " },
            profile.id,
            profile.name,
            profile.difficulty,
            profile.last_save_slot,
            profile.play_time_hours,
            profile.last_played_at.format("%Y-%m-%d %H:%M"),
        );
    }
    println!(
        "{} of {} profiles used",
        registry.instance_count(),
        registry.max_instances()
    );
    Ok(())
}

async fn create(config: PersistenceConfig, name: &str, difficulty: Difficulty) -> Result<()> {
    let (registry, _) = open(config).await?;
    let id = registry
        .lock()
        .await
        .create_instance(name, difficulty)
        .await
        .with_context(|| format!("Failed to create profile '{}'", name))?;
    println!("Created profile {} ('{}', {})", id, name, difficulty);
    Ok(())
}

async fn select(config: PersistenceConfig, id: u32) -> Result<()> {
    let (registry, _) = open(config).await?;
    if !registry.lock().await.select_instance(id).await? {
        return Err(anyhow!("No profile with id {}", id));
    }
    println!("Profile {} is now active", id);
    Ok(())
}

async fn delete(config: PersistenceConfig, id: u32) -> Result<()> {
    let (registry, _) = open(config).await?;
    if !registry.lock().await.delete_instance(id).await? {
        return Err(anyhow!("No profile with id {}", id));
    }
    println!("Deleted profile {}", id);
    Ok(())
}

async fn slots(config: PersistenceConfig) -> Result<()> {
    let (_, coordinator) = open(config).await?;
    let slots = coordinator
        .list_slots()
        .await
        .context("Failed to list slots (is a profile active?)")?;

    if slots.is_empty() {
        println!("No saves.");
    }
    for summary in slots {
        let label = if summary.is_autosave() {
            "auto".to_string()
        } else {
            summary.slot.to_string()
        };
        match summary.status {
            SlotStatus::Readable {
                player_name,
                level,
                currency,
                saved_at,
            } => println!(
                "{:>4}  {:<24} lv {:<3} {:>8} gold  {}",
                label,
                player_name,
                level,
                currency,
                saved_at
                    .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            SlotStatus::Unreadable(reason) => println!("{:>4}  <unreadable: {}>", label, reason),
        }
    }
    Ok(())
}

async fn repair(config: PersistenceConfig) -> Result<()> {
    let (_, coordinator) = open(config).await?;
    let report = coordinator
        .repair_scan()
        .await
        .context("Repair scan failed (is a profile active?)")?;

    println!("Scanned {} slot files", report.scanned);
    if report.is_clean() {
        println!("Nothing to repair.");
        return Ok(());
    }
    println!("Removed undecodable: {:?}", report.removed_undecodable);
    println!("Removed stranded:    {:?}", report.removed_stranded);
    println!("Restamped:           {:?}", report.restamped);
    Ok(())
}

async fn start(config: PersistenceConfig, mode: StartupMode) -> Result<()> {
    let services = ServiceContainer::new(config);
    services
        .start_all()
        .await
        .context("Failed to start persistence services")?;

    let mut sequencer = BootstrapSequencer::new(services);
    sequencer.request(mode);
    let report = sequencer.run().await.context("Startup failed")?;

    println!("Requested: {}", report.requested);
    println!("Outcome:   {:?}", report.outcome);
    match report.instance_id {
        Some(id) => println!("Profile:   {}", id),
        None if report.legacy => println!("Profile:   legacy"),
        None => println!("Profile:   none"),
    }
    Ok(())
}
