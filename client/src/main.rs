//! `wheelspin` command line client
//!
//! Runs one command against the wheelspin services and prints the
//! resulting local view.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wheelspin_client::dispatch::dispatch;
use wheelspin_client::http::HttpTransport;
use wheelspin_client::state::AppState;
use wheelspin_client::types::parse_ids;
use wheelspin_client::{
    AppAction, ClientConfig, ClientEnvironment, Player, PlayerAction, PlayerId, SpinAction,
    SpinMode, Ticket, TicketAction, client_store,
};

#[derive(Debug, Parser)]
#[command(name = "wheelspin", version, about = "Wheel spin raffle client")]
struct Cli {
    /// Base URL of the services (overrides WHEELSPIN_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every player with known ticket counts
    Players,
    /// Add a player
    Add {
        /// Player name
        name: String,
    },
    /// Rename a player
    Rename {
        /// Player id
        id: PlayerId,
        /// New name
        name: String,
    },
    /// Show ticket counts, e.g. `tickets 1,2,3`
    Tickets {
        /// Comma-separated player ids
        ids: String,
    },
    /// Add a ticket to each player, e.g. `increment 1,2`
    Increment {
        /// Comma-separated player ids
        ids: String,
    },
    /// Overwrite ticket counts, e.g. `set 1=5,2=0`
    Set {
        /// Comma-separated `id=count` pairs
        counts: String,
    },
    /// Spin the wheel among players, e.g. `spin 1,2,3`
    Spin {
        /// Comma-separated participant ids
        ids: String,
        /// Give every participant the same chance
        #[arg(long)]
        unweighted: bool,
    },
    /// Show the most recent spin
    LastSpin,
}

impl Command {
    fn into_intent(self) -> anyhow::Result<AppAction> {
        let intent = match self {
            Self::Players => AppAction::Player(PlayerAction::ListPlayers),
            Self::Add { name } => AppAction::Player(PlayerAction::AddPlayer { name }),
            Self::Rename { id, name } => AppAction::Player(PlayerAction::UpdatePlayer {
                player: Player::new(id, name),
            }),
            Self::Tickets { ids } => AppAction::Ticket(TicketAction::GetTickets {
                ids: parse_ids(&ids).context("ids must be comma-separated integers")?,
            }),
            Self::Increment { ids } => AppAction::Ticket(TicketAction::IncrementTickets {
                ids: parse_ids(&ids).context("ids must be comma-separated integers")?,
            }),
            Self::Set { counts } => AppAction::Ticket(TicketAction::SetTickets {
                tickets: parse_counts(&counts)?,
            }),
            Self::Spin { ids, unweighted } => AppAction::Spin(SpinAction::Spin {
                participant_ids: parse_ids(&ids).context("ids must be comma-separated integers")?,
                mode: if unweighted {
                    SpinMode::Unweighted
                } else {
                    SpinMode::Weighted
                },
            }),
            Self::LastSpin => AppAction::Spin(SpinAction::LoadLastSpin),
        };
        Ok(intent)
    }
}

fn parse_counts(counts: &str) -> anyhow::Result<Vec<Ticket>> {
    counts
        .split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (id, tickets) = pair
                .split_once('=')
                .with_context(|| format!("expected id=count, got {pair:?}"))?;
            Ok(Ticket::new(
                id.parse().with_context(|| format!("bad player id in {pair:?}"))?,
                tickets
                    .trim()
                    .parse()
                    .with_context(|| format!("bad ticket count in {pair:?}"))?,
            ))
        })
        .collect()
}

fn init_tracing(level: &str) {
    let fallback = format!("wheelspin={level},wheelspin_client={level},wheelspin_runtime={level}");
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_roster(state: &AppState) {
    if state.players.is_empty() {
        for ticket in state.tickets.iter() {
            println!("{:>4}  {:<20} {}", ticket.id, "", ticket.tickets);
        }
        return;
    }
    for entry in state.roster() {
        let tickets = entry
            .tickets
            .map_or_else(|| "-".to_string(), |count| count.to_string());
        println!("{:>4}  {:<20} {tickets}", entry.id, entry.name);
    }
}

fn print_spin(state: &AppState) {
    if let Some(result) = state.spin.latest() {
        let winner = state
            .winner_name()
            .map_or_else(|| result.winner_id.to_string(), |name| format!("{name} ({})", result.winner_id));
        println!("winner: {winner}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config = config.with_base_url(base_url);
        config.validate()?;
    }

    init_tracing(&config.log_level);

    let transport = Arc::new(HttpTransport::new(&config)?);
    let store = client_store(ClientEnvironment::from_transport(transport));

    let intent = cli.command.into_intent()?;
    let shows_spin = matches!(intent, AppAction::Spin(_));
    let outcome = dispatch(&store, intent, config.action_timeout).await?;

    if let Some(error) = outcome.error_message() {
        bail!("{}: {error}", outcome.operation());
    }

    store
        .state(|state| {
            if shows_spin {
                print_spin(state);
            }
            print_roster(state);
        })
        .await;

    store.shutdown(Duration::from_secs(1)).await?;
    Ok(())
}
