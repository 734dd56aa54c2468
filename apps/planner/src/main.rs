use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, load_settings_from, ComposerEvent, HttpTripBackend, Settings, TripComposer,
    TripLibrary,
};
use shared::domain::{BudgetTier, FormField, Identity, PartyType, Suggestion, TripId};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "planner", about = "Plan trips with generated itineraries")]
struct Cli {
    /// Settings file; defaults to ./planner.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Look up destination suggestions.
    Search { text: String },
    /// Generate an itinerary for the best match of `destination`.
    Plan {
        #[arg(long)]
        destination: String,
        #[arg(long)]
        days: String,
        #[arg(long)]
        budget: BudgetTier,
        #[arg(long)]
        party: PartyType,
        #[arg(long)]
        save: bool,
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },
    #[command(subcommand)]
    Trips(TripsCommand),
}

#[derive(Subcommand, Debug)]
enum TripsCommand {
    List {
        #[arg(long)]
        user_id: String,
    },
    Delete { trip_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => load_settings_from(path)?,
        None => load_settings(),
    };
    debug!(backend_url = %settings.backend_url, geocoding_url = %settings.geocoding_url, "settings loaded");

    match cli.command {
        Command::Search { text } => {
            let composer = TripComposer::from_settings(&settings)?;
            for suggestion in resolve(&composer, &settings, &text).await? {
                println!("{}\t{}", suggestion.place_id, suggestion.display_name);
            }
        }
        Command::Plan {
            destination,
            days,
            budget,
            party,
            save,
            user_id,
            email,
            name,
        } => {
            let composer = TripComposer::from_settings(&settings)?;
            let Some(first) = resolve(&composer, &settings, &destination)
                .await?
                .into_iter()
                .next()
            else {
                bail!("no destination found for '{destination}'");
            };
            info!(destination = %first.display_name, "using destination");

            composer.select_suggestion(&first).await;
            composer.set_field(FormField::Days(days)).await;
            composer.set_field(FormField::Budget(budget)).await;
            composer.set_field(FormField::PartyType(party)).await;

            let plan = composer.generate().await?;
            println!("{}", plan.text);

            if save {
                let identity = user_id.map(|id| {
                    let identity = Identity::new(id);
                    let identity = match email {
                        Some(email) => identity.with_email(email),
                        None => identity,
                    };
                    match name {
                        Some(name) => identity.with_display_name(name),
                        None => identity,
                    }
                });
                let trip_id = composer.save(identity.as_ref()).await?;
                println!("saved trip_id={trip_id}");
            }
        }
        Command::Trips(command) => {
            let library = TripLibrary::new(Arc::new(HttpTripBackend::from_settings(&settings)?));
            match command {
                TripsCommand::List { user_id } => {
                    let trips = library.refresh(Some(&Identity::new(user_id))).await?;
                    if trips.is_empty() {
                        println!("no saved trips");
                    }
                    for trip in trips {
                        println!(
                            "{}\t{}\t{} days\t{}\t{}\t{}",
                            trip.id,
                            trip.destination.display_name,
                            trip.days,
                            trip.budget,
                            trip.trip_type,
                            trip.created_at.format("%Y-%m-%d")
                        );
                    }
                }
                TripsCommand::Delete { trip_id } => {
                    let trip_id = TripId(trip_id);
                    library.delete(&trip_id).await?;
                    println!("deleted trip_id={trip_id}");
                }
            }
        }
    }

    Ok(())
}

/// Types `text` into the destination box and waits for the debounced search
/// to publish its suggestions or its failure.
async fn resolve(
    composer: &Arc<TripComposer>,
    settings: &Settings,
    text: &str,
) -> Result<Vec<Suggestion>> {
    if text.trim().is_empty() {
        bail!("destination text must not be blank");
    }
    let mut events = composer.subscribe_events();
    composer.set_query_text(text).await;

    let deadline = settings.search_debounce() + Duration::from_secs(settings.request_timeout_secs);
    let wait = async {
        loop {
            match events.recv().await {
                Ok(ComposerEvent::SuggestionsUpdated(suggestions)) => return Ok(suggestions),
                Ok(ComposerEvent::SearchFailed { error, .. }) => return Err(anyhow::Error::from(error)),
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => bail!("composer shut down"),
            }
        }
    };
    match tokio::time::timeout(deadline, wait).await {
        Ok(result) => result,
        Err(_) => bail!("place search for '{text}' did not complete"),
    }
}
