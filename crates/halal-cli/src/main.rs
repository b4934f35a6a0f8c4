//! `halal` — browse, like and match from the terminal.
//!
//! # Usage
//!
//! ```
//! halal next
//! halal like profile2
//! halal filters set --max-age 30 --intent marriage
//! HALAL_TIER=premium halal liked-me
//! ```

mod config;
mod location;
mod seed;

use std::path::PathBuf;

use anyhow::Context as _;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use halal_core::{
  decision::Outcome,
  discovery::Ranked,
  filter::FilterSettings,
  geo::Location,
  location::FixedLocation,
  profile::{Candidate, Intent, MaritalStatus, ProfileId, ReligiousLevel, ViewerProfile},
  session::LocationRefresh,
  DiscoverySession,
};
use halal_store_sqlite::SqliteStore;
use rand_core::OsRng;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::{config::CliConfig, location::TimeoutLocation, seed::SeedSource};

type Session = DiscoverySession<SqliteStore>;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "halal", author, version, about = "Halal Match profile discovery")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "halal.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Show the current candidate.
  Next,
  /// Like a candidate (the current one when no id is given).
  Like { id: Option<String> },
  /// Pass on a candidate (the current one when no id is given).
  Dislike { id: Option<String> },
  /// Move past the current candidate without deciding.
  Skip,
  /// List matches with their contact handles.
  Matches,
  /// List who has liked you. Premium only.
  LikedMe,
  /// Show today's like allowance.
  Quota,
  /// Show or change search filters.
  #[command(subcommand)]
  Filters(FiltersCommand),
  /// Request a location fix and re-rank candidates by distance.
  Locate,
  /// Show or change your own profile.
  #[command(subcommand)]
  Profile(ProfileCommand),
  /// List the state saved for this viewer.
  Status,
}

#[derive(Subcommand, Debug)]
enum FiltersCommand {
  Show,
  /// Change only the given settings.
  Set(FilterArgs),
  /// Restore the defaults.
  Reset,
}

#[derive(Args, Debug)]
struct FilterArgs {
  #[arg(long)]
  min_age:                Option<u32>,
  #[arg(long)]
  max_age:                Option<u32>,
  /// Maximum distance in kilometres.
  #[arg(long)]
  max_distance:           Option<u32>,
  /// Accepted religious level; repeat for several.
  #[arg(long = "religious-level")]
  religious_levels:       Vec<ReligiousLevel>,
  /// Accepted marital status; repeat for several.
  #[arg(long = "marital-status")]
  marital_statuses:       Vec<MaritalStatus>,
  #[arg(long)]
  intent:                 Option<Intent>,
  /// Only show candidates with a contact handle.
  #[arg(long)]
  require_contact_handle: Option<bool>,
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
  Show,
  /// Create or replace your profile.
  Set(ProfileArgs),
}

#[derive(Args, Debug)]
struct ProfileArgs {
  #[arg(long)]
  name:            String,
  #[arg(long)]
  age:             u32,
  #[arg(long)]
  religious_level: ReligiousLevel,
  #[arg(long)]
  marital_status:  MaritalStatus,
  #[arg(long, default_value_t = Intent::Both)]
  intent:          Intent,
  #[arg(long, default_value = "")]
  email:           String,
  #[arg(long, default_value = "")]
  bio:             String,
  #[arg(long = "interest")]
  interests:       Vec<String>,
  #[arg(long = "photo")]
  photos:          Vec<String>,
  #[arg(long)]
  latitude:        Option<f64>,
  #[arg(long)]
  longitude:       Option<f64>,
  #[arg(long)]
  city:            Option<String>,
  #[arg(long)]
  country:         Option<String>,
  /// Shown to matches only.
  #[arg(long)]
  contact_handle:  Option<String>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let cfg = CliConfig::load(&cli.config)?;

  let store_path = cfg.store_path();
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let source = SeedSource::load_or_draw(&store, cfg.viewer_id, cfg.liked_me_count, &mut OsRng)
    .await
    .context("failed to prepare candidates")?;
  let mut session = DiscoverySession::open(cfg.identity(), store, &source, cfg.quota_policy()?)
    .await
    .context("failed to open discovery session")?;

  // Ask for a fix on every launch once a position is configured.
  let position = cfg.coordinates()?;
  let provider = TimeoutLocation::new(FixedLocation(position), cfg.location_timeout());
  let refresh = if position.is_some() || matches!(cli.command, Command::Locate) {
    Some(session.refresh_location(&provider).await?)
  } else {
    None
  };

  run(cli.command, &mut session, &cfg, refresh).await
}

async fn run(
  command: Command,
  session: &mut Session,
  cfg: &CliConfig,
  refresh: Option<LocationRefresh>,
) -> anyhow::Result<()> {
  match command {
    Command::Next => print_current(session),
    Command::Skip => {
      session.advance().await?;
      print_current(session);
    }
    Command::Like { id } => {
      let id = target(session, id)?;
      let outcome = session.like(&id, Utc::now()).await?;
      print_outcome(session, &id, &outcome);
    }
    Command::Dislike { id } => {
      let id = target(session, id)?;
      let outcome = session.dislike(&id, Utc::now()).await?;
      print_outcome(session, &id, &outcome);
    }
    Command::Matches => {
      let matched = session.matched_profiles();
      if matched.is_empty() {
        println!("No matches yet.");
      }
      for m in matched {
        println!(
          "{} ({}), matched {}: {}",
          m.candidate.name,
          m.candidate.id,
          m.matched.created_at.format("%Y-%m-%d"),
          m.contact_handle.map_or("no contact handle".into(), |h| format!("@{h}")),
        );
      }
    }
    Command::LikedMe => {
      let admirers = session.liked_me()?;
      if admirers.is_empty() {
        println!("Nobody yet.");
      }
      for c in admirers {
        println!("{} ({}), {}", c.name, c.id, c.age);
      }
    }
    Command::Quota => {
      let q = session.quota(Utc::now());
      println!("{} of {} likes used today, {} left", q.used, q.limit, q.remaining);
    }
    Command::Filters(FiltersCommand::Show) => print_json(session.filters())?,
    Command::Filters(FiltersCommand::Set(args)) => {
      let settings = args.apply(session.filters().clone());
      session.update_filters(settings).await?;
      print_json(session.filters())?;
    }
    Command::Filters(FiltersCommand::Reset) => {
      session.reset_filters().await?;
      print_json(session.filters())?;
    }
    Command::Locate => match refresh {
      Some(LocationRefresh::Updated(c)) => {
        println!("Location set to {:.4}, {:.4}", c.latitude, c.longitude);
        print_current(session);
      }
      Some(LocationRefresh::Unavailable { reason }) => {
        println!("Location unavailable: {reason}");
      }
      None => println!("No location configured."),
    },
    Command::Profile(ProfileCommand::Show) => match &session.viewer().profile {
      Some(profile) => print_json(profile)?,
      None => println!("No profile yet. Create one with `halal profile set`."),
    },
    Command::Profile(ProfileCommand::Set(args)) => {
      let profile = args.into_profile(session.viewer().profile.as_ref(), cfg.viewer_id)?;
      session.save_profile(profile).await?;
      println!("Profile saved.");
    }
    Command::Status => {
      let saved = session.store().saved_slots(cfg.viewer_id).await?;
      println!("viewer {} ({})", cfg.viewer_id, session.viewer().tier);
      for s in saved {
        println!("  {:<10} {}", s.slot, s.updated_at.to_rfc3339());
      }
      println!("  {} candidates left in the queue", session.remaining());
    }
  }
  Ok(())
}

// ─── Argument handling ────────────────────────────────────────────────────────

/// The explicit id, or the candidate on screen.
fn target(session: &Session, id: Option<String>) -> anyhow::Result<ProfileId> {
  match id {
    Some(id) => Ok(ProfileId::new(id)),
    None => session
      .current()
      .map(|r| r.candidate.id.clone())
      .context("nobody left to decide on"),
  }
}

impl FilterArgs {
  fn apply(self, mut settings: FilterSettings) -> FilterSettings {
    if let Some(v) = self.min_age {
      settings.min_age = v;
    }
    if let Some(v) = self.max_age {
      settings.max_age = v;
    }
    if let Some(v) = self.max_distance {
      settings.max_distance_km = v;
    }
    if !self.religious_levels.is_empty() {
      settings.religious_levels = self.religious_levels.into_iter().collect();
    }
    if !self.marital_statuses.is_empty() {
      settings.marital_statuses = self.marital_statuses.into_iter().collect();
    }
    if let Some(v) = self.intent {
      settings.intent = v;
    }
    if let Some(v) = self.require_contact_handle {
      settings.require_contact_handle = v;
    }
    settings
  }
}

impl ProfileArgs {
  fn into_profile(
    self,
    existing: Option<&ViewerProfile>,
    viewer_id: Uuid,
  ) -> anyhow::Result<ViewerProfile> {
    // Keep the profile id stable across edits.
    let id = existing
      .map(|p| p.profile.id.clone())
      .unwrap_or_else(|| ProfileId::new(format!("user-{viewer_id}")));

    let mut profile = Candidate::new(
      id,
      self.name,
      self.age,
      self.religious_level,
      self.marital_status,
      self.intent,
    )
    .with_bio(self.bio)
    .with_interests(self.interests)
    .with_photos(self.photos);

    if let (Some(lat), Some(lon)) = (self.latitude, self.longitude) {
      let coords = halal_core::geo::Coordinates::new(lat, lon)?;
      profile = profile.with_location(Location {
        city: self.city,
        country: self.country,
        ..Location::from(coords)
      });
    }
    if let Some(handle) = self.contact_handle {
      profile = profile.with_contact_handle(handle);
    }

    Ok(ViewerProfile {
      user_id: viewer_id,
      email: self.email,
      profile,
    })
  }
}

// ─── Output ───────────────────────────────────────────────────────────────────

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

fn print_candidate(ranked: Ranked<'_>) {
  let c = ranked.candidate;
  let distance = ranked
    .distance_km
    .map_or_else(|| "distance unknown".to_owned(), |d| format!("{d} km away"));
  println!("{}, {} ({}) · {distance}", c.name, c.age, c.id);
  println!("  {} · {} · looking for {}", c.religious_level, c.marital_status, c.intent);
  if !c.bio.is_empty() {
    println!("  {}", c.bio);
  }
  if !c.interests.is_empty() {
    println!("  interests: {}", c.interests.join(", "));
  }
}

fn print_current(session: &Session) {
  match session.current() {
    Some(ranked) => {
      print_candidate(ranked);
      println!("{} more after this one", session.remaining().saturating_sub(1));
    }
    None => println!("No more profiles match your filters. Try widening them."),
  }
}

fn print_outcome(session: &Session, id: &ProfileId, outcome: &Outcome) {
  let name = session.candidate(id).map_or(id.as_str(), |c| c.name.as_str());
  match outcome {
    Outcome::Liked => println!("You liked {name}."),
    Outcome::Disliked => println!("You passed on {name}."),
    Outcome::Matched(m) => {
      println!("It's a match with {name}!");
      let handle = session
        .matched_profiles()
        .into_iter()
        .find(|p| p.matched.match_id == m.match_id)
        .and_then(|p| p.contact_handle);
      if let Some(handle) = handle {
        println!("  Say salaam: @{handle}");
      }
    }
    Outcome::QuotaExceeded { limit } => {
      println!("You have used all {limit} likes for today. Premium raises the limit.");
    }
    Outcome::AlreadyDecided { verdict } => println!("You already chose {verdict} for {name}."),
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use super::*;

  fn parse(args: &[&str]) -> Command {
    let argv = std::iter::once("halal").chain(args.iter().copied());
    Cli::try_parse_from(argv).unwrap().command
  }

  fn filter_args(args: &[&str]) -> FilterArgs {
    let argv: Vec<&str> = ["filters", "set"].into_iter().chain(args.iter().copied()).collect();
    match parse(&argv) {
      Command::Filters(FiltersCommand::Set(args)) => args,
      other => panic!("unexpected command {other:?}"),
    }
  }

  fn profile_args(args: &[&str]) -> ProfileArgs {
    let base = [
      "profile",
      "set",
      "--name",
      "Zaid",
      "--age",
      "30",
      "--religious-level",
      "moderate",
      "--marital-status",
      "single",
    ];
    let argv: Vec<&str> = base.into_iter().chain(args.iter().copied()).collect();
    match parse(&argv) {
      Command::Profile(ProfileCommand::Set(args)) => args,
      other => panic!("unexpected command {other:?}"),
    }
  }

  // ─── Filters ────────────────────────────────────────────────────────────────

  #[test]
  fn filter_set_changes_only_given_fields() {
    let settings = filter_args(&["--max-age", "35"]).apply(FilterSettings::default());

    assert_eq!(
      settings,
      FilterSettings {
        max_age: 35,
        ..FilterSettings::default()
      }
    );
  }

  #[test]
  fn repeated_level_flags_replace_the_accepted_set() {
    let settings = filter_args(&["--religious-level", "practicing", "--religious-level", "cultural"])
      .apply(FilterSettings::default());

    assert_eq!(
      settings.religious_levels,
      BTreeSet::from([ReligiousLevel::Practicing, ReligiousLevel::Cultural])
    );
    assert_eq!(settings.marital_statuses, FilterSettings::default().marital_statuses);
  }

  #[test]
  fn filter_set_applies_intent_distance_and_handle() {
    let start = FilterSettings {
      min_age: 25,
      ..FilterSettings::default()
    };
    let settings = filter_args(&[
      "--intent",
      "marriage",
      "--max-distance",
      "10",
      "--marital-status",
      "widowed",
      "--require-contact-handle",
      "true",
    ])
    .apply(start);

    assert_eq!(settings.min_age, 25);
    assert_eq!(settings.intent, Intent::Marriage);
    assert_eq!(settings.max_distance_km, 10);
    assert_eq!(settings.marital_statuses, BTreeSet::from([MaritalStatus::Widowed]));
    assert!(settings.require_contact_handle);
  }

  #[test]
  fn unknown_level_is_rejected() {
    let argv = ["halal", "filters", "set", "--religious-level", "devout"];
    assert!(Cli::try_parse_from(argv).is_err());
  }

  // ─── Profile ────────────────────────────────────────────────────────────────

  #[test]
  fn new_profile_takes_an_id_from_the_viewer() {
    let viewer = Uuid::new_v4();
    let profile = profile_args(&[]).into_profile(None, viewer).unwrap();

    assert_eq!(profile.user_id, viewer);
    assert_eq!(profile.profile.id.as_str(), format!("user-{viewer}"));
    assert_eq!(profile.profile.intent, Intent::Both);
    assert_eq!(profile.profile.location, None);
    assert_eq!(profile.contact_handle(), None);
  }

  #[test]
  fn edited_profile_keeps_its_id() {
    let viewer = Uuid::new_v4();
    let mut existing = profile_args(&[]).into_profile(None, viewer).unwrap();
    existing.profile.id = ProfileId::new("legacy-id");

    let edited = profile_args(&["--bio", "Engineer", "--interest", "hiking"])
      .into_profile(Some(&existing), viewer)
      .unwrap();

    assert_eq!(edited.profile.id.as_str(), "legacy-id");
    assert_eq!(edited.profile.bio, "Engineer");
    assert_eq!(edited.profile.interests, vec!["hiking".to_owned()]);
  }

  #[test]
  fn location_needs_both_coordinates() {
    let only_lat = profile_args(&["--latitude", "55.75", "--city", "Moscow"])
      .into_profile(None, Uuid::nil())
      .unwrap();
    assert_eq!(only_lat.profile.location, None);

    let both = profile_args(&[
      "--latitude",
      "55.75",
      "--longitude",
      "37.61",
      "--city",
      "Moscow",
      "--contact-handle",
      "zaid_eng",
    ])
    .into_profile(None, Uuid::nil())
    .unwrap();
    let location = both.profile.location.as_ref().unwrap();

    assert_eq!(location.latitude, 55.75);
    assert_eq!(location.longitude, 37.61);
    assert_eq!(location.city.as_deref(), Some("Moscow"));
    assert_eq!(location.country, None);
    assert_eq!(both.contact_handle(), Some("zaid_eng"));
  }

  #[test]
  fn out_of_range_coordinates_are_rejected() {
    let result =
      profile_args(&["--latitude", "91", "--longitude", "0"]).into_profile(None, Uuid::nil());
    assert!(result.is_err());
  }
}
