//! Runtime configuration for the `halal` binary.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use chrono::FixedOffset;
use halal_core::{
  geo::Coordinates,
  profile::{Tier, ViewerIdentity},
  quota::{QuotaPolicy, PREMIUM_DAILY_LIKES, STANDARD_DAILY_LIKES},
};
use serde::Deserialize;
use uuid::Uuid;

/// Deserialised from `halal.toml` and `HALAL_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CliConfig {
  pub store_path:            PathBuf,
  pub viewer_id:             Uuid,
  pub tier:                  Tier,
  pub latitude:              Option<f64>,
  pub longitude:             Option<f64>,
  pub location_timeout_secs: u64,
  pub liked_me_count:        usize,
  pub standard_daily_likes:  u32,
  pub premium_daily_likes:   u32,
  pub utc_offset_minutes:    i32,
}

impl Default for CliConfig {
  fn default() -> Self {
    Self {
      store_path:            PathBuf::from("~/.halal/state.db"),
      viewer_id:             Uuid::nil(),
      tier:                  Tier::Standard,
      latitude:              None,
      longitude:             None,
      location_timeout_secs: 5,
      liked_me_count:        3,
      standard_daily_likes:  STANDARD_DAILY_LIKES,
      premium_daily_likes:   PREMIUM_DAILY_LIKES,
      utc_offset_minutes:    0,
    }
  }
}

impl CliConfig {
  /// Layer the optional TOML file at `path` under `HALAL_*` variables.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("HALAL").try_parsing(true))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise CliConfig")
  }

  pub fn identity(&self) -> ViewerIdentity {
    ViewerIdentity { viewer_id: self.viewer_id, tier: self.tier }
  }

  pub fn quota_policy(&self) -> anyhow::Result<QuotaPolicy> {
    let utc_offset = FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60))
      .with_context(|| format!("utc_offset_minutes {} is out of range", self.utc_offset_minutes))?;
    Ok(QuotaPolicy {
      standard_daily_likes: self.standard_daily_likes,
      premium_daily_likes: self.premium_daily_likes,
      utc_offset,
    })
  }

  /// Configured device position; `None` unless both halves are set.
  pub fn coordinates(&self) -> anyhow::Result<Option<Coordinates>> {
    match (self.latitude, self.longitude) {
      (Some(lat), Some(lon)) => Ok(Some(
        Coordinates::new(lat, lon).context("invalid configured coordinates")?,
      )),
      _ => Ok(None),
    }
  }

  pub fn location_timeout(&self) -> Duration { Duration::from_secs(self.location_timeout_secs) }

  pub fn store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
