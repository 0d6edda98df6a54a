use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::cache::key::ViewKind;

/// TTL used when a read-through miss populates a view the policy does not
/// cover.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Comma-separated view specs, `name:ttl_secs:refresh_secs` each.
/// Example: `all-products:60:300,products:60:0`.
const ENV_CACHE_VIEWS: &str = "VITRINE_CACHE_VIEWS";
/// Optional bound on the number of live cache entries.
const ENV_CACHE_CAPACITY: &str = "VITRINE_CACHE_CAPACITY";

/// Pre-warm and TTL settings for one cacheable view.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewPolicy {
    pub view: ViewKind,
    pub ttl_secs: u64,
    /// 0 = warm once at startup, no periodic refresh.
    #[serde(default)]
    pub refresh_secs: u64,
}

impl ViewPolicy {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        if self.refresh_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.refresh_secs))
        }
    }
}

/// Which views are pre-warmed and how long their entries live.
///
/// Loaded once at startup and treated as immutable for the process lifetime.
#[derive(Debug, Clone, Deserialize)]
pub struct CachePolicy {
    pub views: Vec<ViewPolicy>,
    /// Cache entry bound; `None` means unbounded.
    #[serde(default)]
    pub capacity: Option<usize>,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            views: vec![ViewPolicy {
                view: ViewKind::AllProducts,
                ttl_secs: DEFAULT_TTL.as_secs(),
                refresh_secs: 0,
            }],
            capacity: None,
        }
    }
}

impl CachePolicy {
    pub fn from_env() -> Result<Self> {
        let views = match env::var(ENV_CACHE_VIEWS) {
            Ok(spec) => parse_views(&spec)
                .with_context(|| format!("failed to parse {ENV_CACHE_VIEWS}"))?,
            Err(_) => return Ok(Self::default()),
        };

        let capacity = match env::var(ENV_CACHE_CAPACITY) {
            Ok(raw) => Some(
                raw.parse::<usize>()
                    .with_context(|| format!("failed to parse {ENV_CACHE_CAPACITY}"))?,
            ),
            Err(_) => None,
        };

        Ok(Self { views, capacity })
    }

    pub fn view(&self, kind: ViewKind) -> Option<&ViewPolicy> {
        self.views.iter().find(|v| v.view == kind)
    }

    /// TTL for a view, falling back to [`DEFAULT_TTL`] for uncovered views.
    pub fn ttl_for(&self, kind: ViewKind) -> Duration {
        self.view(kind).map(ViewPolicy::ttl).unwrap_or(DEFAULT_TTL)
    }
}

fn parse_views(spec: &str) -> Result<Vec<ViewPolicy>> {
    let mut views: Vec<ViewPolicy> = Vec::new();
    for item in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let mut parts = item.split(':');
        let name = parts.next().unwrap_or_default();
        let view: ViewKind = name
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
            .with_context(|| format!("in view spec '{item}'"))?;
        let ttl_secs: u64 = parts
            .next()
            .with_context(|| format!("missing ttl in view spec '{item}'"))?
            .parse()
            .with_context(|| format!("bad ttl in view spec '{item}'"))?;
        let refresh_secs: u64 = match parts.next() {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("bad refresh interval in view spec '{item}'"))?,
            None => 0,
        };
        if parts.next().is_some() {
            bail!("trailing fields in view spec '{item}'");
        }
        if views.iter().any(|v| v.view == view) {
            bail!("view '{view}' listed more than once");
        }
        views.push(ViewPolicy {
            view,
            ttl_secs,
            refresh_secs,
        });
    }
    if views.is_empty() {
        bail!("no views configured");
    }
    Ok(views)
}
