//! Mode resolution: configuration token to immutable fallback policy.
//!
//! `resolve_mode` is the only place tier ordering is decided. Startup
//! bootstrap and runtime fallback both consume the `FallbackPolicy` it
//! returns, so the two paths can never disagree about ordering.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::GenerationError;
use crate::tier::Tier;

/// A recognized configuration mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Remote, then local, then edge.
    RemoteFirst,
    /// Local, then remote, then edge.
    LocalFirst,
    /// Edge, then local, then remote.
    EdgeFirst,
    /// Remote only, no fallback.
    RemoteOnly,
    /// Local only, no fallback.
    LocalOnly,
    /// Edge only, no fallback.
    EdgeOnly,
}

impl Mode {
    /// Every recognized mode.
    pub const ALL: [Mode; 6] = [
        Mode::RemoteFirst,
        Mode::LocalFirst,
        Mode::EdgeFirst,
        Mode::RemoteOnly,
        Mode::LocalOnly,
        Mode::EdgeOnly,
    ];

    /// The configuration token for this mode.
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Mode::RemoteFirst => "remote_first",
            Mode::LocalFirst => "local_first",
            Mode::EdgeFirst => "edge_first",
            Mode::RemoteOnly => "remote_only",
            Mode::LocalOnly => "local_only",
            Mode::EdgeOnly => "edge_only",
        }
    }

    /// Builds the policy this mode stands for.
    #[must_use]
    pub fn policy(self) -> FallbackPolicy {
        let (chain, allow_fallback) = match self {
            Mode::RemoteFirst => (vec![Tier::Remote, Tier::Local, Tier::Edge], true),
            Mode::LocalFirst => (vec![Tier::Local, Tier::Remote, Tier::Edge], true),
            Mode::EdgeFirst => (vec![Tier::Edge, Tier::Local, Tier::Remote], true),
            Mode::RemoteOnly => (vec![Tier::Remote], false),
            Mode::LocalOnly => (vec![Tier::Local], false),
            Mode::EdgeOnly => (vec![Tier::Edge], false),
        };
        FallbackPolicy {
            mode: self,
            chain,
            allow_fallback,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Mode {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_lowercase();
        Mode::ALL
            .into_iter()
            .find(|mode| mode.token() == token)
            .ok_or_else(|| {
                GenerationError::Configuration(format!("unrecognized mode token '{}'", s.trim()))
            })
    }
}

/// Ordered tier chain plus whether runtime fallback is permitted.
///
/// Fields are private: the only way to obtain a policy is through a `Mode`,
/// which upholds `chain[0] == primary`, distinct tiers, and
/// `!allow_fallback => chain.len() == 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FallbackPolicy {
    mode: Mode,
    chain: Vec<Tier>,
    allow_fallback: bool,
}

impl FallbackPolicy {
    /// The mode this policy was resolved from.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The first tier of the chain.
    #[must_use]
    pub fn primary(&self) -> Tier {
        self.chain[0]
    }

    /// The full ordered chain.
    #[must_use]
    pub fn chain(&self) -> &[Tier] {
        &self.chain
    }

    /// Whether tiers after the primary may be attempted.
    #[must_use]
    pub fn allow_fallback(&self) -> bool {
        self.allow_fallback
    }

    /// The tiers a walk over this policy may visit, in order.
    #[must_use]
    pub fn candidates(&self) -> &[Tier] {
        if self.allow_fallback {
            &self.chain
        } else {
            &self.chain[..1]
        }
    }
}

/// Resolves a configuration token into a `FallbackPolicy`.
///
/// # Errors
///
/// Returns `GenerationError::Configuration` if the token is not recognized.
pub fn resolve_mode(token: &str) -> Result<FallbackPolicy, GenerationError> {
    token.parse::<Mode>().map(Mode::policy)
}
