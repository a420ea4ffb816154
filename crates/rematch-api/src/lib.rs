//! Client library for the Rematch Tracker stats API.
//!
//! The API authenticates every call with an undocumented per-session HMAC
//! scheme whose signing key only exists inside the tracker web app. This
//! crate captures that key by instrumenting a headless browser on the
//! tracker origin, caches it on disk, signs requests with it, and re-captures
//! transparently when the server rejects a signature. On top of the signed
//! client sits a multi-platform resolution cascade that turns a free-text
//! username into a player profile via Steam, PlayStation and Xbox lookups.

pub mod client;
pub mod config;
pub mod default;
pub mod error;
pub mod models;
pub mod profile;
pub mod rank;
pub mod resolver;
pub mod secret;
pub mod signing;
pub mod steam;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use default::{default_client, default_resolver};
pub use error::{ClientError, Result};
pub use profile::{LifetimeStats, PlayerProfile};
pub use rank::RankSummary;
pub use resolver::{CandidateSearch, Platform, ProfileApi, Resolver};
pub use secret::{ChromiumSniffer, SecretCache, SecretManager, SecretSource, SigningSecret};
pub use steam::{SteamCandidate, SteamSearch};
