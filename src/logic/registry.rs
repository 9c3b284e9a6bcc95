//! Registry of tournament types: type tag -> constructor.

use crate::models::{LimitedRound, PlayerId, Tournament, TournamentError, TournamentOptions};
use rand::RngCore;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Builds a tournament of one type from a name, roster and options.
pub type Constructor = fn(
    String,
    Vec<PlayerId>,
    TournamentOptions,
    &mut dyn RngCore,
) -> Result<Tournament, TournamentError>;

/// Maps type tags to constructors. Entries are added explicitly, never discovered.
#[derive(Clone, Default)]
pub struct TournamentRegistry {
    constructors: BTreeMap<&'static str, Constructor>,
}

impl std::fmt::Debug for TournamentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.constructors.keys()).finish()
    }
}

impl TournamentRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in tournament type.
    pub fn with_builtin_types() -> Self {
        let mut registry = Self::new();
        registry.register(LimitedRound::TYPE_TAG, |name, players, options, rng| {
            LimitedRound::with_rng(name, players, options, rng).map(Tournament::from)
        });
        registry
    }

    /// Register `constructor` under `tag`, replacing any previous entry.
    pub fn register(&mut self, tag: &'static str, constructor: Constructor) {
        self.constructors.insert(tag, constructor);
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.constructors.contains_key(tag)
    }

    /// Registered tags, sorted.
    pub fn types(&self) -> Vec<&'static str> {
        self.constructors.keys().copied().collect()
    }

    /// Construct a tournament of type `tag`.
    pub fn create(
        &self,
        tag: &str,
        name: impl Into<String>,
        players: Vec<PlayerId>,
        options: TournamentOptions,
    ) -> Result<Tournament, TournamentError> {
        self.create_with_rng(tag, name, players, options, &mut rand::thread_rng())
    }

    pub fn create_with_rng(
        &self,
        tag: &str,
        name: impl Into<String>,
        players: Vec<PlayerId>,
        options: TournamentOptions,
        rng: &mut dyn RngCore,
    ) -> Result<Tournament, TournamentError> {
        let constructor = self
            .constructors
            .get(tag)
            .ok_or_else(|| TournamentError::UnknownTournamentType(tag.to_owned()))?;
        let tournament = constructor(name.into(), players, options, rng)?;
        log::info!(
            "Created {} tournament {} with {} players and {} heats",
            tag,
            tournament.name(),
            tournament.players().len(),
            tournament.total_heats()
        );
        Ok(tournament)
    }
}

/// Process-wide registry, built on first use.
pub fn tournament_types() -> &'static TournamentRegistry {
    static REGISTRY: OnceLock<TournamentRegistry> = OnceLock::new();
    REGISTRY.get_or_init(TournamentRegistry::with_builtin_types)
}

/// Construct a tournament of type `tag` from the process-wide registry.
pub fn create(
    tag: &str,
    name: impl Into<String>,
    players: Vec<PlayerId>,
    options: TournamentOptions,
) -> Result<Tournament, TournamentError> {
    tournament_types().create(tag, name, players, options)
}
