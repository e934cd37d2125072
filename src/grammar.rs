//! The grammar engine: weighted, optionally context-sensitive axion rewriting.
//!
//! A [`Grammar`] maps symbols to [`ReplacementRule`]s. Every round rewrites each
//! element of the axion independently by drawing one alternative from its
//! rule; leftover probability mass keeps the element as it is.
//!
//! All randomness comes from the caller's generator, so growing the same seed
//! for the same number of generations always produces the same axion.

use crate::axion::Axion;
use crate::error::TreeError;
use rand::{Rng, RngCore};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Slack allowed above 1.0 when summing the weights of one rule.
pub const WEIGHT_TOLERANCE: f32 = 1e-4;

/// Signature of a replacement generator.
///
/// Receives the axion as it stood at the start of the round and the random
/// source of the current growth call.
pub type ReplacementFn = dyn Fn(&Axion, &mut dyn RngCore) -> String + Send + Sync;

/// One alternative of a [`ReplacementRule`].
#[derive(Clone)]
pub enum Replacement {
    /// A constant replacement string.
    Fixed(String),
    /// A replacement computed from the current axion.
    Generated {
        /// Every symbol the generator may emit. Used to validate tree
        /// definitions without running the generator.
        emits: String,
        generator: Arc<ReplacementFn>,
    },
}

impl Replacement {
    pub fn produce(&self, axion: &Axion, rng: &mut dyn RngCore) -> String {
        match self {
            Self::Fixed(text) => text.clone(),
            Self::Generated { generator, .. } => generator(axion, rng),
        }
    }

    /// Symbols this alternative can introduce into the axion.
    pub fn alphabet(&self) -> Vec<char> {
        match self {
            Self::Fixed(text) => Axion::new(text.as_str())
                .elements()
                .map(|e| e.symbol)
                .collect(),
            Self::Generated { emits, .. } => emits.chars().collect(),
        }
    }
}

impl fmt::Debug for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(text) => f.debug_tuple("Fixed").field(text).finish(),
            Self::Generated { emits, .. } => f
                .debug_struct("Generated")
                .field("emits", emits)
                .finish_non_exhaustive(),
        }
    }
}

/// Weighted alternatives for a single symbol.
#[derive(Clone, Debug, Default)]
pub struct ReplacementRule {
    alternatives: Vec<(f32, Replacement)>,
}

impl ReplacementRule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a constant alternative drawn with probability `weight`.
    pub fn with_fixed(mut self, weight: f32, replacement: impl Into<String>) -> Self {
        self.alternatives
            .push((weight, Replacement::Fixed(replacement.into())));
        self
    }

    /// Adds a generated alternative drawn with probability `weight`.
    ///
    /// `emits` lists every symbol the generator can return.
    pub fn with_generator<F>(mut self, weight: f32, emits: impl Into<String>, generator: F) -> Self
    where
        F: Fn(&Axion, &mut dyn RngCore) -> String + Send + Sync + 'static,
    {
        self.alternatives.push((
            weight,
            Replacement::Generated {
                emits: emits.into(),
                generator: Arc::new(generator),
            },
        ));
        self
    }

    pub fn alternatives(&self) -> &[(f32, Replacement)] {
        &self.alternatives
    }

    pub fn total_weight(&self) -> f32 {
        self.alternatives.iter().map(|(w, _)| w).sum()
    }

    /// Rejects negative or non-finite weights and totals above 1.0.
    pub fn validate(&self, symbol: char) -> Result<(), TreeError> {
        if let Some(&(weight, _)) = self
            .alternatives
            .iter()
            .find(|(w, _)| !w.is_finite() || *w < 0.0)
        {
            return Err(TreeError::InvalidWeight { symbol, weight });
        }
        let total = self.total_weight();
        if total > 1.0 + WEIGHT_TOLERANCE {
            return Err(TreeError::WeightOverflow { symbol, total });
        }
        Ok(())
    }

    /// Draws one alternative for an element of `axion`.
    ///
    /// Returns `None` when the draw lands past the total weight, meaning the
    /// element is kept unchanged this round.
    pub fn sample(&self, axion: &Axion, rng: &mut dyn RngCore) -> Option<String> {
        let draw: f32 = rng.random();
        let mut cumulative = 0.0;
        for (weight, replacement) in &self.alternatives {
            cumulative += weight;
            if draw < cumulative {
                return Some(replacement.produce(axion, rng));
            }
        }
        None
    }
}

/// A set of replacement rules keyed by symbol.
#[derive(Clone, Debug, Default)]
pub struct Grammar {
    rules: BTreeMap<char, ReplacementRule>,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_rule(mut self, symbol: char, rule: ReplacementRule) -> Self {
        self.insert(symbol, rule);
        self
    }

    /// Sets the rule for `symbol`, replacing any previous one.
    pub fn insert(&mut self, symbol: char, rule: ReplacementRule) {
        self.rules.insert(symbol, rule);
    }

    pub fn rule(&self, symbol: char) -> Option<&ReplacementRule> {
        self.rules.get(&symbol)
    }

    pub fn rules(&self) -> impl Iterator<Item = (char, &ReplacementRule)> {
        self.rules.iter().map(|(s, r)| (*s, r))
    }

    pub fn validate(&self) -> Result<(), TreeError> {
        self.rules
            .iter()
            .try_for_each(|(symbol, rule)| rule.validate(*symbol))
    }

    /// Performs one rewrite round.
    ///
    /// Elements are visited left to right; generators see `axion` as it was
    /// before the round started.
    pub fn rewrite(&self, axion: &Axion, rng: &mut dyn RngCore) -> Axion {
        let mut out = String::with_capacity(axion.as_str().len() * 2);
        for element in axion.elements() {
            let replaced = self
                .rules
                .get(&element.symbol)
                .and_then(|rule| rule.sample(axion, &mut *rng));
            match replaced {
                Some(text) => out.push_str(&text),
                None => out.push_str(element.text),
            }
        }
        Axion::from(out)
    }

    /// Rewrites `seed` for `generations` rounds.
    pub fn grow(&self, seed: &Axion, generations: u32, rng: &mut dyn RngCore) -> Axion {
        let mut axion = seed.clone();
        for generation in 1..=generations {
            axion = self.rewrite(&axion, rng);
            tracing::trace!(generation, axion = %axion, "rewrite round");
        }
        axion
    }

    /// Every symbol that can appear in an axion grown from `seed`.
    pub fn reachable_symbols(&self, seed: &Axion) -> BTreeSet<char> {
        let mut seen: BTreeSet<char> = seed.elements().map(|e| e.symbol).collect();
        let mut pending: Vec<char> = seen.iter().copied().collect();

        while let Some(symbol) = pending.pop() {
            let Some(rule) = self.rules.get(&symbol) else {
                continue;
            };
            for (_, replacement) in rule.alternatives() {
                for produced in replacement.alphabet() {
                    if seen.insert(produced) {
                        pending.push(produced);
                    }
                }
            }
        }

        seen
    }
}
