//! # Reaction Network Model
//!
//! ## Purpose
//! In-memory representation of a chemical reaction network: named species with
//! integer initial populations and an ordered list of reactions, each with an
//! input multiset, an output multiset and a rate constant.
//!
//! ## Main Data Structures
//! - `ReactionNetwork`: species in declaration order + reactions in file order.
//!   Declaration order defines the row index of a species in every matrix built
//!   from the network, and the column index of a reaction is its position in the
//!   reaction list. That ordering contract is what keeps the population vector,
//!   the rate vector and the stoichiometry/input-count matrices consistent.
//! - `Reaction`: input/output multisets stored as ordered `(name, count)` pairs
//!   with merged counts, plus the rate.
//! - `FormatError`: the error taxonomy shared by both codecs.
//!
//! A network is built once per conversion run from fully-read input and is not
//! mutated afterwards.

use prettytable::{Cell, Row, Table};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while decoding one of the textual network encodings.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormatError {
    #[error("cannot split line into the expected parts: {0:?}")]
    MalformedLine(String),
    #[error("expected a number, found {0:?}")]
    InvalidNumber(String),
    #[error("reaction references the undeclared species {0:?}")]
    UnknownSpecies(String),
    #[error("species {0:?} is declared more than once")]
    DuplicateSpecies(String),
    #[error("matrix row {row} has {found} columns, expected {expected}")]
    RaggedMatrix {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("expected {expected} {what}, found {found}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("inconsistent matrices at species row {row}, reaction column {column}: {detail}")]
    InconsistentMatrix {
        row: usize,
        column: usize,
        detail: &'static str,
    },
}

/// One reaction: consumed species, produced species, rate constant.
///
/// Multisets are kept as `(name, count)` pairs in first-seen order so that
/// re-encoding a parsed network reproduces the term order of the source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    pub inputs: Vec<(String, u64)>,
    pub outputs: Vec<(String, u64)>,
    pub rate: f64,
}

impl Reaction {
    pub fn new(rate: f64) -> Self {
        Self {
            inputs: Vec::new(),
            outputs: Vec::new(),
            rate,
        }
    }

    /// Adds one occurrence group of a species to the input multiset,
    /// merging with an existing entry for the same name.
    pub fn add_input(&mut self, name: &str, count: u64) {
        Self::bump(&mut self.inputs, name, count);
    }

    pub fn add_output(&mut self, name: &str, count: u64) {
        Self::bump(&mut self.outputs, name, count);
    }

    fn bump(side: &mut Vec<(String, u64)>, name: &str, count: u64) {
        if let Some(entry) = side.iter_mut().find(|(n, _)| n == name) {
            entry.1 += count;
        } else {
            side.push((name.to_string(), count));
        }
    }

    /// Net effect of this reaction on `name`: produced minus consumed.
    pub fn net_delta(&self, name: &str) -> i64 {
        let consumed: u64 = self
            .inputs
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, c)| *c)
            .sum();
        let produced: u64 = self
            .outputs
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, c)| *c)
            .sum();
        produced as i64 - consumed as i64
    }
}

/// An ordered species → initial population mapping plus an ordered reaction list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReactionNetwork {
    species: Vec<String>,
    populations: Vec<i64>,
    index: HashMap<String, usize>,
    reactions: Vec<Reaction>,
}

impl ReactionNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a species with its initial population. The species gets the next
    /// free index; duplicates are a data-integrity failure.
    pub fn add_species(&mut self, name: &str, population: i64) -> Result<usize, FormatError> {
        if self.index.contains_key(name) {
            return Err(FormatError::DuplicateSpecies(name.to_string()));
        }
        let idx = self.species.len();
        self.species.push(name.to_string());
        self.populations.push(population);
        self.index.insert(name.to_string(), idx);
        Ok(idx)
    }

    /// Overwrites the population of an already declared species, or declares it.
    /// Only used by the compatibility decoding mode that keeps the reference
    /// last-wins behavior for duplicate declarations.
    pub fn set_species(&mut self, name: &str, population: i64) -> usize {
        match self.index.get(name) {
            Some(&idx) => {
                self.populations[idx] = population;
                idx
            }
            None => {
                let idx = self.species.len();
                self.species.push(name.to_string());
                self.populations.push(population);
                self.index.insert(name.to_string(), idx);
                idx
            }
        }
    }

    /// Appends a reaction, checking that every participant is a declared species.
    pub fn add_reaction(&mut self, reaction: Reaction) -> Result<(), FormatError> {
        for (name, _) in reaction.inputs.iter().chain(reaction.outputs.iter()) {
            if !self.index.contains_key(name) {
                return Err(FormatError::UnknownSpecies(name.clone()));
            }
        }
        self.reactions.push(reaction);
        Ok(())
    }

    /// Stable index of a species, assigned by first-seen declaration order.
    pub fn species_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn species_names(&self) -> &[String] {
        &self.species
    }

    pub fn populations(&self) -> &[i64] {
        &self.populations
    }

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    pub fn species_count(&self) -> usize {
        self.species.len()
    }

    pub fn reaction_count(&self) -> usize {
        self.reactions.len()
    }

    /// Prints a species/population summary table to stdout.
    pub fn pretty_print(&self) {
        let mut table = Table::new();
        table.add_row(Row::new(vec![
            Cell::new("species"),
            Cell::new("initial population"),
        ]));
        for (name, pop) in self.species.iter().zip(self.populations.iter()) {
            table.add_row(Row::new(vec![
                Cell::new(name),
                Cell::new(&pop.to_string()),
            ]));
        }
        table.printstd();
        println!(
            "{} species, {} reactions",
            self.species_count(),
            self.reaction_count()
        );
    }
}
