//! # Matrix Builder
//!
//! Derives the dense numeric form of a reaction network and reconstructs
//! networks from it. For `S` species and `R` reactions both matrices are `S×R`:
//! rows follow species declaration order, columns follow reaction order.
//!
//! - `stoichiometry[i][j]` is the signed net delta of species `i` under
//!   reaction `j` (`output_count − input_count`).
//! - `input_counts[i][j]` is the raw number of molecules of species `i`
//!   consumed by reaction `j`. The simulator needs raw consumption for
//!   propensity calculation, which the signed matrix cannot recover when a
//!   species sits on both sides of a reaction.

use crate::network::{FormatError, Reaction, ReactionNetwork};
use nalgebra::DMatrix;

/// The dense matrix form of a network: signed net deltas plus raw input counts.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkMatrices {
    pub stoichiometry: DMatrix<i64>,
    pub input_counts: DMatrix<u64>,
}

/// Builds both `S×R` matrices from a network. O(S·R) allocation plus one pass
/// over the reaction multisets. Every participant is a declared species; the
/// network enforced that on construction.
pub fn build_matrices(net: &ReactionNetwork) -> NetworkMatrices {
    let s = net.species_count();
    let r = net.reaction_count();
    let mut stoichiometry = DMatrix::<i64>::zeros(s, r);
    let mut input_counts = DMatrix::<u64>::zeros(s, r);

    for (j, reaction) in net.reactions().iter().enumerate() {
        for (name, count) in &reaction.inputs {
            let i = net.species_index(name).unwrap_or_else(|| {
                unreachable!("network invariant: input species {name:?} is declared")
            });
            stoichiometry[(i, j)] -= *count as i64;
            input_counts[(i, j)] += count;
        }
        for (name, count) in &reaction.outputs {
            let i = net.species_index(name).unwrap_or_else(|| {
                unreachable!("network invariant: output species {name:?} is declared")
            });
            stoichiometry[(i, j)] += *count as i64;
        }
    }

    NetworkMatrices {
        stoichiometry,
        input_counts,
    }
}

/// Reconstructs a network from its positional matrix form, assigning synthetic
/// species names `S<row+1>`.
///
/// Without `input_counts` the reconstruction applies the net-delta rule: a
/// negative entry is an input with multiplicity `-v`, a positive entry an
/// output with multiplicity `v`, zero means the species does not participate.
/// This is lossy when the source data cancelled a species appearing on both
/// sides. With `input_counts` the raw consumption is taken from that matrix and
/// production follows from `stoichiometry + input`, which is exact.
pub fn network_from_matrices(
    populations: &[i64],
    rates: &[f64],
    stoichiometry: &[Vec<i64>],
    input_counts: Option<&[Vec<i64>]>,
) -> Result<ReactionNetwork, FormatError> {
    let species = populations.len();
    if stoichiometry.len() != species {
        return Err(FormatError::LengthMismatch {
            what: "matrix rows",
            expected: species,
            found: stoichiometry.len(),
        });
    }
    let reactions = rates.len();
    for (row, cols) in stoichiometry.iter().enumerate() {
        if cols.len() != reactions {
            return Err(FormatError::RaggedMatrix {
                row,
                found: cols.len(),
                expected: reactions,
            });
        }
    }
    if let Some(inputs) = input_counts {
        if inputs.len() != species {
            return Err(FormatError::LengthMismatch {
                what: "input-count rows",
                expected: species,
                found: inputs.len(),
            });
        }
        for (row, cols) in inputs.iter().enumerate() {
            if cols.len() != reactions {
                return Err(FormatError::RaggedMatrix {
                    row,
                    found: cols.len(),
                    expected: reactions,
                });
            }
        }
    }

    let mut net = ReactionNetwork::new();
    for (idx, population) in populations.iter().enumerate() {
        net.add_species(&format!("S{}", idx + 1), *population)?;
    }

    for (j, rate) in rates.iter().enumerate() {
        let mut reaction = Reaction::new(*rate);
        for i in 0..species {
            let name = format!("S{}", i + 1);
            match input_counts {
                Some(inputs) => {
                    let consumed = inputs[i][j];
                    if consumed < 0 {
                        return Err(FormatError::InconsistentMatrix {
                            row: i,
                            column: j,
                            detail: "input count is negative",
                        });
                    }
                    let produced = stoichiometry[i][j] + consumed;
                    if produced < 0 {
                        return Err(FormatError::InconsistentMatrix {
                            row: i,
                            column: j,
                            detail: "production count would be negative",
                        });
                    }
                    if consumed > 0 {
                        reaction.add_input(&name, consumed as u64);
                    }
                    if produced > 0 {
                        reaction.add_output(&name, produced as u64);
                    }
                }
                None => {
                    let v = stoichiometry[i][j];
                    if v < 0 {
                        reaction.add_input(&name, (-v) as u64);
                    } else if v > 0 {
                        reaction.add_output(&name, v as u64);
                    }
                }
            }
        }
        net.add_reaction(reaction)?;
    }
    Ok(net)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::SymbolicCodec;

    // `A -> B, 0.5` with rows (A, B): stoichiometry column [-1, 1], input
    // counts [1, 0].
    #[test]
    fn test_first_order_conversion() {
        let codec = SymbolicCodec::new();
        let net = codec.decode("A = 10\nB = 0\n", "A -> B, 0.5\n").unwrap();
        let m = build_matrices(&net);
        assert_eq!(m.stoichiometry, DMatrix::from_column_slice(2, 1, &[-1, 1]));
        assert_eq!(m.input_counts, DMatrix::from_column_slice(2, 1, &[1, 0]));
    }

    // `2A + B -> 3C, 1.2`: deltas A −2, B −1, C +3; inputs A 2, B 1, C 0.
    #[test]
    fn test_higher_order_conversion() {
        let codec = SymbolicCodec::new();
        let net = codec
            .decode("A = 10\nB = 5\nC = 0\n", "2A + B -> 3C, 1.2\n")
            .unwrap();
        let m = build_matrices(&net);
        assert_eq!(
            m.stoichiometry,
            DMatrix::from_column_slice(3, 1, &[-2, -1, 3])
        );
        assert_eq!(m.input_counts, DMatrix::from_column_slice(3, 1, &[2, 1, 0]));
    }

    // stoichiometry == outputs − inputs and input_counts == raw inputs, for
    // every (species, reaction) pair including non-participants, and also when
    // a species sits on both sides of the same reaction.
    #[test]
    fn test_builder_invariant() {
        let codec = SymbolicCodec::new();
        let net = codec
            .decode(
                "A = 10\nB = 5\nC = 0\n",
                "A + B -> 2A, 1.0\n2C -> C + B, 0.3\n -> A, 2.0\n",
            )
            .unwrap();
        let m = build_matrices(&net);
        for (j, reaction) in net.reactions().iter().enumerate() {
            for (i, name) in net.species_names().iter().enumerate() {
                let consumed: u64 = reaction
                    .inputs
                    .iter()
                    .filter(|(n, _)| n == name)
                    .map(|(_, c)| *c)
                    .sum();
                assert_eq!(m.stoichiometry[(i, j)], reaction.net_delta(name));
                assert_eq!(m.input_counts[(i, j)], consumed);
            }
        }
        // Spot-check the both-sides column: A consumed once, net +1.
        assert_eq!(m.stoichiometry[(0, 0)], 1);
        assert_eq!(m.input_counts[(0, 0)], 1);
    }

    #[test]
    fn test_reconstruction_dimension_checks() {
        let err = network_from_matrices(&[1, 2], &[0.5], &[vec![-1]], None).unwrap_err();
        assert_eq!(
            err,
            FormatError::LengthMismatch {
                what: "matrix rows",
                expected: 2,
                found: 1
            }
        );

        let err =
            network_from_matrices(&[1, 2], &[0.5], &[vec![-1], vec![1, 1]], None).unwrap_err();
        assert_eq!(
            err,
            FormatError::RaggedMatrix {
                row: 1,
                found: 2,
                expected: 1
            }
        );
    }

    #[test]
    fn test_exact_reconstruction_with_input_counts() {
        let codec = SymbolicCodec::new();
        let net = codec
            .decode("A = 10\nB = 5\n", "A + B -> 2A, 1.0\n")
            .unwrap();
        let m = build_matrices(&net);
        let stoich_rows: Vec<Vec<i64>> = (0..2).map(|i| vec![m.stoichiometry[(i, 0)]]).collect();
        let input_rows: Vec<Vec<i64>> =
            (0..2).map(|i| vec![m.input_counts[(i, 0)] as i64]).collect();
        let round = network_from_matrices(
            net.populations(),
            &[1.0],
            &stoich_rows,
            Some(&input_rows),
        )
        .unwrap();
        let r = &round.reactions()[0];
        assert_eq!(
            r.inputs,
            vec![("S1".to_string(), 1), ("S2".to_string(), 1)]
        );
        assert_eq!(r.outputs, vec![("S1".to_string(), 2)]);
    }

    // The input-count matrix is unsigned by construction; a negative entry, or
    // a column whose stoichiometry drops below what the inputs can account
    // for, is corrupt data and must not be silently dropped.
    #[test]
    fn test_negative_input_count_rejected() {
        let inputs = vec![vec![-1]];
        let err = network_from_matrices(&[1], &[1.0], &[vec![1]], Some(&inputs)).unwrap_err();
        assert_eq!(
            err,
            FormatError::InconsistentMatrix {
                row: 0,
                column: 0,
                detail: "input count is negative"
            }
        );
    }

    #[test]
    fn test_negative_production_count_rejected() {
        let inputs = vec![vec![1]];
        let err = network_from_matrices(&[5], &[1.0], &[vec![-2]], Some(&inputs)).unwrap_err();
        assert_eq!(
            err,
            FormatError::InconsistentMatrix {
                row: 0,
                column: 0,
                detail: "production count would be negative"
            }
        );
    }
}
