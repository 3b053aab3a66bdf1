//! # Column-Vector Codec
//!
//! ## Purpose
//! Decodes and encodes the encoding used by the reference dataset: an ordered
//! population vector, an ordered rate vector and a stoichiometry matrix (rows =
//! species, columns = reactions, signed net delta), optionally paired with an
//! unsigned input-count matrix.
//!
//! Species are unnamed in this format. Identity is purely positional, so the
//! codec assigns synthetic names `S1`, `S2`, ... consistently across the three
//! vectors/matrices.
//!
//! ## Lossiness
//! The dataset's convention forbids a species being both consumed and produced
//! by the same reaction: shared inputs/outputs are cancelled upstream and only
//! the net stoichiometry survives. Reconstructing reactions from the signed
//! matrix alone therefore cannot recover the cancelled multiplicities. That is a
//! property of the upstream data and is preserved here; full fidelity is only
//! available through the separate input-count matrix.

use crate::matrices::{build_matrices, network_from_matrices};
use crate::network::{FormatError, ReactionNetwork};

/// The four text files of the column-vector layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnFiles {
    pub populations: String,
    pub rates: String,
    pub stoichiometry: String,
    pub input_counts: String,
}

/// Parses a whitespace/newline-separated population vector.
pub fn parse_populations(text: &str) -> Result<Vec<i64>, FormatError> {
    text.split_whitespace()
        .map(|tok| {
            tok.parse()
                .map_err(|_| FormatError::InvalidNumber(tok.to_string()))
        })
        .collect()
}

/// Parses a whitespace/newline-separated rate vector.
pub fn parse_rates(text: &str) -> Result<Vec<f64>, FormatError> {
    text.split_whitespace()
        .map(|tok| {
            tok.parse()
                .map_err(|_| FormatError::InvalidNumber(tok.to_string()))
        })
        .collect()
}

/// Parses a matrix: one comma-separated integer row per line. A trailing comma
/// is tolerated (the layout terminates each row with one). A blank interior
/// line is a species that participates in no reaction and materializes as an
/// all-zero row, so the rows below it keep their positional identity; blank
/// lines at the end of the file carry no row at all. Rows of unequal width are
/// an error.
pub fn parse_matrix(text: &str) -> Result<Vec<Vec<i64>>, FormatError> {
    let mut rows: Vec<Option<Vec<i64>>> = Vec::new();
    let mut width: Option<usize> = None;
    for line in text.lines() {
        if line.trim().is_empty() {
            rows.push(None);
            continue;
        }
        let row = line
            .split(',')
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .map(|cell| {
                cell.parse()
                    .map_err(|_| FormatError::InvalidNumber(cell.to_string()))
            })
            .collect::<Result<Vec<i64>, _>>()?;
        match width {
            Some(expected) if row.len() != expected => {
                return Err(FormatError::RaggedMatrix {
                    row: rows.len(),
                    found: row.len(),
                    expected,
                });
            }
            Some(_) => {}
            None => width = Some(row.len()),
        }
        rows.push(Some(row));
    }
    while rows.last().is_some_and(|row| row.is_none()) {
        rows.pop();
    }
    let width = width.unwrap_or(0);
    Ok(rows
        .into_iter()
        .map(|row| row.unwrap_or_else(|| vec![0; width]))
        .collect())
}

/// Decodes a positional network from the population vector, the rate vector and
/// the signed stoichiometry matrix, using the lossy net-delta reconstruction.
pub fn decode_network(
    populations: &[i64],
    rates: &[f64],
    stoichiometry: &[Vec<i64>],
) -> Result<ReactionNetwork, FormatError> {
    network_from_matrices(populations, rates, stoichiometry, None)
}

/// Full-fidelity decode: raw consumption counts come from the input-count
/// matrix and production counts follow from `stoichiometry + inputs`.
pub fn decode_network_with_inputs(
    populations: &[i64],
    rates: &[f64],
    stoichiometry: &[Vec<i64>],
    input_counts: &[Vec<i64>],
) -> Result<ReactionNetwork, FormatError> {
    network_from_matrices(populations, rates, stoichiometry, Some(input_counts))
}

/// Encodes a network into the four column files. Matrix rows are comma-joined
/// with a trailing comma and terminating newline; downstream parsers rely on
/// the fixed per-row token count.
pub fn encode_network(net: &ReactionNetwork) -> ColumnFiles {
    let matrices = build_matrices(net);

    let populations = net
        .populations()
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join("\n");
    let rates = net
        .reactions()
        .iter()
        .map(|r| r.rate.to_string())
        .collect::<Vec<_>>()
        .join("\n");

    let mut stoichiometry = String::new();
    let mut input_counts = String::new();
    for i in 0..net.species_count() {
        for j in 0..net.reaction_count() {
            stoichiometry.push_str(&matrices.stoichiometry[(i, j)].to_string());
            stoichiometry.push(',');
            input_counts.push_str(&matrices.input_counts[(i, j)].to_string());
            input_counts.push(',');
        }
        stoichiometry.push('\n');
        input_counts.push('\n');
    }

    ColumnFiles {
        populations,
        rates,
        stoichiometry,
        input_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::SymbolicCodec;

    #[test]
    fn test_parse_vectors() {
        assert_eq!(parse_populations("5\n0\n12\n").unwrap(), vec![5, 0, 12]);
        assert_eq!(parse_rates("0.5\n1.2\n").unwrap(), vec![0.5, 1.2]);
        assert_eq!(
            parse_populations("5 x").unwrap_err(),
            crate::network::FormatError::InvalidNumber("x".to_string())
        );
    }

    #[test]
    fn test_parse_matrix_trailing_comma_and_blank_rows() {
        let rows = parse_matrix("-1,0,\n\n1,-2,\n\n\n").unwrap();
        assert_eq!(rows, vec![vec![-1, 0], vec![0, 0], vec![1, -2]]);
    }

    // A blank interior line is a non-participating species; the rows below it
    // must not slide up and take over its index.
    #[test]
    fn test_interior_blank_row_keeps_positional_identity() {
        let rows = parse_matrix("-1,\n\n1,\n").unwrap();
        assert_eq!(rows, vec![vec![-1], vec![0], vec![1]]);

        let net = decode_network(&[5, 2, 0], &[0.5], &rows).unwrap();
        assert_eq!(net.species_names(), &["S1", "S2", "S3"]);
        let reaction = &net.reactions()[0];
        assert_eq!(reaction.inputs, vec![("S1".to_string(), 1)]);
        assert_eq!(reaction.outputs, vec![("S3".to_string(), 1)]);
    }

    #[test]
    fn test_parse_matrix_ragged() {
        let err = parse_matrix("-1,0,\n1,\n").unwrap_err();
        assert_eq!(
            err,
            crate::network::FormatError::RaggedMatrix {
                row: 1,
                found: 1,
                expected: 2
            }
        );
    }

    // Population vector [5, 0] with stoichiometry column [-2, 1] decodes to a
    // reaction consuming two S1 and producing one S2.
    #[test]
    fn test_positional_decode() {
        let net = decode_network(&[5, 0], &[1.0], &[vec![-2], vec![1]]).unwrap();
        assert_eq!(net.species_names(), &["S1".to_string(), "S2".to_string()]);
        assert_eq!(net.populations(), &[5, 0]);
        let r = &net.reactions()[0];
        assert_eq!(r.inputs, vec![("S1".to_string(), 2)]);
        assert_eq!(r.outputs, vec![("S2".to_string(), 1)]);
    }

    #[test]
    fn test_unit_entries_decode_to_multiplicity_one() {
        let net = decode_network(&[1, 1], &[0.5], &[vec![-1], vec![1]]).unwrap();
        let r = &net.reactions()[0];
        assert_eq!(r.inputs, vec![("S1".to_string(), 1)]);
        assert_eq!(r.outputs, vec![("S2".to_string(), 1)]);
    }

    #[test]
    fn test_decode_with_input_counts_recovers_cancellation() {
        // Net delta 0 for S1, but the raw reaction consumes and produces it.
        let net = decode_network_with_inputs(
            &[3, 0],
            &[2.0],
            &[vec![0], vec![1]],
            &[vec![1], vec![0]],
        )
        .unwrap();
        let r = &net.reactions()[0];
        assert_eq!(r.inputs, vec![("S1".to_string(), 1)]);
        assert_eq!(
            r.outputs,
            vec![("S1".to_string(), 1), ("S2".to_string(), 1)]
        );
    }

    #[test]
    fn test_encode_layout() {
        let codec = SymbolicCodec::new();
        let net = codec
            .decode("A = 10\nB = 0\n", "A -> B, 0.5\n")
            .unwrap();
        let files = encode_network(&net);
        assert_eq!(files.populations, "10\n0");
        assert_eq!(files.rates, "0.5");
        assert_eq!(files.stoichiometry, "-1,\n1,\n");
        assert_eq!(files.input_counts, "1,\n0,\n");
    }

    #[test]
    fn test_column_round_trip_without_cancellation() {
        let codec = SymbolicCodec::new();
        let net = codec
            .decode("A = 10\nB = 3\nC = 0\n", "2A + B -> 3C, 1.2\nC -> , 0.1\n")
            .unwrap();
        let files = encode_network(&net);
        let round = decode_network_with_inputs(
            &parse_populations(&files.populations).unwrap(),
            &parse_rates(&files.rates).unwrap(),
            &parse_matrix(&files.stoichiometry).unwrap(),
            &parse_matrix(&files.input_counts).unwrap(),
        )
        .unwrap();
        // Names become positional, so compare structure.
        assert_eq!(round.populations(), net.populations());
        assert_eq!(round.reaction_count(), net.reaction_count());
        let r = &round.reactions()[0];
        assert_eq!(
            r.inputs,
            vec![("S1".to_string(), 2), ("S2".to_string(), 1)]
        );
        assert_eq!(r.outputs, vec![("S3".to_string(), 3)]);
    }

    // The lossy inverse: a species consumed and produced by the same reaction
    // nets out and the split is not recoverable from the signed matrix alone.
    #[test]
    fn test_lossy_inverse_under_cancellation() {
        let codec = SymbolicCodec::new();
        let net = codec
            .decode("A = 5\nB = 0\n", "A + B -> 2A, 1.0\n")
            .unwrap();
        let files = encode_network(&net);
        let round = decode_network(
            &parse_populations(&files.populations).unwrap(),
            &parse_rates(&files.rates).unwrap(),
            &parse_matrix(&files.stoichiometry).unwrap(),
        )
        .unwrap();
        let r = &round.reactions()[0];
        // Net effect survives (A: +1, B: -1) but the raw split does not.
        assert_eq!(r.inputs, vec![("S2".to_string(), 1)]);
        assert_eq!(r.outputs, vec![("S1".to_string(), 1)]);
    }
}
