//! # Reference Dataset
//!
//! ## Purpose
//! The concrete artifact descriptors for the reference data sources and the two
//! orchestrated preparations built on top of [`crate::retrieval`]:
//!
//! - `prepare_reference_models`: the Thanh et al. (2017) model archive plus the
//!   two Ghosh et al. (2021) BlSSSA networks, fetched, converted to the
//!   symbolic encoding and hash-verified.
//! - `export_column_layout`: the reverse direction, writing a symbolic network
//!   out as the column-vector benchmark layout with the separate unsigned
//!   input-count matrix.
//!
//! While an effort has been made to make sure the retrieved data is correct, we
//! do not own it and do not guarantee its correctness.
//!
//! All URLs and expected digests live in a `DatasetManifest` that serializes to
//! JSON, so tests and alternative mirrors can substitute their own descriptors
//! without touching the code.

use crate::network::FormatError;
use crate::retrieval::{
    ArchiveSpec, HttpClient, RemoteNetworkSpec, RetrievalError, fetch_archive,
    fetch_converted_network,
};
use crate::columns;
use crate::symbolic::SymbolicCodec;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const MODELS_URL: &str =
    "https://www.cosbi.eu/wp-content/uploads/2021/11/Collection-of-models-RSSA.zip";
const MODELS_SHA512: &str = "ad28c617d99bc49e80ddcd044d7e850853cd3ee573ce46c4227ca4f196d228b17f042d3f5ab143f13270829cba0abcabe998e36b74769e9e1344b176b31bbd12";
const REPO_URL: &str =
    "https://raw.githubusercontent.com/debraj86/Algorithms/226275e08e8931fe0236b9832d280b51cdbc9daa";

const BCR_POP_SHA512: &str = "c73839895db40368e3d013679ad2a11858647e4406089f48fba533a794d658b847bf842209e94a12f9699205aa21bf96e84084af7f187ac0c67c7fed07842900";
const BCR_RXN_SHA512: &str = "880d1f935fe968745cc04c0221fee7584dd2ff6d7da450c41006aa998a0b81e2b7fc590e2ae57e4d4e55d7dee3a3c9b61f92617e9222cb3938b221d93880dac2";
const FCERI_POP_SHA512: &str = "b077c8d9cd568705709506a60759a71cf44265bf1587e923976eb7c80acf4c7355ee58a8613c986a1bc21d54a7e7a832eb4a598bc2b431f30cbe708da64018b8";
const FCERI_RXN_SHA512: &str = "a2dfaf35e5107aca67d59bf66957a998b211bbd415b54a1dcecc92da55db5486d387da5a9b2439943a4cc7a6877b25f40a37c1faaff503d8136d61f2509392a0";

const POP_NAME: &str = "conc.txt";
const RATE_NAME: &str = "k.txt";
const STOICHIOMETRY_NAME: &str = "xyz.txt";
const INPUT_COUNT_NAME: &str = "reaction_inputs.txt";

/// The full set of artifact descriptors for one data root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetManifest {
    pub archive: ArchiveSpec,
    pub networks: Vec<RemoteNetworkSpec>,
}

impl DatasetManifest {
    /// The built-in reference descriptors, rooted at `data_root`.
    pub fn reference(data_root: &Path) -> Self {
        let models_dir = data_root.join("models");
        let bcr_dir = models_dir.join("B cell antigen receptor signaling");
        let fceri_dir = models_dir.join("FceRI");
        Self {
            archive: ArchiveSpec {
                url: MODELS_URL.to_string(),
                sha512: MODELS_SHA512.to_string(),
                cache_path: data_root.join("models.zip"),
                extract_root: data_root.to_path_buf(),
                required_paths: vec![bcr_dir.clone(), fceri_dir.clone()],
            },
            networks: vec![
                RemoteNetworkSpec {
                    base_url: REPO_URL.to_string(),
                    network_dir: "B cell receptor signaling network".to_string(),
                    population_file: POP_NAME.to_string(),
                    rate_file: RATE_NAME.to_string(),
                    stoichiometry_file: STOICHIOMETRY_NAME.to_string(),
                    initial_state_path: bcr_dir.join("BCR_pop_high.txt"),
                    reactions_path: bcr_dir.join("BCR_rxn_blsssa.txt"),
                    initial_state_sha512: BCR_POP_SHA512.to_string(),
                    reactions_sha512: BCR_RXN_SHA512.to_string(),
                },
                RemoteNetworkSpec {
                    base_url: REPO_URL.to_string(),
                    network_dir: "Fceri signaling network".to_string(),
                    population_file: POP_NAME.to_string(),
                    rate_file: RATE_NAME.to_string(),
                    stoichiometry_file: STOICHIOMETRY_NAME.to_string(),
                    initial_state_path: fceri_dir.join("Phosphorylation-Syk_pop_high.txt"),
                    reactions_path: fceri_dir.join("Phosphorylation-Syk_rxn_blsssa.txt"),
                    initial_state_sha512: FCERI_POP_SHA512.to_string(),
                    reactions_sha512: FCERI_RXN_SHA512.to_string(),
                },
            ],
        }
    }

    /// Loads a manifest from a JSON file if it exists, falling back to the
    /// built-in reference descriptors.
    pub fn load_or_reference(manifest_path: &Path, data_root: &Path) -> Self {
        if manifest_path.exists() {
            match fs::read_to_string(manifest_path)
                .map_err(|e| e.to_string())
                .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()))
            {
                Ok(manifest) => return manifest,
                Err(err) => {
                    log::warn!(
                        "ignoring unreadable manifest {}: {err}",
                        manifest_path.display()
                    );
                }
            }
        }
        Self::reference(data_root)
    }

    pub fn save(&self, manifest_path: &Path) -> Result<(), RetrievalError> {
        let content = serde_json::to_string_pretty(self).map_err(|e| RetrievalError::Io {
            path: manifest_path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;
        fs::write(manifest_path, content).map_err(|source| RetrievalError::Io {
            path: manifest_path.to_path_buf(),
            source,
        })
    }
}

/// Fetches the model archive and both converted networks. Idempotent: verified
/// local artifacts cause the corresponding steps to be skipped.
pub fn prepare_reference_models<C: HttpClient>(
    client: &C,
    manifest: &DatasetManifest,
) -> Result<(), RetrievalError> {
    fetch_archive(client, &manifest.archive)?;
    for network in &manifest.networks {
        fetch_converted_network(client, network)?;
    }
    info!("reference models are ready");
    Ok(())
}

/// Reads a symbolic network and writes it as the column-vector benchmark layout
/// (`conc.txt`, `k.txt`, `xyz.txt`, `reaction_inputs.txt`). The input-count
/// matrix keeps full fidelity where the signed stoichiometry alone cannot.
pub fn export_column_layout(
    initial_state_path: &Path,
    reactions_path: &Path,
    out_dir: &Path,
) -> Result<(), RetrievalError> {
    let initial_state = read_text(initial_state_path)?;
    let reactions = read_text(reactions_path)?;
    // Legacy model files rely on last-wins duplicate declarations.
    let codec = SymbolicCodec {
        allow_duplicate_species: true,
    };
    let net = codec
        .decode(&initial_state, &reactions)
        .map_err(RetrievalError::Format)?;
    let files = columns::encode_network(&net);

    fs::create_dir_all(out_dir).map_err(|source| RetrievalError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;
    write_text(&out_dir.join(POP_NAME), &files.populations)?;
    write_text(&out_dir.join(RATE_NAME), &files.rates)?;
    write_text(&out_dir.join(STOICHIOMETRY_NAME), &files.stoichiometry)?;
    write_text(&out_dir.join(INPUT_COUNT_NAME), &files.input_counts)?;
    info!(
        "exported {} species x {} reactions to {}",
        net.species_count(),
        net.reaction_count(),
        out_dir.display()
    );
    Ok(())
}

/// Loads a symbolic network from its two files, for inspection.
pub fn load_symbolic_network(
    initial_state_path: &Path,
    reactions_path: &Path,
) -> Result<crate::network::ReactionNetwork, RetrievalError> {
    let initial_state = read_text(initial_state_path)?;
    let reactions = read_text(reactions_path)?;
    SymbolicCodec::new()
        .decode(&initial_state, &reactions)
        .map_err(RetrievalError::Format)
}

fn read_text(path: &Path) -> Result<String, RetrievalError> {
    fs::read_to_string(path).map_err(|source| RetrievalError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_text(path: &Path, content: &str) -> Result<(), RetrievalError> {
    fs::write(path, content).map_err(|source| RetrievalError::Io {
        path: path.to_path_buf(),
        source,
    })
}
