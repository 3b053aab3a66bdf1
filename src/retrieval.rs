//! # Integrity-Verified Retrieval
//!
//! ## Purpose
//! Fetches the externally hosted reference data and never trusts a local copy
//! until its SHA-512 content hash matches the expected digest. Two artifact
//! kinds are handled:
//!
//! - a zip archive, verified before extraction into a target directory;
//! - remote column-vector model files, fetched, converted to the symbolic
//!   encoding and hash-checked *after* conversion, so the gate catches both
//!   transport corruption and conversion regressions.
//!
//! ## State machine
//! Each artifact is `Absent`, `CachedUnverified`, `CachedVerified` or `Corrupt`.
//! A verified cache short-circuits all network access; that check doubles as
//! the skip gate for already-performed conversions, so it is mandatory rather
//! than an optimization. A corrupt cache entry is deleted as part of raising
//! `IntegrityError`, which makes plain re-invocation the only recovery step an
//! operator ever needs.
//!
//! ## Main Data Structures
//! - `HttpClient`: transport trait with an impl for `reqwest::blocking::Client`,
//!   injectable so tests run without network access.
//! - `ArchiveSpec` / `RemoteNetworkSpec`: explicit artifact descriptors (URL,
//!   expected hash, cache path, target paths) passed into the operations
//!   instead of global configuration.
//!
//! None of the four error kinds is retried automatically; every operation is
//! idempotent under re-invocation.

use crate::network::FormatError;
use crate::{columns, symbolic};
use log::{info, warn};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// The dataset host rejects requests with a default library user agent.
const USER_AGENT: &str = "Mozilla/5.0";

/// Hash mismatch on a cached or converted artifact. Deliberately does not carry
/// the digest values; the artifact path and the failed condition are what an
/// operator needs to decide between retrying and replacing the data source.
#[derive(Debug, Error)]
#[error("integrity check failed for {}: {condition}", artifact.display())]
pub struct IntegrityError {
    pub artifact: PathBuf,
    pub condition: &'static str,
}

/// Archive extraction failure. Not retried automatically.
#[derive(Debug, Error)]
#[error("failed to extract {}", archive.display())]
pub struct ExtractionError {
    pub archive: PathBuf,
    #[source]
    pub source: zip::result::ZipError,
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("network error while fetching {url}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to build the HTTP client")]
    Client(#[source] reqwest::Error),
    #[error("response from {url} is not valid UTF-8 text")]
    Decode { url: String },
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("malformed remote model data: {0}")]
    Format(#[from] FormatError),
    #[error(transparent)]
    Url(#[from] url::ParseError),
    #[error("i/o failure on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> RetrievalError + '_ {
    move |source| RetrievalError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// HTTP transport trait for dependency injection.
pub trait HttpClient {
    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, RetrievalError>;

    fn get_text(&self, url: &str) -> Result<String, RetrievalError> {
        String::from_utf8(self.get_bytes(url)?).map_err(|_| RetrievalError::Decode {
            url: url.to_string(),
        })
    }
}

impl HttpClient for Client {
    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, RetrievalError> {
        let net = |source| RetrievalError::Network {
            url: url.to_string(),
            source,
        };
        let response = self.get(url).send().map_err(net)?.error_for_status().map_err(net)?;
        Ok(response.bytes().map_err(net)?.to_vec())
    }
}

/// Builds the blocking client used for real retrievals.
pub fn default_client() -> Result<Client, RetrievalError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(RetrievalError::Client)
}

/// Lifecycle state of a locally cached artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactState {
    Absent,
    CachedUnverified,
    CachedVerified,
    Corrupt,
}

/// SHA-512 digest of a file, as lowercase hex.
pub fn file_sha512_hex(path: &Path) -> Result<String, RetrievalError> {
    let bytes = fs::read(path).map_err(io_err(path))?;
    Ok(hex::encode(Sha512::digest(&bytes)))
}

/// Classifies a local artifact against its expected digest. Passing no digest
/// reports an existing file as `CachedUnverified`.
pub fn artifact_state(
    path: &Path,
    expected_sha512: Option<&str>,
) -> Result<ArtifactState, RetrievalError> {
    if !path.exists() {
        return Ok(ArtifactState::Absent);
    }
    match expected_sha512 {
        None => Ok(ArtifactState::CachedUnverified),
        Some(expected) => {
            if file_sha512_hex(path)?.eq_ignore_ascii_case(expected) {
                Ok(ArtifactState::CachedVerified)
            } else {
                Ok(ArtifactState::Corrupt)
            }
        }
    }
}

/// Descriptor of a remote zip archive: where it lives, what it must hash to,
/// where it is cached and extracted, and which extracted paths prove that the
/// extraction already happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveSpec {
    pub url: String,
    pub sha512: String,
    pub cache_path: PathBuf,
    pub extract_root: PathBuf,
    pub required_paths: Vec<PathBuf>,
}

/// Downloads, verifies and extracts an archive. A fully extracted tree (every
/// path in `required_paths` present) performs no work at all. An empty
/// `required_paths` list is vacuously satisfied, so a spec that ever wants to
/// fetch must name at least one extracted path.
pub fn fetch_archive<C: HttpClient>(client: &C, spec: &ArchiveSpec) -> Result<(), RetrievalError> {
    if spec.required_paths.iter().all(|p| p.exists()) {
        return Ok(());
    }

    if artifact_state(&spec.cache_path, Some(&spec.sha512))? != ArtifactState::CachedVerified {
        info!("downloading the model archive from {}", spec.url);
        let bytes = client.get_bytes(&spec.url)?;
        write_whole_file(&spec.cache_path, &bytes)?;
    }

    if artifact_state(&spec.cache_path, Some(&spec.sha512))? != ArtifactState::CachedVerified {
        warn!(
            "archive downloaded from {} failed verification, discarding it",
            spec.url
        );
        fs::remove_file(&spec.cache_path).map_err(io_err(&spec.cache_path))?;
        return Err(IntegrityError {
            artifact: spec.cache_path.clone(),
            condition: "downloaded archive does not match its expected content hash",
        }
        .into());
    }

    info!("extracting the model archive into {}", spec.extract_root.display());
    fs::create_dir_all(&spec.extract_root).map_err(io_err(&spec.extract_root))?;
    let file = File::open(&spec.cache_path).map_err(io_err(&spec.cache_path))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|source| ExtractionError {
        archive: spec.cache_path.clone(),
        source,
    })?;
    archive
        .extract(&spec.extract_root)
        .map_err(|source| ExtractionError {
            archive: spec.cache_path.clone(),
            source,
        })?;
    Ok(())
}

/// Descriptor of one remote column-vector network and the symbolic files it
/// converts into. The expected hashes gate the *converted* outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteNetworkSpec {
    pub base_url: String,
    pub network_dir: String,
    pub population_file: String,
    pub rate_file: String,
    pub stoichiometry_file: String,
    pub initial_state_path: PathBuf,
    pub reactions_path: PathBuf,
    pub initial_state_sha512: String,
    pub reactions_sha512: String,
}

impl RemoteNetworkSpec {
    /// URL of one of the remote files. The network directory names contain
    /// spaces; the parser percent-encodes them.
    fn remote_url(&self, file: &str) -> Result<String, RetrievalError> {
        let url = Url::parse(&format!("{}/{}/{}", self.base_url, self.network_dir, file))?;
        Ok(url.to_string())
    }
}

/// Fetches a remote column-vector network and writes the two symbolic files the
/// simulator consumes, converting on first use only. Each written file is
/// hash-checked after conversion; a mismatch deletes it and fails.
pub fn fetch_converted_network<C: HttpClient>(
    client: &C,
    spec: &RemoteNetworkSpec,
) -> Result<(), RetrievalError> {
    if artifact_state(&spec.initial_state_path, Some(&spec.initial_state_sha512))?
        != ArtifactState::CachedVerified
    {
        info!(
            "fetching and converting the initial state of {:?}",
            spec.network_dir
        );
        let raw = client.get_text(&spec.remote_url(&spec.population_file)?)?;
        let populations = columns::parse_populations(&raw)?;
        // A population-only network: zero reactions, synthetic names.
        let empty_rows = vec![Vec::new(); populations.len()];
        let net = columns::decode_network(&populations, &[], &empty_rows)?;
        write_whole_file(
            &spec.initial_state_path,
            symbolic::encode_initial_state(&net).as_bytes(),
        )?;
    }
    verify_converted(
        &spec.initial_state_path,
        &spec.initial_state_sha512,
        "converted initial state does not match its expected content hash",
    )?;

    if artifact_state(&spec.reactions_path, Some(&spec.reactions_sha512))?
        != ArtifactState::CachedVerified
    {
        info!(
            "fetching and converting the reactions of {:?}",
            spec.network_dir
        );
        let rates = columns::parse_rates(&client.get_text(&spec.remote_url(&spec.rate_file)?)?)?;
        let stoichiometry =
            columns::parse_matrix(&client.get_text(&spec.remote_url(&spec.stoichiometry_file)?)?)?;
        // The reactions file carries no populations; placeholder zeros keep the
        // species/row pairing for the synthetic names.
        let populations = vec![0; stoichiometry.len()];
        let net = columns::decode_network(&populations, &rates, &stoichiometry)?;
        write_whole_file(
            &spec.reactions_path,
            symbolic::encode_reactions(&net).as_bytes(),
        )?;
    }
    verify_converted(
        &spec.reactions_path,
        &spec.reactions_sha512,
        "converted reaction file does not match its expected content hash",
    )?;

    Ok(())
}

fn verify_converted(
    path: &Path,
    expected_sha512: &str,
    condition: &'static str,
) -> Result<(), RetrievalError> {
    match artifact_state(path, Some(expected_sha512))? {
        ArtifactState::CachedVerified => Ok(()),
        ArtifactState::Absent => Err(IntegrityError {
            artifact: path.to_path_buf(),
            condition: "converted artifact was never written",
        }
        .into()),
        _ => {
            warn!("found corrupted converted file at {}, deleting it", path.display());
            fs::remove_file(path).map_err(io_err(path))?;
            Err(IntegrityError {
                artifact: path.to_path_buf(),
                condition,
            }
            .into())
        }
    }
}

fn write_whole_file(path: &Path, bytes: &[u8]) -> Result<(), RetrievalError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }
    fs::write(path, bytes).map_err(io_err(path))
}
