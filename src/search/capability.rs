//! Fuzzy-search capability detection
//!
//! The database path needs the `similarity()` SQL function. Whether it is
//! there is checked once per [`FuzzyCapability`] and the answer is kept for
//! the lifetime of the value; picking up a newly installed function needs a
//! new provider (in practice, a process restart).

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::Result;

/// Backend that can answer "is trigram similarity available?"
pub trait CapabilityProbe: Send + Sync {
    /// `Ok(true)` / `Ok(false)` are definitive answers; `Err` means the check
    /// itself failed (connectivity, permissions, missing catalog).
    fn probe_fuzzy_capability(&self) -> Result<bool>;
}

/// What the one-time probe concluded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Available,
    Unavailable,
    /// The probe failed; treated as unavailable
    Inconclusive(String),
}

impl ProbeOutcome {
    pub fn is_available(&self) -> bool {
        matches!(self, ProbeOutcome::Available)
    }
}

/// Memoized capability answer, built once at startup and shared by reference
pub struct FuzzyCapability {
    probe: Option<Arc<dyn CapabilityProbe>>,
    outcome: OnceCell<ProbeOutcome>,
}

impl FuzzyCapability {
    /// Lazily probe `probe` on first use
    pub fn new(probe: Arc<dyn CapabilityProbe>) -> Self {
        Self {
            probe: Some(probe),
            outcome: OnceCell::new(),
        }
    }

    /// Provider with a predetermined answer; never probes
    pub fn with_outcome(outcome: ProbeOutcome) -> Self {
        Self {
            probe: None,
            outcome: OnceCell::with_value(outcome),
        }
    }

    /// Probe result, computing it on the first call
    pub fn outcome(&self) -> &ProbeOutcome {
        self.outcome.get_or_init(|| self.run_probe())
    }

    pub fn is_available(&self) -> bool {
        self.outcome().is_available()
    }

    /// Whether the probe has already run
    pub fn is_resolved(&self) -> bool {
        self.outcome.get().is_some()
    }

    fn run_probe(&self) -> ProbeOutcome {
        let Some(probe) = &self.probe else {
            return ProbeOutcome::Unavailable;
        };

        match probe.probe_fuzzy_capability() {
            Ok(true) => {
                tracing::info!("Trigram similarity available, using database ranking");
                ProbeOutcome::Available
            }
            Ok(false) => {
                tracing::info!("Trigram similarity not installed, using in-process ranking");
                ProbeOutcome::Unavailable
            }
            Err(e) => {
                tracing::warn!(
                    "Trigram capability probe failed, using in-process ranking: {}",
                    e
                );
                ProbeOutcome::Inconclusive(e.to_string())
            }
        }
    }
}

impl std::fmt::Debug for FuzzyCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FuzzyCapability")
            .field("outcome", &self.outcome.get())
            .finish()
    }
}
