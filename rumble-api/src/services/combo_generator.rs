//! Combo generation
//!
//! One randomized punch sequence per energy segment. Punch count scales with
//! the segment's energy level, the opener is biased toward jab/cross, and no
//! punch is thrown twice in a row.
//!
//! All randomness (punch count, punch choice, replacement segment, combo id)
//! comes from one injected `StdRng`, so a seeded generator is reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rumble_common::api::{AnalysisRecord, Combo, EnergySegment, Punch};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

use crate::store::MemoryStore;

/// Cap on combos produced by initial generation
pub const MAX_INITIAL_COMBOS: usize = 10;

/// Probability that a combo opens with a jab rather than a cross
const JAB_OPENER_PROBABILITY: f64 = 0.7;

/// Generate a single combo for `segment`
///
/// The combo inherits the segment's energy level, start time and length.
pub fn generate_combo<R: Rng + ?Sized>(rng: &mut R, bpm: f64, segment: &EnergySegment) -> Combo {
    let (min_punches, max_punches) = segment.level.punch_range();
    let punch_count = rng.gen_range(min_punches..=max_punches);

    let mut punches = Vec::with_capacity(punch_count);
    punches.push(if rng.gen_bool(JAB_OPENER_PROBABILITY) {
        Punch::Jab
    } else {
        Punch::Cross
    });

    while punches.len() < punch_count {
        let last = punches[punches.len() - 1];
        let candidates: Vec<Punch> = Punch::ALL.into_iter().filter(|p| *p != last).collect();
        punches.push(candidates[rng.gen_range(0..candidates.len())]);
    }

    let sequence = punches
        .iter()
        .map(|p| p.index().to_string())
        .collect::<Vec<_>>()
        .join("-");
    let notation = punches.iter().map(|p| p.name().to_string()).collect();

    Combo {
        id: rumble_common::uuid_utils::generate_with(rng),
        sequence,
        notation,
        energy_level: segment.level,
        bpm,
        time: segment.start_time,
        duration: segment.duration(),
        created_at: rumble_common::time::now(),
    }
}

/// Per-song combo lists plus the random source used to build them
#[derive(Clone)]
pub struct ComboGenerator {
    combos: MemoryStore<Vec<Combo>>,
    rng: Arc<Mutex<StdRng>>,
}

impl Default for ComboGenerator {
    fn default() -> Self {
        Self::from_entropy(MemoryStore::new())
    }
}

impl ComboGenerator {
    pub fn new(combos: MemoryStore<Vec<Combo>>, rng: StdRng) -> Self {
        Self {
            combos,
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    /// Generator seeded from OS entropy
    pub fn from_entropy(combos: MemoryStore<Vec<Combo>>) -> Self {
        Self::new(combos, StdRng::from_entropy())
    }

    /// Reproducible generator
    pub fn with_seed(combos: MemoryStore<Vec<Combo>>, seed: u64) -> Self {
        Self::new(combos, StdRng::seed_from_u64(seed))
    }

    /// Stored combos for a song; empty when none exist
    pub async fn get_combos(&self, song_id: &str) -> Vec<Combo> {
        self.combos.get(song_id).await.unwrap_or_default()
    }

    /// One combo per energy segment (first [`MAX_INITIAL_COMBOS`] segments)
    ///
    /// Overwrites any stored list. Returns an empty list and stores nothing
    /// when the analysis lacks BPM, energy profile or duration.
    pub async fn generate_initial_combos(&self, song_id: &str, analysis: &AnalysisRecord) -> Vec<Combo> {
        let Some((bpm, segments, _duration)) = analysis.generation_inputs() else {
            error!(song_id = %song_id, "Cannot generate combos: missing analysis data");
            return Vec::new();
        };

        let combos: Vec<Combo> = self.with_rng(|rng| {
            segments
                .iter()
                .take(MAX_INITIAL_COMBOS)
                .map(|segment| generate_combo(rng, bpm, segment))
                .collect()
        });

        self.combos.insert(song_id, combos.clone()).await;
        info!(song_id = %song_id, count = combos.len(), "Generated initial combos");
        combos
    }

    /// Replace the combos named in `exclude_ids`, keeping the rest
    ///
    /// Each exclusion yields exactly one new combo built from a uniformly
    /// random segment of the analysis. Retained combos keep their order and
    /// replacements are appended; the stored list is replaced in full.
    pub async fn regenerate_combos(
        &self,
        song_id: &str,
        analysis: &AnalysisRecord,
        exclude_ids: &[String],
    ) -> Vec<Combo> {
        let Some((bpm, segments, _duration)) = analysis.generation_inputs() else {
            error!(song_id = %song_id, "Cannot regenerate combos: missing analysis data");
            return Vec::new();
        };

        let combos = self
            .combos
            .replace_with(song_id, |existing| {
                let mut combos: Vec<Combo> = existing
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|combo| !exclude_ids.contains(&combo.id))
                    .collect();

                if !segments.is_empty() {
                    self.with_rng(|rng| {
                        for _ in exclude_ids {
                            let segment = &segments[rng.gen_range(0..segments.len())];
                            combos.push(generate_combo(rng, bpm, segment));
                        }
                    });
                }
                combos
            })
            .await;

        debug!(
            song_id = %song_id,
            excluded = exclude_ids.len(),
            total = combos.len(),
            "Regenerated combos"
        );
        combos
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }
}
