use crate::core::config::Config;
use crate::core::diagnostics::{self, CentroidSample};
use crate::core::grid::build_initial_state;
use crate::core::particle::{Bunch, BunchId};
use crate::core::stepper;
use crate::error::{Error, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Where the current pass stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequencerState {
    /// Fresh layout; no step taken since construction or the last reset.
    NotStarted,
    /// At least one step taken; the bunches have not finished separating.
    InPass,
    /// The pass is over. Only `reset()` leaves this state.
    PassComplete,
}

/// One particle as seen by a renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleState {
    pub z: f64,
    pub y: f64,
    pub vy: f64,
}

/// Field aggregate of one slice for the last step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceField {
    pub index: usize,
    pub z: f64,
    /// Mean field over the slice's particles (0 if the slice overlapped nothing).
    pub mean_field: f64,
}

/// Owned copy of the engine state after a step.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub bunch_a: Vec<ParticleState>,
    pub bunch_b: Vec<ParticleState>,
    pub step_index: usize,
    pub sequencer_state: SequencerState,
}

/// Collision sequencer: owns both bunches, steps them and tracks the pass.
///
/// A pass ends once `max_steps` steps have elapsed since the first slice
/// contact and the two bunches no longer share any Z range. A pass in which
/// no slices ever meet stops at [`Simulation::step_limit`]. Advancing a
/// finished pass is an error; the driver calls `reset()` to replay the
/// identical initial condition.
#[derive(Debug)]
pub struct Simulation {
    config: Config,
    a: Bunch,
    b: Bunch,
    initial_a: Bunch,
    initial_b: Bunch,
    state: SequencerState,
    step_index: usize,
    first_contact: Option<usize>,
    passes_completed: usize,
    history: Vec<CentroidSample>,
}

impl Simulation {
    /// Build both bunches for `config` and keep a copy of the layout for `reset()`.
    ///
    /// Errors:
    /// - `Error::InvalidConfig` if `config` fails validation.
    pub fn new(config: Config) -> Result<Self> {
        let (a, b) = build_initial_state(&config)?;
        info!(
            "beam-beam: {} particles per bunch, length {}, max_steps {}, dy_kick {}, y_offset {}",
            config.particles_per_bunch(),
            config.bunch_length(),
            config.max_steps,
            config.dy_kick,
            config.y_offset
        );
        let mut sim = Self {
            initial_a: a.clone(),
            initial_b: b.clone(),
            a,
            b,
            config,
            state: SequencerState::NotStarted,
            step_index: 0,
            first_contact: None,
            passes_completed: 0,
            history: Vec::new(),
        };
        sim.record_centroids();
        Ok(sim)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sequencer_state(&self) -> SequencerState {
        self.state
    }

    /// Steps taken in the current pass.
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    /// Number of passes that reached `PassComplete`.
    pub fn passes_completed(&self) -> usize {
        self.passes_completed
    }

    /// Step at which the first slice pair interacted in the current pass, if any yet.
    pub fn first_contact_step(&self) -> Option<usize> {
        self.first_contact
    }

    /// Steps elapsed since the first slice contact, or 0 before it.
    pub fn steps_since_contact(&self) -> usize {
        self.first_contact.map_or(0, |contact| self.step_index - contact)
    }

    /// Hard ceiling on the length of a pass, reached only if no slices ever meet.
    pub fn step_limit(&self) -> usize {
        self.config.max_steps.saturating_add(self.config.crossing_steps())
    }

    pub fn bunch(&self, id: BunchId) -> &Bunch {
        match id {
            BunchId::A => &self.a,
            BunchId::B => &self.b,
        }
    }

    /// Take one step.
    ///
    /// Errors:
    /// - `Error::InvalidState` if the pass is already complete (state is left untouched).
    /// - `Error::MathError` from overlap detection (state is left untouched).
    pub fn advance(&mut self) -> Result<()> {
        if self.state == SequencerState::PassComplete {
            return Err(Error::InvalidState(
                "pass complete; call reset() before advancing again".into(),
            ));
        }

        let pairs = stepper::advance(&mut self.a, &mut self.b, &self.config)?;
        self.step_index += 1;
        self.state = SequencerState::InPass;

        if pairs > 0 && self.first_contact.is_none() {
            debug!("first slice contact at step {}", self.step_index);
            self.first_contact = Some(self.step_index);
        }
        debug!("step {}: {} overlapping slice pairs", self.step_index, pairs);
        self.record_centroids();

        if self.pass_finished() {
            self.state = SequencerState::PassComplete;
            self.passes_completed += 1;
            let (_, ya) = diagnostics::centroid(&self.a);
            let (_, yb) = diagnostics::centroid(&self.b);
            info!(
                "pass {} complete after {} steps (centroid y: a={:.6}, b={:.6})",
                self.passes_completed, self.step_index, ya, yb
            );
        }
        Ok(())
    }

    /// Advance until the pass completes and return the number of steps taken by this call.
    ///
    /// Errors:
    /// - `Error::InvalidState` if the pass is already complete.
    pub fn run_pass(&mut self) -> Result<usize> {
        let start = self.step_index;
        loop {
            self.advance()?;
            if self.state == SequencerState::PassComplete {
                return Ok(self.step_index - start);
            }
        }
    }

    /// Restore positions, velocities, offsets and pass bookkeeping to the initial layout.
    ///
    /// Allowed from any state. The completed-pass counter is kept.
    pub fn reset(&mut self) -> Result<()> {
        self.a.restore_from(&self.initial_a)?;
        self.b.restore_from(&self.initial_b)?;
        self.state = SequencerState::NotStarted;
        self.step_index = 0;
        self.first_contact = None;
        self.history.clear();
        self.record_centroids();
        info!("reset to initial layout ({} passes completed)", self.passes_completed);
        Ok(())
    }

    /// Owned snapshot of every particle plus the sequencer position.
    pub fn state(&self) -> Snapshot {
        Snapshot {
            bunch_a: particle_states(&self.a),
            bunch_b: particle_states(&self.b),
            step_index: self.step_index,
            sequencer_state: self.state,
        }
    }

    /// Mean (Z, Y) of one bunch.
    pub fn centroid(&self, id: BunchId) -> (f64, f64) {
        diagnostics::centroid(self.bunch(id))
    }

    /// Per-slice field aggregates from the last step.
    pub fn slice_fields(&self, id: BunchId) -> Vec<SliceField> {
        let bunch = self.bunch(id);
        bunch
            .slices
            .iter()
            .map(|s| SliceField {
                index: s.index(),
                z: bunch.slice_z(s.index()),
                mean_field: s.last_field,
            })
            .collect()
    }

    /// Centroids of both bunches for every step of the current pass, starting at step 0.
    pub fn centroid_history(&self) -> &[CentroidSample] {
        &self.history
    }

    /// (y, vy) pairs of one slice.
    pub fn phase_space(&self, id: BunchId, slice: usize) -> Result<Vec<(f64, f64)>> {
        diagnostics::phase_space(self.bunch(id), slice)
    }

    /// Vertical-position histogram of one bunch.
    pub fn y_histogram(
        &self,
        id: BunchId,
        bins: usize,
        range: Option<(f64, f64)>,
    ) -> Result<(Vec<f64>, Vec<f64>)> {
        diagnostics::y_histogram(self.bunch(id), bins, range)
    }

    // ============ Internal helpers ============

    fn pass_finished(&self) -> bool {
        if self.step_index >= self.step_limit() {
            return true;
        }
        self.first_contact.is_some()
            && self.steps_since_contact() >= self.config.max_steps
            && !stepper::ranges_overlap(&self.a, &self.b, self.config.overlap_tolerance)
    }

    fn record_centroids(&mut self) {
        self.history.push(CentroidSample {
            step: self.step_index,
            a: diagnostics::centroid(&self.a),
            b: diagnostics::centroid(&self.b),
        });
    }
}

fn particle_states(bunch: &Bunch) -> Vec<ParticleState> {
    bunch
        .iter_particles()
        .map(|(z, p)| ParticleState { z, y: p.y, vy: p.vy })
        .collect()
}
