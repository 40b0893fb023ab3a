use numpy::ndarray::Array2;
use numpy::{IntoPyArray, PyArray1, PyArray2};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::core::config::EXIT_MARGIN_STEPS;
use crate::core::{BunchId, Config, SequencerState, Simulation};
use crate::error::Error;

fn py_err(e: Error) -> PyErr {
    match e {
        Error::InvalidConfig(_) | Error::InvalidParam(_) => PyValueError::new_err(e.to_string()),
        Error::InvalidState(_) | Error::MathError(_) => PyRuntimeError::new_err(e.to_string()),
    }
}

fn parse_bunch(name: &str) -> PyResult<BunchId> {
    match name {
        "a" | "A" | "electrons" => Ok(BunchId::A),
        "b" | "B" | "positrons" => Ok(BunchId::B),
        other => Err(PyValueError::new_err(format!(
            "unknown bunch {other:?}; expected \"a\" or \"b\""
        ))),
    }
}

/// BeamBeam: Python-facing wrapper around the collision sequencer.
///
/// API:
/// - __new__(slice_count=50, particles_per_slice=21, dz=1.0, dy=0.5, dy_kick=0.0025,
///           y_offset=2.0, max_steps=None, overlap_tolerance=0.0)
/// - advance(), run_pass() -> int, reset()
/// - get_positions(bunch) -> np.ndarray (N, 2) of [z, y]
/// - get_velocities(bunch) -> np.ndarray (N,) of vy
#[pyclass]
pub struct BeamBeam {
    sim: Simulation,
}

#[pymethods]
impl BeamBeam {
    /// Build both bunches.
    ///
    /// `max_steps=None` uses the crossing time plus a margin to watch the exit.
    ///
    /// Errors: raises ValueError on invalid parameters.
    #[new]
    #[pyo3(signature = (
        slice_count=50,
        particles_per_slice=21,
        dz=1.0,
        dy=0.5,
        dy_kick=0.0025,
        y_offset=2.0,
        max_steps=None,
        overlap_tolerance=0.0
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        slice_count: usize,
        particles_per_slice: usize,
        dz: f64,
        dy: f64,
        dy_kick: f64,
        y_offset: f64,
        max_steps: Option<usize>,
        overlap_tolerance: f64,
    ) -> PyResult<Self> {
        let config = Config {
            slice_count,
            particles_per_slice,
            dz,
            dy,
            dy_kick,
            y_offset,
            max_steps: max_steps.unwrap_or(slice_count + EXIT_MARGIN_STEPS),
            overlap_tolerance,
        };
        let sim = Simulation::new(config).map_err(py_err)?;
        Ok(Self { sim })
    }

    /// Take one step. Raises RuntimeError if the pass is complete.
    fn advance(&mut self) -> PyResult<()> {
        self.sim.advance().map_err(py_err)
    }

    /// Run to the end of the pass (releases the GIL). Returns the number of steps taken.
    fn run_pass(&mut self, py: Python<'_>) -> PyResult<usize> {
        py.detach(|| self.sim.run_pass()).map_err(py_err)
    }

    /// Restore the initial layout.
    fn reset(&mut self) -> PyResult<()> {
        self.sim.reset().map_err(py_err)
    }

    #[getter]
    fn step_index(&self) -> usize {
        self.sim.step_index()
    }

    #[getter]
    fn passes_completed(&self) -> usize {
        self.sim.passes_completed()
    }

    /// "not_started", "in_pass" or "pass_complete".
    #[getter]
    fn state(&self) -> &'static str {
        match self.sim.sequencer_state() {
            SequencerState::NotStarted => "not_started",
            SequencerState::InPass => "in_pass",
            SequencerState::PassComplete => "pass_complete",
        }
    }

    /// Return positions of one bunch as a NumPy array of shape (N, 2): [z, y].
    fn get_positions(&self, py: Python<'_>, bunch: &str) -> PyResult<Py<PyArray2<f64>>> {
        let b = self.sim.bunch(parse_bunch(bunch)?);
        let mut arr = Array2::<f64>::zeros((b.num_particles(), 2));
        for (i, (z, p)) in b.iter_particles().enumerate() {
            arr[[i, 0]] = z;
            arr[[i, 1]] = p.y;
        }
        Ok(arr.into_pyarray(py).to_owned().into())
    }

    /// Return vertical velocities of one bunch as a NumPy array of shape (N,).
    fn get_velocities(&self, py: Python<'_>, bunch: &str) -> PyResult<Py<PyArray1<f64>>> {
        let b = self.sim.bunch(parse_bunch(bunch)?);
        let vy: Vec<f64> = b.iter_particles().map(|(_, p)| p.vy).collect();
        Ok(vy.into_pyarray(py).to_owned().into())
    }

    /// Return (mean_z, mean_y) of one bunch.
    fn get_centroid(&self, bunch: &str) -> PyResult<(f64, f64)> {
        Ok(self.sim.centroid(parse_bunch(bunch)?))
    }

    /// Return a (M, 5) array of [step, z_a, y_a, z_b, y_b] for the current pass.
    fn get_centroid_history(&self, py: Python<'_>) -> PyResult<Py<PyArray2<f64>>> {
        let history = self.sim.centroid_history();
        let mut arr = Array2::<f64>::zeros((history.len(), 5));
        for (i, s) in history.iter().enumerate() {
            arr[[i, 0]] = s.step as f64;
            arr[[i, 1]] = s.a.0;
            arr[[i, 2]] = s.a.1;
            arr[[i, 3]] = s.b.0;
            arr[[i, 4]] = s.b.1;
        }
        Ok(arr.into_pyarray(py).to_owned().into())
    }

    /// Return a (S, 2) array of [z, mean_field] per slice for the last step.
    fn get_slice_fields(&self, py: Python<'_>, bunch: &str) -> PyResult<Py<PyArray2<f64>>> {
        let fields = self.sim.slice_fields(parse_bunch(bunch)?);
        let mut arr = Array2::<f64>::zeros((fields.len(), 2));
        for (i, f) in fields.iter().enumerate() {
            arr[[i, 0]] = f.z;
            arr[[i, 1]] = f.mean_field;
        }
        Ok(arr.into_pyarray(py).to_owned().into())
    }

    /// Return a (P, 2) array of [y, vy] for one slice (default: the central slice).
    #[pyo3(signature = (bunch, slice=None))]
    fn get_phase_space(
        &self,
        py: Python<'_>,
        bunch: &str,
        slice: Option<usize>,
    ) -> PyResult<Py<PyArray2<f64>>> {
        let index = slice.unwrap_or(self.sim.config().slice_count / 2);
        let points = self
            .sim
            .phase_space(parse_bunch(bunch)?, index)
            .map_err(py_err)?;
        let mut arr = Array2::<f64>::zeros((points.len(), 2));
        for (i, (y, vy)) in points.into_iter().enumerate() {
            arr[[i, 0]] = y;
            arr[[i, 1]] = vy;
        }
        Ok(arr.into_pyarray(py).to_owned().into())
    }

    /// Histogram of vertical positions. Returns (edges, counts).
    #[pyo3(signature = (bunch, bins=40, range=None))]
    fn get_y_histogram(
        &self,
        py: Python<'_>,
        bunch: &str,
        bins: usize,
        range: Option<(f64, f64)>,
    ) -> PyResult<(Py<PyArray1<f64>>, Py<PyArray1<f64>>)> {
        let (edges, counts) = self
            .sim
            .y_histogram(parse_bunch(bunch)?, bins, range)
            .map_err(py_err)?;
        Ok((
            edges.into_pyarray(py).to_owned().into(),
            counts.into_pyarray(py).to_owned().into(),
        ))
    }
}

/// The beambeam Python module entry point.
#[pymodule]
fn beambeam(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<BeamBeam>()?;
    Ok(())
}
