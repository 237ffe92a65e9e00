//! The analysis engines behind the facade: DC operating point,
//! backward-Euler transient stepping and the AC sweep.

use std::f64::consts::PI;

use krets_core::mna::{ComplexMna, MnaSystem};
use krets_devices::{AnalysisMode, DeviceSet};
use krets_solver::ac::{generate_frequencies, AcSweepParams};
use krets_solver::linear::solve_dense;
use krets_solver::newton::{solve_newton_raphson, NonlinearStamper};
use nalgebra::DVector;
use num_complex::Complex;

use crate::circuit::{AnalysisState, Circuit, StampedSystem};
use crate::error::{Error, Result};
use crate::probe;

/// Points used when `transient_simulation` has to choose a step size:
/// `h = (t_end - t_begin) / 1000`.
const DEFAULT_TRANSIENT_POINTS: f64 = 1000.0;

/// Stamps the whole device set for one analysis mode.
struct SetStamper<'a> {
    devices: &'a DeviceSet,
    mode: AnalysisMode,
}

impl NonlinearStamper for SetStamper<'_> {
    fn stamp_at(&self, mna: &mut MnaSystem, solution: &DVector<f64>) {
        self.devices.stamp(mna, self.mode, solution);
    }
}

impl Circuit {
    /// Solve the DC operating point.
    ///
    /// Linear circuits take a single LU pass; circuits with diodes run
    /// Newton-Raphson seeded with the previous solution (zeros on the
    /// first call).
    pub fn dc_analysis(&mut self) -> Result<()> {
        log::debug!("dc analysis");
        let guess = self.solution.clone();
        let solution = self.solve_real(AnalysisMode::Dc, guess.as_ref())?;

        self.devices.update_after_dc(&solution, self.nodes.len());
        self.dc_solution = Some(solution.clone());
        self.solution = Some(solution);
        self.state = AnalysisState::DcSolved;
        Ok(())
    }

    /// Run a transient simulation from `t_begin` to `t_end`, recording
    /// the named probes. The step size defaults to
    /// `(t_end - t_begin) / 1000` and is reported by
    /// [`time_step`](Circuit::time_step).
    ///
    /// The call records one sample at `t_begin` from the
    /// initial-conditions solve, then one per step. With
    /// `t_end <= t_begin` it only prepares: state is initialized from the
    /// initial conditions and the single starting sample is returned,
    /// ready for [`continue_transient_simulation`](Self::continue_transient_simulation).
    pub fn transient_simulation(
        &mut self,
        t_begin: f64,
        t_end: f64,
        probes: &[&str],
    ) -> Result<(Vec<f64>, Vec<Vec<f64>>)> {
        let span = t_end - t_begin;
        let time_step = if span > 0.0 {
            span / DEFAULT_TRANSIENT_POINTS
        } else {
            self.time_step
        };
        self.run_transient(t_begin, t_end, probes, time_step)
    }

    /// Like [`transient_simulation`](Self::transient_simulation) with an
    /// explicit step size.
    pub fn transient_simulation_with_step(
        &mut self,
        t_begin: f64,
        t_end: f64,
        probes: &[&str],
        time_step: f64,
    ) -> Result<(Vec<f64>, Vec<Vec<f64>>)> {
        if time_step <= 0.0 {
            return Err(Error::TimeStepNonPositive(time_step));
        }
        self.run_transient(t_begin, t_end, probes, time_step)
    }

    /// Append `⌈duration / time_step⌉` steps to a running transient
    /// simulation, each advancing exactly `time_step`.
    ///
    /// Pending component mutations are acknowledged at the start of each
    /// step. On failure the recorded history stays intact up to the last
    /// successful step.
    pub fn continue_transient_simulation(
        &mut self,
        duration: f64,
        time_step: f64,
    ) -> Result<(Vec<f64>, Vec<Vec<f64>>)> {
        if self.state != AnalysisState::TransientRunning {
            return Err(Error::InvalidState(
                "continue_transient_simulation requires a running transient simulation"
                    .to_string(),
            ));
        }
        if time_step <= 0.0 {
            return Err(Error::TimeStepNonPositive(time_step));
        }
        self.time_step = time_step;
        self.advance(duration, time_step)?;
        Ok((self.time_stamps.clone(), self.series.clone()))
    }

    fn run_transient(
        &mut self,
        t_begin: f64,
        t_end: f64,
        probes: &[&str],
        time_step: f64,
    ) -> Result<(Vec<f64>, Vec<Vec<f64>>)> {
        log::debug!(
            "transient simulation: t = [{t_begin}, {t_end}], h = {time_step}, {} probes",
            probes.len()
        );

        let targets = probes
            .iter()
            .map(|name| probe::resolve(name, &self.nodes, &self.devices))
            .collect::<Result<Vec<_>>>()?;

        self.probes = targets;
        self.time_stamps.clear();
        self.series = vec![Vec::new(); probes.len()];
        self.sim_time = t_begin;
        self.time_step = time_step;

        // Initial-conditions solve: reactive state is pinned to the
        // declared v0/i0 and the rest of the circuit settles around it.
        self.devices.init_transient_state();
        let start = self.solve_real(AnalysisMode::TransientStart, None)?;
        let num_nodes = self.nodes.len();
        self.devices.load_start_solution(&start, num_nodes);

        let persistent = num_nodes + self.devices.num_branches();
        self.solution = Some(start.rows(0, persistent).into_owned());
        self.state = AnalysisState::TransientRunning;
        self.record_sample();

        if t_end > t_begin {
            self.advance(t_end - t_begin, time_step)?;
        }
        Ok((self.time_stamps.clone(), self.series.clone()))
    }

    /// Step the circuit forward by `duration` in increments of `h`.
    fn advance(&mut self, duration: f64, h: f64) -> Result<()> {
        let steps = num_steps(duration, h);
        log::debug!("advancing {steps} steps of {h}");

        for _ in 0..steps {
            let guess = self.solution.clone();
            let solution = self.solve_real(AnalysisMode::TransientStep { h }, guess.as_ref())?;

            self.devices.update_after_step(&solution, self.nodes.len(), h);
            self.solution = Some(solution);
            self.sim_time += h;
            self.record_sample();
        }
        Ok(())
    }

    /// Run an AC sweep over the default grid (1 Hz to 1 MHz, 20 points
    /// per decade), returning the frequencies and one complex series per
    /// probe.
    ///
    /// The sweep linearizes about the DC operating point and runs
    /// [`dc_analysis`](Self::dc_analysis) first if none is available.
    pub fn ac_sweep(&mut self, probes: &[&str]) -> Result<(Vec<f64>, Vec<Vec<Complex<f64>>>)> {
        self.ac_sweep_with(probes, &AcSweepParams::default())
    }

    /// Run an AC sweep over an explicit frequency grid.
    pub fn ac_sweep_with(
        &mut self,
        probes: &[&str],
        params: &AcSweepParams,
    ) -> Result<(Vec<f64>, Vec<Vec<Complex<f64>>>)> {
        if self.state != AnalysisState::DcSolved {
            self.dc_analysis()?;
        }
        let dc_solution = self
            .dc_solution
            .clone()
            .expect("dc analysis stores the operating point");

        let targets = probes
            .iter()
            .map(|name| probe::resolve(name, &self.nodes, &self.devices))
            .collect::<Result<Vec<_>>>()?;

        self.devices.acknowledge_mutations();

        let frequencies = generate_frequencies(params);
        log::debug!(
            "ac sweep: {} points in [{}, {}] Hz",
            frequencies.len(),
            params.fstart,
            params.fstop
        );

        let num_nodes = self.nodes.len();
        let num_branches = self.devices.num_branches();
        let mut results = vec![Vec::with_capacity(frequencies.len()); targets.len()];

        for (index, &freq) in frequencies.iter().enumerate() {
            let omega = 2.0 * PI * freq;
            let mut mna = ComplexMna::new(num_nodes, num_branches);
            self.devices.stamp_ac(&mut mna, omega, &dc_solution);

            let solution = solve_dense(mna.matrix(), mna.rhs())?;

            for (series, target) in results.iter_mut().zip(&targets) {
                series.push(probe::read_complex(
                    *target,
                    &solution,
                    &self.devices,
                    num_nodes,
                    omega,
                    &dc_solution,
                ));
            }

            if index == frequencies.len() - 1 {
                self.last_system = Some(StampedSystem::Complex {
                    mna,
                    names: self.unknown_names(),
                });
            }
        }

        Ok((frequencies, results))
    }

    /// Assemble and solve one real system.
    ///
    /// Pending mutations are acknowledged before stamping. The
    /// post-stamp system at the accepted solution is retained for
    /// diagnostics.
    fn solve_real(
        &mut self,
        mode: AnalysisMode,
        guess: Option<&DVector<f64>>,
    ) -> Result<DVector<f64>> {
        self.devices.acknowledge_mutations();

        let num_nodes = self.nodes.len();
        let mut num_branches = self.devices.num_branches();
        if mode == AnalysisMode::TransientStart {
            num_branches += self.devices.num_start_branches();
        }

        let solution = if self.devices.has_nonlinear() {
            let stamper = SetStamper {
                devices: &self.devices,
                mode,
            };
            solve_newton_raphson(num_nodes, num_branches, &stamper, &self.criteria, guess)?
                .solution
        } else {
            let mut mna = MnaSystem::new(num_nodes, num_branches);
            self.devices
                .stamp(&mut mna, mode, &DVector::zeros(num_nodes + num_branches));
            let solution = solve_dense(mna.matrix(), mna.rhs())?;
            self.last_system = Some(StampedSystem::Real {
                mna,
                names: self.unknown_names_for(mode),
            });
            return Ok(solution);
        };

        // Re-stamp at the accepted solution so diagnostics show the
        // converged linearization.
        let mut mna = MnaSystem::new(num_nodes, num_branches);
        self.devices.stamp(&mut mna, mode, &solution);
        self.last_system = Some(StampedSystem::Real {
            mna,
            names: self.unknown_names_for(mode),
        });
        Ok(solution)
    }

    fn record_sample(&mut self) {
        self.time_stamps.push(self.sim_time);
        let solution = self
            .solution
            .as_ref()
            .expect("transient state holds a solution");
        for (series, target) in self.series.iter_mut().zip(&self.probes) {
            series.push(probe::read(
                *target,
                solution,
                &self.devices,
                self.nodes.len(),
            ));
        }
    }
}

/// Number of steps covering `duration` at step `h`.
///
/// `⌈duration/h⌉`, with a relative epsilon so an exact multiple of `h`
/// is not pushed over the next integer by round-off.
fn num_steps(duration: f64, h: f64) -> usize {
    if duration <= 0.0 {
        return 0;
    }
    ((duration / h) * (1.0 - 1e-12)).ceil() as usize
}
