//! AC sweep frequency grids.
//!
//! The complex system itself lives in [`krets_core::mna::ComplexMna`];
//! this module owns the sweep parameters and frequency-point generation.

/// Frequency spacing of an AC sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcSweepType {
    /// Logarithmic spacing with a fixed number of points per decade.
    Decade,
    /// Evenly spaced points over `[fstart, fstop]`.
    Linear,
}

/// AC sweep parameters.
///
/// The default grid is the engine's documented sweep: 1 Hz to 1 MHz,
/// logarithmic, 20 points per decade.
#[derive(Debug, Clone)]
pub struct AcSweepParams {
    /// Start frequency (Hz).
    pub fstart: f64,
    /// Stop frequency (Hz).
    pub fstop: f64,
    /// Points per decade for [`AcSweepType::Decade`], total points for
    /// [`AcSweepType::Linear`].
    pub num_points: usize,
    /// Sweep spacing.
    pub sweep_type: AcSweepType,
}

impl Default for AcSweepParams {
    fn default() -> Self {
        Self {
            fstart: 1.0,
            fstop: 1e6,
            num_points: 20,
            sweep_type: AcSweepType::Decade,
        }
    }
}

/// Generate the frequency points for a sweep, endpoints included.
pub fn generate_frequencies(params: &AcSweepParams) -> Vec<f64> {
    let mut freqs = Vec::new();
    match params.sweep_type {
        AcSweepType::Decade => {
            let per_decade = params.num_points.max(1) as f64;
            let mut k = 0u32;
            loop {
                let f = params.fstart * 10f64.powf(f64::from(k) / per_decade);
                if f > params.fstop * (1.0 + 1e-9) {
                    break;
                }
                freqs.push(f);
                k += 1;
            }
        }
        AcSweepType::Linear => {
            let n = params.num_points.max(1);
            if n == 1 {
                freqs.push(params.fstart);
            } else {
                let step = (params.fstop - params.fstart) / (n - 1) as f64;
                for k in 0..n {
                    freqs.push(params.fstart + step * k as f64);
                }
            }
        }
    }
    freqs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_decade_grid() {
        let freqs = generate_frequencies(&AcSweepParams::default());
        // 6 decades at 20 points each, endpoints included.
        assert_eq!(freqs.len(), 121);
        assert!((freqs[0] - 1.0).abs() < 1e-12);
        assert!((freqs[120] - 1e6).abs() < 1e-3);
        // Log-spaced: constant ratio between neighbors.
        let ratio = freqs[1] / freqs[0];
        assert!((ratio - 10f64.powf(1.0 / 20.0)).abs() < 1e-12);
    }

    #[test]
    fn linear_grid() {
        let params = AcSweepParams {
            fstart: 10.0,
            fstop: 50.0,
            num_points: 5,
            sweep_type: AcSweepType::Linear,
        };
        let freqs = generate_frequencies(&params);
        assert_eq!(freqs, vec![10.0, 20.0, 30.0, 40.0, 50.0]);
    }

    #[test]
    fn single_point_linear_grid() {
        let params = AcSweepParams {
            fstart: 42.0,
            fstop: 42.0,
            num_points: 1,
            sweep_type: AcSweepType::Linear,
        };
        assert_eq!(generate_frequencies(&params), vec![42.0]);
    }
}
