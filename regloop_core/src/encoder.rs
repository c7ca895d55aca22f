//! Quadrature edge detection for the manual knob.
//!
//! One state variable: the last sampled primary (CLK) level. A differing
//! sample is an edge and yields exactly one step; the secondary (DT) level at
//! that moment picks the direction. No debounce is applied, so contact bounce
//! produces extra steps.

use regloop_traits::{DeviceError, Level, QuadratureEncoder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualStep {
    Up,
    Down,
}

impl ManualStep {
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            ManualStep::Up => 1.0,
            ManualStep::Down => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeDetector {
    last_primary: Level,
}

impl EdgeDetector {
    pub fn new(initial_primary: Level) -> Self {
        Self {
            last_primary: initial_primary,
        }
    }

    pub fn last_primary(&self) -> Level {
        self.last_primary
    }

    /// Feed one sample pair. The stored level always becomes `primary`.
    pub fn transition(&mut self, primary: Level, secondary: Level) -> Option<ManualStep> {
        let step = (primary != self.last_primary).then(|| direction(primary, secondary));
        self.last_primary = primary;
        step
    }

    /// Sample the encoder; the secondary channel is read only when an edge fired.
    ///
    /// A fired edge is consumed even if the secondary read then fails.
    pub fn poll<E: QuadratureEncoder + ?Sized>(
        &mut self,
        encoder: &mut E,
    ) -> Result<Option<ManualStep>, DeviceError> {
        let primary = encoder.primary()?;
        if primary == self.last_primary {
            return Ok(None);
        }
        self.last_primary = primary;
        let secondary = encoder.secondary()?;
        Ok(Some(direction(primary, secondary)))
    }
}

#[inline]
fn direction(primary: Level, secondary: Level) -> ManualStep {
    if secondary != primary {
        ManualStep::Up
    } else {
        ManualStep::Down
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Level::Low, Level::High, Level::Low, Some(ManualStep::Up))]
    #[case(Level::Low, Level::High, Level::High, Some(ManualStep::Down))]
    #[case(Level::High, Level::Low, Level::High, Some(ManualStep::Up))]
    #[case(Level::High, Level::Low, Level::Low, Some(ManualStep::Down))]
    #[case(Level::High, Level::High, Level::Low, None)]
    #[case(Level::Low, Level::Low, Level::High, None)]
    fn edge_table(
        #[case] last: Level,
        #[case] primary: Level,
        #[case] secondary: Level,
        #[case] expected: Option<ManualStep>,
    ) {
        let mut det = EdgeDetector::new(last);
        assert_eq!(det.transition(primary, secondary), expected);
        assert_eq!(det.last_primary(), primary);
    }

    #[test]
    fn each_bounce_is_a_step() {
        let mut det = EdgeDetector::new(Level::High);
        let steps: Vec<_> = [Level::Low, Level::High, Level::Low]
            .into_iter()
            .filter_map(|p| det.transition(p, Level::High))
            .collect();
        assert_eq!(steps.len(), 3);
    }

    struct FlakyDt {
        clk: Level,
        dt_fails: bool,
    }

    impl QuadratureEncoder for FlakyDt {
        fn primary(&mut self) -> Result<Level, DeviceError> {
            Ok(self.clk)
        }

        fn secondary(&mut self) -> Result<Level, DeviceError> {
            if self.dt_fails {
                Err("dt read failed".into())
            } else {
                Ok(Level::High)
            }
        }
    }

    #[test]
    fn failed_secondary_read_still_consumes_edge() {
        let mut det = EdgeDetector::new(Level::High);
        let mut enc = FlakyDt {
            clk: Level::Low,
            dt_fails: true,
        };
        assert!(det.poll(&mut enc).is_err());
        assert_eq!(det.last_primary(), Level::Low);

        // no new CLK transition: no step on the next iteration
        enc.dt_fails = false;
        assert_eq!(det.poll(&mut enc).unwrap(), None);
    }

    #[test]
    fn poll_reports_edge_direction() {
        let mut det = EdgeDetector::new(Level::High);
        let mut enc = FlakyDt {
            clk: Level::Low,
            dt_fails: false,
        };
        assert_eq!(det.poll(&mut enc).unwrap(), Some(ManualStep::Up));
    }
}
