//! Scripted sensor waveforms.

use std::collections::VecDeque;

use verdant_common::hal::driver::HalError;

/// Value source for one simulated sensor.
#[derive(Debug, Clone)]
pub enum Signal {
    /// Always the same value.
    Constant(f64),
    /// Scripted values and faults, consumed in order. Exhaustion is an I/O error.
    Sequence(VecDeque<Result<f64, HalError>>),
    /// Triangle wave bouncing between `low` and `high`.
    Ramp {
        /// Current value.
        value: f64,
        /// Change per sample.
        step: f64,
        /// Lower bound.
        low: f64,
        /// Upper bound.
        high: f64,
    },
}

impl Signal {
    /// Scripted sequence of plain values.
    pub fn sequence(values: impl IntoIterator<Item = f64>) -> Self {
        Self::Sequence(values.into_iter().map(Ok).collect())
    }

    /// Scripted sequence mixing values and faults.
    pub fn script(samples: impl IntoIterator<Item = Result<f64, HalError>>) -> Self {
        Self::Sequence(samples.into_iter().collect())
    }

    /// Next sample.
    pub fn sample(&mut self) -> Result<f64, HalError> {
        match self {
            Self::Constant(v) => Ok(*v),
            Self::Sequence(queue) => queue
                .pop_front()
                .unwrap_or_else(|| Err(HalError::Io("simulated signal exhausted".to_string()))),
            Self::Ramp {
                value,
                step,
                low,
                high,
            } => {
                let current = *value;
                let next = *value + *step;
                if next > *high || next < *low {
                    *step = -*step;
                    *value = next.clamp(*low, *high);
                } else {
                    *value = next;
                }
                Ok(current)
            }
        }
    }
}
