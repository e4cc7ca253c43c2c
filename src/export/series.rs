use matrw::{matvar, MatVariable};
use ndarray::Array1;

use crate::drivers::GsrError;
use crate::export::matfile::{column, scalar};
use crate::types::Sample;

/// Summary figures reported after a recording.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeriesStats {
    pub count: usize,
    pub duration_s: f64,
    pub min_conductance: f64,
    pub mean_conductance: f64,
    pub max_conductance: f64,
}

/// Time-normalized view of a recording, ready to be written out.
#[derive(Clone, Debug)]
pub struct ExportSeries {
    pub time: Array1<f64>,
    pub conductance: Array1<f64>,
    pub sampling_rate_hz: f64,
    pub stats: SeriesStats,
}

impl ExportSeries {
    pub fn from_samples(samples: &[Sample], fallback_rate_hz: f64) -> Result<Self, GsrError> {
        if samples.is_empty() {
            return Err(GsrError::EmptyBuffer);
        }
        let time = normalized_times(samples);
        let conductance: Array1<f64> = samples.iter().map(|s| s.conductance).collect();
        let sampling_rate_hz = estimate_sampling_rate(&time, fallback_rate_hz);
        let stats = SeriesStats {
            count: samples.len(),
            duration_s: time[time.len() - 1],
            min_conductance: conductance.fold(f64::INFINITY, |acc, &v| acc.min(v)),
            mean_conductance: conductance.mean().unwrap_or(0.0),
            max_conductance: conductance.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v)),
        };
        Ok(Self {
            time,
            conductance,
            sampling_rate_hz,
            stats,
        })
    }

    /// Builds the `data` struct Ledalab imports: column vectors for the
    /// series, scalar offset and rate, and an empty event list.
    pub fn to_ledalab_record(&self) -> MatVariable {
        let conductance = column(&self.conductance.to_vec());
        let time = column(&self.time.to_vec());
        let timeoff = scalar(0.0);
        let samplingrate = scalar(self.sampling_rate_hz);
        let event = column(&[]);
        matvar!({
            conductance: conductance,
            time: time,
            timeoff: timeoff,
            samplingrate: samplingrate,
            event: event,
        })
    }
}

/// Re-bases device timestamps so the first sample sits at t = 0.
pub fn normalized_times(samples: &[Sample]) -> Array1<f64> {
    let Some(first) = samples.first() else {
        return Array1::zeros(0);
    };
    samples.iter().map(|s| s.time - first.time).collect()
}

/// `1 / mean(dt)` over consecutive samples, or `fallback_hz` when there is
/// fewer than two samples or the mean step is not positive.
pub fn estimate_sampling_rate(time: &Array1<f64>, fallback_hz: f64) -> f64 {
    if time.len() < 2 {
        return fallback_hz;
    }
    let deltas: Vec<f64> = time
        .iter()
        .zip(time.iter().skip(1))
        .map(|(prev, next)| next - prev)
        .collect();
    let mean = deltas.iter().sum::<f64>() / deltas.len() as f64;
    if mean > 0.0 {
        1.0 / mean
    } else {
        fallback_hz
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::matfile::{as_scalar, dims, field, is_record};

    fn sample(time: f64, conductance: f64) -> Sample {
        Sample {
            time,
            raw: 512,
            resistance: 1.0 / conductance,
            conductance,
        }
    }

    #[test]
    fn normalization_shifts_by_first_time() {
        let samples = [sample(12.5, 1.0), sample(12.75, 1.0), sample(13.5, 1.0)];
        let time = normalized_times(&samples);
        assert_eq!(time[0], 0.0);
        assert_eq!(time.to_vec(), vec![0.0, 0.25, 1.0]);
    }

    #[test]
    fn uniform_spacing_gives_reciprocal_rate() {
        let samples: Vec<Sample> = (0..50).map(|i| sample(3.0 + i as f64 * 0.04, 2.0)).collect();
        let series = ExportSeries::from_samples(&samples, 10.0).unwrap();
        assert!((series.sampling_rate_hz - 25.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_timing_falls_back() {
        let one = ExportSeries::from_samples(&[sample(5.0, 1.0)], 10.0).unwrap();
        assert_eq!(one.sampling_rate_hz, 10.0);
        assert_eq!(one.stats.duration_s, 0.0);

        let stuck = [sample(1.0, 1.0), sample(1.0, 1.0)];
        assert_eq!(ExportSeries::from_samples(&stuck, 7.5).unwrap().sampling_rate_hz, 7.5);

        // out-of-order stamps are passed through, not rejected
        let backwards = [sample(2.0, 1.0), sample(1.0, 1.0)];
        let series = ExportSeries::from_samples(&backwards, 10.0).unwrap();
        assert_eq!(series.time.to_vec(), vec![0.0, -1.0]);
        assert_eq!(series.sampling_rate_hz, 10.0);
    }

    #[test]
    fn empty_recording_is_an_error() {
        assert!(matches!(
            ExportSeries::from_samples(&[], 10.0),
            Err(GsrError::EmptyBuffer)
        ));
    }

    #[test]
    fn two_sample_scenario() {
        let samples = [
            Sample { time: 1.0, raw: 512, resistance: 10000.0, conductance: 0.1 },
            Sample { time: 1.1, raw: 520, resistance: 9900.0, conductance: 0.1010 },
        ];
        let series = ExportSeries::from_samples(&samples, 10.0).unwrap();
        assert_eq!(series.time[0], 0.0);
        assert!((series.time[1] - 0.1).abs() < 1e-12);
        assert!((series.sampling_rate_hz - 10.0).abs() < 1e-9);
        assert_eq!(series.stats.count, 2);
        assert_eq!(series.stats.min_conductance, 0.1);
        assert_eq!(series.stats.max_conductance, 0.1010);
        assert!((series.stats.mean_conductance - 0.1005).abs() < 1e-12);
    }

    #[test]
    fn ledalab_record_shape() {
        let samples = [sample(0.0, 1.0), sample(0.1, 2.0), sample(0.2, 3.0)];
        let record = ExportSeries::from_samples(&samples, 10.0)
            .unwrap()
            .to_ledalab_record();
        assert!(is_record(&record));
        assert_eq!(dims(field(&record, "conductance").unwrap()), vec![3, 1]);
        assert_eq!(dims(field(&record, "time").unwrap()), vec![3, 1]);
        assert_eq!(as_scalar(field(&record, "timeoff").unwrap()), Some(0.0));
        let rate = as_scalar(field(&record, "samplingrate").unwrap()).unwrap();
        assert!((rate - 10.0).abs() < 1e-9);
        let event = dims(field(&record, "event").unwrap());
        assert_eq!(event.iter().product::<usize>(), 0);
    }
}
