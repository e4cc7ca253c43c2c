use crate::types::Sample;

/// Append-only store for the samples of one recording.
///
/// Unlike a rolling display buffer this never evicts: a recording is short and
/// supervised, and every sample goes to the export.
#[derive(Clone, Debug, Default)]
pub struct SampleBuffer {
    samples: Vec<Sample>,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn snapshot(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(time: f64) -> Sample {
        Sample {
            time,
            raw: 500,
            resistance: 1.0e5,
            conductance: 10.0,
        }
    }

    #[test]
    fn preserves_arrival_order_without_reordering() {
        let mut buffer = SampleBuffer::new();
        assert!(buffer.is_empty());
        for t in [1.0, 1.1, 1.05, 1.2] {
            buffer.append(sample(t));
        }
        let times: Vec<f64> = buffer.snapshot().iter().map(|s| s.time).collect();
        assert_eq!(times, vec![1.0, 1.1, 1.05, 1.2]);
        assert_eq!(buffer.len(), 4);
    }
}
