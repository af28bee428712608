use crate::typer::workflows::SampleResult;
use std::sync::Mutex;

/// Collects results in completion order and hands them back in input order.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    results: Mutex<Vec<SampleResult>>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, result: SampleResult) {
        let mut results = self.results.lock().unwrap_or_else(|p| p.into_inner());
        results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn finalize(self) -> Vec<SampleResult> {
        let mut results = self.results.into_inner().unwrap_or_else(|p| p.into_inner());
        results.sort_by_key(|r| r.input_order_index);
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typer::workflows::SampleJob;
    use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
    use std::{path::PathBuf, thread};

    fn result(index: usize) -> SampleResult {
        let job = SampleJob {
            index,
            sample_id: format!("sample{}", index),
            path: PathBuf::from(format!("/genomes/sample{}.fasta", index)),
        };
        SampleResult::failed(&job, "ecoli_achtman_4", "no hits".to_string())
    }

    #[test]
    fn test_finalize_orders_by_input_index() {
        let aggregator = ResultAggregator::new();
        for index in [4, 0, 3, 1, 2] {
            aggregator.insert(result(index));
        }
        assert_eq!(aggregator.len(), 5);
        let order = aggregator
            .finalize()
            .iter()
            .map(|r| r.input_order_index)
            .collect::<Vec<_>>();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_concurrent_inserts() {
        let mut indices = (0..200).collect::<Vec<_>>();
        indices.shuffle(&mut StdRng::seed_from_u64(11));
        let aggregator = ResultAggregator::new();
        thread::scope(|scope| {
            for chunk in indices.chunks(25) {
                let aggregator = &aggregator;
                scope.spawn(move || {
                    for &index in chunk {
                        aggregator.insert(result(index));
                    }
                });
            }
        });
        let results = aggregator.finalize();
        assert_eq!(results.len(), 200);
        assert!(results
            .iter()
            .enumerate()
            .all(|(i, r)| r.input_order_index == i && r.sample_id == format!("sample{}", i)));
    }
}
