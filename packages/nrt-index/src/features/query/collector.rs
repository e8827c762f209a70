//! Result collectors
//!
//! `collect` is called once per hit, best score first. Returning
//! `ControlFlow::Break(())` stops delivery; hits already delivered stand.

use std::ops::ControlFlow;

pub trait ResultCollector<K> {
    fn collect(&mut self, key: K, score: f32) -> ControlFlow<()>;
}

impl<K, F> ResultCollector<K> for F
where
    F: FnMut(K, f32) -> ControlFlow<()>,
{
    fn collect(&mut self, key: K, score: f32) -> ControlFlow<()> {
        self(key, score)
    }
}

/// Buffers hits in rank order, optionally stopping after `max` of them.
#[derive(Debug, Clone)]
pub struct VecCollector<K> {
    hits: Vec<(K, f32)>,
    max: Option<usize>,
}

impl<K> VecCollector<K> {
    pub fn new() -> Self {
        Self {
            hits: Vec::new(),
            max: None,
        }
    }

    pub fn with_max(max: usize) -> Self {
        Self {
            hits: Vec::new(),
            max: Some(max),
        }
    }

    pub fn hits(&self) -> &[(K, f32)] {
        &self.hits
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.hits.iter().map(|(key, _)| key)
    }

    pub fn into_hits(self) -> Vec<(K, f32)> {
        self.hits
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

impl<K> Default for VecCollector<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> ResultCollector<K> for VecCollector<K> {
    fn collect(&mut self, key: K, score: f32) -> ControlFlow<()> {
        self.hits.push((key, score));
        match self.max {
            Some(max) if self.hits.len() >= max => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_collector_stops_at_max() {
        let mut collector = VecCollector::with_max(2);
        assert_eq!(collector.collect(1, 3.0), ControlFlow::Continue(()));
        assert_eq!(collector.collect(2, 2.0), ControlFlow::Break(()));
        assert_eq!(collector.len(), 2);
    }

    #[test]
    fn test_closure_collector() {
        let mut seen = Vec::new();
        let mut collector = |key: u32, _score: f32| {
            seen.push(key);
            ControlFlow::Continue(())
        };
        let _ = collector.collect(7, 1.0);
        let _ = collector.collect(8, 0.5);
        assert_eq!(seen, vec![7, 8]);
    }
}
