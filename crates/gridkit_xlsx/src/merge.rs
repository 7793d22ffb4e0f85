//! Staging list of merge rectangles.

use crate::spec::SpecMergeRegion;

/// Passive accumulator of merge regions produced by spanning appends.
///
/// Regions are trusted: no overlap check happens here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeRegionCollector {
    l_regions: Vec<SpecMergeRegion>,
}

impl MergeRegionCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage one region.
    pub fn push(&mut self, region: SpecMergeRegion) {
        self.l_regions.push(region);
    }

    /// Staged regions in append order.
    pub fn regions(&self) -> &[SpecMergeRegion] {
        &self.l_regions
    }

    pub fn len(&self) -> usize {
        self.l_regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.l_regions.is_empty()
    }

    /// Remove all staged regions.
    pub fn clear(&mut self) {
        self.l_regions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::MergeRegionCollector;
    use crate::spec::SpecMergeRegion;

    #[test]
    fn test_collector_keeps_append_order_until_cleared() {
        let mut merges = MergeRegionCollector::new();
        let region_a = SpecMergeRegion {
            row_start: 0,
            row_end: 1,
            col_start: 0,
            col_end: 0,
        };
        let region_b = SpecMergeRegion {
            row_start: 0,
            row_end: 0,
            col_start: 1,
            col_end: 3,
        };
        merges.push(region_a);
        merges.push(region_b);

        assert_eq!(merges.regions(), &[region_a, region_b]);
        merges.clear();
        assert!(merges.is_empty());
    }
}
