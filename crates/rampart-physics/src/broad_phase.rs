use crate::aabb::Aabb;

/// Proposes the pairs of volumes worth a narrow-phase test.
///
/// Implementations return every pair `(i, j)` with `i < j` whose volumes may
/// overlap, sorted by `i` then `j`. Callers that write results per pair rely
/// on that order, so a spatial index must sort before returning.
pub trait BroadPhase: Send {
    fn candidate_pairs(&mut self, volumes: &[Aabb], out: &mut Vec<(usize, usize)>);
}

/// Every unordered pair. Quadratic, and exact for small populations.
#[derive(Debug, Clone, Copy, Default)]
pub struct PairwiseBroadPhase;

impl BroadPhase for PairwiseBroadPhase {
    fn candidate_pairs(&mut self, volumes: &[Aabb], out: &mut Vec<(usize, usize)>) {
        out.clear();
        for i in 0..volumes.len() {
            for j in (i + 1)..volumes.len() {
                out.push((i, j));
            }
        }
    }
}

/// Sort-and-sweep along the x axis: only pairs whose x extents overlap are
/// proposed.
#[derive(Debug, Default)]
pub struct SweepAxisBroadPhase {
    order: Vec<usize>,
}

impl BroadPhase for SweepAxisBroadPhase {
    fn candidate_pairs(&mut self, volumes: &[Aabb], out: &mut Vec<(usize, usize)>) {
        out.clear();
        self.order.clear();
        self.order
            .extend((0..volumes.len()).filter(|&i| !volumes[i].is_empty()));
        self.order
            .sort_by(|&a, &b| volumes[a].min.x.total_cmp(&volumes[b].min.x));

        for (n, &a) in self.order.iter().enumerate() {
            let reach = volumes[a].max.x;
            for &b in &self.order[n + 1..] {
                if volumes[b].min.x > reach {
                    break;
                }
                out.push((a.min(b), a.max(b)));
            }
        }
        out.sort_unstable();
    }
}
