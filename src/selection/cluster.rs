//! Contiguity clustering of selection boxes

use super::group::SelectionGroup;
use super::reduce::merge_boxes;

/// Split a selection into maximal contiguous groups.
///
/// Two boxes are connected when they touch or intersect (corner contact
/// counts). Each returned group is connected, no two groups touch, and
/// redundant boxes are removed from every group. Groups keep the order in
/// which their first box appears in the input.
pub fn contiguous_selections(selection: &SelectionGroup) -> Vec<SelectionGroup> {
    let mut clusters: Vec<SelectionGroup> = selection
        .iter()
        .map(|b| SelectionGroup::new([*b]))
        .collect();

    // Merge until a full pass makes no change
    loop {
        let mut merged_any = false;
        let mut next: Vec<SelectionGroup> = Vec::with_capacity(clusters.len());

        for cluster in clusters {
            match next.iter().position(|c| c.touches_or_intersects(&cluster)) {
                Some(i) => {
                    let combined = std::mem::take(&mut next[i]).extended(&cluster);
                    next[i] = merge_boxes(&combined);
                    merged_any = true;
                }
                None => next.push(cluster),
            }
        }

        clusters = next;
        if !merged_any {
            break;
        }
    }

    let clusters: Vec<SelectionGroup> = clusters.iter().map(merge_boxes).collect();
    log::debug!(
        "Split {} selection boxes into {} contiguous groups",
        selection.len(),
        clusters.len()
    );
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Aabb;

    fn group(boxes: &[([i32; 3], [i32; 3])]) -> SelectionGroup {
        SelectionGroup::new(boxes.iter().map(|(min, max)| Aabb::from_corners(*min, *max)))
    }

    #[test]
    fn test_empty_selection() {
        assert!(contiguous_selections(&SelectionGroup::default()).is_empty());
    }

    #[test]
    fn test_single_box() {
        let selection = group(&[([0, 0, 0], [2, 2, 2])]);
        let clusters = contiguous_selections(&selection);
        assert_eq!(clusters, vec![selection]);
    }

    #[test]
    fn test_disjoint_boxes() {
        let selection = group(&[
            ([0, 0, 0], [2, 2, 2]),
            ([3, 3, 3], [5, 5, 5]),
            ([6, 6, 6], [8, 8, 8]),
        ]);
        let clusters = contiguous_selections(&selection);
        assert_eq!(clusters.len(), 3);
        assert_eq!(clusters[0].boxes(), &selection.boxes()[..1]);
        assert_eq!(clusters[1].boxes(), &selection.boxes()[1..2]);
        assert_eq!(clusters[2].boxes(), &selection.boxes()[2..]);
    }

    #[test]
    fn test_contained_box_collapses() {
        let selection = group(&[([0, 0, 0], [2, 2, 2]), ([1, 1, 1], [2, 2, 2])]);
        let clusters = contiguous_selections(&selection);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].boxes(), &[Aabb::from_corners([0, 0, 0], [2, 2, 2])]);
    }

    #[test]
    fn test_mixed_selection() {
        let selection = group(&[
            ([0, 0, 0], [2, 2, 2]),
            ([1, 1, 1], [2, 2, 2]),
            ([1, 1, 1], [3, 3, 3]),
            ([4, 4, 4], [5, 5, 5]),
            ([5, 4, 4], [6, 6, 6]),
            ([7, 7, 7], [8, 8, 8]),
        ]);
        let boxes = selection.boxes();
        let clusters = contiguous_selections(&selection);
        assert_eq!(clusters.len(), 3);
        assert_eq!(clusters[0].boxes(), &[boxes[0], boxes[2]]);
        assert_eq!(clusters[1].boxes(), &boxes[3..5]);
        assert_eq!(clusters[2].boxes(), &boxes[5..]);
    }

    #[test]
    fn test_edge_touching_is_contiguous() {
        let selection = group(&[([0, 0, 0], [2, 2, 2]), ([2, 2, 1], [3, 3, 3])]);
        let clusters = contiguous_selections(&selection);
        assert_eq!(clusters, vec![selection]);
    }

    #[test]
    fn test_corner_touching_is_contiguous() {
        let selection = group(&[([0, 0, 0], [2, 2, 2]), ([2, 2, 2], [3, 3, 3])]);
        let clusters = contiguous_selections(&selection);
        assert_eq!(clusters, vec![selection]);
    }

    #[test]
    fn test_late_bridge_joins_earlier_groups() {
        // The last box connects the first two, which only a second pass can see.
        let selection = group(&[
            ([0, 0, 0], [1, 1, 1]),
            ([5, 0, 0], [6, 1, 1]),
            ([1, 0, 0], [5, 1, 1]),
        ]);
        let clusters = contiguous_selections(&selection);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].volume(), 6);
    }

    #[test]
    fn test_volume_preserved_and_idempotent() {
        let selection = group(&[
            ([0, 0, 0], [3, 3, 3]),
            ([2, 2, 2], [5, 5, 5]),
            ([1, 1, 1], [2, 2, 2]),
            ([10, 0, 0], [12, 2, 2]),
            ([12, 2, 2], [13, 3, 3]),
            ([-5, -5, -5], [-3, -3, -3]),
        ]);
        let clusters = contiguous_selections(&selection);
        let total: usize = clusters.iter().map(|c| c.volume()).sum();
        assert_eq!(total, selection.volume());

        for (i, a) in clusters.iter().enumerate() {
            for b in &clusters[i + 1..] {
                assert!(!a.touches_or_intersects(b));
            }
        }

        for cluster in &clusters {
            assert_eq!(contiguous_selections(cluster), vec![cluster.clone()]);
        }
    }
}
