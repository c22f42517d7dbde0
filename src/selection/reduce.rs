//! Redundant box removal

use super::group::SelectionGroup;

/// Remove boxes that add no volume the other boxes do not already cover.
///
/// Greedy: each pass drops the first box whose removal leaves the union
/// unchanged, then starts over. Stops after a pass that removes nothing.
/// The result depends on box order but is deterministic for a given order.
pub fn merge_boxes(group: &SelectionGroup) -> SelectionGroup {
    let mut current = group.clone();
    let mut current_volume = current.volume();

    'passes: loop {
        for i in 0..current.len() {
            let candidate = current.without(i);
            if candidate.volume() == current_volume {
                log::trace!("Dropping redundant box {:?}", current.boxes()[i]);
                current = candidate;
                current_volume = current.volume();
                continue 'passes;
            }
        }
        break;
    }

    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Aabb;

    #[test]
    fn test_contained_box_removed() {
        let group = SelectionGroup::new([
            Aabb::from_corners([0, 0, 0], [2, 2, 2]),
            Aabb::from_corners([1, 1, 1], [2, 2, 2]),
        ]);
        let merged = merge_boxes(&group);
        assert_eq!(merged.boxes(), &[Aabb::from_corners([0, 0, 0], [2, 2, 2])]);
    }

    #[test]
    fn test_partial_overlap_kept() {
        let group = SelectionGroup::new([
            Aabb::from_corners([0, 0, 0], [2, 2, 2]),
            Aabb::from_corners([1, 1, 1], [3, 3, 3]),
        ]);
        assert_eq!(merge_boxes(&group), group);
    }

    #[test]
    fn test_box_shadowed_by_union() {
        // The middle box is covered by the two halves together.
        let group = SelectionGroup::new([
            Aabb::from_corners([1, 0, 0], [3, 1, 1]),
            Aabb::from_corners([0, 0, 0], [2, 1, 1]),
            Aabb::from_corners([2, 0, 0], [4, 1, 1]),
        ]);
        let merged = merge_boxes(&group);
        assert_eq!(
            merged.boxes(),
            &[
                Aabb::from_corners([0, 0, 0], [2, 1, 1]),
                Aabb::from_corners([2, 0, 0], [4, 1, 1]),
            ]
        );
        assert_eq!(merged.volume(), group.volume());
    }

    #[test]
    fn test_duplicates_collapse_to_first_surviving() {
        let b = Aabb::from_corners([0, 0, 0], [1, 1, 1]);
        let merged = merge_boxes(&SelectionGroup::new([b, b, b]));
        assert_eq!(merged.boxes(), &[b]);
    }

    #[test]
    fn test_never_grows_or_changes_volume() {
        let group = SelectionGroup::new([
            Aabb::from_corners([0, 0, 0], [4, 4, 4]),
            Aabb::from_corners([1, 1, 1], [3, 3, 3]),
            Aabb::from_corners([3, 0, 0], [6, 2, 2]),
            Aabb::from_corners([5, 1, 1], [6, 2, 2]),
        ]);
        let merged = merge_boxes(&group);
        assert!(merged.len() <= group.len());
        assert_eq!(merged.volume(), group.volume());
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_empty_group() {
        assert!(merge_boxes(&SelectionGroup::default()).is_empty());
    }
}
