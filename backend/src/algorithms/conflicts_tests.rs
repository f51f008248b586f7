#[cfg(test)]
mod tests {
    use crate::algorithms::conflicts::{detect_conflicts, overlaps, CourseBlock, DetectionError};
    use crate::api::CourseId;
    use crate::models::{ClockTime, ConflictKind, Severity};
    use proptest::prelude::*;

    fn t(s: &str) -> ClockTime {
        ClockTime::parse(s).unwrap()
    }

    fn block(id: i64, day: u8, start: &str, end: &str) -> CourseBlock {
        CourseBlock::new(CourseId::new(id), format!("Course {}", id), day, t(start), t(end))
    }

    fn pairs(blocks: &[CourseBlock]) -> Vec<(i64, i64)> {
        detect_conflicts(blocks)
            .unwrap()
            .conflicts
            .iter()
            .map(|c| (c.course_a.value(), c.course_b.value()))
            .collect()
    }

    #[test]
    fn test_empty_and_single_inputs_have_no_conflicts() {
        assert!(detect_conflicts(&[]).unwrap().is_clean());
        let report = detect_conflicts(&[block(1, 0, "08:00", "09:00")]).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.skipped, 0);
    }

    #[test]
    fn test_symmetry() {
        let a = block(1, 0, "08:00", "09:30");
        let b = block(2, 0, "09:00", "10:00");
        let forward = detect_conflicts(&[a.clone(), b.clone()]).unwrap();
        let backward = detect_conflicts(&[b, a]).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_canonical_pair_order_lower_id_first() {
        let a = block(9, 0, "08:00", "09:30");
        let b = block(4, 0, "09:00", "10:00");
        assert_eq!(pairs(&[a, b]), vec![(4, 9)]);
    }

    #[test]
    fn test_boundary_touching_is_not_overlap() {
        let a = block(1, 0, "08:00", "09:00");
        let b = block(2, 0, "09:00", "10:00");
        assert!(!overlaps(&a, &b));
        assert!(pairs(&[a, b]).is_empty());
    }

    #[test]
    fn test_simple_overlap() {
        let report = detect_conflicts(&[
            block(1, 0, "08:00", "09:30"),
            block(2, 0, "09:00", "10:00"),
        ])
        .unwrap();
        assert_eq!(report.conflicts.len(), 1);
        let conflict = &report.conflicts[0];
        assert_eq!(conflict.kind, ConflictKind::TimeOverlap);
        assert_eq!(conflict.severity, Severity::High);
        assert_eq!(conflict.kinds(), vec![ConflictKind::TimeOverlap]);
        assert!(conflict.description.contains("Monday"));
        assert!(conflict.description.contains("09:00-09:30"));
    }

    #[test]
    fn test_different_days_never_conflict() {
        let a = block(1, 0, "08:00", "09:00");
        let b = block(2, 1, "08:00", "09:00");
        assert!(pairs(&[a, b]).is_empty());
    }

    #[test]
    fn test_containment_overlap() {
        let outer = block(1, 2, "08:00", "12:00");
        let inner = block(2, 2, "09:00", "10:00");
        assert_eq!(pairs(&[outer, inner]), vec![(1, 2)]);
    }

    #[test]
    fn test_identical_ranges_overlap() {
        let a = block(1, 3, "10:00", "11:00");
        let b = block(2, 3, "10:00", "11:00");
        assert_eq!(pairs(&[a, b]), vec![(1, 2)]);
    }

    #[test]
    fn test_three_mutually_overlapping_blocks_give_three_pairs() {
        let blocks = [
            block(3, 4, "10:00", "12:00"),
            block(1, 4, "09:00", "11:00"),
            block(2, 4, "10:30", "11:30"),
        ];
        assert_eq!(pairs(&blocks), vec![(1, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn test_long_block_overlaps_several_later_ones() {
        // The sweep must not stop at the first non-overlapping neighbour of a
        // shorter block.
        let blocks = [
            block(1, 0, "08:00", "18:00"),
            block(2, 0, "09:00", "10:00"),
            block(3, 0, "10:00", "11:00"),
            block(4, 0, "17:00", "19:00"),
        ];
        assert_eq!(pairs(&blocks), vec![(1, 2), (1, 3), (1, 4)]);
    }

    #[test]
    fn test_same_room_without_time_overlap_is_not_a_conflict() {
        let a = block(1, 0, "08:00", "09:00").with_room("R1");
        let b = block(2, 0, "10:00", "11:00").with_room("R1");
        assert!(pairs(&[a, b]).is_empty());
    }

    #[test]
    fn test_same_room_overlap_carries_room_annotation() {
        let a = block(1, 0, "08:00", "09:30").with_room("R1");
        let b = block(2, 0, "09:00", "10:00").with_room(" R1 ");
        let report = detect_conflicts(&[a, b]).unwrap();
        assert_eq!(report.conflicts.len(), 1);
        let conflict = &report.conflicts[0];
        assert_eq!(conflict.kind, ConflictKind::TimeOverlap);
        assert_eq!(conflict.severity, Severity::High);
        assert_eq!(conflict.shared_room.as_deref(), Some("R1"));
        assert_eq!(
            conflict.kinds(),
            vec![ConflictKind::TimeOverlap, ConflictKind::RoomConflict]
        );
        assert_eq!(report.room_conflicts(), 1);
    }

    #[test]
    fn test_blank_or_different_rooms_are_not_room_conflicts() {
        let blank = [
            block(1, 0, "08:00", "09:30").with_room("  "),
            block(2, 0, "09:00", "10:00").with_room("  "),
        ];
        assert!(detect_conflicts(&blank).unwrap().conflicts[0]
            .shared_room
            .is_none());

        let different = [
            block(1, 0, "08:00", "09:30").with_room("R1"),
            block(2, 0, "09:00", "10:00").with_room("R2"),
        ];
        assert!(detect_conflicts(&different).unwrap().conflicts[0]
            .shared_room
            .is_none());
    }

    #[test]
    fn test_malformed_blocks_are_skipped_and_counted() {
        let blocks = [
            block(1, 0, "08:00", "09:30"),
            block(2, 0, "09:00", "10:00"),
            // inverted
            block(3, 0, "10:00", "08:30"),
            // empty
            block(4, 0, "09:00", "09:00"),
            // no such weekday
            block(5, 9, "08:00", "10:00"),
        ];
        let report = detect_conflicts(&blocks).unwrap();
        assert_eq!(report.skipped, 3);
        assert_eq!(pairs(&blocks), vec![(1, 2)]);
    }

    #[test]
    fn test_duplicate_block_ids_are_rejected() {
        let blocks = [block(1, 0, "08:00", "09:00"), block(1, 1, "08:00", "09:00")];
        assert_eq!(
            detect_conflicts(&blocks).unwrap_err(),
            DetectionError::DuplicateBlock(CourseId::new(1))
        );
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let blocks = [
            block(1, 0, "08:00", "09:30").with_room("A"),
            block(2, 0, "09:00", "10:00").with_room("A"),
            block(3, 2, "13:00", "15:00"),
            block(4, 2, "14:00", "14:30"),
        ];
        assert_eq!(
            detect_conflicts(&blocks).unwrap(),
            detect_conflicts(&blocks).unwrap()
        );
    }

    fn arb_block(id: i64) -> impl Strategy<Value = CourseBlock> {
        (0u8..7, 0u16..1380, 1u16..180, prop::option::of(0u8..3)).prop_map(
            move |(day, start, len, room)| {
                let end = (start + len).min(1439);
                let mut b = CourseBlock::new(
                    CourseId::new(id),
                    format!("c{}", id),
                    day,
                    ClockTime::from_minutes(start).unwrap(),
                    ClockTime::from_minutes(end).unwrap(),
                );
                b.room = room.map(|r| format!("R{}", r));
                b
            },
        )
    }

    fn arb_blocks() -> impl Strategy<Value = Vec<CourseBlock>> {
        (0usize..25).prop_flat_map(|n| {
            (0..n as i64)
                .map(arb_block)
                .collect::<Vec<_>>()
        })
    }

    proptest! {
        #[test]
        fn prop_matches_brute_force_pairwise_scan(blocks in arb_blocks()) {
            let mut expected = Vec::new();
            for (i, a) in blocks.iter().enumerate() {
                for b in &blocks[i + 1..] {
                    if overlaps(a, b) {
                        let (x, y) = if a.id < b.id { (a.id, b.id) } else { (b.id, a.id) };
                        expected.push((x.value(), y.value()));
                    }
                }
            }
            expected.sort();
            prop_assert_eq!(pairs(&blocks), expected);
        }

        #[test]
        fn prop_order_independent(blocks in arb_blocks()) {
            let mut reversed = blocks.clone();
            reversed.reverse();
            prop_assert_eq!(
                detect_conflicts(&blocks).unwrap(),
                detect_conflicts(&reversed).unwrap()
            );
        }

        #[test]
        fn prop_no_self_conflicts(blocks in arb_blocks()) {
            let report = detect_conflicts(&blocks).unwrap();
            for conflict in &report.conflicts {
                prop_assert!(conflict.course_a < conflict.course_b);
            }
        }
    }
}
