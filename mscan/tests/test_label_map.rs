use mscan::config::ScanConfig;
use mscan::domain::{GuestAddr, LabelKind, LabelMapError, ObjectId, Pc};
use mscan::label_map::{LabelEvent, LabelMap, ObjectRecord, UnlabelEvent};
use mscan_common::{LABEL_BLOCK, LABEL_HEAP, LABEL_PERCPU, LABEL_STATIC};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn heap(addr: u64, bytes: u64) -> LabelEvent {
    LabelEvent::new(LABEL_HEAP, addr, bytes, 0)
}

fn free(addr: u64) -> UnlabelEvent {
    UnlabelEvent::new(LABEL_HEAP, addr)
}

#[test]
fn test_point_lookup_scenario() {
    init_logging();
    let mut map = LabelMap::new();
    map.register(&LabelEvent::new(LABEL_HEAP, 0x1000, 16, 0x4000)).unwrap();

    let a = map.lookup_point(GuestAddr(0x1008)).expect("0x1008 is inside A");
    assert_eq!(a.start(), GuestAddr(0x1000));
    assert_eq!(a.bytes(), 16);
    assert_eq!(a.alloc_pc(), Pc(0x4000));
    assert_eq!(a.kind(), LabelKind::Heap);

    assert!(map.lookup_point(GuestAddr(0x1010)).is_none(), "upper bound is exclusive");

    map.unregister(&free(0x1000), false).unwrap();
    assert!(map.lookup_point(GuestAddr(0x1008)).is_none());
}

#[test]
fn test_cacheline_scenario() {
    let mut map = LabelMap::new();
    map.register(&heap(0x1040, 8).with_name("B")).unwrap();
    map.register(&heap(0x1048, 8).with_name("C")).unwrap();

    let names: Vec<String> =
        map.lookup_cacheline(GuestAddr(0x1044)).iter().map(|o| o.name().to_string()).collect();
    assert_eq!(names, vec!["B", "C"]);
}

#[test]
fn test_zero_size_scenario() {
    let mut map = LabelMap::new();
    let err = map.register(&heap(0x2000, 0)).unwrap_err();
    assert_eq!(err, LabelMapError::ZeroSize { kind: LabelKind::Heap, addr: GuestAddr(0x2000) });
    assert!(map.is_empty());
}

#[test]
fn test_label_ending_at_top_of_address_space() {
    let mut map = LabelMap::new();
    map.register(&heap(u64::MAX - 7, 8)).unwrap();

    let object = map.lookup_point(GuestAddr(u64::MAX)).expect("top byte is covered");
    assert_eq!(object.bytes(), 8);
    assert_eq!(ids(&map.lookup_cacheline(GuestAddr(u64::MAX))), vec![object.id()]);
    assert_eq!(map.first_ending_at_or_after(GuestAddr(u64::MAX)).map(|o| o.id()), Some(object.id()));

    map.unregister(&free(u64::MAX - 7), false).unwrap();
    assert!(map.lookup_point(GuestAddr(u64::MAX)).is_none());
}

#[test]
fn test_round_trip_clears_whole_range() {
    let mut map = LabelMap::new();
    map.register(&heap(0x3000, 100)).unwrap();
    map.unregister(&free(0x3000), false).unwrap();

    for addr in 0x3000..0x3000 + 100 {
        assert!(map.lookup_point(GuestAddr(addr)).is_none());
    }
    assert!(map.lookup_cacheline(GuestAddr(0x3000)).is_empty());
}

#[test]
fn test_miss_tolerance_boundary() {
    init_logging();
    let mut map = LabelMap::new();

    for i in 0..200 {
        map.unregister(&free(0x10_0000 + i * 8), false).unwrap();
    }
    assert_eq!(map.misses(LabelKind::Heap), 200);

    let err = map.unregister(&free(0x20_0000), false).unwrap_err();
    assert!(matches!(err, LabelMapError::TooManyMisses { kind: LabelKind::Heap, misses: 201, .. }));
}

#[test]
fn test_miss_tolerance_is_per_kind() {
    let mut map = LabelMap::new();
    for _ in 0..200 {
        map.unregister(&free(0x1000), false).unwrap();
    }
    // Other kinds still have their full allowance.
    map.unregister(&UnlabelEvent::new(LABEL_STATIC, 0x1000), false).unwrap();
    map.unregister(&UnlabelEvent::new(LABEL_PERCPU, 0x1000), false).unwrap();
    assert_eq!(map.misses(LabelKind::Static), 1);
}

#[test]
fn test_configured_tolerance() {
    let config = ScanConfig::from_json(r#"{ "miss_tolerance": 0 }"#).unwrap();
    let mut map = LabelMap::with_config(&config);
    assert!(map.unregister(&free(0x1000), false).is_err());
}

#[test]
fn test_block_kind_is_a_no_op() {
    let mut map = LabelMap::new();
    map.register(&heap(0x1000, 64)).unwrap();

    map.register(&LabelEvent::new(LABEL_BLOCK, 0x1000, 4096, 0)).unwrap();
    map.unregister(&UnlabelEvent::new(LABEL_BLOCK, 0x1000), false).unwrap();
    for _ in 0..500 {
        map.unregister(&UnlabelEvent::new(LABEL_BLOCK, 0x8000), true).unwrap();
    }

    assert_eq!(map.len(), 1);
    assert_eq!(map.objects_created(), 1);
    assert_eq!(map.misses(LabelKind::Block), 0);
    assert_eq!(map.lookup_point(GuestAddr(0x1000)).unwrap().id(), ObjectId(1));
}

#[test]
fn test_query_results_are_copies() {
    let mut map = LabelMap::new();
    map.register(&heap(0x1000, 16).with_name("inode")).unwrap();

    let held = map.lookup_point(GuestAddr(0x1000)).unwrap();
    map.unregister(&free(0x1000), false).unwrap();
    map.register(&heap(0x1000, 32).with_name("dentry")).unwrap();

    assert_eq!(held.name(), "inode");
    assert_eq!(held.bytes(), 16);
    let current = map.lookup_point(GuestAddr(0x1000)).unwrap();
    assert_ne!(held, current);
    assert_eq!(current.name(), "dentry");
}

/// Brute-force reference: a flat list of live objects.
#[derive(Default)]
struct Reference {
    live: Vec<(u64, u64, ObjectId)>,
}

impl Reference {
    fn overlaps(&self, start: u64, end: u64) -> bool {
        self.live.iter().any(|&(s, e, _)| s < end && start < e)
    }

    fn point(&self, addr: u64) -> Option<ObjectId> {
        self.live.iter().find(|&&(s, e, _)| s <= addr && addr < e).map(|&(_, _, id)| id)
    }

    fn line(&self, addr: u64) -> Vec<ObjectId> {
        let first = addr & !63;
        let mut hits: Vec<_> =
            self.live.iter().filter(|&&(s, e, _)| s < first + 64 && first < e).copied().collect();
        hits.sort_by_key(|&(_, e, _)| e);
        hits.into_iter().map(|(_, _, id)| id).collect()
    }
}

fn ids(records: &[ObjectRecord]) -> Vec<ObjectId> {
    records.iter().map(ObjectRecord::id).collect()
}

#[test]
fn test_matches_reference_model() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(0x6d74_7261_6365);
    let mut map = LabelMap::new();
    let mut reference = Reference::default();
    let mut next_id = 0;

    for _ in 0..5000 {
        let addr = rng.gen_range(0..0x800u64) * 4;
        if rng.gen_bool(0.6) {
            let bytes = rng.gen_range(1..=96u64);
            let result = map.register(&heap(addr, bytes));
            if reference.overlaps(addr, addr + bytes) {
                assert!(matches!(result, Err(LabelMapError::Overlap { .. })));
            } else {
                result.unwrap();
                next_id += 1;
                reference.live.push((addr, addr + bytes, ObjectId(next_id)));
            }
        } else if let Some(pos) = reference.live.iter().position(|&(s, _, _)| s == addr) {
            map.unregister(&free(addr), false).unwrap();
            reference.live.swap_remove(pos);
        }

        let probe = rng.gen_range(0..0x2100u64);
        assert_eq!(map.lookup_point(GuestAddr(probe)).map(|o| o.id()), reference.point(probe));
        assert_eq!(ids(&map.lookup_cacheline(GuestAddr(probe))), reference.line(probe));

        if let Some(o) = map.lookup_point(GuestAddr(probe)) {
            assert!(o.contains(GuestAddr(probe)));
        }
    }

    assert_eq!(map.len(), reference.live.len());

    // Live ranges stay pairwise disjoint.
    let snapshot = map.snapshot();
    for pair in snapshot.windows(2) {
        assert!(pair[0].last() < pair[1].start());
    }
}
