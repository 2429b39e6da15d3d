use lockchain::{FineGrainedHashMap, Map};
use simplelog::{Config, LevelFilter, TestLogger};

fn init_logging() {
    let _ = TestLogger::init(LevelFilter::Trace, Config::default());
}

#[test]
fn main_scenario() {
    let map: FineGrainedHashMap<String, i32> = FineGrainedHashMap::with_num_buckets(2);
    assert!(!map.contains("aboba"));
    assert!(map.insert("aboba".to_string(), 10));
    assert_eq!(map.find("aboba"), Some(10));
    assert_eq!(map.insert_or_replace("aboba".to_string(), 5), Some(10));
    assert_eq!(map.find("aboba"), Some(5));
    assert!(map.contains("aboba"));

    assert!(!map.contains("zeleboba"));
    assert!(map.insert("zeleboba".to_string(), 10));
    assert!(map.contains("zeleboba"));
    map.insert_or_replace("zeleboba".to_string(), 5);
    assert_eq!(map.find("zeleboba"), Some(5));

    assert!(map.insert("dassyr".to_string(), 20));
    assert_eq!(map.find("dassyr"), Some(20));
    assert_eq!(map.find("zeleboba"), Some(5));
    assert_eq!(map.find("aboba"), Some(5));
    assert_eq!(map.len(), 3);

    assert!(map.erase("aboba"));
    assert!(!map.erase("aboba"));
    assert!(!map.contains("aboba"));
    assert_eq!(map.find("aboba"), None);
    assert_eq!(map.find("dassyr"), Some(20));
    assert_eq!(map.find("zeleboba"), Some(5));
    assert_eq!(map.len(), 2);
}

#[test]
fn insert_without_replace_reports_failure() {
    let map = FineGrainedHashMap::with_num_buckets(2);
    assert!(map.insert("k", 1));
    assert!(!map.insert("k", 2));
    assert_eq!(map.find(&"k"), Some(1));
    assert_eq!(map.len(), 1);
}

#[test]
fn erase_absent_keeps_size() {
    let map = FineGrainedHashMap::with_num_buckets(3);
    map.insert(1, ());
    assert!(!map.erase(&2));
    assert_eq!(map.len(), 1);
    assert!(map.erase(&1));
    assert!(!map.erase(&1));
    assert!(map.is_empty());
}

#[test]
fn single_bucket_chain() {
    let map = FineGrainedHashMap::with_num_buckets(1);
    for i in 0..200u32 {
        assert!(map.insert(i, i));
    }
    // Erase from the front, the back and the middle of one chain.
    assert!(map.erase(&0));
    assert!(map.erase(&199));
    assert!(map.erase(&100));
    for i in 1..199 {
        assert_eq!(map.find(&i), if i == 100 { None } else { Some(i) });
    }
    assert_eq!(map.len(), 197);
}

#[test]
fn resize_rehashes_everything() {
    init_logging();
    let mut map = FineGrainedHashMap::with_num_buckets(2);
    for i in 0..1_000u64 {
        map.insert(i, i.to_string());
    }
    map.resize(1_009);
    assert_eq!(map.num_buckets(), 1_009);
    assert_eq!(map.len(), 1_000);
    for i in 0..1_000u64 {
        assert_eq!(map.find(&i), Some(i.to_string()));
    }

    map.resize(0);
    assert_eq!(map.num_buckets(), 1_009);

    map.grow();
    assert_eq!(map.num_buckets(), 2_018);
    assert!(map.erase(&999));
    assert_eq!(map.len(), 999);
}

#[test]
fn map_moves_between_owners() {
    let map = FineGrainedHashMap::with_num_buckets(4);
    map.insert("moved", 1);
    let boxed = Box::new(map);
    let map = *boxed;
    assert_eq!(map.find(&"moved"), Some(1));
}

fn exercise<M: Map<Key = u32, Val = u32>>(map: &M) {
    assert!(map.insert(1, 1));
    assert!(!map.insert(1, 2));
    map.put(1, 3);
    assert_eq!(map.find(&1), Some(3));
    assert!(map.contains(&1));
    assert!(map.erase(&1));
    assert!(map.is_empty());
}

#[test]
fn usable_through_trait() {
    exercise(&FineGrainedHashMap::with_num_buckets(7));
}
