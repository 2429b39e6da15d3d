use std::hash::Hash;

use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use log::info;
use lockchain::{FineGrainedHashMap, FineGrainedHashSet, Map, Set};
use rand::{distributions::Alphanumeric, Rng};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::sync::Arc;
use std::sync::Barrier;
use std::thread;
use std::time::Instant;

const NUM_BUCKETS: usize = 100_003;
const NUM_PAIRS: usize = 1_000_000;
const NUM_THREADS: usize = 10;

macro_rules! bench {
    ($name: expr, $body: expr) => {
        let now = Instant::now();
        $body;
        let elapsed = now.elapsed();
        info!("{} elapsed: {:.2?}", $name, elapsed);
    };
}

/// Lets the benchmark drive `DashMap` through the same interface.
struct DashMapAdapter<K: Hash + Eq, V>(DashMap<K, V>);

impl<K: Hash + Eq, V: Clone> Map for DashMapAdapter<K, V> {
    type Key = K;
    type Val = V;

    fn find(&self, key: &K) -> Option<V> {
        self.0.get(key).map(|entry| entry.value().clone())
    }

    fn contains(&self, key: &K) -> bool {
        self.0.contains_key(key)
    }

    fn insert(&self, key: K, value: V) -> bool {
        match self.0.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(value);
                true
            }
        }
    }

    fn put(&self, key: K, value: V) {
        self.0.insert(key, value);
    }

    fn erase(&self, key: &K) -> bool {
        self.0.remove(key).is_some()
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

struct DashSetAdapter<T: Hash + Eq>(DashSet<T>);

impl<T: Hash + Eq> Set for DashSetAdapter<T> {
    type Elem = T;

    fn insert(&self, elem: T) -> bool {
        self.0.insert(elem)
    }

    fn erase(&self, elem: &T) -> bool {
        self.0.remove(elem).is_some()
    }

    fn contains(&self, elem: &T) -> bool {
        self.0.contains(elem)
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

fn make_random_string() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(char::from)
        .collect()
}

fn make_random_string_pairs(n: usize) -> Vec<(String, String)> {
    (0..n)
        .map(|_| (make_random_string(), make_random_string()))
        .collect()
}

fn partition_data<T>(data: Vec<T>, num_partitions: usize) -> Vec<Vec<T>> {
    match num_partitions {
        0 => vec![],
        1 => vec![data],
        n => {
            let partition_sz = (data.len() / n).max(1);
            let mut out = Vec::new();
            let mut buf = Vec::new();
            for item in data {
                buf.push(item);
                if buf.len() == partition_sz {
                    out.push(std::mem::take(&mut buf));
                }
            }
            if !buf.is_empty() {
                out.push(buf);
            }
            out
        }
    }
}

fn bench_map_single_threaded<M: Map<Key = String, Val = String>>(name: &str, map: M, src: &[(String, String)]) {
    bench!(format!("{} single threaded", name), {
        for (key, val) in src.iter().cloned() {
            map.put(key, val);
        }
        for (key, _) in src {
            assert!(map.contains(key));
        }
    });
}

fn bench_map_multi_threaded<M>(name: &str, map: M, num_threads: usize, src: &[(String, String)])
where
    M: Map<Key = String, Val = String> + Send + Sync + 'static,
{
    let thread_data = partition_data(src.to_vec(), num_threads);
    let map = Arc::new(map);
    let start_barr = Arc::new(Barrier::new(thread_data.len() + 1));
    let end_barr = Arc::new(Barrier::new(thread_data.len() + 1));

    let mut handles = Vec::new();
    for data in thread_data {
        let tmap = map.clone();
        let t_start_barr = start_barr.clone();
        let t_end_barr = end_barr.clone();
        handles.push(thread::spawn(move || {
            t_start_barr.wait();
            for (key, val) in data.iter().cloned() {
                tmap.insert(key, val);
            }
            for (key, _) in &data {
                let _ = tmap.find(key);
            }
            for (key, _) in data.iter().step_by(2) {
                tmap.erase(key);
            }
            t_end_barr.wait();
        }));
    }

    start_barr.wait();
    let now = Instant::now();
    end_barr.wait();
    info!("{} multithreaded elapsed: {:.2?} ({} entries left)", name, now.elapsed(), map.len());

    for h in handles {
        h.join().unwrap();
    }
}

fn bench_set_multi_threaded<S>(name: &str, set: S, num_threads: usize, src: &[(String, String)])
where
    S: Set<Elem = String> + Send + Sync + 'static,
{
    let keys: Vec<String> = src.iter().map(|(key, _)| key.clone()).collect();
    let thread_data = partition_data(keys, num_threads);
    let set = Arc::new(set);
    let now = Instant::now();

    let handles: Vec<_> = thread_data
        .into_iter()
        .map(|data| {
            let tset = set.clone();
            thread::spawn(move || {
                for key in &data {
                    tset.insert(key.clone());
                }
                for key in data.iter().step_by(2) {
                    tset.erase(key);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    info!("{} multithreaded elapsed: {:.2?} ({} elements left)", name, now.elapsed(), set.len());
}

fn main() {
    TermLogger::init(LevelFilter::Info, Config::default(), TerminalMode::Mixed, ColorChoice::Auto)
        .expect("logger is initialized once");

    let input = make_random_string_pairs(NUM_PAIRS);

    info!("bench single threaded");
    bench_map_single_threaded(
        "FineGrainedHashMap",
        FineGrainedHashMap::with_num_buckets(NUM_BUCKETS),
        &input,
    );
    bench_map_single_threaded("DashMap", DashMapAdapter(DashMap::new()), &input);

    info!("bench bulk load");
    bench!("FineGrainedHashMap bulk load", {
        let mut map = FineGrainedHashMap::with_num_buckets(NUM_BUCKETS);
        map.extend(input.iter().cloned());
        map.grow();
    });

    info!("bench multi threaded");
    bench_map_multi_threaded(
        "FineGrainedHashMap",
        FineGrainedHashMap::with_num_buckets(NUM_BUCKETS),
        NUM_THREADS,
        &input,
    );
    bench_map_multi_threaded("DashMap", DashMapAdapter(DashMap::new()), NUM_THREADS, &input);
    bench_set_multi_threaded(
        "FineGrainedHashSet",
        FineGrainedHashSet::with_num_buckets(NUM_BUCKETS),
        NUM_THREADS,
        &input,
    );
    bench_set_multi_threaded("DashSet", DashSetAdapter(DashSet::new()), NUM_THREADS, &input);
}
