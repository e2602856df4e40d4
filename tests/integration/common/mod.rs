//! Common utilities for integration tests.

pub mod localstack;

pub use localstack::LocalStackTestContext;

use flate2::read::GzDecoder;
use lr_traits::memory::MemoryObjectStore;

/// A log basename dated `date`, numbered `n` within the day.
pub fn log_name(date: &str, n: usize) -> String {
    format!("{date}-{:02}-{:02}-{:02}-{:016X}", n / 3600 % 24, n / 60 % 60, n % 60, n)
}

/// Store `count` logs per date under `dir`.
pub fn put_logs(
    store: &MemoryObjectStore,
    bucket: &str,
    dir: &str,
    dates: &[&str],
    count: usize,
) {
    for date in dates {
        for n in 0..count {
            let name = log_name(date, n);
            store.put(bucket, &format!("{dir}{name}"), name.as_bytes());
        }
    }
}

/// Member names and contents of a gzip'd tarball, in archive order.
pub fn read_tarball(data: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = tar::Archive::new(GzDecoder::new(data));
    archive
        .entries()
        .unwrap()
        .map(|entry| {
            let mut entry = entry.unwrap();
            let name = entry.path().unwrap().to_string_lossy().into_owned();
            let mut contents = Vec::new();
            std::io::Read::read_to_end(&mut entry, &mut contents).unwrap();
            (name, contents)
        })
        .collect()
}
