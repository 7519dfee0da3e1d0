//! Test fixtures and utilities

use partsizer_core::{Key, KeyHasher, Record, XxHasher};

/// Generate a device ID for testing
pub fn device_id(i: usize) -> String {
    format!("device-{:05}", i)
}

/// `buckets * per_bucket` device IDs that hash evenly: exactly
/// `per_bucket` of them land in each bucket modulo `buckets`
pub fn balanced_device_ids(buckets: u32, per_bucket: usize) -> Vec<String> {
    let hasher = XxHasher::new();
    let mut filled = vec![0usize; buckets as usize];
    let mut ids = Vec::with_capacity(buckets as usize * per_bucket);

    for i in 0.. {
        if ids.len() == buckets as usize * per_bucket {
            break;
        }
        let id = device_id(i);
        let bucket = hasher
            .bucket(&Key::from(id.as_str()), buckets)
            .expect("buckets must be > 0") as usize;
        if filled[bucket] < per_bucket {
            filled[bucket] += 1;
            ids.push(id);
        }
    }
    ids
}

/// One process-event row
pub fn event_row(device: &str, seq: usize) -> Record {
    Record::default()
        .with("DeviceId", device)
        .with("FileName", format!("proc-{}.exe", seq % 17))
        .with("SHA256", format!("{:064x}", seq % 97))
        .with("Seq", seq as u64)
}

/// `rows_per_device` rows for every device
pub fn uniform_rows(devices: &[String], rows_per_device: usize) -> Vec<Record> {
    devices
        .iter()
        .flat_map(|d| (0..rows_per_device).map(move |i| event_row(d, i)))
        .collect()
}

/// `total_rows` rows where the first device holds `heavy_rows` and the
/// rest are spread round-robin over the remaining devices
pub fn skewed_rows(devices: &[String], heavy_rows: usize, total_rows: usize) -> Vec<Record> {
    let (heavy, rest) = devices.split_first().expect("at least one device");
    let mut rows: Vec<Record> = (0..heavy_rows).map(|i| event_row(heavy, i)).collect();
    rows.extend((0..total_rows - heavy_rows).map(|i| event_row(&rest[i % rest.len()], i)));
    rows
}
