#![no_main]

use libfuzzer_sys::fuzz_target;
use mculink::{scan, ScanResult, RECORD_SIZE};

fuzz_target!(|data: &[u8]| {
    let result = scan(data);
    for pair in result.entries().windows(2) {
        assert!(pair[0].offset + RECORD_SIZE <= pair[1].offset);
    }

    // NaN bounds are accepted, so compare positions rather than records.
    let again = scan(data);
    let offsets = |r: &ScanResult| r.entries().iter().map(|e| e.offset).collect::<Vec<_>>();
    assert_eq!(offsets(&again), offsets(&result));
    assert_eq!(again.reject_stats(), result.reject_stats());
});
