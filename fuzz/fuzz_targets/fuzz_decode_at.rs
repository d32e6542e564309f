#![no_main]

use libfuzzer_sys::fuzz_target;
use mculink::{decode_at, RECORD_SIZE};

fuzz_target!(|data: &[u8]| {
    for offset in 0..=data.len().min(16) {
        if let Ok((record, len)) = decode_at(data, offset) {
            assert_eq!(len, RECORD_SIZE);
            assert!(!record.name().is_empty());
            assert_ne!(record.address(), 0);
        }
    }
});
