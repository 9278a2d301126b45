#![no_main]
use latexify_log::LogSummary;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let summary = LogSummary::from_log_bytes(data);
    assert!(summary.first_error.is_some() == summary.has_errors());
});
