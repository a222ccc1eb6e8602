#![no_main]

use libfuzzer_sys::fuzz_target;
use sysrelay_relay_pipeline::{FormatClassifier, MessageFormat, ParsedRfc5424Fields};

fuzz_target!(|data: &str| {
    let classifier = FormatClassifier::new().expect("classifier rules must compile");

    // 헤더가 잡히면 접두부와 타임스탬프는 항상 원문 안의 구간이어야 한다
    if let Some(header) = classifier.header(data) {
        assert!(header.start <= header.end && header.end <= data.len());
        assert!(header.from_header(data).starts_with(header.prefix));
        assert_eq!(
            header.leading(data).len() + header.from_header(data).len(),
            data.len()
        );
        let _ = header.rest(data);
    } else {
        assert_eq!(classifier.classify(data), MessageFormat::Unrecognized);
    }

    let _ = ParsedRfc5424Fields::split(data);
});
