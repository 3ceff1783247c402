#![no_main]
use libfuzzer_sys::fuzz_target;
use logic2vcd::vcd::{ChannelSpec, ProbeRegistry, parse_vector_name};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);

    if let Some((base, bit)) = parse_vector_name(&text) {
        assert!(!base.is_empty());
        assert!(text.starts_with(base));
        assert!(text.ends_with(&format!("{bit}>")));
    }

    // Every line is one channel name.
    let channels: Vec<_> = text.lines().take(128).map(ChannelSpec::enabled).collect();
    if let Ok(registry) = ProbeRegistry::from_channels(&channels) {
        for probe in &registry {
            assert!(!probe.bits().is_empty());
            assert!(probe.bits().windows(2).all(|w| w[0].bit >= w[1].bit));
        }
    }
});
