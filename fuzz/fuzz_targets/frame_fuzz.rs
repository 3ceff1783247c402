#![no_main]
use libfuzzer_sys::fuzz_target;
use logic2vcd::vcd::{AcquisitionInfo, ChannelSpec, VcdEncoder, VcdOptions};

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    // First bytes pick the layout, the rest is sample data.
    let count = usize::from(data[0] % 40) + 1;
    let stride = usize::from(data[1] % 8);
    let chunk = usize::from(data[2]) + 1;
    let payload = &data[3..];

    let channels: Vec<_> = (0..count)
        .map(|i| {
            if i % 4 == 3 {
                ChannelSpec::new(format!("v<{}>", i % 7), i % 5 != 0)
            } else {
                ChannelSpec::new(format!("c{i}"), i % 5 != 0)
            }
        })
        .collect();
    let info = AcquisitionInfo::new(channels, Some(u64::from(data[1]) * 100_000));
    let Ok(mut enc) = VcdEncoder::new(&info, VcdOptions::default()) else {
        return;
    };

    let mut out = String::new();
    for frame in payload.chunks(chunk) {
        match enc.process_frame(frame, stride) {
            Ok(text) => out.push_str(&text),
            Err(_) => assert_eq!(stride, 0),
        }
    }

    let stats = enc.finish();
    assert_eq!(stats.bytes_out, out.len() as u64);
    assert!(stats.samples_emitted <= stats.samples_in);
});
