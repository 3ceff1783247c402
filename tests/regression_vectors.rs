use chrono::NaiveDate;
use logic2vcd::vcd::{AcquisitionInfo, ChannelSpec, VcdEncoder, VcdOptions};

#[derive(Debug)]
struct Vector {
    name: String,
    channels: Vec<ChannelSpec>,
    sample_rate: Option<u64>,
    unit_size: usize,
    samples: Vec<u8>,
    body: String,
}

fn hex_to_bytes(s: &str) -> Vec<u8> {
    let s: String = s.split_whitespace().collect();
    if s.is_empty() {
        return Vec::new();
    }
    assert!(
        s.len().is_multiple_of(2),
        "hex string must have even length"
    );
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
        .collect()
}

fn load_vectors() -> Vec<Vector> {
    let manifest = include_str!("vectors/manifest.tsv");
    manifest
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .map(|line| {
            let parts: Vec<_> = line.split('|').collect();
            assert_eq!(parts.len(), 6, "invalid vector row: {line}");
            let disabled: Vec<_> = parts[2].split(',').filter(|s| !s.is_empty()).collect();
            let channels: Vec<_> = parts[1]
                .split(',')
                .map(|name| ChannelSpec::new(name, !disabled.contains(&name)))
                .collect();
            let unit_size = channels.len().div_ceil(8);
            let sample_rate = match parts[3] {
                "-" => None,
                rate => Some(rate.parse().unwrap()),
            };
            let mut body = parts[5].replace(';', "\n");
            body.push('\n');
            Vector {
                name: parts[0].to_string(),
                channels,
                sample_rate,
                unit_size,
                samples: hex_to_bytes(parts[4]),
                body,
            }
        })
        .collect()
}

fn opts() -> VcdOptions {
    VcdOptions {
        tool_name: "regress".into(),
        tool_version: "1.0".into(),
        date: NaiveDate::from_ymd_opt(2021, 6, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0),
        unit_size: None,
    }
}

fn encode(v: &Vector) -> String {
    let info = AcquisitionInfo::new(v.channels.clone(), v.sample_rate);
    let mut enc = VcdEncoder::new(&info, opts()).unwrap();
    enc.process_frame(&v.samples, v.unit_size).unwrap()
}

fn split_body(vcd: &str) -> &str {
    let marker = "$enddefinitions $end\n";
    let at = vcd.find(marker).expect("missing $enddefinitions");
    &vcd[at + marker.len()..]
}

#[test]
fn vector_database_is_non_empty() {
    let vectors = load_vectors();
    assert!(!vectors.is_empty());
}

#[test]
fn all_vectors_match_golden_body() {
    for v in load_vectors() {
        let vcd = encode(&v);
        assert_eq!(split_body(&vcd), v.body, "vector {}", v.name);
    }
}

#[test]
fn all_vectors_match_when_fed_one_sample_at_a_time() {
    for v in load_vectors() {
        let info = AcquisitionInfo::new(v.channels.clone(), v.sample_rate);
        let mut enc = VcdEncoder::new(&info, opts()).unwrap();
        let mut vcd = String::new();
        for sample in v.samples.chunks(v.unit_size) {
            vcd.push_str(&enc.process_frame(sample, v.unit_size).unwrap());
        }
        assert_eq!(split_body(&vcd), v.body, "vector {}", v.name);
    }
}

#[test]
fn full_document_for_mixed_probes() {
    let v = load_vectors()
        .into_iter()
        .find(|v| v.name == "mixed_scalar_vector")
        .unwrap();
    let expected = concat!(
        "$date Tue Jun 15 12:00:00 2021 $end\n",
        "$version regress 1.0 $end\n",
        "$comment\n",
        "  Acquisition with 3/3 probes at 1 MHz\n",
        "$end\n",
        "$timescale 1 us $end\n",
        "$scope module regress $end\n",
        "$var wire 1 ! clk $end\n",
        "$var wire 2 \" d $end\n",
        "$upscope $end\n",
        "$enddefinitions $end\n",
        "#1\n",
        "$dumpvars\n",
        "0!\n",
        "b00 \"\n",
        "$end\n",
        "#2\n",
        "1!\n",
        "b10 \"\n",
        "#4\n",
        "0!\n",
        "b11 \"\n",
    );
    assert_eq!(encode(&v), expected);
}

#[test]
fn header_without_rate_has_no_comment() {
    let v = load_vectors()
        .into_iter()
        .find(|v| v.name == "vector_gaps")
        .unwrap();
    let vcd = encode(&v);
    assert!(!vcd.contains("$comment"));
    assert!(vcd.contains("$timescale 1 ms $end\n"));
    assert!(vcd.contains("$var wire 2 ! d $end\n"));
}

#[test]
fn disabled_channels_are_counted_in_comment() {
    let v = load_vectors()
        .into_iter()
        .find(|v| v.name == "disabled_keeps_slot")
        .unwrap();
    let vcd = encode(&v);
    assert!(vcd.contains("  Acquisition with 2/3 probes at 200 kHz\n"));
    assert!(vcd.contains("$var wire 1 \" C $end\n"));
    assert!(!vcd.contains(" B $end"));
}
