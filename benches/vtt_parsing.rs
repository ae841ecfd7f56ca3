use criterion::{black_box, criterion_group, criterion_main, Criterion};
use youtube_extractor::transcription::vtt::{parse_timestamp, strip_tags};
use youtube_extractor::{parse_vtt, Config};

fn timestamp(seconds: u32) -> String {
    format!("{:02}:{:02}:{:02}.000", seconds / 3600, (seconds / 60) % 60, seconds % 60)
}

/// Auto-caption style document with inline word timings
fn caption_document(cues: u32) -> String {
    let mut vtt = String::from("WEBVTT\nKind: captions\nLanguage: ko\n\n");
    for i in 0..cues {
        vtt.push_str(&format!(
            "{} --> {} align:start position:0%\n\
             오늘은<00:00:01.200><c> 가드</c><00:00:01.800><c> 패스를</c> &amp; 연습합니다 {}\n\n",
            timestamp(i * 3),
            timestamp(i * 3 + 3),
            i
        ));
    }
    vtt
}

fn bench_vtt_parsing(c: &mut Criterion) {
    let short = caption_document(50);
    let long = caption_document(2_000);

    c.bench_function("vtt_parse_50_cues", |b| b.iter(|| black_box(parse_vtt(black_box(&short)))));

    c.bench_function("vtt_parse_2000_cues", |b| b.iter(|| black_box(parse_vtt(black_box(&long)))));

    c.bench_function("vtt_strip_tags", |b| {
        b.iter(|| {
            black_box(strip_tags(black_box(
                "<v Speaker>오늘은<00:00:01.200><c> 가드</c> <i>패스</i> &lt;연습&gt;",
            )))
        })
    });

    c.bench_function("vtt_parse_timestamp", |b| {
        b.iter(|| {
            black_box(parse_timestamp(black_box("01:02:03.456")));
            black_box(parse_timestamp(black_box("02:03.456")));
        })
    });
}

fn bench_pacing(c: &mut Criterion) {
    let policy = Config::default().rate_limit_policy();
    c.bench_function("pacing_delay_lookup", |b| {
        b.iter(|| {
            for size in [1usize, 50, 51, 99, 100, 200] {
                black_box(policy.delay_for(black_box(size)));
            }
        })
    });
}

criterion_group!(benches, bench_vtt_parsing, bench_pacing);
criterion_main!(benches);
