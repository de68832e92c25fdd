use criterion::{black_box, criterion_group, criterion_main, Criterion};

use lw_rules::{
    convert_rules, deserialize_rules, generate, parse_filter_list, serialize_rules, ConversionTarget, ParserOptions,
};

const SAMPLE: &str = "[Adblock Plus 2.0; AdGuard]
! Title: Bench list
! Expires: 4 days
!+ NOT_OPTIMIZED PLATFORM(windows, mac)
!#if (adguard && !adguard_ext_safari)
example.org##.banner
example.org#@#.sponsored
example.com##p:matches-path(/foo)
example.com##+js(set, foo, 1)
example.com#%#//scriptlet('set-constant', 'a', 'b')
example.com#$#abort-on-property-read foo; log bar
example.com#?#div:has(> a[href*=\"ads\"])
example.com#$#body { padding: 0 !important; }
example.com$$script[tag-content=\"ads\"]
example.com##^script:has-text(ads)
||ads.example.com^$third-party,script,domain=a.com|~b.com
@@||example.com^$document
||example.org^$redirect=noop.js:5,xhr
/banner/*/ads.$image,1p
!#endif
";

fn sample_list() -> String {
    SAMPLE.repeat(50)
}

fn bench_parse(c: &mut Criterion) {
    let text = sample_list();
    let options = ParserOptions::default();
    c.bench_function("parse_filter_list", |b| {
        b.iter(|| parse_filter_list(black_box(&text), &options))
    });
}

fn bench_generate(c: &mut Criterion) {
    let nodes = parse_filter_list(&sample_list(), &ParserOptions::default()).into_nodes();
    c.bench_function("generate", |b| {
        b.iter(|| nodes.iter().map(generate).map(|line| line.len()).sum::<usize>())
    });
}

fn bench_binary(c: &mut Criterion) {
    let options = ParserOptions {
        include_raws: false,
        ..ParserOptions::default()
    };
    let nodes = parse_filter_list(&sample_list(), &options).into_nodes();
    let bytes = serialize_rules(&nodes).expect("serialize");

    c.bench_function("serialize_rules", |b| b.iter(|| serialize_rules(black_box(&nodes))));
    c.bench_function("deserialize_rules", |b| b.iter(|| deserialize_rules(black_box(&bytes))));
}

fn bench_convert(c: &mut Criterion) {
    let nodes: Vec<_> = parse_filter_list(&sample_list(), &ParserOptions::default())
        .into_nodes()
        .into_iter()
        .filter(|node| lw_rules::convert(node, ConversionTarget::Adg).is_ok())
        .collect();
    c.bench_function("convert_rules_adg", |b| {
        b.iter(|| convert_rules(black_box(&nodes), ConversionTarget::Adg))
    });
}

criterion_group!(benches, bench_parse, bench_generate, bench_binary, bench_convert);
criterion_main!(benches);
