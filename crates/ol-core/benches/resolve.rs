use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ol_core::{AccessRule, Whitelist};

fn build_whitelist() -> Whitelist {
    let mut rules = vec![AccessRule::uri("WIDGET_LOCAL", false)];
    for i in 0..200 {
        rules.push(AccessRule::new(
            format!("https://site{i}.example.com/app/section{}", i % 7),
            i % 2 == 0,
            vec![format!("feature.{}", i % 11).into()],
        ));
    }
    rules.push(AccessRule::uri("https://example.com/", true));
    Whitelist::from_rules(rules, false).expect("valid rule set")
}

fn bench_resolve(c: &mut Criterion) {
    let whitelist = build_whitelist();
    // Build the index outside the measured loop.
    whitelist.is_access_allowed("https://example.com/", false);

    c.bench_function("allowed_deep_subdomain", |b| {
        b.iter(|| whitelist.is_access_allowed(black_box("https://a.b.site42.example.com/app/section0/x/y/z"), true))
    });

    c.bench_function("denied_unknown_host", |b| {
        b.iter(|| whitelist.is_access_allowed(black_box("https://evil.org/index.html"), true))
    });

    c.bench_function("features_for_url", |b| {
        b.iter(|| whitelist.get_features_for_url(black_box("https://site3.example.com/app/section3/page")))
    });
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
