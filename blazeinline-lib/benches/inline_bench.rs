extern crate criterion;

use criterion::{criterion_group, criterion_main, Criterion};

use blazeinline_lib::parser::blaze_html::create_dom_tree;
use blazeinline_lib::{InlineOptions, Inliner};

fn bench_large_document(c: &mut Criterion) {
    let mut big_html = String::with_capacity(10_000_000);
    big_html.push_str("<style>.a { color: red; } p { margin: 0; } div > p.b { padding: 1px; }</style><div>");
    for i in 0..100_000 {
        if i % 2 == 0 {
            big_html.push_str("<p class=\"a b\">Test</p>");
        } else {
            big_html.push_str("<p>Test</p>");
        }
    }
    big_html.push_str("</div>");

    c.bench_function("parse_large_document", |b| {
        b.iter(|| create_dom_tree(&big_html, &InlineOptions::default()))
    });

    let inliner = Inliner::default();
    c.bench_function("inline_large_document", |b| b.iter(|| inliner.inline(&big_html)));
}

fn bench_many_rules(c: &mut Criterion) {
    let mut css = String::new();
    let mut body = String::new();
    for i in 0..500 {
        css.push_str(&format!(".c{i} {{ margin: {i}px; }} .gap-{i}-[1px] {{ gap: 1px; }}\n"));
        body.push_str(&format!("<span class=\"c{i} gap-{i}-[1px]\">{i}</span>"));
    }
    let html = format!("<style>{css}</style><div>{body}</div>");

    let inliner = Inliner::default();
    c.bench_function("inline_many_rules", |b| b.iter(|| inliner.inline_safe(&html)));
}

fn bench_deep_nesting(c: &mut Criterion) {
    let mut deep_html = String::from("<style>div div p { color: red; }</style>");
    for _ in 0..1000 {
        deep_html.push_str("<div>");
    }
    deep_html.push_str("<p>Content</p>");
    for _ in 0..1000 {
        deep_html.push_str("</div>");
    }

    let inliner = Inliner::default();
    c.bench_function("inline_deep_nesting", |b| b.iter(|| inliner.inline(&deep_html)));
}

criterion_group!(benches, bench_large_document, bench_many_rules, bench_deep_nesting);
criterion_main!(benches);
