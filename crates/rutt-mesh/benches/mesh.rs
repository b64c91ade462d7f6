use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rutt_core::settings::MeshConfig;
use rutt_core::Settings;
use rutt_fx::glitch::Glitch;
use rutt_fx::depth::DepthColorizer;
use rutt_fx::mirror::{Mirror, MirrorMode, MirrorParams};
use rutt_fx::EffectChain;
use rutt_mesh::Engine;
use rutt_source::{Pattern, PatternSource};

fn settings(w: u32, h: u32) -> Settings {
    Settings {
        horizontal_resolution: w,
        vertical_resolution: h,
        horizontal_wave: 0.3,
        vertical_wave: 0.2,
        edge_detect: true,
        show_vertical_lines: true,
        ..Settings::default()
    }
}

fn bench_tick_128x64(c: &mut Criterion) {
    let s = settings(128, 64);
    let mut engine = Engine::new(MeshConfig::default());
    let mut source = PatternSource::new(Pattern::Rings, 640, 480);

    c.bench_function("tick_128x64", |b| {
        b.iter(|| black_box(engine.tick(1.0 / 60.0, &s, &mut source)));
    });
}

fn bench_tick_512x256_overlays(c: &mut Criterion) {
    let s = settings(512, 256);
    let mut chain = EffectChain::new();
    chain.insert(Glitch::default());
    chain.insert(Mirror::new(MirrorParams {
        mode: MirrorMode::Both,
        kaleidoscope: true,
        ..MirrorParams::default()
    }));
    chain.insert(DepthColorizer::default());
    let mut engine = Engine::new(MeshConfig::default()).with_chain(chain);
    let mut source = PatternSource::new(Pattern::Gradient, 1280, 720);

    c.bench_function("tick_512x256_overlays", |b| {
        b.iter(|| black_box(engine.tick(1.0 / 60.0, &s, &mut source)));
    });
}

criterion_group!(benches, bench_tick_128x64, bench_tick_512x256_overlays);
criterion_main!(benches);
