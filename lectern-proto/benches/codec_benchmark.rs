use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use lectern_core::{Brush, PenPoint, Rect};
use lectern_proto::{
    decode_envelopes, encode_envelopes, read_action_record, write_action_record, Action,
    ActionKind, BrushAction, ByteReader, ByteWriter, RecordedPage, StreamEnvelope,
};

/// A stroke as recorded: brush selection, begin, `points` executes, end.
fn stroke(points: usize) -> Vec<Action> {
    let mut actions = vec![Action::new(
        0,
        ActionKind::Pen(BrushAction::new(1, Brush::default())),
    )];
    actions.push(Action::new(1, ActionKind::ToolBegin(PenPoint::new(0.1, 0.1, 0.5))));
    for i in 0..points {
        let t = i as f32 / points as f32;
        actions.push(Action::new(
            2 + i as i32,
            ActionKind::ToolExecute(PenPoint::new(t, 1.0 - t, 0.5)),
        ));
    }
    actions.push(Action::new(
        points as i32 + 2,
        ActionKind::ToolEnd(PenPoint::new(0.9, 0.9, 0.5)),
    ));
    actions
}

fn bench_action_encode(c: &mut Criterion) {
    let action = Action::new(7, ActionKind::ToolExecute(PenPoint::new(0.5, 0.5, 1.0)));

    c.bench_function("action_record_encode", |b| {
        b.iter(|| {
            let mut w = ByteWriter::with_capacity(32);
            write_action_record(&mut w, black_box(&action)).unwrap();
            black_box(w.into_inner());
        })
    });
}

fn bench_action_decode(c: &mut Criterion) {
    let mut w = ByteWriter::new();
    write_action_record(
        &mut w,
        &Action::new(7, ActionKind::ExtendView(Rect::new(0.0, 0.0, 0.5, 0.5))),
    )
    .unwrap();
    let bytes = w.into_inner();

    c.bench_function("action_record_decode", |b| {
        b.iter(|| {
            let mut r = ByteReader::new(black_box(&bytes));
            black_box(read_action_record(&mut r).unwrap());
        })
    });
}

fn bench_recorded_page_1k(c: &mut Criterion) {
    let mut page = RecordedPage::new(0, 0);
    page.static_actions = stroke(200);
    page.playback_actions = stroke(800);
    let bytes = page.to_bytes().unwrap();

    c.bench_function("recorded_page_decode_1k_actions", |b| {
        b.iter(|| black_box(RecordedPage::from_bytes(black_box(&bytes)).unwrap()))
    });
}

fn bench_envelope_stream(c: &mut Criterion) {
    let envelopes: Vec<StreamEnvelope> = stroke(500)
        .into_iter()
        .map(|action| StreamEnvelope::PagePlayback {
            document_id: 1,
            page_number: 0,
            action,
        })
        .collect();
    let bytes = encode_envelopes(&envelopes).unwrap();

    c.bench_function("envelope_stream_decode_500", |b| {
        b.iter(|| black_box(decode_envelopes(black_box(&bytes)).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_action_encode,
    bench_action_decode,
    bench_recorded_page_1k,
    bench_envelope_stream,
);
criterion_main!(benches);
