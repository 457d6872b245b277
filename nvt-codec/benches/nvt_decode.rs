use bytes::BytesMut;
use criterion::{Criterion, criterion_group, criterion_main};
use muxnet_nvt::TelnetCodec;
use tokio_util::codec::Decoder;

fn decode_plain_text(c: &mut Criterion) {
    let line = "The quick brown fox jumps over the lazy dog.\r\n".repeat(8);
    c.bench_function("decode plain text line", |b| {
        b.iter(|| {
            let mut codec = TelnetCodec::new();
            let mut input = BytesMut::from(line.as_bytes());
            while codec.decode(&mut input).unwrap().is_some() {}
        })
    });
}

fn decode_with_negotiation(c: &mut Criterion) {
    let mut payload = Vec::new();
    payload.extend_from_slice(b"Login: ");
    payload.extend_from_slice(&[0xFF, 0xFD, 0x00]); // IAC DO BINARY
    payload.extend_from_slice(b"Password: \r\n");

    c.bench_function("decode with option negotiation", |b| {
        b.iter(|| {
            let mut codec = TelnetCodec::new();
            let mut input = BytesMut::from(&payload[..]);
            while codec.decode(&mut input).unwrap().is_some() {}
        })
    });
}

criterion_group!(benches, decode_plain_text, decode_with_negotiation);
criterion_main!(benches);
