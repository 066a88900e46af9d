// Run:
//   cargo bench --bench profile_pcapng -- --profile-time=5
//
//
// Use one the following to display the results:
//   ~/go/bin/pprof -svg ./target/criterion/profile_reader_pcapng\ generated/profile/profile.pb
//      + use firefox to open file `profile001.svg`
// Or
//   ~/go/bin/pprof -http "0.0.0.0:8081" ./target/criterion/profile_reader_pcapng\ generated/profile/profile.pb
//      + connect to 127.0.0.1:8081

use criterion::{criterion_group, criterion_main, Criterion};
use pcapng_codec::{
    Block, ByteOrder, EnhancedPacketBlock, InterfaceDescriptionBlock, Linktype, PcapNGReader,
    Section,
};
use pprof::criterion::{Output, PProfProfiler};

fn build_capture(num_packets: usize) -> Vec<u8> {
    let mut section = Section::new(ByteOrder::BigEndian);
    let mut out = Vec::new();
    section.write_header(&mut out).unwrap();
    let idb = section
        .new_member(InterfaceDescriptionBlock::new(Linktype::ETHERNET, 0))
        .unwrap();
    section.write_block(&idb, &mut out).unwrap();
    for i in 0..num_packets {
        let epb = EnhancedPacketBlock::new(0, vec![0x42; 60 + i % 1400]);
        section
            .write_block(&Block::EnhancedPacket(epb), &mut out)
            .unwrap();
    }
    out
}

fn do_reader_pcapng(bytes: &[u8]) {
    let reader = PcapNGReader::new(65536, bytes).expect("could not create reader");
    let num_blocks = reader.map(|b| b.expect("block")).count();
    assert_eq!(num_blocks, 5002);
}

fn profile_reader_pcapng(c: &mut Criterion) {
    let bytes = build_capture(5000);
    c.bench_function("profile_reader_pcapng generated", |b| {
        b.iter(|| do_reader_pcapng(&bytes))
    });
}

fn profiled() -> Criterion {
    //Criterion::default().with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
    Criterion::default().with_profiler(PProfProfiler::new(100, Output::Protobuf))
}

criterion_group! {
    name = benches;
    config = profiled();
    targets = profile_reader_pcapng
}
criterion_main!(benches);
