use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use tsfile::{
    DataPoint, Path, QueryEngine, QueryExpression, SensorDescriptor, TsDataType, TsEncoding,
    TsFileSequenceReader, TsFileWriter, TsRecord, TypedValue,
};

const NUM_ITEMS: i64 = 100_000;
const BENCH_FILE: &str = "tmp/bench_codec.tsfile";

fn bench_write_sequential(encoding: TsEncoding) {
    std::fs::create_dir_all("tmp").unwrap();
    let mut writer = TsFileWriter::open(black_box(BENCH_FILE)).unwrap();
    writer
        .add_sensor(SensorDescriptor::new("s1", TsDataType::Int64, encoding))
        .unwrap();
    for i in 0..NUM_ITEMS {
        let mut record = TsRecord::new("device_1", black_box(i));
        record.add_tuple(DataPoint::new(
            "s1",
            TypedValue::Int64(black_box(i + (i % 100))),
        ));
        writer.write(&record).unwrap();
    }
    writer.close().unwrap();
    std::fs::remove_file(BENCH_FILE).unwrap();
}

fn bench_read_back() {
    let mut engine = QueryEngine::new(TsFileSequenceReader::open(BENCH_FILE).unwrap());
    let mut data_set = engine
        .query(QueryExpression::new(vec![Path::new("device_1", "s1")]))
        .unwrap();
    let mut count = 0u64;
    while let Some(row) = data_set.next().unwrap() {
        black_box(&row);
        count += 1;
    }
    assert_eq!(count, NUM_ITEMS as u64);
}

fn write_sequential(c: &mut Criterion) {
    c.bench_function(
        &format!("write sequential ts2diff 0-{NUM_ITEMS}"),
        |b| b.iter(|| bench_write_sequential(TsEncoding::Ts2Diff)),
    );
    c.bench_function(&format!("write sequential plain 0-{NUM_ITEMS}"), |b| {
        b.iter(|| bench_write_sequential(TsEncoding::Plain))
    });
}

fn read_sequential(c: &mut Criterion) {
    std::fs::create_dir_all("tmp").unwrap();
    let mut writer = TsFileWriter::open(BENCH_FILE).unwrap();
    writer
        .add_sensor(SensorDescriptor::new(
            "s1",
            TsDataType::Int64,
            TsEncoding::Ts2Diff,
        ))
        .unwrap();
    for i in 0..NUM_ITEMS {
        let mut record = TsRecord::new("device_1", i);
        record.add_tuple(DataPoint::new("s1", TypedValue::Int64(i + (i % 100))));
        writer.write(&record).unwrap();
    }
    writer.close().unwrap();

    c.bench_function(&format!("read sequential 0-{NUM_ITEMS}"), |b| {
        b.iter(bench_read_back)
    });

    std::fs::remove_file(BENCH_FILE).unwrap();
}

criterion_group!(benches, write_sequential, read_sequential);
criterion_main!(benches);
