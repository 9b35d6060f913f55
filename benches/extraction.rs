use criterion::{criterion_group, criterion_main, Criterion};
use std::io::{Cursor, Write};

use mailpeel::model::artifact::Artifact;
use mailpeel::output::dir::prepare_output_dir;
use mailpeel::output::writer::{OutputLimits, OutputNames, OutputWriter};
use mailpeel::{Extractor, FormatPath};
use zip::write::SimpleFileOptions;

fn message(n: usize) -> Vec<u8> {
    format!(
        "From: sender@example.com\r\n\
         To: rcpt@example.com\r\n\
         Subject: message {n}\r\n\
         Content-Type: text/plain\r\n\
         \r\n\
         {}\r\n",
        "Lorem ipsum dolor sit amet. ".repeat(64)
    )
    .into_bytes()
}

fn archive(entries: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in entries {
        writer
            .start_file(name.as_str(), SimpleFileOptions::default())
            .unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Ten inner archives of ten messages each, wrapped in one outer archive.
fn nested_fixture() -> Vec<u8> {
    let inner: Vec<_> = (0..10)
        .map(|i| {
            let messages: Vec<_> = (0..10)
                .map(|j| (format!("{i}-{j}.eml"), message(i * 10 + j)))
                .collect();
            (format!("inner-{i}.zip"), archive(&messages))
        })
        .collect();
    archive(&inner)
}

fn bench_nested_zip(c: &mut Criterion) {
    let fixture = nested_fixture();
    let out = tempfile::tempdir().unwrap();

    c.bench_function("extract_zip_zip_eml", |b| {
        b.iter(|| {
            prepare_output_dir(out.path()).unwrap();
            let writer = OutputWriter::new(out.path(), OutputNames::new(), OutputLimits::default());
            let mut extractor = Extractor::new(writer);
            let mut path: FormatPath = "ZIP,ZIP,EML".parse().unwrap();
            let summary = extractor
                .extract(Artifact::borrowed("bench.zip", &fixture), &mut path)
                .unwrap();
            summary.written.len()
        })
    });
}

criterion_group!(benches, bench_nested_zip);
criterion_main!(benches);
