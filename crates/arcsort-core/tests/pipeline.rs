use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use arcsort_core::{
    Destinations, JobReport, JobStatus, ProgressEvent, ProgressObserver, RunConfig, RunSummary,
    ScanError, process_archives,
};

fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
    for (name, body) in entries {
        writer
            .start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(body).unwrap();
    }
    writer.finish().unwrap();
}

fn write_tar(path: &Path, entries: &[(&str, &[u8])]) {
    let mut builder = tar::Builder::new(File::create(path).unwrap());
    for (name, body) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *body).unwrap();
    }
    builder.into_inner().unwrap().sync_all().unwrap();
}

fn crc32(bytes: &[u8]) -> u32 {
    let mut crc = flate2::Crc::new();
    crc.update(bytes);
    crc.sum()
}

fn rar_block(body: Vec<u8>) -> Vec<u8> {
    let mut out = (crc32(&body) as u16).to_le_bytes().to_vec();
    out.extend(body);
    out
}

/// RAR 4 archive with stored members, packed on a Unix host.
fn write_rar(path: &Path, entries: &[(&str, &[u8])]) {
    let mut out = b"Rar!\x1a\x07\x00".to_vec();
    out.extend(rar_block(vec![0x73, 0, 0, 13, 0, 0, 0, 0, 0, 0, 0]));
    for (name, body) in entries {
        let mut header = vec![0x74, 0x00, 0x80];
        header.extend((32 + name.len() as u16).to_le_bytes());
        header.extend((body.len() as u32).to_le_bytes());
        header.extend((body.len() as u32).to_le_bytes());
        header.push(3);
        header.extend(crc32(body).to_le_bytes());
        header.extend(0x4A21_0000u32.to_le_bytes());
        header.extend([29, 0x30]);
        header.extend((name.len() as u16).to_le_bytes());
        header.extend(0o100644u32.to_le_bytes());
        header.extend(name.as_bytes());
        out.extend(rar_block(header));
        out.extend(*body);
    }
    out.extend(rar_block(vec![0x7B, 0x00, 0x40, 7, 0]));
    std::fs::write(path, out).unwrap();
}

fn report<'a>(summary: &'a RunSummary, file_name: &str) -> &'a JobReport {
    summary
        .jobs
        .iter()
        .find(|r| r.archive.file_name().is_some_and(|n| n == file_name))
        .unwrap_or_else(|| panic!("no report for {file_name}"))
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<ProgressEvent>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl ProgressObserver for Recorder {
    fn on_event(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::JobStarted { .. } => {
                let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak.fetch_max(now, Ordering::SeqCst);
            }
            ProgressEvent::JobFinished { .. } => {
                self.active.fetch_sub(1, Ordering::SeqCst);
            }
            _ => {}
        }
        self.events.lock().unwrap().push(event.clone());
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn routes_media_into_configured_trees() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_zip(
        &input.path().join("a.zip"),
        &[("x.jpg", b"jpeg bytes"), ("y.txt", b"text")],
    );
    write_rar(&input.path().join("b.rar"), &[("z.mp4", b"video bytes")]);
    write_tar(&input.path().join("c.tar"), &[("clip.mkv", b"mkv bytes")]);

    let destinations = Destinations::default()
        .images(output.path().join("img"))
        .videos(output.path().join("vid"))
        .output(output.path().join("out"));
    let config = RunConfig::default().destinations(destinations);

    let summary = process_archives(input.path(), config, None).await.unwrap();

    assert_eq!(summary.completed(), 3);
    assert_eq!(
        std::fs::read(output.path().join("img/x.jpg")).unwrap(),
        b"jpeg bytes"
    );
    assert!(output.path().join("out/y.txt").is_file());
    assert_eq!(
        std::fs::read(output.path().join("vid/z.mp4")).unwrap(),
        b"video bytes"
    );
    assert!(output.path().join("vid/clip.mkv").is_file());
    assert!(!input.path().join("a.zip").exists());
    assert!(!input.path().join("b.rar").exists());
    assert!(!input.path().join("c.tar").exists());

    let leftovers: Vec<_> = std::fs::read_dir(input.path()).unwrap().collect();
    assert!(leftovers.is_empty(), "input dir not empty: {leftovers:?}");
}

#[tokio::test(flavor = "multi_thread")]
async fn corrupt_archive_does_not_affect_others() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_zip(
        &input.path().join("a.zip"),
        &[("x.jpg", b"jpeg bytes"), ("y.txt", b"text")],
    );
    std::fs::write(input.path().join("b.rar"), b"not a rar archive").unwrap();

    let config = RunConfig::default().destinations(
        Destinations::default()
            .images(output.path().join("img"))
            .output(output.path().join("out")),
    );
    let summary = process_archives(input.path(), config, None).await.unwrap();

    let good = report(&summary, "a.zip");
    assert_eq!(good.status, JobStatus::Completed);
    assert!(good.archive_removed);
    assert!(!input.path().join("a.zip").exists());
    assert!(output.path().join("img/x.jpg").is_file());

    let bad = report(&summary, "b.rar");
    assert_eq!(bad.status, JobStatus::Failed);
    assert_eq!(bad.error_kind, Some("container_open"));
    assert!(input.path().join("b.rar").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn no_destinations_routes_beside_archive() {
    let root = tempfile::tempdir().unwrap();
    let d = root.path().join("D");
    std::fs::create_dir(&d).unwrap();
    write_zip(
        &d.join("archive.zip"),
        &[("pic.png", b"png"), ("doc.txt", b"doc")],
    );

    let summary = process_archives(root.path(), RunConfig::default(), None)
        .await
        .unwrap();

    assert_eq!(summary.completed(), 1);
    assert!(d.join("images/pic.png").is_file());
    assert!(d.join("doc.txt").is_file());
    assert!(!d.join("archive.zip").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn wrapper_directory_is_not_reproduced() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_zip(
        &input.path().join("album.zip"),
        &[("album/2024/x.jpg", b"x"), ("album/notes.txt", b"n")],
    );

    let config =
        RunConfig::default().destinations(Destinations::default().output(output.path()));
    process_archives(input.path(), config, None).await.unwrap();

    assert!(output.path().join("2024/x.jpg").is_file());
    assert!(output.path().join("notes.txt").is_file());
    assert!(!output.path().join("album").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn in_flight_jobs_respect_the_ceiling() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    for i in 0..6 {
        let body = vec![i as u8; 200_000];
        write_zip(
            &input.path().join(format!("batch-{i}.zip")),
            &[(&format!("file-{i}.bin"), &body)],
        );
    }

    let recorder = Arc::new(Recorder::default());
    let config = RunConfig::default()
        .jobs(2)
        .destinations(Destinations::default().output(output.path()));
    let summary = process_archives(input.path(), config, Some(recorder.clone()))
        .await
        .unwrap();

    assert_eq!(summary.completed(), 6);
    assert!(recorder.peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(recorder.active.load(Ordering::SeqCst), 0);

    let events = recorder.events.lock().unwrap();
    assert!(matches!(events.first(), Some(ProgressEvent::RunStarted { jobs: 6 })));
    assert!(matches!(
        events.last(),
        Some(ProgressEvent::RunFinished { done: 6, total: 6 })
    ));

    // Per-job extraction progress is monotonic and ends at its total.
    for job in 0..6 {
        let bytes: Vec<(u64, u64)> = events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Extracted { job: id, bytes, total } if id.0 == job => {
                    Some((*bytes, *total))
                }
                _ => None,
            })
            .collect();
        assert!(bytes.windows(2).all(|w| w[0].0 <= w[1].0));
        assert_eq!(bytes.last(), Some(&(200_000, 200_000)));
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn summary_serializes_to_json() {
    let input = tempfile::tempdir().unwrap();
    std::fs::write(input.path().join("broken.7z"), b"garbage").unwrap();

    let config = RunConfig::default().keep_archives(true);
    let summary = process_archives(input.path(), config, None).await.unwrap();
    let json = serde_json::to_value(&summary).unwrap();

    assert_eq!(json["jobs"][0]["status"], "failed");
    assert_eq!(json["jobs"][0]["error_kind"], "container_open");
    assert_eq!(json["jobs"][0]["id"], 0);
}

#[tokio::test]
async fn unreadable_root_ends_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let err = process_archives(dir.path().join("missing"), RunConfig::default(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ScanError::Root { .. }));
}
