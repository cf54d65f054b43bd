use std::fs;
use std::io::{self, BufReader, Cursor, Read};
use std::thread;
use std::time::{Duration, Instant};

use cloudlabel_core::{Colour, ColourMode, Point3d, Point3f};
use cloudlabel_io::CsvOptions;
use cloudlabel_stream::{ReaderConfig, StreamReader};

fn wait_for(reader: &StreamReader) {
    let start = Instant::now();
    while !reader.is_shutdown() {
        assert!(start.elapsed() < Duration::from_secs(10), "reader did not finish");
        thread::sleep(Duration::from_millis(1));
    }
}

/// Take vertices until the reader has stopped; returns how many were taken
fn drain(reader: &mut StreamReader, offset: &Point3d) -> usize {
    let start = Instant::now();
    let mut count = 0;
    loop {
        let finished = reader.is_shutdown();
        count += reader.update(offset);
        if finished {
            return count;
        }
        assert!(start.elapsed() < Duration::from_secs(10), "reader did not finish");
        thread::sleep(Duration::from_millis(1));
    }
}

fn endless(capacity: usize) -> StreamReader {
    let source = BufReader::new(Endless { next: 0, pending: Vec::new() });
    let options = CsvOptions::new("x,y,z,id").unwrap();
    StreamReader::spawn(source, options, ReaderConfig::new().with_capacity(capacity)).unwrap()
}

fn spawn(input: &str, fields: &str, config: ReaderConfig) -> StreamReader {
    let options = CsvOptions::new(fields).unwrap();
    StreamReader::spawn(Cursor::new(input.to_string()), options, config).unwrap()
}

/// An endless source of points along the x axis
struct Endless {
    next: u64,
    pending: Vec<u8>,
}

impl Read for Endless {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            self.pending = format!("{},0,0,1\n", self.next).into_bytes();
            self.next += 1;
        }
        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }
}

#[test]
fn test_blocks_swap_read_window() {
    let input = "0,0,0,1\n1,0,0,1\n2,0,0,2\n3,0,0,2\n4,0,0,3\n";
    let mut reader = spawn(input, "x,y,z,block", ReaderConfig::new().with_capacity(4));
    assert_eq!(drain(&mut reader, &Point3d::origin()), 5);

    let vertices = reader.vertices();
    assert_eq!(vertices.block(), 3);
    let (points, _) = vertices.window();
    assert_eq!(points, &[Point3f::new(2.0, 0.0, 0.0), Point3f::new(3.0, 0.0, 0.0)]);
}

#[test]
fn test_positions_are_relative_to_offset() {
    let mut reader = spawn("1001,2002,3003\n", "x,y,z", ReaderConfig::new());
    wait_for(&reader);
    reader.update(&Point3d::new(1000.0, 2000.0, 3000.0));
    assert_eq!(reader.vertices().window().0, &[Point3f::new(1.0, 2.0, 3.0)]);
    assert_eq!(reader.index().find(&Point3d::new(1001.0, 2002.0, 3003.0)).len(), 1);
}

#[test]
fn test_colour_from_record() {
    let config = ReaderConfig::new().with_colour(ColourMode::FromRecord { fallback: Colour::WHITE });
    let mut reader = spawn("0,0,0,255,0,0\n", "x,y,z,r,g,b", config);
    wait_for(&reader);
    reader.update(&Point3d::origin());
    assert_eq!(reader.vertices().window().1, &[Colour::RED]);
}

#[test]
fn test_parse_failure_keeps_ingested_points() {
    let mut reader = spawn("0,0,0,1\n1,1,1,1\ngarbage\n2,2,2,1\n", "x,y,z,id", ReaderConfig::new());
    wait_for(&reader);
    assert!(reader.failed());
    assert_eq!(reader.update(&Point3d::origin()), 2);
    assert_eq!(reader.index().size(), 2);
    assert_eq!(reader.index().find(&Point3d::new(2.0, 2.0, 2.0)).len(), 0);
}

#[test]
fn test_shutdown_stops_endless_source() {
    let mut reader = endless(8);

    let start = Instant::now();
    while reader.index().size() < 100 {
        assert!(start.elapsed() < Duration::from_secs(10), "reader made no progress");
        reader.update(&Point3d::origin());
        thread::sleep(Duration::from_millis(1));
    }
    // queries and relabels are safe while the reader is inserting
    let found = reader.index().find_range(&Point3d::new(0.0, 0.0, 0.0), &Point3d::new(9.0, 0.0, 0.0));
    assert_eq!(found.size(), 10);
    assert_eq!(reader.index().relabel(&Point3d::new(5.0, 0.0, 0.0), 42), 1);

    reader.shutdown();
    assert!(reader.is_shutdown());
    assert!(!reader.failed());
    let size = reader.index().size();
    thread::sleep(Duration::from_millis(10));
    assert_eq!(reader.index().size(), size);
    assert_eq!(reader.update(&Point3d::origin()), 0);
    assert!(reader.vertices().size() <= 8);
}

#[test]
fn test_reader_waits_for_owner_to_take_vertices() {
    let mut reader = endless(8);

    // eight vertices fill the channel and the ninth point waits to be sent
    let start = Instant::now();
    while reader.index().size() < 9 {
        assert!(start.elapsed() < Duration::from_secs(10), "reader made no progress");
        thread::sleep(Duration::from_millis(1));
    }
    thread::sleep(Duration::from_millis(50));
    assert_eq!(reader.index().size(), 9);
    assert!(!reader.is_shutdown());

    assert!(reader.update(&Point3d::origin()) >= 8);
    let start = Instant::now();
    while reader.index().size() <= 9 {
        assert!(start.elapsed() < Duration::from_secs(10), "reader did not resume");
        thread::sleep(Duration::from_millis(1));
    }

    // shutdown must not hang on a reader waiting for room
    thread::sleep(Duration::from_millis(20));
    reader.shutdown();
    assert!(reader.is_shutdown());
    assert!(!reader.failed());
}

#[test]
fn test_open_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.csv");
    fs::write(&path, "0,0,0\n1,0,0\n").unwrap();
    let options = CsvOptions::new("x,y,z").unwrap();
    let path = path.to_str().unwrap().to_string();
    let mut reader = StreamReader::open(&path, options, ReaderConfig::new().with_label("file")).unwrap();
    wait_for(&reader);
    assert_eq!(reader.update(&Point3d::origin()), 2);
    assert_eq!(reader.label(), "file");
}

#[test]
fn test_independent_sources() {
    let mut a = spawn("0,0,0\n", "x,y,z", ReaderConfig::new().with_label("a"));
    let mut b = spawn("1,1,1\n2,2,2\n", "x,y,z", ReaderConfig::new().with_label("b"));
    wait_for(&a);
    wait_for(&b);
    assert_eq!(a.index().size(), 1);
    assert_eq!(b.index().size(), 2);
    a.shutdown();
    b.shutdown();
}
