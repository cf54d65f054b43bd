//! Background stream reader
//!
//! Each source gets one named thread. The thread parses records until end of stream,
//! a stop request or a failure, inserting every point into the source's
//! [`SharedIndex`] and sending a [`StreamVertex`] to the owner of the reader. The owner
//! drains those vertices into its [`VertexBuffer`] from [`StreamReader::update`], so the
//! buffer is only ever touched by one thread.
//!
//! The hand-off channel holds at most one block's capacity of vertices. A reader whose
//! owner stops calling `update` waits on the channel instead of queueing the whole
//! source in memory.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use cloudlabel_core::{to_render_position, Colour, ColourMode, Payload, Point3d, Result, VertexBuffer};
use cloudlabel_io::{open_source, CsvOptions, RecordReader};

use crate::config::ReaderConfig;
use crate::shared::SharedIndex;

/// A point as handed from the reader thread to the render side
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamVertex {
    pub point: Point3d,
    pub colour: Colour,
    pub block: u32,
}

#[derive(Debug, Default)]
struct Status {
    stop: AtomicBool,
    finished: AtomicBool,
    failed: AtomicBool,
}

/// Reads one point source on a background thread
pub struct StreamReader {
    label: String,
    index: SharedIndex,
    vertices: VertexBuffer,
    receiver: Option<flume::Receiver<StreamVertex>>,
    status: Arc<Status>,
    handle: Option<JoinHandle<()>>,
    latest: Option<Point3d>,
}

impl StreamReader {
    /// Start reading `source` on a new thread
    pub fn spawn<R>(source: R, options: CsvOptions, config: ReaderConfig) -> Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let records = RecordReader::new(source, options)?;
        let index = SharedIndex::new();
        let status = Arc::new(Status::default());
        let (sender, receiver) = flume::bounded(config.capacity.max(1));

        let worker = Worker {
            records,
            index: index.clone(),
            status: Arc::clone(&status),
            sender,
            colour: config.colour.clone(),
            label: config.label.clone(),
        };
        let handle = thread::Builder::new()
            .name(format!("reader-{}", config.label))
            .spawn(move || worker.run())?;

        Ok(Self {
            label: config.label,
            index,
            vertices: VertexBuffer::new(config.capacity),
            receiver: Some(receiver),
            status,
            handle: Some(handle),
            latest: None,
        })
    }

    /// Start reading a file, or standard input for `-`
    pub fn open(name: &str, options: CsvOptions, config: ReaderConfig) -> Result<Self> {
        let source = open_source(name)?;
        Self::spawn(source, options, config)
    }

    /// Move every vertex read so far into the vertex buffer
    ///
    /// Positions are stored relative to `offset`. Returns the number of vertices taken,
    /// always 0 after [`StreamReader::shutdown`].
    pub fn update(&mut self, offset: &Point3d) -> usize {
        let Some(receiver) = &self.receiver else {
            return 0;
        };
        let mut count = 0;
        for vertex in receiver.try_iter() {
            self.vertices
                .add_vertex(to_render_position(&vertex.point, offset), vertex.colour, vertex.block);
            self.latest = Some(vertex.point);
            count += 1;
        }
        count
    }

    pub fn vertices(&self) -> &VertexBuffer {
        &self.vertices
    }

    /// The index the reader thread inserts into
    pub fn index(&self) -> &SharedIndex {
        &self.index
    }

    /// Last point taken by [`StreamReader::update`]
    pub fn latest_point(&self) -> Option<Point3d> {
        self.latest
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the reader thread has stopped or been asked to
    pub fn is_shutdown(&self) -> bool {
        self.status.stop.load(Ordering::Acquire) || self.status.finished.load(Ordering::Acquire)
    }

    /// Whether reading stopped on an I/O or parse error
    pub fn failed(&self) -> bool {
        self.status.failed.load(Ordering::Acquire)
    }

    /// Ask the reader thread to stop and wait for it
    ///
    /// The thread checks between records; a thread blocked reading a pipe returns only
    /// once the read does. Vertices not yet taken by `update` are discarded.
    pub fn shutdown(&mut self) {
        self.status.stop.store(true, Ordering::Release);
        // wakes a thread waiting for room on the channel
        self.receiver = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("reader thread for {} panicked", self.label);
            }
        }
    }
}

impl Drop for StreamReader {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Worker<R> {
    records: RecordReader<R>,
    index: SharedIndex,
    status: Arc<Status>,
    sender: flume::Sender<StreamVertex>,
    colour: ColourMode,
    label: String,
}

impl<R: BufRead> Worker<R> {
    fn run(mut self) {
        let mut count = 0usize;
        while !self.status.stop.load(Ordering::Acquire) {
            match self.records.read() {
                Ok(Some(line)) => {
                    let record = line.record;
                    self.index.insert(&record.point, Payload::new(record.id, count));
                    let colour = self.colour.colour(&record.point, record.id, record.scalar, record.colour);
                    let vertex = StreamVertex {
                        point: record.point,
                        colour,
                        block: record.block,
                    };
                    count += 1;
                    if self.sender.send(vertex).is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    log::info!("end of {} after {} points", self.label, count);
                    break;
                }
                Err(e) => {
                    log::error!("{}: {}", self.label, e);
                    self.status.failed.store(true, Ordering::Release);
                    break;
                }
            }
        }
        self.status.finished.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::{Duration, Instant};

    fn wait_for(reader: &StreamReader) {
        let start = Instant::now();
        while !reader.is_shutdown() {
            assert!(start.elapsed() < Duration::from_secs(10), "reader did not finish");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_reads_to_end() {
        let input = "0,0,0,1\n1,1,1,2\n2,2,2,2\n";
        let options = CsvOptions::new("x,y,z,id").unwrap();
        let mut reader = StreamReader::spawn(Cursor::new(input.to_string()), options, ReaderConfig::new()).unwrap();
        wait_for(&reader);
        assert!(!reader.failed());
        assert_eq!(reader.update(&Point3d::origin()), 3);
        assert_eq!(reader.vertices().size(), 3);
        assert_eq!(reader.latest_point(), Some(Point3d::new(2.0, 2.0, 2.0)));
        assert_eq!(reader.index().size(), 3);
        assert_eq!(reader.index().lock().partition(2).map(|p| p.size()), Some(2));
        reader.shutdown();
        assert!(reader.is_shutdown());
    }
}
