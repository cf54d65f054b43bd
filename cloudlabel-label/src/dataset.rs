//! Labeled point datasets
//!
//! A [`BasicDataset`] is an in-memory [`PartitionedIndex`] plus what a viewer needs to
//! draw it: a coordinate offset, a visibility flag and a materialized vertex buffer.
//! A [`Dataset`] adds a backing file. Each line of the file is kept verbatim so that
//! saving writes the file back in its original order with only the `id` column changed.

use std::fs;
use std::path::{Path, PathBuf};

use cloudlabel_core::{
    to_render_position, Error, Extents3d, IdPalette, PartitionedIndex, Partitions, Payload, Point3d, PointMap,
    Result, VertexBuffer,
};
use cloudlabel_io::{CsvOptions, RecordReader, RecordWriter, SourceLine};

/// Coordinates larger than this make the first point the default offset
const OFFSET_THRESHOLD: f64 = 1000.0;

/// Points, partitions and render state without a backing file
#[derive(Debug, Clone)]
pub struct BasicDataset {
    index: PartitionedIndex,
    offset: Point3d,
    visible: bool,
    palette: IdPalette,
    vertices: Option<VertexBuffer>,
}

impl BasicDataset {
    pub fn new() -> Self {
        Self::with_offset(Point3d::origin())
    }

    pub fn with_offset(offset: Point3d) -> Self {
        Self {
            index: PartitionedIndex::new(),
            offset,
            visible: true,
            palette: IdPalette::new(),
            vertices: None,
        }
    }

    pub fn index(&self) -> &PartitionedIndex {
        &self.index
    }

    pub fn points(&self) -> &PointMap<Payload> {
        self.index.points()
    }

    pub fn partitions(&self) -> &Partitions {
        self.index.partitions()
    }

    pub fn partition(&self, id: u32) -> Option<&PointMap<Payload>> {
        self.index.partition(id)
    }

    pub fn extents(&self) -> &Extents3d {
        self.index.extents()
    }

    pub fn offset(&self) -> &Point3d {
        &self.offset
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Vertices for drawing, `None` when there are no points
    pub fn vertices(&self) -> Option<&VertexBuffer> {
        self.vertices.as_ref()
    }

    /// Replace the id colouring and rebuild the vertices
    pub fn set_palette(&mut self, palette: IdPalette) {
        self.palette = palette;
        self.init();
    }

    /// Rebuild the vertex buffer from the current points
    pub fn init(&mut self) {
        if self.index.is_empty() {
            self.vertices = None;
            return;
        }
        let mut vertices = VertexBuffer::new(self.index.size());
        for (point, payload) in self.index.points() {
            let position = to_render_position(&point, &self.offset);
            vertices.add_vertex(position, self.palette.colour(payload.id), 0);
        }
        self.vertices = Some(vertices);
    }

    /// Insert a single point; call [`BasicDataset::init`] before drawing
    pub fn insert(&mut self, point: &Point3d, payload: Payload) {
        self.index.insert(point, payload);
    }

    pub fn insert_map(&mut self, points: &PointMap<Payload>) {
        if points.is_empty() {
            return;
        }
        self.index.insert_map(points);
        self.init();
    }

    pub fn erase_map<U>(&mut self, points: &PointMap<U>) -> usize {
        if points.is_empty() {
            return 0;
        }
        let erased = self.index.erase_map(points);
        self.init();
        erased
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.vertices = None;
    }
}

impl Default for BasicDataset {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle of a file-backed dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetState {
    Loading,
    Ready,
    Modified,
    Invalid,
}

/// A labeled point file with its selection
#[derive(Debug)]
pub struct Dataset {
    base: BasicDataset,
    selection: BasicDataset,
    path: PathBuf,
    options: CsvOptions,
    lines: Vec<SourceLine>,
    header: Option<String>,
    explicit_offset: Option<Point3d>,
    writable: bool,
    state: DatasetState,
}

impl Dataset {
    /// Back up `path` to `path~` and load it
    ///
    /// Without an explicit `offset` the first point is used when any of its coordinates
    /// exceeds 1000, otherwise the origin. A file that fails to parse gives an
    /// [`DatasetState::Invalid`] dataset rather than an error; a file that cannot be
    /// opened or backed up is an error.
    pub fn open<P: AsRef<Path>>(
        path: P,
        options: CsvOptions,
        offset: Option<Point3d>,
        relabel_duplicated: bool,
    ) -> Result<Self> {
        if let Some(format) = &options.binary {
            return Err(Error::Unsupported(format!("binary dataset ({})", format)));
        }
        let mut dataset = Self {
            base: BasicDataset::new(),
            selection: BasicDataset::new(),
            path: path.as_ref().to_path_buf(),
            options,
            lines: Vec::new(),
            header: None,
            explicit_offset: offset,
            writable: true,
            state: DatasetState::Loading,
        };
        dataset.backup()?;
        dataset.load();
        if relabel_duplicated && dataset.valid() {
            dataset.label_duplicated();
            dataset.base.init();
        }
        Ok(dataset)
    }

    /// Open without deduplicating, converge duplicates and save
    ///
    /// Returns the number of payloads relabeled.
    pub fn repair<P: AsRef<Path>>(path: P, options: CsvOptions) -> Result<usize> {
        let path = path.as_ref();
        log::info!("repairing {}...", path.display());
        let mut dataset = Self::open(path, options, None, false)?;
        if !dataset.valid() {
            return Err(Error::Dataset(format!("failed to load {}", path.display())));
        }
        let count = dataset.label_duplicated();
        dataset.save()?;
        log::info!("repaired {}", path.display());
        Ok(count)
    }

    fn sibling_path(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }

    fn backup_path(&self) -> PathBuf {
        self.sibling_path("~")
    }

    fn backup(&self) -> Result<()> {
        let backup = self.backup_path();
        if backup.exists() {
            fs::remove_file(&backup)?;
        }
        fs::copy(&self.path, &backup)?;
        Ok(())
    }

    /// Discard everything in memory and parse the file again
    pub fn reload(&mut self) {
        self.load();
    }

    fn load(&mut self) {
        self.state = DatasetState::Loading;
        self.header = None;
        self.lines.clear();
        self.base.clear();
        self.selection.clear();
        match self.read_lines() {
            Ok(count) => {
                log::info!("loaded {} lines from {}", count, self.path.display());
                self.selection = BasicDataset::with_offset(self.base.offset);
                self.selection.set_palette(self.base.palette.clone());
                self.base.init();
                self.state = DatasetState::Ready;
            }
            Err(e) => {
                log::error!("{}: {}", self.path.display(), e);
                self.lines.clear();
                self.base.clear();
                self.state = DatasetState::Invalid;
            }
        }
    }

    fn read_lines(&mut self) -> Result<usize> {
        let mut reader = RecordReader::open(&self.path, self.options.clone())?;
        let mut offset = self.explicit_offset;
        for line in reader.by_ref() {
            let line = line?;
            let point = line.record.point;
            self.base.offset = *offset.get_or_insert_with(|| default_offset(&point));
            self.base.insert(&point, Payload::new(line.record.id, self.lines.len()));
            self.lines.push(line);
            if self.lines.len() % 10000 == 0 {
                log::debug!("loaded {} lines from {}", self.lines.len(), self.path.display());
            }
        }
        let offset = offset.unwrap_or_else(Point3d::origin);
        self.base.offset = offset;
        self.explicit_offset = Some(offset);
        self.header = reader.header().map(str::to_string);
        Ok(self.lines.len())
    }

    /// Write the file back if it has changes; returns whether anything was written
    ///
    /// Lines go to a sibling `.partial` file that replaces the dataset's file only once
    /// it is complete. On error the file on disk and the modified state are unchanged.
    pub fn save(&mut self) -> Result<bool> {
        if self.state != DatasetState::Modified {
            log::info!("no changes since last save in {}", self.path.display());
            return Ok(false);
        }
        let partial = self.sibling_path(".partial");
        let written = self.write_lines(&partial).and_then(|count| {
            fs::rename(&partial, &self.path)?;
            Ok(count)
        });
        let count = match written {
            Ok(count) => count,
            Err(e) => {
                if partial.exists() {
                    if let Err(e) = fs::remove_file(&partial) {
                        log::warn!("failed to remove {}: {}", partial.display(), e);
                    }
                }
                return Err(e);
            }
        };
        self.commit();
        log::info!("saved {} lines to {}", count, self.path.display());
        Ok(true)
    }

    /// Write every line to `path`; the dataset's own file is not touched
    fn write_lines(&self, path: &Path) -> Result<usize> {
        let mut writer = RecordWriter::create(path, self.options.clone())?;
        if let Some(header) = &self.header {
            writer.write_header(header)?;
        }
        for line in &self.lines {
            writer.write(line, line.record.id)?;
        }
        writer.finish()
    }

    /// Switch to `path` and write everything there
    pub fn save_as<P: AsRef<Path>>(&mut self, path: P) -> Result<bool> {
        log::info!("saving {} as {}...", self.path.display(), path.as_ref().display());
        self.path = path.as_ref().to_path_buf();
        if self.state == DatasetState::Ready {
            self.state = DatasetState::Modified;
        }
        self.save()
    }

    /// Mark the current labels as saved
    pub fn commit(&mut self) {
        if self.state == DatasetState::Modified {
            self.state = DatasetState::Ready;
        }
    }

    fn label_impl(&mut self, point: &Point3d, id: u32) -> usize {
        if !self.writable {
            return 0;
        }
        let lines = &mut self.lines;
        let count = self.base.index.relabel_with(point, id, |payload| {
            lines[payload.index].record.id = payload.id;
        });
        if count > 0 {
            self.state = DatasetState::Modified;
        }
        count
    }

    /// Relabel every payload at `point`; returns the number changed
    pub fn label(&mut self, point: &Point3d, id: u32) -> usize {
        let count = self.label_impl(point, id);
        if count > 0 {
            self.base.init();
        }
        count
    }

    /// Relabel every coordinate in `points`
    pub fn label_map<U>(&mut self, points: &PointMap<U>, id: u32) -> usize {
        if !self.writable {
            return 0;
        }
        let count: usize = points.keys().map(|point| self.label_impl(&point, id)).sum();
        if count > 0 {
            self.base.init();
        }
        count
    }

    /// Give every payload at a coordinate the id of the first one read from the file
    pub fn label_duplicated(&mut self) -> usize {
        if !self.writable {
            log::warn!("will not relabel duplicated points in read-only {}", self.path.display());
            return 0;
        }
        log::info!("relabeling duplicated points in {}...", self.path.display());
        let lines = &mut self.lines;
        let count = self.base.index.deduplicate(|payload| {
            lines[payload.index].record.id = payload.id;
        });
        if count > 0 {
            self.state = DatasetState::Modified;
        }
        log::info!("relabeled {} duplicated point(s)", count);
        count
    }

    pub fn base(&self) -> &BasicDataset {
        &self.base
    }

    pub fn points(&self) -> &PointMap<Payload> {
        self.base.points()
    }

    pub fn partitions(&self) -> &Partitions {
        self.base.partitions()
    }

    pub fn partition(&self, id: u32) -> Option<&PointMap<Payload>> {
        self.base.partition(id)
    }

    pub fn extents(&self) -> &Extents3d {
        self.base.extents()
    }

    pub fn offset(&self) -> &Point3d {
        self.base.offset()
    }

    pub fn vertices(&self) -> Option<&VertexBuffer> {
        self.base.vertices()
    }

    pub fn visible(&self) -> bool {
        self.base.visible()
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.base.set_visible(visible);
    }

    pub fn selection(&self) -> &BasicDataset {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut BasicDataset {
        &mut self.selection
    }

    /// Recolour the dataset and its selection
    pub fn set_palette(&mut self, palette: IdPalette) {
        self.selection.set_palette(palette.clone());
        self.base.set_palette(palette);
    }

    /// Source lines in file order, with their current ids
    pub fn lines(&self) -> &[SourceLine] {
        &self.lines
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> &CsvOptions {
        &self.options
    }

    pub fn writable(&self) -> bool {
        self.writable
    }

    pub fn set_writable(&mut self, writable: bool) {
        self.writable = writable;
    }

    pub fn state(&self) -> DatasetState {
        self.state
    }

    pub fn valid(&self) -> bool {
        matches!(self.state, DatasetState::Ready | DatasetState::Modified)
    }

    pub fn modified(&self) -> bool {
        self.state == DatasetState::Modified
    }
}

fn default_offset(point: &Point3d) -> Point3d {
    if point.iter().any(|c| *c > OFFSET_THRESHOLD) {
        *point
    } else {
        Point3d::origin()
    }
}
