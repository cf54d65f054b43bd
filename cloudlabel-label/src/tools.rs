//! Labeling tools
//!
//! Headless counterparts of the interactive tools: the caller turns mouse events into
//! world coordinates and modifier keys, these functions do the picking, selection and
//! filling against a set of datasets.

use cloudlabel_core::{Extents3d, IdPalette, Payload, Point3d, PointMap, Vector3d};

use crate::dataset::Dataset;

/// Squared distance within which a stored point counts as picked
pub const PICK_DISTANCE_SQUARED: f64 = 0.01;

/// How a selection gesture combines with the existing selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    Replace,
    Append,
    Erase,
}

impl SelectionMode {
    /// Control appends, shift erases; with both held append wins
    pub fn from_modifiers(control: bool, shift: bool) -> Self {
        if control {
            SelectionMode::Append
        } else if shift {
            SelectionMode::Erase
        } else {
            SelectionMode::Replace
        }
    }

    fn describe(self) -> &'static str {
        match self {
            SelectionMode::Replace => "selected",
            SelectionMode::Append => "added to selection",
            SelectionMode::Erase => "removed from selection",
        }
    }
}

/// Nearest stored point to `point` and its id
///
/// Only points within one unit per axis are considered, and only visible datasets
/// (writable ones too if `writable_only`). Datasets are searched in order and the
/// search stops once the nearest point so far is close enough.
pub fn pick(datasets: &[Dataset], point: &Point3d, writable_only: bool) -> Option<(Point3d, u32)> {
    let query = Extents3d::around(point, &Vector3d::repeat(1.0));
    let (lower, upper) = query.bounds()?;
    let mut best: Option<(Point3d, u32)> = None;
    let mut best_distance = f64::MAX;
    for dataset in datasets {
        if !dataset.visible() || (writable_only && !dataset.writable()) {
            continue;
        }
        let found = dataset.points().find_range(lower, upper);
        for (candidate, payload) in &found {
            let distance = (candidate - point).norm_squared();
            if distance < best_distance {
                best_distance = distance;
                best = Some((candidate, payload.id));
            }
        }
        if best_distance <= PICK_DISTANCE_SQUARED {
            if let Some((found, id)) = &best {
                log::debug!("picked ({}, {}, {}) with id {}", found.x, found.y, found.z, id);
            }
            return best;
        }
    }
    None
}

fn clear_selections(datasets: &mut [Dataset]) {
    for dataset in datasets.iter_mut() {
        dataset.selection_mut().clear();
    }
}

fn apply_selection(dataset: &mut Dataset, points: &PointMap<Payload>, mode: SelectionMode) {
    match mode {
        SelectionMode::Erase => {
            dataset.selection_mut().erase_map(points);
        }
        SelectionMode::Replace | SelectionMode::Append => dataset.selection_mut().insert_map(points),
    }
}

/// Select the partition holding the picked point in the first dataset that has it
///
/// Returns the size of the partition, 0 if none was found.
pub fn select_partition(datasets: &mut [Dataset], picked: &(Point3d, u32), mode: SelectionMode) -> usize {
    if mode == SelectionMode::Replace {
        clear_selections(datasets);
    }
    let (point, id) = picked;
    for dataset in datasets.iter_mut() {
        if mode != SelectionMode::Erase && !dataset.visible() {
            continue;
        }
        let partition = match dataset.partition(*id) {
            Some(partition) if partition.contains(point) => partition.clone(),
            _ => continue,
        };
        apply_selection(dataset, &partition, mode);
        log::info!(
            "partition id {} with {} point(s) in {} {}",
            id,
            partition.size(),
            dataset.path().display(),
            mode.describe()
        );
        return partition.size();
    }
    0
}

/// Select partition `id` in every dataset; returns the number of points involved
pub fn select_id(datasets: &mut [Dataset], id: u32, mode: SelectionMode) -> usize {
    if mode == SelectionMode::Replace {
        clear_selections(datasets);
    }
    let mut count = 0;
    for dataset in datasets.iter_mut() {
        if mode != SelectionMode::Erase && !dataset.visible() {
            continue;
        }
        let partition = match dataset.partition(id) {
            Some(partition) => partition.clone(),
            None => continue,
        };
        apply_selection(dataset, &partition, mode);
        log::info!(
            "partition id {} with {} point(s) in {} {}",
            id,
            partition.size(),
            dataset.path().display(),
            mode.describe()
        );
        count += partition.size();
    }
    count
}

/// Select every point within `radius` of `centre` along each axis
pub fn select_clip(datasets: &mut [Dataset], centre: &Point3d, radius: &Vector3d, mode: SelectionMode) -> usize {
    if mode == SelectionMode::Replace {
        clear_selections(datasets);
    }
    let query = Extents3d::around(centre, &radius.abs());
    let Some((lower, upper)) = query.bounds() else {
        return 0;
    };
    let mut count = 0;
    for dataset in datasets.iter_mut() {
        if mode != SelectionMode::Erase && !dataset.visible() {
            continue;
        }
        let found = dataset.points().find_range(lower, upper);
        apply_selection(dataset, &found, mode);
        log::info!("{} point(s) from {} {}", found.size(), dataset.path().display(), mode.describe());
        count += found.size();
    }
    count
}

/// Label with `id`
///
/// With nothing selected anywhere the picked point is labeled in every dataset that
/// contains it. Otherwise each dataset's selection is labeled in every writable, visible
/// dataset and then cleared. Returns the number of payloads changed.
pub fn fill(datasets: &mut [Dataset], picked: Option<&(Point3d, u32)>, id: u32) -> usize {
    let selection_empty = datasets.iter().all(|dataset| dataset.selection().is_empty());
    let mut count = 0;
    if selection_empty {
        let Some((point, _)) = picked else {
            return 0;
        };
        for dataset in datasets.iter_mut() {
            if !dataset.points().contains(point) {
                continue;
            }
            count += dataset.label(point, id);
            log::info!(
                "({}, {}, {}) labeled with id {} in {}",
                point.x,
                point.y,
                point.z,
                id,
                dataset.path().display()
            );
        }
        return count;
    }
    for i in 0..datasets.len() {
        if datasets[i].selection().is_empty() {
            continue;
        }
        let selection = datasets[i].selection().points().clone();
        for target in datasets.iter_mut() {
            if !target.writable() || !target.visible() {
                continue;
            }
            count += target.label_map(&selection, id);
            log::info!("labeled selection with id {} in {}", id, target.path().display());
        }
        datasets[i].selection_mut().clear();
    }
    count
}

/// Reshuffle id colours and recolour every dataset
pub fn shake_colours(datasets: &mut [Dataset], palette: &mut IdPalette) {
    palette.shake();
    for dataset in datasets.iter_mut() {
        dataset.set_palette(palette.clone());
    }
}
