use std::fs;
use std::path::PathBuf;

use approx::assert_relative_eq;
use cloudlabel_core::{Point3d, Vector3d};
use cloudlabel_io::CsvOptions;
use cloudlabel_label::{
    fill, pick, select_clip, select_id, select_partition, Dataset, DatasetState, SelectionMode,
};
use tempfile::TempDir;

fn options() -> CsvOptions {
    CsvOptions::new("x,y,z,id,intensity").unwrap()
}

fn ids(dataset: &Dataset, point: &Point3d) -> Vec<u32> {
    dataset.points().find(point).iter().map(|payload| payload.id).collect()
}

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

const CLOUD: &str = "\
2,0,0,1,10
0,0,0,1,11
0,0,0,2,12
5,5,5,3,13
5.05,5,5,3,14
";

#[test]
fn test_open_creates_backup() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "cloud.csv", CLOUD);
    let dataset = Dataset::open(&path, options(), None, false).unwrap();
    assert!(dataset.valid());
    assert_eq!(fs::read_to_string(dir.path().join("cloud.csv~")).unwrap(), CLOUD);
    assert_eq!(dataset.points().size(), 5);
    assert_eq!(dataset.partitions().len(), 3);
}

#[test]
fn test_open_with_dedup_keeps_first_line_label() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "cloud.csv", CLOUD);
    let dataset = Dataset::open(&path, options(), None, true).unwrap();
    assert_eq!(ids(&dataset, &Point3d::origin()), vec![1, 1]);
    assert!(dataset.partition(2).is_none());
    assert!(dataset.modified());
}

#[test]
fn test_repair_rewrites_only_ids_in_file_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "cloud.csv", CLOUD);
    assert_eq!(Dataset::repair(&path, options()).unwrap(), 1);
    let repaired = fs::read_to_string(&path).unwrap();
    assert_eq!(repaired, CLOUD.replace("0,0,0,2,12", "0,0,0,1,12"));
}

#[test]
fn test_save_without_changes_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "cloud.csv", "1.000,0,0,1,7\n");
    let mut dataset = Dataset::open(&path, options(), None, false).unwrap();
    assert!(!dataset.save().unwrap());
    assert_eq!(fs::read_to_string(&path).unwrap(), "1.000,0,0,1,7\n");
}

#[test]
fn test_save_as_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "cloud.csv", CLOUD);
    let copy = dir.path().join("copy.csv");
    let mut dataset = Dataset::open(&path, options(), None, false).unwrap();

    assert_eq!(dataset.label(&Point3d::new(2.0, 0.0, 0.0), 9), 1);
    assert!(dataset.save_as(&copy).unwrap());
    assert_eq!(dataset.state(), DatasetState::Ready);
    assert_eq!(dataset.path(), copy.as_path());
    assert_eq!(fs::read_to_string(&path).unwrap(), CLOUD);
    assert!(fs::read_to_string(&copy).unwrap().starts_with("2,0,0,9,10\n"));

    dataset.label(&Point3d::new(5.0, 5.0, 5.0), 4);
    assert!(dataset.modified());
    dataset.reload();
    assert_eq!(dataset.state(), DatasetState::Ready);
    assert_eq!(ids(&dataset, &Point3d::new(5.0, 5.0, 5.0)), vec![3]);
    assert_eq!(ids(&dataset, &Point3d::new(2.0, 0.0, 0.0)), vec![9]);
}

#[test]
fn test_header_is_preserved_on_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "cloud.csv", "x,y,z,id,intensity\n0,0,0,1,5\n");
    let options = options().with_header(true);
    let mut dataset = Dataset::open(&path, options, None, false).unwrap();
    dataset.label(&Point3d::origin(), 2);
    dataset.save().unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "x,y,z,id,intensity\n0,0,0,2,5\n");
}

#[test]
fn test_failed_save_leaves_file_and_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "cloud.csv", "0,0,0\n1,1,1\n");
    let mut dataset = Dataset::open(&path, CsvOptions::new("x,y,z").unwrap(), None, false).unwrap();
    assert_eq!(dataset.label(&Point3d::origin(), 5), 1);

    assert!(dataset.save().is_err());
    assert_eq!(fs::read_to_string(&path).unwrap(), "0,0,0\n1,1,1\n");
    assert!(dataset.modified());
    assert!(!dir.path().join("cloud.csv.partial").exists());
}

#[test]
fn test_save_keeps_column_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "cloud.csv", "1.0, 2.0, 3.0, 1, 7\n4.0, 5.0, 6.0, 1, 8\n");
    let mut dataset = Dataset::open(&path, options(), None, false).unwrap();
    dataset.label(&Point3d::new(4.0, 5.0, 6.0), 12);
    assert!(dataset.save().unwrap());
    assert_eq!(fs::read_to_string(&path).unwrap(), "1.0, 2.0, 3.0, 1, 7\n4.0, 5.0, 6.0, 12, 8\n");

    let path = write(&dir, "aligned.txt", "  10.5   2.0  1  0   7\n 100.25  3.0  1  0  8\n");
    let aligned = options().with_delimiter(' ');
    let mut dataset = Dataset::open(&path, aligned, None, false).unwrap();
    dataset.label(&Point3d::new(10.5, 2.0, 1.0), 3);
    dataset.save().unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "  10.5   2.0  1  3   7\n 100.25  3.0  1  0  8\n");
}

#[test]
fn test_vertices_are_relative_to_offset() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "far.csv", "5000.25,100.5,0,1,0\n5001.75,99.5,2,1,0\n");
    let dataset = Dataset::open(&path, options(), None, false).unwrap();
    assert_relative_eq!(dataset.offset().x, 5000.25);
    assert_relative_eq!(dataset.offset().y, 100.5);

    let (points, _) = dataset.vertices().unwrap().window();
    assert_eq!(points.len(), 2);
    assert_relative_eq!(points[0].x, 0.0);
    assert_relative_eq!(points[1].x, 1.5);
    assert_relative_eq!(points[1].y, -1.0);
    assert_relative_eq!(points[1].z, 2.0);
}

#[test]
fn test_pick_nearest_within_tolerance() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "cloud.csv", CLOUD);
    let mut datasets = vec![Dataset::open(&path, options(), None, false).unwrap()];

    let picked = pick(&datasets, &Point3d::new(5.04, 5.0, 5.0), false).unwrap();
    assert_eq!(picked, (Point3d::new(5.05, 5.0, 5.0), 3));

    assert!(pick(&datasets, &Point3d::new(3.0, 0.0, 0.0), false).is_none());

    datasets[0].set_visible(false);
    assert!(pick(&datasets, &Point3d::new(5.0, 5.0, 5.0), false).is_none());
    datasets[0].set_visible(true);
    datasets[0].set_writable(false);
    assert!(pick(&datasets, &Point3d::new(5.0, 5.0, 5.0), true).is_none());
    assert!(pick(&datasets, &Point3d::new(5.0, 5.0, 5.0), false).is_some());
}

#[test]
fn test_select_and_fill() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(&dir, "a.csv", CLOUD);
    let b = write(&dir, "b.csv", "5,5,5,8,0\n9,9,9,8,0\n");
    let mut datasets = vec![
        Dataset::open(&a, options(), None, false).unwrap(),
        Dataset::open(&b, options(), None, false).unwrap(),
    ];

    let picked = (Point3d::new(5.0, 5.0, 5.0), 3);
    assert_eq!(select_partition(&mut datasets, &picked, SelectionMode::Replace), 2);
    assert_eq!(datasets[0].selection().points().size(), 2);
    assert!(datasets[1].selection().is_empty());

    // the selection is applied to every writable, visible dataset
    let changed = fill(&mut datasets, None, 6);
    assert_eq!(changed, 3);
    assert!(datasets[0].selection().is_empty());
    assert_eq!(ids(&datasets[0], &Point3d::new(5.05, 5.0, 5.0)), vec![6]);
    assert_eq!(ids(&datasets[1], &Point3d::new(5.0, 5.0, 5.0)), vec![6]);
    assert_eq!(ids(&datasets[1], &Point3d::new(9.0, 9.0, 9.0)), vec![8]);

    assert_eq!(select_id(&mut datasets, 6, SelectionMode::Replace), 3);
    assert_eq!(select_id(&mut datasets, 6, SelectionMode::Erase), 3);
    assert!(datasets.iter().all(|d| d.selection().is_empty()));
}

#[test]
fn test_fill_picked_point_without_selection() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "cloud.csv", CLOUD);
    let mut datasets = vec![Dataset::open(&path, options(), None, false).unwrap()];
    assert_eq!(fill(&mut datasets, None, 4), 0);
    let picked = (Point3d::origin(), 1);
    assert_eq!(fill(&mut datasets, Some(&picked), 4), 2);
    assert_eq!(ids(&datasets[0], &Point3d::origin()), vec![4, 4]);
}

#[test]
fn test_select_clip_modes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "cloud.csv", CLOUD);
    let mut datasets = vec![Dataset::open(&path, options(), None, false).unwrap()];
    let radius = Vector3d::new(0.5, 0.5, 0.5);

    assert_eq!(select_clip(&mut datasets, &Point3d::origin(), &radius, SelectionMode::Replace), 2);
    assert_eq!(select_clip(&mut datasets, &Point3d::new(5.0, 5.0, 5.0), &radius, SelectionMode::Append), 2);
    assert_eq!(datasets[0].selection().points().size(), 4);
    select_clip(&mut datasets, &Point3d::origin(), &radius, SelectionMode::Erase);
    assert_eq!(datasets[0].selection().points().size(), 2);
    select_clip(&mut datasets, &Point3d::new(2.0, 0.0, 0.0), &radius, SelectionMode::Replace);
    assert_eq!(datasets[0].selection().points().size(), 1);
}
