use atfm_scan::{
    classify, classify_location, detect_tag, expand_sequence, FileStatus, LocationMatch, NodeId,
    PathMap,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[test]
fn test_udim_token_always_detected() {
    for name in ["<UDIM>", "a<UDIM>", "wall_<UDIM>.exr", "/proj/x/<UDIM>_color.tx"] {
        let tag = detect_tag(name).unwrap();
        assert_eq!(tag.matched, "<UDIM>", "{name}");
    }
}

#[test]
fn test_expansion_includes_existing_path() {
    let temp = TempDir::new().unwrap();
    let names = ["bark_u1_v1.png", "bark_u2_v1.png", "bark_U1_V2.png"];
    for name in names {
        fs::write(temp.path().join(name), b"png").unwrap();
    }

    for name in names {
        let path = format!("{}/{}", slash(temp.path()), name);
        let tag = detect_tag(name).unwrap();
        let members = expand_sequence(&path, &tag);
        assert!(members.contains(&path), "{path} not in {members:?}");
        assert_eq!(members.len(), 3);
    }
}

#[test]
fn test_scenario_in_place_existing_file() {
    let temp = TempDir::new().unwrap();
    let images = temp.path().join("sourceimages");
    fs::create_dir_all(&images).unwrap();
    fs::write(images.join("wall.png"), b"png").unwrap();
    let wall = format!("{}/wall.png", slash(&images));

    let id = NodeId::new("n1");
    let mut paths = PathMap::new();
    paths.insert(id.clone(), wall.clone());

    let result = classify(&paths);
    let in_place = classify_location(&paths, temp.path(), "/sourceimages", LocationMatch::Segment);

    assert_eq!(result.existing.get(&id), Some(&wall));
    assert!(result.missing.is_empty());
    assert_eq!(in_place.get(&id), Some(&wall));
}

#[test]
fn test_scenario_missing_tile_resolves_to_sibling() {
    let temp = TempDir::new().unwrap();
    let textures = temp.path().join("textures");
    fs::create_dir_all(&textures).unwrap();
    fs::write(textures.join("wall_u2_v1.png"), b"png").unwrap();

    let id = NodeId::new("n2");
    let mut paths = PathMap::new();
    paths.insert(id.clone(), format!("{}/wall_u1_v2.png", slash(&textures)));

    let tag = detect_tag("wall_u1_v2.png").unwrap();
    assert_eq!(tag.matched, "_u1_v2");

    let result = classify(&paths);
    let sibling = format!("{}/wall_u2_v1.png", slash(&textures));

    // The referenced tile is absent; its sequence sibling stands in for it.
    assert_eq!(result.existing.get(&id), Some(&sibling));
    assert!(result.missing.is_empty());
    assert_eq!(
        result.status(&id),
        Some(&FileStatus::Present {
            members: vec![sibling]
        })
    );
}

#[test]
fn test_untagged_missing_file() {
    let id = NodeId::new("n3");
    let mut paths = PathMap::new();
    paths.insert(id.clone(), "/no/such/dir/wall.png".to_string());

    let result = classify(&paths);
    assert!(result.existing.is_empty());
    assert_eq!(result.missing[&id], "/no/such/dir/wall.png");
    assert!(matches!(result.status(&id), Some(FileStatus::Absent { .. })));
}
