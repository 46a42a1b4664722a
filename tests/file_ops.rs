use assert_fs::TempDir;
use assert_fs::prelude::*;
use std::collections::BTreeMap;
use std::fs;

use fs_handles::prelude::*;

fn dir(t: &TempDir) -> Directory {
    Directory::from_path(t.path()).unwrap()
}

#[test]
fn copy_without_overwrite_keeps_destination() {
    let temp = TempDir::new().unwrap();
    temp.child("src/a.txt").write_str("new content").unwrap();
    temp.child("dst/a.txt").write_str("old content").unwrap();

    let src = File::from_path(temp.child("src/a.txt").path()).unwrap();
    let dst = Directory::from_path(temp.child("dst").path()).unwrap();

    let err = src.try_copy_to(&dst, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert_eq!(
        fs::read_to_string(temp.child("dst/a.txt").path()).unwrap(),
        "old content"
    );

    // Convenience forms report the same failure as a sentinel.
    assert!(src.copy_to(&dst).is_none());

    let copy = src.try_copy_to(&dst, true).unwrap();
    assert_eq!(copy.read_string().unwrap(), "new content");
    assert!(src.exists(), "copy must keep the source");
}

#[test]
fn copy_to_exact_file_destination() {
    let temp = TempDir::new().unwrap();
    temp.child("a.txt").write_str("payload").unwrap();
    let src = File::from_path(temp.child("a.txt").path()).unwrap();
    let target = File::from_path(temp.child("renamed.bin").path()).unwrap();

    let copy = src.copy_to(&target).unwrap();
    assert_eq!(copy.name(), "renamed.bin");
    assert_eq!(copy.read_data().unwrap(), b"payload");
}

#[cfg(unix)]
#[test]
fn copy_preserves_permissions_and_mtime() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let src_path = temp.child("script.sh");
    src_path.write_str("#!/bin/sh\n").unwrap();
    fs::set_permissions(src_path.path(), fs::Permissions::from_mode(0o750)).unwrap();
    let old = filetime::FileTime::from_unix_time(1_600_000_000, 0);
    filetime::set_file_mtime(src_path.path(), old).unwrap();
    temp.child("out").create_dir_all().unwrap();

    let src = File::from_path(src_path.path()).unwrap();
    let copy = src
        .try_copy_to(Directory::from_path(temp.child("out").path()).unwrap(), false)
        .unwrap();

    let meta = fs::metadata(copy.absolute_path()).unwrap();
    assert_eq!(meta.permissions().mode() & 0o777, 0o750);
    assert_eq!(filetime::FileTime::from_last_modification_time(&meta), old);
}

#[test]
fn move_removes_source_and_keeps_content() {
    let temp = TempDir::new().unwrap();
    temp.child("inbox/letter.txt").write_str("dear reader").unwrap();
    temp.child("archive").create_dir_all().unwrap();

    let src = File::from_path(temp.child("inbox/letter.txt").path()).unwrap();
    let dest = Directory::from_path(temp.child("archive").path()).unwrap();
    let moved = src.move_to(&dest).unwrap();

    assert!(!src.item_exists());
    assert_eq!(moved.read_string().unwrap(), "dear reader");
    assert_eq!(moved.parent().absolute_path(), dest.absolute_path());
}

#[test]
fn move_without_overwrite_refuses_existing_destination() {
    let temp = TempDir::new().unwrap();
    temp.child("a.txt").write_str("a").unwrap();
    temp.child("b.txt").write_str("b").unwrap();
    let a = File::from_path(temp.child("a.txt").path()).unwrap();
    let b = File::from_path(temp.child("b.txt").path()).unwrap();

    assert_eq!(a.try_move_to(&b, false).unwrap_err().kind(), ErrorKind::AlreadyExists);
    assert_eq!(b.read_string().unwrap(), "b");
    assert!(a.exists());

    let moved = a.move_to_with(&b, true).unwrap();
    assert_eq!(moved.read_string().unwrap(), "a");
    assert!(!a.exists());
}

#[test]
fn missing_source_is_not_found() {
    let temp = TempDir::new().unwrap();
    let ghost = dir(&temp).file("ghost.txt").unwrap();
    assert_eq!(ghost.read_data().unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(
        ghost.try_copy_to(dir(&temp), false).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert!(!ghost.delete());
}

#[test]
fn file_handle_on_a_directory_is_a_type_mismatch() {
    let temp = TempDir::new().unwrap();
    temp.child("folder").create_dir_all().unwrap();
    let f = File::from_path(temp.child("folder").path()).unwrap();
    assert!(!f.exists());
    assert!(f.item_exists());
    assert_eq!(f.read_data().unwrap_err().kind(), ErrorKind::TypeMismatch);
    assert_eq!(f.try_write_data(b"x", true).unwrap_err().kind(), ErrorKind::TypeMismatch);
}

#[test]
fn array_round_trip_through_plist() {
    let temp = TempDir::new().unwrap();
    let f = dir(&temp).file("numbers.plist").unwrap();
    let items: Vec<Value> = vec![1.into(), 2.into(), 3.into()];
    assert!(f.write_array(&items));
    assert_eq!(f.read_array().unwrap(), items);
    let text = f.read_string().unwrap();
    assert!(text.contains("<plist version=\"1.0\">"));
}

#[test]
fn dictionary_round_trip_and_overwrite() {
    let temp = TempDir::new().unwrap();
    let f = dir(&temp).file_with_name("settings", "plist").unwrap();
    let mut map = BTreeMap::new();
    map.insert("volume".to_string(), Value::from(11));
    map.insert("name".to_string(), Value::from("amp"));
    f.try_write_dictionary(&map, false).unwrap();
    assert_eq!(f.read_dictionary().unwrap(), map);

    map.insert("volume".to_string(), Value::from(3));
    assert!(!f.write_dictionary(&map));
    assert!(f.write_dictionary_with(&map, true));
    assert_eq!(
        f.read_dictionary().unwrap().get("volume"),
        Some(&Value::Integer(3))
    );
}

#[test]
fn archive_round_trip_for_nested_composite() {
    let temp = TempDir::new().unwrap();
    let f = dir(&temp).file("state.archive").unwrap();
    let inner: Value = [("depth", Value::from(2)), ("ok", Value::from(true))]
        .into_iter()
        .collect();
    let value: Value = [
        ("title", Value::from("draft")),
        ("ratio", Value::from(0.5)),
        ("list", Value::from(vec![Value::from(1), Value::from("two"), inner.clone()])),
        ("inner", inner),
    ]
    .into_iter()
    .collect();

    assert!(f.archive(&value));
    assert_eq!(f.unarchive().unwrap(), value);
    // The keyed archive is not a plist.
    assert_eq!(
        f.unarchive_from_xml_plist().unwrap_err().kind(),
        ErrorKind::SerializationFailure
    );

    let plist = dir(&temp).file("state.plist").unwrap();
    assert!(plist.archive_as_xml_plist(&value));
    assert_eq!(plist.unarchive_from_xml_plist().unwrap(), value);
}

#[test]
fn text_in_other_encodings() {
    let temp = TempDir::new().unwrap();
    temp.child("latin1.txt").write_binary(&[0x63, 0x61, 0x66, 0xE9]).unwrap();
    let f = File::from_path(temp.child("latin1.txt").path()).unwrap();
    assert_eq!(f.read_string_with_encoding(Encoding::Latin1).unwrap(), "café");
    assert_eq!(f.read_string().unwrap_err().kind(), ErrorKind::SerializationFailure);
}

#[test]
fn from_url_round_trip() {
    let temp = TempDir::new().unwrap();
    temp.child("with space.txt").write_str("x").unwrap();
    let f = File::from_path(temp.child("with space.txt").path()).unwrap();
    let url = f.file_url();
    assert!(url.starts_with("file://"));
    assert!(url.contains("with%20space.txt"));
    let back = File::from_url(&url).unwrap();
    assert_eq!(back.absolute_path(), f.absolute_path());
    assert!(back.exists());
}

#[test]
fn copy_onto_own_path() {
    let temp = TempDir::new().unwrap();
    temp.child("same.txt").write_str("keep me").unwrap();
    let f = File::from_path(temp.child("same.txt").path()).unwrap();

    assert_eq!(f.try_copy_to(&f, false).unwrap_err().kind(), ErrorKind::AlreadyExists);
    assert_eq!(f.try_copy_to(dir(&temp), true).unwrap(), f);
    assert_eq!(f.read_string().unwrap(), "keep me");
}
