use assert_fs::TempDir;
use assert_fs::prelude::*;
use std::fs;
use std::path::Path;

use fs_handles::prelude::*;

fn at(p: &Path) -> Directory {
    Directory::from_path(p).unwrap()
}

fn build_tree(temp: &TempDir, root: &str) {
    temp.child(format!("{root}/one.txt")).write_str("one").unwrap();
    temp.child(format!("{root}/sub/two.txt")).write_str("two").unwrap();
    temp.child(format!("{root}/sub/deeper/three.txt")).write_str("three").unwrap();
    temp.child(format!("{root}/empty")).create_dir_all().unwrap();
}

#[test]
fn copy_creates_a_full_replica() {
    let temp = TempDir::new().unwrap();
    build_tree(&temp, "project");
    temp.child("backup").create_dir_all().unwrap();

    let src = at(temp.child("project").path());
    let copy = src.copy_to(at(temp.child("backup").path())).unwrap();

    assert_eq!(copy.name(), "project");
    let root = temp.child("backup/project");
    assert_eq!(fs::read_to_string(root.child("one.txt").path()).unwrap(), "one");
    assert_eq!(
        fs::read_to_string(root.child("sub/deeper/three.txt").path()).unwrap(),
        "three"
    );
    assert!(root.child("empty").path().is_dir());
    assert_eq!(copy.size().unwrap(), src.size().unwrap());
    assert_eq!(src.size().unwrap(), 3 + 3 + 5);
}

#[test]
fn copy_without_overwrite_refuses_existing_tree() {
    let temp = TempDir::new().unwrap();
    build_tree(&temp, "project");
    temp.child("backup/project/keep.txt").write_str("keep").unwrap();

    let src = at(temp.child("project").path());
    let err = src.try_copy_to(at(temp.child("backup").path()), false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert!(temp.child("backup/project/keep.txt").path().exists());
    assert!(!temp.child("backup/project/one.txt").path().exists());
}

#[test]
fn copy_with_overwrite_replaces_the_whole_tree() {
    let temp = TempDir::new().unwrap();
    build_tree(&temp, "project");
    temp.child("backup/project/stale.txt").write_str("stale").unwrap();
    temp.child("backup/project/sub/two.txt").write_str("old two").unwrap();

    let src = at(temp.child("project").path());
    src.try_copy_to(at(temp.child("backup").path()), true).unwrap();

    let root = temp.child("backup/project");
    assert!(!root.child("stale.txt").path().exists(), "stale items must be gone");
    assert_eq!(fs::read_to_string(root.child("sub/two.txt").path()).unwrap(), "two");

    // No staging directories left behind.
    let leftovers: Vec<_> = fs::read_dir(temp.child("backup").path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(leftovers, vec!["project"]);
}

#[test]
fn move_relocates_the_tree() {
    let temp = TempDir::new().unwrap();
    build_tree(&temp, "project");
    temp.child("elsewhere").create_dir_all().unwrap();

    let src = at(temp.child("project").path());
    let moved = src.move_to(at(temp.child("elsewhere").path())).unwrap();

    assert!(!src.item_exists());
    assert!(moved.exists());
    assert_eq!(
        fs::read_to_string(temp.child("elsewhere/project/sub/two.txt").path()).unwrap(),
        "two"
    );
}

#[test]
fn move_with_overwrite_replaces_existing_directory() {
    let temp = TempDir::new().unwrap();
    build_tree(&temp, "project");
    temp.child("dest/project/old.txt").write_str("old").unwrap();

    let src = at(temp.child("project").path());
    let dest = at(temp.child("dest").path());
    assert_eq!(src.try_move_to(&dest, false).unwrap_err().kind(), ErrorKind::AlreadyExists);
    assert!(src.exists());

    src.try_move_to(&dest, true).unwrap();
    assert!(!temp.child("dest/project/old.txt").path().exists());
    assert!(temp.child("dest/project/one.txt").path().exists());
}

#[test]
fn delete_contents_leaves_an_empty_directory() {
    let temp = TempDir::new().unwrap();
    build_tree(&temp, "project");
    let d = at(temp.child("project").path());

    assert!(!d.is_empty().unwrap());
    assert!(d.delete_contents());
    assert!(d.exists());
    assert!(d.is_empty().unwrap());
    assert!(d.items().unwrap().is_empty());
}

#[test]
fn delete_removes_tree() {
    let temp = TempDir::new().unwrap();
    build_tree(&temp, "project");
    let d = at(temp.child("project").path());
    assert!(d.delete());
    assert!(!d.item_exists());
    assert_eq!(d.try_delete().unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn copy_contents_merges_into_destination() {
    let temp = TempDir::new().unwrap();
    build_tree(&temp, "project");
    temp.child("merged/existing.txt").write_str("here before").unwrap();

    let src = at(temp.child("project").path());
    let dest = at(temp.child("merged").path());
    src.try_copy_contents_to(&dest, false).unwrap();

    let names: Vec<_> = dest.items().unwrap().iter().map(Entry::name).collect();
    assert_eq!(names, vec!["empty", "existing.txt", "one.txt", "sub"]);

    // Second pass collides on the first item and fails fast.
    assert_eq!(
        src.try_copy_contents_to(&dest, false).unwrap_err().kind(),
        ErrorKind::AlreadyExists
    );
    assert!(src.copy_contents_to_with(&dest, true).is_some());
}

#[test]
fn numeric_suffix_skips_taken_names() {
    let temp = TempDir::new().unwrap();
    temp.child("report.txt").touch().unwrap();
    temp.child("report 2.txt").touch().unwrap();
    temp.child("Photos").create_dir_all().unwrap();
    let d = at(temp.path());

    let f = d.file_with_numeric_suffix_if_exists("report.txt").unwrap();
    assert_eq!(f.name(), "report 3.txt");
    assert!(!f.item_exists(), "probing must not create anything");

    let free = d.file_with_numeric_suffix_if_exists("fresh.txt").unwrap();
    assert_eq!(free.name(), "fresh.txt");

    let sub = d.subdirectory_with_numeric_suffix_if_exists("Photos").unwrap();
    assert_eq!(sub.name(), "Photos 2");

    let via_trait = d.subitem_with_numeric_suffix_if_exists("Photos").unwrap();
    assert_eq!(via_trait.name(), "Photos 2");

    let claimed = d.create_file_with_numeric_suffix("report.txt").unwrap();
    assert_eq!(claimed.name(), "report 3.txt");
    assert!(claimed.exists());
    let album = d.create_subdirectory_with_numeric_suffix("Photos").unwrap();
    assert_eq!(album.name(), "Photos 2");
    assert!(album.exists());

    let entries = d.items().unwrap();
    assert!(entries.iter().any(|e| e.as_directory().is_some_and(|x| x.name() == "Photos 2")));
    assert!(entries.iter().any(|e| e.as_file().is_some_and(|x| x.name() == "report 3.txt")));
}

#[test]
fn copy_contents_convenience_creates_destination() {
    let temp = TempDir::new().unwrap();
    build_tree(&temp, "project");
    let src = at(temp.child("project").path());
    let dest = at(temp.child("fresh/target").path());
    let out = src.copy_contents_to(&dest).unwrap();
    assert!(out.subdirectory("sub").unwrap().exists());
    assert!(src.copy_contents_to(&dest).is_none(), "second pass collides");
}

#[cfg(unix)]
#[test]
fn tree_copy_keeps_symlinks_as_links() {
    let temp = TempDir::new().unwrap();
    build_tree(&temp, "project");
    std::os::unix::fs::symlink("one.txt", temp.child("project/link.txt").path()).unwrap();
    temp.child("out").create_dir_all().unwrap();

    at(temp.child("project").path())
        .try_copy_to(at(temp.child("out").path()), false)
        .unwrap();

    let link = temp.child("out/project/link.txt");
    let meta = fs::symlink_metadata(link.path()).unwrap();
    assert!(meta.file_type().is_symlink());
    assert_eq!(fs::read_link(link.path()).unwrap(), Path::new("one.txt"));
    assert_eq!(fs::read_to_string(link.path()).unwrap(), "one");
}

#[test]
fn missing_destination_parent_fails_cleanly() {
    let temp = TempDir::new().unwrap();
    build_tree(&temp, "project");
    let src = at(temp.child("project").path());
    let nowhere = at(temp.child("no/such/dir").path());
    assert_eq!(src.try_copy_to(&nowhere, false).unwrap_err().kind(), ErrorKind::NotFound);
    assert!(!temp.child("no").path().exists());
}

#[test]
fn copy_onto_own_path_matches_file_semantics() {
    let temp = TempDir::new().unwrap();
    build_tree(&temp, "project");
    let src = at(temp.child("project").path());
    let parent = at(temp.path());

    assert_eq!(
        src.try_copy_to(&parent, false).unwrap_err().kind(),
        ErrorKind::AlreadyExists
    );
    assert_eq!(src.try_copy_to(&parent, true).unwrap(), src);
    assert_eq!(fs::read_to_string(temp.child("project/one.txt").path()).unwrap(), "one");
}

#[test]
fn copy_into_own_subtree_is_invalid() {
    let temp = TempDir::new().unwrap();
    build_tree(&temp, "project");
    let src = at(temp.child("project").path());
    let inner = at(temp.child("project/sub").path());
    assert_eq!(src.try_copy_to(&inner, false).unwrap_err().kind(), ErrorKind::InvalidPath);
}

#[cfg(unix)]
fn make_fifo(path: &Path) {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;
    let c = CString::new(path.as_os_str().as_bytes()).unwrap();
    assert_eq!(unsafe { libc::mkfifo(c.as_ptr(), 0o644) }, 0);
}

#[cfg(unix)]
#[test]
fn failed_fresh_copy_removes_partial_target() {
    let temp = TempDir::new().unwrap();
    build_tree(&temp, "project");
    make_fifo(temp.child("project/z.fifo").path());
    temp.child("out").create_dir_all().unwrap();

    let err = at(temp.child("project").path())
        .try_copy_to(at(temp.child("out").path()), false)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert!(!temp.child("out/project").path().exists(), "partial copy must be removed");
}

#[cfg(unix)]
#[test]
fn failed_replacing_copy_keeps_old_tree_and_leaves_no_staging() {
    let temp = TempDir::new().unwrap();
    build_tree(&temp, "project");
    make_fifo(temp.child("project/z.fifo").path());
    temp.child("out/project/old.txt").write_str("old").unwrap();

    let err = at(temp.child("project").path())
        .try_copy_to(at(temp.child("out").path()), true)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);

    assert_eq!(fs::read_to_string(temp.child("out/project/old.txt").path()).unwrap(), "old");
    assert!(!temp.child("out/project/one.txt").path().exists());
    let names: Vec<_> = fs::read_dir(temp.child("out").path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["project"]);
}

#[cfg(target_os = "linux")]
fn non_utf8_name() -> &'static std::ffi::OsStr {
    use std::os::unix::ffi::OsStrExt;
    std::ffi::OsStr::from_bytes(b"bad\xff.txt")
}

#[cfg(target_os = "linux")]
#[test]
fn copy_with_non_utf8_child_fails_instead_of_dropping_it() {
    let temp = TempDir::new().unwrap();
    temp.child("project/ok.txt").write_str("ok").unwrap();
    fs::write(temp.child("project").path().join(non_utf8_name()), "bad").unwrap();
    temp.child("out").create_dir_all().unwrap();

    let src = at(temp.child("project").path());
    let err = src.try_copy_to(at(temp.child("out").path()), false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidPath);
    assert!(!temp.child("out/project").path().exists());
    assert_eq!(src.items().unwrap_err().kind(), ErrorKind::InvalidPath);
}

#[cfg(target_os = "linux")]
#[test]
fn move_carries_non_utf8_children() {
    let temp = TempDir::new().unwrap();
    temp.child("project/ok.txt").write_str("ok").unwrap();
    fs::write(temp.child("project").path().join(non_utf8_name()), "bad").unwrap();
    temp.child("out").create_dir_all().unwrap();

    let src = at(temp.child("project").path());
    src.try_move_to(at(temp.child("out").path()), false).unwrap();
    assert!(temp.child("out/project").path().join(non_utf8_name()).exists());
}

#[cfg(target_os = "linux")]
#[test]
fn delete_contents_removes_non_utf8_children() {
    let temp = TempDir::new().unwrap();
    temp.child("project/ok.txt").write_str("ok").unwrap();
    fs::write(temp.child("project").path().join(non_utf8_name()), "bad").unwrap();

    let d = at(temp.child("project").path());
    d.try_delete_contents().unwrap();
    assert!(d.is_empty().unwrap());
}
