use super::*;

#[test]
fn workspace_is_removed_on_drop() {
    let parent = tempfile::tempdir().unwrap();
    let ws = RenderWorkspace::new_in(parent.path()).unwrap();
    let root = ws.path().to_path_buf();
    let downloads = ws.downloads().unwrap();
    std::fs::write(downloads.join("a.png"), b"x").unwrap();
    assert!(ws.spool().unwrap().is_dir());
    assert!(ws.audio_mix_path().starts_with(&root));
    drop(ws);
    assert!(!root.exists());
}

#[test]
fn workspaces_do_not_collide() {
    let a = RenderWorkspace::new().unwrap();
    let b = RenderWorkspace::new().unwrap();
    assert_ne!(a.path(), b.path());
}
