mod common;

use common::FakeDirectoryStore;
use gremium::graph::drive::{create_link_file, delete_link_files, DirectoryStore};

#[tokio::test]
async fn join_shortcut_lifecycle() {
    let store = FakeDirectoryStore::new();
    let folder = store
        .create_folder("meetings-drive", "meetings-root", "2025-03-01 - Budget Sync")
        .await
        .unwrap();

    // A stale shortcut and an unrelated document already live in the folder.
    store
        .upload_content(
            "meetings-drive",
            &folder,
            "Join Old Meeting.url",
            b"[InternetShortcut]\nURL=https://old".to_vec(),
            "text/plain",
        )
        .await
        .unwrap();
    store
        .upload_content(
            "meetings-drive",
            &folder,
            "Agenda-Budget Sync.pdf",
            b"%PDF-".to_vec(),
            "application/pdf",
        )
        .await
        .unwrap();

    let removed = delete_link_files(&store, "meetings-drive", &folder)
        .await
        .unwrap();
    assert_eq!(removed, 1);

    let file_id = create_link_file(
        &store,
        "meetings-drive",
        &folder,
        "https://teams.example/join/abc",
        "Join Budget Sync",
    )
    .await
    .unwrap();

    let content = store.fetch_content("meetings-drive", &file_id).await.unwrap();
    assert_eq!(
        String::from_utf8(content).unwrap(),
        "[InternetShortcut]\nURL=https://teams.example/join/abc"
    );

    // The PDF was untouched; only the shortcut churned.
    let mut names = store.children_of(&folder);
    names.sort();
    assert_eq!(names, vec!["Agenda-Budget Sync.pdf", "Join Budget Sync.url"]);
}
