mod common;

use std::collections::HashMap;

use common::FakeProfileStore;
use gremium::docs::template_data::lookup_display_name;
use gremium::graph::profiles::resolve_display_names;

fn upns(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("user{i}@example.com")).collect()
}

#[tokio::test]
async fn forty_five_upns_are_looked_up_in_three_chunks() {
    let store = FakeProfileStore::default();
    let overrides = HashMap::new();
    let resolved = resolve_display_names(&store, &overrides, &upns(45))
        .await
        .unwrap();

    assert_eq!(resolved.len(), 45);
    assert_eq!(*store.chunk_sizes.lock().unwrap(), vec![20, 20, 5]);
}

#[tokio::test]
async fn unknown_upn_is_echoed_as_its_own_display_name() {
    let mut store = FakeProfileStore::default();
    store
        .profiles
        .insert("anna@example.com".into(), "Schmidt, Anna".into());
    let overrides = HashMap::new();

    let resolved = resolve_display_names(
        &store,
        &overrides,
        &["anna@example.com".to_string(), "guest@external.org".to_string()],
    )
    .await
    .unwrap();

    assert_eq!(resolved["anna@example.com"], "Schmidt, Anna");
    assert_eq!(resolved["guest@external.org"], "guest@external.org");

    // Downstream, the echoed form survives recomposition.
    assert_eq!(
        lookup_display_name(&resolved, "guest@external.org"),
        "guest@external.org"
    );
    assert_eq!(lookup_display_name(&resolved, "anna@example.com"), "Anna Schmidt");
}

#[tokio::test]
async fn override_table_wins_over_the_remote_profile() {
    let mut store = FakeProfileStore::default();
    store
        .profiles
        .insert("anna@example.com".into(), "Schmidt, Anna".into());
    let mut overrides = HashMap::new();
    overrides.insert("anna@example.com".to_string(), "Dr. Anna Schmidt".to_string());
    // Overrides only apply to looked-up participants.
    overrides.insert("absent@example.com".to_string(), "Should Not Appear".to_string());

    let resolved = resolve_display_names(&store, &overrides, &["anna@example.com".to_string()])
        .await
        .unwrap();

    assert_eq!(resolved["anna@example.com"], "Dr. Anna Schmidt");
    assert!(!resolved.contains_key("absent@example.com"));
}
