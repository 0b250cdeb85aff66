//! On-disk backends survive a restart.

#![cfg(feature = "redb")]

use std::fs;

use outfit::{Category, Collection, OutfitAssistant, OutfitConfig, Payload};

fn on_disk_config(dir: &std::path::Path) -> OutfitConfig {
    let yaml = format!(
        r#"
version: "1.0"
embed:
  mode: "stub"
  dimension: 32
index:
  backend: "redb"
  redb_path: "{index}"
archive:
  backend: "sqlite"
  sqlite_path: "{archive}"
"#,
        index = dir.join("outfits.redb").display(),
        archive = dir.join("fashion.db").display(),
    );
    OutfitConfig::from_yaml(&yaml).expect("config")
}

#[test]
fn wardrobe_and_saved_outfits_survive_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let shirt = dir.path().join("shirt.jpg");
    let jeans = dir.path().join("jeans.jpg");
    fs::write(&shirt, b"shirt").expect("write");
    fs::write(&jeans, b"jeans").expect("write");
    let config = on_disk_config(dir.path());

    let saved_id = {
        let assistant = OutfitAssistant::from_config(&config).expect("assistant");
        assistant
            .add_item(
                Collection::Wardrobe,
                &shirt,
                Category::Top,
                Payload::new().with_description("Oxford shirt"),
            )
            .expect("add shirt");
        assistant
            .add_item(
                Collection::Wardrobe,
                &jeans,
                Category::Bottom,
                Payload::new().with_description("Jeans"),
            )
            .expect("add jeans");
        let rec = assistant.generate("smart casual").expect("generate");
        assistant
            .save_outfit(&rec.outfits[0], &rec.prompt)
            .expect("save")
    };

    let assistant = OutfitAssistant::from_config(&config).expect("reopen");
    assert_eq!(
        assistant
            .list_items(Collection::Wardrobe, None)
            .expect("list")
            .len(),
        2
    );
    let rec = assistant.generate("smart casual").expect("generate");
    assert_eq!(rec.outfits.len(), 1);
    assert_eq!(rec.outfits[0].top.description(), Some("Oxford shirt"));

    let saved = assistant.saved_outfits().expect("saved");
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].id, saved_id);
    assert_eq!(saved[0].bottom_description.as_deref(), Some("Jeans"));
    assert_eq!(saved[0].prompt.as_deref(), Some("smart casual"));
}
