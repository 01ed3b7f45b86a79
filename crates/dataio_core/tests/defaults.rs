use dataio_core::{
    defaults, reset_defaults, update_defaults, DataReader, DataWriter, Entity, JsonConfig,
    JsonFileReader, JsonFileWriter, JsonFormat,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Setting {
    key: String,
    value: String,
}

impl Entity for Setting {
    type Id = String;

    fn id(&self) -> &String {
        &self.key
    }

    fn set_id(&mut self, id: String) {
        self.key = id;
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn set_enabled(&mut self, _enabled: bool) {}
}

// Single test: defaults are process-wide state.
#[test]
fn adapters_copy_defaults_at_construction() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");

    let before = JsonFileWriter::<Setting>::try_new(JsonConfig::new(&path).with_create_missing(true))
        .unwrap();

    update_defaults(|value| {
        value.json_source_name = "Settings Store".to_string();
        value.json_format = JsonFormat::Pretty;
    });
    assert_eq!(defaults().json_format, JsonFormat::Pretty);

    let after = JsonFileWriter::<Setting>::try_new(JsonConfig::new(&path).with_create_missing(true))
        .unwrap();
    assert_eq!(DataWriter::source_name(&before), "Json File");
    assert_eq!(DataWriter::source_name(&after), "Settings Store");

    after
        .write_data(Setting {
            key: "theme".to_string(),
            value: "dark".to_string(),
        })
        .unwrap();
    assert!(std::fs::read_to_string(&path).unwrap().contains('\n'));

    let renamed = JsonFileReader::<Setting>::try_new(JsonConfig::new(&path))
        .unwrap()
        .with_source_name("Override");
    assert_eq!(renamed.source_name(), "Override");

    reset_defaults();
    assert_eq!(defaults().json_source_name, "Json File");
    assert_eq!(defaults().json_format, JsonFormat::Compact);
}
