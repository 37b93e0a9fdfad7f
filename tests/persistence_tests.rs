use campusflow::{
    Calendar, CalendarCollection, CalendarStore, Entry, EntryType, HoursPerWeek, JsonFileStore,
    StoreError, export_calendar_to_csv, import_calendar_from_csv, load_calendars_from_json,
    open_store, save_calendars_to_json,
};
use chrono::NaiveDateTime;
use serde_json::json;
use tempfile::{NamedTempFile, tempdir};

fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
}

fn sample_collection() -> CalendarCollection {
    let mut collection = CalendarCollection::new();
    collection.insert(
        "School",
        Calendar::from_entries(vec![
            Entry::event(dt("2024-11-05T10:00:00"), "Lecture"),
            Entry::goal(dt("2024-12-01T18:00:00"), "Thesis", 4),
            Entry::sub_goal(dt("2024-11-04T16:00:00"), "Thesis_1"),
        ]),
    );
    collection.insert("Empty", Calendar::new());
    collection
}

#[test]
fn json_round_trip_preserves_collection() {
    let file = NamedTempFile::new().unwrap();
    let collection = sample_collection();

    save_calendars_to_json(&collection, file.path()).expect("save json");
    let loaded = load_calendars_from_json(file.path()).expect("load json");

    assert_eq!(loaded, collection);
}

#[test]
fn json_layout_matches_data_file_format() {
    let file = NamedTempFile::new().unwrap();
    save_calendars_to_json(&sample_collection(), file.path()).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
    assert_eq!(value["Empty"], json!({ "events": [] }));
    assert_eq!(
        value["School"]["events"][1],
        json!({
            "date": "2024-12-01T18:00:00",
            "description": "Thesis",
            "type": "Goal",
            "hours_per_week": 4
        })
    );
    assert_eq!(value["School"]["events"][2]["type"], json!("Sub-Goal"));
    assert!(value["School"]["events"][0].get("hours_per_week").is_none());
}

#[test]
fn loading_tolerates_odd_entries() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(
        file.path(),
        r#"{
            "Home": { "events": [
                { "date": "someday", "description": "Chores", "type": "Event" },
                { "date": "2024-11-05T10:00:00.250000", "description": "Call", "type": "Event" }
            ] },
            "Bare": {}
        }"#,
    )
    .unwrap();

    let loaded = load_calendars_from_json(file.path()).unwrap();
    let home = loaded.calendar("Home").unwrap();
    assert_eq!(home.entries()[0].date, "someday");
    assert!(home.entries()[0].timestamp().is_err());
    assert_eq!(
        home.entries()[1].timestamp().unwrap(),
        dt("2024-11-05T10:00:00") + chrono::Duration::milliseconds(250)
    );
    assert!(loaded.calendar("Bare").unwrap().is_empty());
}

#[test]
fn unknown_entry_type_is_rejected() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(
        file.path(),
        r#"{ "Home": { "events": [ { "date": "2024-11-05", "description": "x", "type": "Task" } ] } }"#,
    )
    .unwrap();
    let err = load_calendars_from_json(file.path()).unwrap_err();
    assert!(matches!(err, StoreError::Serialization(_)));
}

#[test]
fn json_store_treats_missing_file_as_empty() {
    let dir = tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("events_data.json"));
    assert!(store.load_calendars().unwrap().is_none());

    store.save_calendars(&sample_collection()).unwrap();
    assert_eq!(store.load_calendars().unwrap(), Some(sample_collection()));
}

#[test]
fn failed_save_leaves_previous_file_intact() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("events_data.json");
    save_calendars_to_json(&sample_collection(), &path).unwrap();

    // parent directory does not exist
    let bad_target = dir.path().join("missing").join("events_data.json");
    assert!(save_calendars_to_json(&CalendarCollection::new(), &bad_target).is_err());

    assert_eq!(load_calendars_from_json(&path).unwrap(), sample_collection());
    let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(leftovers.len(), 1);
}

#[test]
fn csv_round_trip_keeps_entries() {
    let file = NamedTempFile::new().unwrap();
    let collection = sample_collection();
    let calendar = collection.calendar("School").unwrap();

    export_calendar_to_csv(calendar, file.path()).unwrap();
    let header = std::fs::read_to_string(file.path()).unwrap();
    assert!(header.starts_with("date,description,type,hours_per_week"));

    let imported = import_calendar_from_csv(file.path()).unwrap();
    assert_eq!(&imported, calendar);
    assert_eq!(imported.entries()[2].entry_type, EntryType::SubGoal);
}

#[test]
fn csv_import_reports_bad_rows() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(
        file.path(),
        "date,description,type,hours_per_week\n2024-11-05T10:00:00,Essay,Task,2\n",
    )
    .unwrap();
    let err = import_calendar_from_csv(file.path()).unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(_)));
}

#[test]
fn csv_import_keeps_non_numeric_hours() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(
        file.path(),
        "date,description,type,hours_per_week\n2024-11-05T10:00:00,Essay,Goal,lots\n",
    )
    .unwrap();
    let calendar = import_calendar_from_csv(file.path()).unwrap();
    assert_eq!(
        calendar.entries()[0].hours_per_week,
        Some(HoursPerWeek::Malformed(json!("lots")))
    );
}

#[test]
fn mistyped_goal_fields_do_not_block_loading() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(
        file.path(),
        r#"{
            "A": { "events": [ { "date": null, "description": "Run", "type": "Goal", "hours_per_week": 2 } ] },
            "B": { "events": [ { "date": "2024-12-01T18:00:00", "description": "Read", "type": "Goal", "hours_per_week": "3" } ] },
            "C": { "events": [ { "description": "Swim", "type": "Goal", "hours_per_week": 1 } ] }
        }"#,
    )
    .unwrap();

    let loaded = load_calendars_from_json(file.path()).unwrap();
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded.calendar("A").unwrap().entries()[0].date, "");
    assert_eq!(loaded.calendar("C").unwrap().entries()[0].date, "");

    // odd values survive a save
    let out = NamedTempFile::new().unwrap();
    save_calendars_to_json(&loaded, out.path()).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.path()).unwrap()).unwrap();
    assert_eq!(value["B"]["events"][0]["hours_per_week"], json!("3"));
}

#[test]
fn plain_location_opens_a_json_file_store() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("events_data.json");
    let store = open_store(path.to_str().unwrap()).unwrap();
    store.save_calendars(&sample_collection()).unwrap();

    assert_eq!(load_calendars_from_json(&path).unwrap(), sample_collection());
}

#[cfg(feature = "sqlite")]
mod sqlite {
    use super::*;
    use campusflow::SqliteCalendarStore;

    #[test]
    fn empty_store_loads_nothing() {
        let store = SqliteCalendarStore::in_memory().unwrap();
        assert!(store.load_calendars().unwrap().is_none());
    }

    #[test]
    fn sqlite_store_round_trip() {
        let file = NamedTempFile::new().unwrap();
        let store = SqliteCalendarStore::new(file.path()).unwrap();
        store.save_calendars(&sample_collection()).expect("save");

        let reopened = SqliteCalendarStore::new(file.path()).unwrap();
        let loaded = reopened.load_calendars().expect("load").expect("stored");
        assert_eq!(loaded, sample_collection());
    }

    #[test]
    fn sqlite_location_opens_the_sqlite_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("calendars.db");
        let store = open_store(&format!("sqlite:{}", path.display())).unwrap();
        store.save_calendars(&sample_collection()).unwrap();

        let reopened = SqliteCalendarStore::new(&path).unwrap();
        assert_eq!(reopened.load_calendars().unwrap(), Some(sample_collection()));
    }

    #[test]
    fn saving_replaces_previous_contents() {
        let store = SqliteCalendarStore::in_memory().unwrap();
        store.save_calendars(&sample_collection()).unwrap();

        let mut smaller = CalendarCollection::new();
        smaller.insert(
            "Work",
            Calendar::from_entries(vec![Entry::event(dt("2025-01-06T09:00:00"), "Standup")]),
        );
        store.save_calendars(&smaller).unwrap();

        assert_eq!(store.load_calendars().unwrap(), Some(smaller));
    }
}
