use std::path::{Path, PathBuf};

use tzconvert::{
    compare::compare,
    convert::{Config, Converter, Stage},
    fmt::{
        ical::Printer,
        properties::{Aliases, Info},
    },
    zic::Database,
};

/// A type alias we use for tests.
type Result = std::result::Result<(), tzconvert::Error>;

fn data(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("data").join(name)
}

fn sample() -> Database {
    let db = Database::from_dir(data("tzdata")).unwrap();
    assert!(db.failures().is_empty(), "{:?}", db.failures());
    db
}

fn ics(converter: &Converter, name: &str) -> String {
    let vtz = converter.convert_zone(name).unwrap();
    let mut out = String::new();
    Printer::new().print_vtimezone(&vtz, &mut out).unwrap();
    out
}

#[test]
fn sample_database() {
    let _ = env_logger::try_init();

    let db = sample();
    let zones: Vec<&str> = db.zones().map(|zone| zone.name()).collect();
    assert_eq!(
        zones,
        vec![
            "America/New_York",
            "America/Phoenix",
            "Europe/Berlin",
            "Europe/London",
        ],
    );
    assert_eq!(db.link_target("US/Eastern"), Some("America/New_York"));
    assert_eq!(db.link_target("GB"), Some("Europe/London"));
    assert!(db.rule_set("NYC").is_some());
    assert!(db.rule_set("GB-Eire").is_some());
}

#[test]
fn convert_sample_database() {
    let _ = env_logger::try_init();

    let db = sample();
    let conversion = Converter::new(&db, Config::new()).convert_all();
    assert!(conversion.is_success(), "{:?}", conversion.failures());
    assert_eq!(conversion.report().succeeded(), 4);
    assert_eq!(conversion.report().failed(), 0);
    assert!(conversion.report().transitions() > 0);
}

#[test]
fn new_york() {
    let _ = env_logger::try_init();

    let db = sample();
    let converter = Converter::new(&db, Config::new());
    let ics = ics(&converter, "America/New_York");
    assert!(ics.starts_with("BEGIN:VTIMEZONE\r\nTZID:America/New_York\r\n"));
    assert!(ics.ends_with("END:VTIMEZONE\r\n"));
    // Local mean time only shows up as the offset before the first onset.
    assert!(ics.contains("DTSTART:18831118T120358\r\n"));
    assert!(ics.contains("TZOFFSETFROM:-045602\r\n"));
    assert!(!ics.contains("TZNAME:LMT\r\n"));
    // War time and peace time.
    assert!(ics.contains("TZNAME:EWT\r\n"));
    assert!(ics.contains("TZNAME:EPT\r\n"));
    // The current rules continue indefinitely.
    assert!(ics.contains("RRULE:FREQ=YEARLY;BYMONTH=3;BYDAY=2SU\r\n"));
    assert!(ics.contains("RRULE:FREQ=YEARLY;BYMONTH=11;BYDAY=1SU\r\n"));
}

#[test]
fn phoenix_fixed_periods() {
    let db = sample();
    let converter = Converter::new(&db, Config::new());
    let ics = ics(&converter, "America/Phoenix");
    assert!(ics.contains("TZNAME:MWT\r\n"));
    assert!(ics.contains("TZNAME:MST\r\n"));
    // Only the rules of 1918 and 1919 recur, and they stop.
    assert!(ics.contains("RRULE:FREQ=YEARLY;UNTIL="));
    assert!(!ics.contains("RRULE:FREQ=YEARLY;BYMONTH"));

    // Nothing has changed since 1968.
    let recent = Converter::new(&db, Config::new().min_year(1970));
    let err = recent.convert_zone("America/Phoenix").unwrap_err();
    insta::assert_snapshot!(
        err,
        @"zone `America/Phoenix` has no transitions in the converted years, besides local mean time",
    );
}

#[test]
fn european_rules_in_universal_time() {
    let db = sample();
    let converter = Converter::new(&db, Config::new().min_year(2000));
    for name in ["Europe/London", "Europe/Berlin"] {
        let ics = ics(&converter, name);
        assert!(
            ics.contains("RRULE:FREQ=YEARLY;BYMONTH=3;BYDAY=-1SU\r\n"),
            "{name}: {ics}",
        );
        assert!(
            ics.contains("RRULE:FREQ=YEARLY;BYMONTH=10;BYDAY=-1SU\r\n"),
            "{name}: {ics}",
        );
    }
    // Both switch at 01:00 UTC.
    let london = ics(&converter, "Europe/London");
    assert!(london.contains("DTSTART:20000326T010000\r\n"));
    assert!(london.contains("TZNAME:BST\r\n"));
    let berlin = ics(&converter, "Europe/Berlin");
    assert!(berlin.contains("DTSTART:20000326T020000\r\n"));
    assert!(berlin.contains("TZNAME:CEST\r\n"));
}

#[test]
fn links_and_aliases() -> Result {
    let _ = env_logger::try_init();

    let mut db = sample();
    let src = std::fs::read_to_string(data("aliases.properties")).unwrap();
    let aliases = Aliases::parse(&src)?;
    assert_eq!(aliases.get("Eastern Time"), Some("US/Eastern"));
    assert_eq!(aliases.get("Europe/Berlin-Alias"), Some("Europe/Berlin"));
    aliases.merge_into(&mut db);

    let converter = Converter::new(&db, Config::new().min_year(2007));
    let vtz = converter.convert_zone("Eastern Time")?;
    assert_eq!(vtz.tzid(), "Eastern Time");
    assert_eq!(vtz.location(), "Eastern Time");

    let err = converter.convert_zone("Nowhere/Zone").unwrap_err();
    insta::assert_snapshot!(err, @"no zone or link named `Nowhere/Zone`");
    Ok(())
}

#[test]
fn write_sample_database() -> Result {
    let _ = env_logger::try_init();

    let mut db = sample();
    let src = std::fs::read_to_string(data("aliases.properties")).unwrap();
    Aliases::parse(&src)?.merge_into(&mut db);
    assert_eq!(db.link_target("Eastern Time"), Some("US/Eastern"));
    let aliases = Aliases::from_database(&db);
    let config = Config::new().min_year(1900).prodid("-//test//EN");
    let conversion = Converter::new(&db, config).convert_all();
    let build_time: jiff::Timestamp = "2024-03-10T07:00:00Z".parse().unwrap();
    let info = Info::new(build_time, "-//test//EN", "tzdata-test");

    let dir = tempfile::tempdir().unwrap();
    let written = conversion.write_dir(dir.path(), &aliases, &info)?;
    // Four zones, four links and two of the three extra aliases. The last
    // one points nowhere.
    assert_eq!(written, 10);

    let read = |name: &str| {
        std::fs::read_to_string(dir.path().join(name)).unwrap()
    };
    let new_york = read("America/New_York.ics");
    assert!(new_york.starts_with(
        "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//test//EN\r\n"
    ));
    assert!(new_york.ends_with("END:VCALENDAR\r\n"));
    let eastern = read("US/Eastern.ics");
    assert!(eastern.contains("TZID:US/Eastern\r\n"));
    assert_eq!(
        eastern.replace("US/Eastern", "America/New_York"),
        new_york,
    );
    assert!(read("Eastern Time.ics").contains("TZID:Eastern Time\r\n"));
    assert!(read("GB.ics").contains("TZID:GB\r\n"));
    assert!(!dir.path().join("Nowhere/Zone.ics").exists());

    let aliases = Aliases::parse(&read("aliases.properties"))?;
    assert_eq!(aliases.len(), 7);
    assert_eq!(aliases.get("Eastern Time"), Some("US/Eastern"));
    let info = Info::parse(&read("info.properties"))?;
    assert_eq!(info.build_time(), build_time);
    assert_eq!(info.prodid(), "-//test//EN");
    assert_eq!(info.source(), "tzdata-test");
    Ok(())
}

#[test]
fn broken_zones_are_isolated() {
    let _ = env_logger::try_init();

    let db = Database::from_dir(data("broken")).unwrap();
    assert_eq!(db.failures().len(), 2);
    assert!(db.failures()[0].error().is_range_invariant());
    assert_eq!(db.failures()[0].line(), 3);
    assert!(db.failures()[1].error().is_malformed_field());
    assert!(db.zone("Europe/Garbled").is_none());
    assert!(db.zone("Europe/After").is_some());

    let conversion = Converter::new(&db, Config::new()).convert_all();
    assert!(!conversion.is_success());
    assert!(conversion.zone("Europe/Good").is_some());
    assert!(conversion.zone("Europe/After").is_some());

    let stages: Vec<Stage> =
        conversion.failures().iter().map(|f| f.stage()).collect();
    assert_eq!(stages, vec![Stage::Parse, Stage::Parse, Stage::Expand]);
    assert_eq!(conversion.failures()[0].name(), "europe:3");
    let dangling = &conversion.failures()[2];
    assert!(dangling.error().is_unknown_rule());
    insta::assert_snapshot!(
        dangling,
        @"Europe/Dangling (expand): failed to expand transitions for zone `Europe/Dangling`: zone refers to unknown rule set `Missing`",
    );
}

#[test]
fn strict_parse_stops_at_first_error() {
    let src = std::fs::read_to_string(data("broken").join("europe")).unwrap();
    let mut db = Database::new();
    let err = db.parse("europe", &src).unwrap_err();
    assert!(err.is_range_invariant());
    assert!(db.zone("Europe/Good").is_none());
}

#[test]
fn compare_sample_databases() {
    let _ = env_logger::try_init();

    let ours = sample();
    assert!(compare(&ours, &ours, 1800, 2038).is_empty());

    let theirs = Database::from_dir(data("broken")).unwrap();
    let mismatches = compare(&ours, &theirs, 1800, 2038);
    let zones: Vec<&str> = mismatches.iter().map(|m| m.zone()).collect();
    assert_eq!(
        zones,
        vec![
            "America/New_York",
            "America/Phoenix",
            "Europe/After",
            "Europe/Berlin",
            "Europe/Dangling",
            "Europe/Good",
            "Europe/London",
        ],
    );
}
