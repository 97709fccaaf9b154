//! End-to-end typed binding through the facade.

use jsonkit::{Datum, FromJson, Value, from_json_text};

#[derive(FromJson, Debug, Default, PartialEq)]
struct Point {
    x: i32,
    y: i32,
}

#[derive(FromJson, Debug, Default, PartialEq)]
struct Employee {
    id: i64,
    name: String,
    reports: Vec<Employee>,
}

#[derive(FromJson, Debug, Default, PartialEq)]
struct Renamed {
    #[json(rename = "the-key")]
    key: String,
    plain: Option<i64>,
}

#[test]
fn binds_true_literal() {
    assert!(from_json_text::<bool>("true").unwrap());
    assert_eq!(from_json_text::<Datum>("true").unwrap(), Datum::Bool(true));
}

#[test]
fn binds_object_to_map_in_order() {
    let d: Datum = from_json_text(r#"{"a":1,"b":"x"}"#).unwrap();
    let Datum::Map(map) = d else { panic!("expected map") };
    let keys: Vec<_> = map.keys().cloned().collect();
    assert_eq!(keys, ["a", "b"]);
    assert_eq!(map["a"], Datum::Int(1));
    assert_eq!(map["b"], Datum::Text("x".into()));
}

#[test]
fn binds_record_fields() {
    let p: Point = from_json_text(r#"{"x": 3, "y": 4}"#).unwrap();
    assert_eq!(p, Point { x: 3, y: 4 });
}

#[test]
fn record_matching_is_case_insensitive() {
    let p: Point = from_json_text(r#"{"X": 3, "Y": 4}"#).unwrap();
    assert_eq!(p, Point { x: 3, y: 4 });
}

#[test]
fn unknown_properties_are_skipped() {
    let p: Point = from_json_text(r#"{"x": 1, "junk": {"deep": [1,2,3]}, "y": 2}"#).unwrap();
    assert_eq!(p, Point { x: 1, y: 2 });
}

#[test]
fn missing_fields_default() {
    let p: Point = from_json_text(r#"{"y": 9}"#).unwrap();
    assert_eq!(p, Point { x: 0, y: 9 });
}

#[test]
fn renamed_field_binds() {
    let r: Renamed = from_json_text(r#"{"the-key": "v", "plain": null}"#).unwrap();
    assert_eq!(
        r,
        Renamed {
            key: "v".into(),
            plain: None,
        }
    );
}

#[test]
fn self_referential_record_binds_lazily() {
    let e: Employee = from_json_text(
        r#"{"id":1,"name":"a","reports":[{"id":2,"name":"b"},{"id":3,"name":"c"}]}"#,
    )
    .unwrap();
    assert_eq!(e.id, 1);
    assert_eq!(e.name, "a");
    assert_eq!(e.reports.len(), 2);
    assert_eq!(e.reports[0].name, "b");
    assert_eq!(e.reports[1].id, 3);
    assert!(e.reports[1].reports.is_empty());
}

#[test]
fn string_reader_decodes_escapes() {
    let s: String = from_json_text(r#""ab\ncd""#).unwrap();
    assert_eq!(s, "ab\ncd");
    assert_eq!(s.len(), 5);
    assert_eq!(s.lines().count(), 2);
}

#[test]
fn value_round_trips_through_any() {
    // Binding through the Any reader and re-reading the same document as a
    // Value tree agree on structure.
    let text = r#"{"a": [1, "two", 3.5, true, null], "b": {"c": "d"}}"#;
    let value: Value = from_json_text(text).unwrap();
    let datum: Datum = from_json_text(text).unwrap();

    let Datum::Map(map) = &datum else { panic!("expected map") };
    assert_eq!(value.len(), Some(map.len()));
    let Some(Value::List(items)) = value.get("a") else {
        panic!("expected list under a")
    };
    let Datum::List(cells) = &map["a"] else {
        panic!("expected list under a")
    };
    assert_eq!(items.len(), cells.len());
}

#[test]
fn record_from_reader() {
    let reader = std::io::Cursor::new(br#"{"x": -1, "y": 100}"#.to_vec());
    let p: Point = jsonkit::from_json_reader(reader).unwrap();
    assert_eq!(p, Point { x: -1, y: 100 });
}

#[test]
fn tolerates_stray_commas_in_records() {
    let p: Point = from_json_text(r#"{"x": 1,, "y": 2,}"#).unwrap();
    assert_eq!(p, Point { x: 1, y: 2 });
}

#[test]
fn mismatched_shape_defaults_whole_record() {
    let p: Point = from_json_text("[1,2]").unwrap();
    assert_eq!(p, Point::default());
}

mod parsed {
    use std::str::FromStr;

    /// A newtype bound through its `FromStr` implementation.
    #[derive(Debug, Default, PartialEq)]
    pub struct Port(pub u16);

    impl FromStr for Port {
        type Err = std::num::ParseIntError;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            s.parse().map(Port)
        }
    }

    jsonkit::from_json_via_parse!(Port);
}

#[test]
fn from_str_types_bind_via_parse_macro() {
    let p: parsed::Port = from_json_text(r#""8080""#).unwrap();
    assert_eq!(p, parsed::Port(8080));
    let p: parsed::Port = from_json_text("443").unwrap();
    assert_eq!(p, parsed::Port(443));
    let p: parsed::Port = from_json_text(r#""not a port""#).unwrap();
    assert_eq!(p, parsed::Port(0));
}

#[test]
fn switch_composes_shape_readers() {
    use jsonkit::read::Switch;
    use jsonkit::{TokenScanner, Tokens as _};

    let reader = Switch::<String>::new()
        .on_string(|t: &mut dyn jsonkit::Tokens| String::from_json(t))
        .on_number(|t: &mut dyn jsonkit::Tokens| Ok(format!("#{}", t.read_value()?)))
        .on_null(|t: &mut dyn jsonkit::Tokens| {
            t.next_token()?;
            Ok("∅".into())
        });

    let mut scanner = TokenScanner::from_text(r#"[ "a", 7, null ]"#);
    scanner.next_token().unwrap();
    scanner.next_token().unwrap();
    let mut seen = Vec::new();
    loop {
        match scanner.kind() {
            jsonkit::TokenKind::ListEnd | jsonkit::TokenKind::None => break,
            jsonkit::TokenKind::Comma => {
                scanner.next_token().unwrap();
            }
            _ => seen.push(reader.read(&mut scanner).unwrap()),
        }
    }
    assert_eq!(seen, ["a", "#7", "∅"]);
}

#[derive(FromJson, Debug, PartialEq)]
struct Settings {
    #[json(default = 8080)]
    port: u16,
    #[json(default)]
    host: String,
    retries: u32,
}

#[test]
fn field_level_defaults_apply() {
    let s: Settings = from_json_text("{}").unwrap();
    assert_eq!(
        s,
        Settings {
            port: 8080,
            host: String::new(),
            retries: 0,
        }
    );

    // A present property beats the declared default.
    let s: Settings = from_json_text(r#"{"Port": 9, "host": "h"}"#).unwrap();
    assert_eq!(s.port, 9);
    assert_eq!(s.host, "h");
    assert_eq!(s.retries, 0);
}
