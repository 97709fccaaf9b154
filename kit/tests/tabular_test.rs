//! Tabular reader behavior over literal table documents.

use jsonkit::{ColumnType, Datum, FromJson, TableReader, Value};

const ONE_TABLE: &str = r#"{ "name":"T",
    "columns":[{"name":"Id","type":"long"},{"name":"N","type":"string"}],
    "rows":[[1,"a"],[2,"b"]] }"#;

#[derive(FromJson, Debug, Default, PartialEq)]
struct TRow {
    id: i64,
    n: String,
}

#[test]
fn single_table_object_binds_rows() {
    let mut reader = TableReader::from_text(ONE_TABLE);
    assert!(reader.next_table().unwrap());
    assert_eq!(reader.table_name(), "T");
    assert_eq!(reader.field_count(), 2);
    assert_eq!(reader.field_name(0), "Id");
    assert_eq!(reader.field_type(0), "long");
    assert_eq!(reader.field_name(1), "N");

    let mut rows = Vec::new();
    while reader.next_row().unwrap() {
        rows.push(reader.read_row::<TRow>().unwrap());
    }
    assert_eq!(
        rows,
        [
            TRow { id: 1, n: "a".into() },
            TRow { id: 2, n: "b".into() },
        ]
    );
    assert!(!reader.next_table().unwrap());
}

#[test]
fn field_values_follow_column_types() {
    let mut reader = TableReader::from_text(ONE_TABLE);
    assert!(reader.next_table().unwrap());
    assert!(reader.next_row().unwrap());
    assert!(reader.next_field().unwrap());
    assert_eq!(reader.field_value().unwrap(), Datum::Long(1));
    assert!(reader.next_field().unwrap());
    assert_eq!(reader.field_value().unwrap(), Datum::Text("a".into()));
    assert!(!reader.next_field().unwrap());
}

#[test]
fn typed_field_binding() {
    let mut reader = TableReader::from_text(ONE_TABLE);
    reader.next_table().unwrap();
    reader.next_row().unwrap();
    reader.next_field().unwrap();
    assert_eq!(reader.field::<i64>().unwrap(), 1);
    reader.next_field().unwrap();
    assert_eq!(reader.field::<String>().unwrap(), "a");
}

#[test]
fn table_list_iterates_all_tables() {
    let text = r#"[
        {"name":"A","columns":["x"],"rows":[[1],[2],[3]]},
        {"name":"B","columns":[{"name":"y","type":"string"}],"rows":[["z"]]}
    ]"#;
    let mut reader = TableReader::from_text(text);

    assert!(reader.next_table().unwrap());
    assert_eq!(reader.table_name(), "A");
    // Plain-string columns carry an empty type.
    assert_eq!(reader.field_name(0), "x");
    assert_eq!(reader.field_type(0), "");
    let mut count = 0;
    while reader.next_row().unwrap() {
        count += 1;
    }
    assert_eq!(count, 3);

    assert!(reader.next_table().unwrap());
    assert_eq!(reader.table_name(), "B");
    assert!(reader.next_row().unwrap());
    assert!(reader.next_field().unwrap());
    assert_eq!(reader.field_value().unwrap(), Datum::Text("z".into()));

    assert!(!reader.next_table().unwrap());
}

#[test]
fn next_table_skips_mid_row() {
    let text = r#"[
        {"name":"A","columns":["x","y"],"rows":[[1,2],[3,4]]},
        {"name":"B","columns":["z"],"rows":[[9]]}
    ]"#;
    let mut reader = TableReader::from_text(text);
    assert!(reader.next_table().unwrap());
    assert!(reader.next_row().unwrap());
    assert!(reader.next_field().unwrap());
    // Abandon the rest of A mid-field.
    assert!(reader.next_table().unwrap());
    assert_eq!(reader.table_name(), "B");
    assert!(reader.next_row().unwrap());
    assert!(reader.next_field().unwrap());
    assert_eq!(reader.field_value().unwrap(), Datum::Int(9));
}

#[test]
fn next_row_skips_unread_fields() {
    let mut reader = TableReader::from_text(ONE_TABLE);
    reader.next_table().unwrap();
    assert!(reader.next_row().unwrap());
    // Read nothing from row one.
    assert!(reader.next_row().unwrap());
    reader.next_field().unwrap();
    assert_eq!(reader.field_value().unwrap(), Datum::Long(2));
}

#[test]
fn header_members_in_any_order() {
    let text = r#"{"columns":["a"],"name":"late","rows":[[true]]}"#;
    let mut reader = TableReader::from_text(text);
    assert!(reader.next_table().unwrap());
    assert_eq!(reader.table_name(), "late");
    reader.next_row().unwrap();
    reader.next_field().unwrap();
    assert_eq!(reader.field_value().unwrap(), Datum::Bool(true));
}

#[test]
fn missing_name_and_untyped_columns() {
    let text = r#"{"rows":[[1]]}"#;
    let mut reader = TableReader::from_text(text);
    assert!(reader.next_table().unwrap());
    assert_eq!(reader.table_name(), "");
    assert_eq!(reader.field_count(), 0);
    assert_eq!(reader.field_name(7), "");
    assert_eq!(reader.field_type(7), "");
    reader.next_row().unwrap();
    reader.next_field().unwrap();
    // No declared type: the Any reader decides.
    assert_eq!(reader.field_value().unwrap(), Datum::Int(1));
}

#[test]
fn unknown_column_type_falls_back_to_any() {
    let text = r#"{"columns":[{"name":"m","type":"mystery"}],"rows":[["x"]]}"#;
    assert_eq!(ColumnType::parse("mystery"), ColumnType::Any);
    let mut reader = TableReader::from_text(text);
    reader.next_table().unwrap();
    reader.next_row().unwrap();
    reader.next_field().unwrap();
    assert_eq!(reader.field_value().unwrap(), Datum::Text("x".into()));
}

#[test]
fn json_column_preserves_tree() {
    let text = r#"{"columns":[{"name":"doc","type":"json"}],"rows":[[{"k":[1,2]}]]}"#;
    let mut reader = TableReader::from_text(text);
    reader.next_table().unwrap();
    reader.next_row().unwrap();
    reader.next_field().unwrap();
    let Datum::Json(value) = reader.field_value().unwrap() else {
        panic!("expected a json tree")
    };
    assert_eq!(value.get("k").and_then(Value::len), Some(2));
}

#[test]
fn type_reader_override_wins() {
    let text = r#"{"columns":[{"name":"v","type":"Upper"}],"rows":[["abc"]]}"#;
    let mut reader =
        TableReader::from_text(text).with_type_reader("upper", |tokens: &mut dyn jsonkit::Tokens| {
            let raw = String::from_json(tokens)?;
            Ok(Datum::Text(raw.to_ascii_uppercase()))
        });
    reader.next_table().unwrap();
    reader.next_row().unwrap();
    reader.next_field().unwrap();
    assert_eq!(reader.field_value().unwrap(), Datum::Text("ABC".into()));
}

#[test]
fn null_fields_bind_as_null() {
    let text = r#"{"columns":[{"name":"a","type":"long"}],"rows":[[null]]}"#;
    let mut reader = TableReader::from_text(text);
    reader.next_table().unwrap();
    reader.next_row().unwrap();
    reader.next_field().unwrap();
    assert_eq!(reader.field_value().unwrap(), Datum::Null);
}

#[test]
fn registry_reader_binds_fields() {
    let reader_for_i64 = jsonkit::read::registry::reader_for::<i64>();
    let mut reader = TableReader::from_text(ONE_TABLE);
    reader.next_table().unwrap();
    reader.next_row().unwrap();
    reader.next_field().unwrap();
    let slot = reader.field_with(reader_for_i64.as_ref()).unwrap();
    assert_eq!(jsonkit::read::registry::take_slot::<i64>(slot), Some(1));
}

#[test]
fn row_count_survives_extra_members() {
    // Members after "rows" are skipped when the table is finished.
    let text = r#"[{"rows":[[1]],"stats":{"count":1}},{"rows":[[2]]}]"#;
    let mut reader = TableReader::from_text(text);
    assert!(reader.next_table().unwrap());
    let mut rows = 0;
    while reader.next_row().unwrap() {
        rows += 1;
    }
    assert_eq!(rows, 1);
    assert!(reader.next_table().unwrap());
    assert!(reader.next_row().unwrap());
    reader.next_field().unwrap();
    assert_eq!(reader.field_value().unwrap(), Datum::Int(2));
}

#[test]
fn scalar_column_vocabulary() {
    let text = r#"{"columns":[
            {"name":"at","type":"datetime"},
            {"name":"took","type":"timespan"},
            {"name":"key","type":"guid"},
            {"name":"ok","type":"bool"},
            {"name":"amount","type":"decimal"}
        ],
        "rows":[["2024-05-06T07:08:09Z","01:02:03","67e55044-10b1-426f-9247-bb680e5fe0c8",true,"1.25"]]}"#;
    let mut reader = TableReader::from_text(text);
    reader.next_table().unwrap();
    reader.next_row().unwrap();

    reader.next_field().unwrap();
    let Datum::Date(at) = reader.field_value().unwrap() else {
        panic!("expected a datetime")
    };
    assert_eq!(at.timestamp(), 1_714_979_289);

    reader.next_field().unwrap();
    assert_eq!(
        reader.field_value().unwrap(),
        Datum::Span(chrono::Duration::seconds(3723))
    );

    reader.next_field().unwrap();
    let Datum::Guid(key) = reader.field_value().unwrap() else {
        panic!("expected a guid")
    };
    assert_eq!(key.to_string(), "67e55044-10b1-426f-9247-bb680e5fe0c8");

    reader.next_field().unwrap();
    assert_eq!(reader.field_value().unwrap(), Datum::Bool(true));

    reader.next_field().unwrap();
    let Datum::Decimal(amount) = reader.field_value().unwrap() else {
        panic!("expected a decimal")
    };
    assert_eq!(amount.to_string(), "1.25");
}
