//! Round-trip and registry behaviour through the public API

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use rockrpc_json::conversion::{
    AnyBox, ConverterFamily, Exporter, FnFamily, Importer, NumberConverter, downcast_ref,
};
use rockrpc_json::{
    ExportContext, ImportContext, JsonComponent, JsonEnum, JsonReader, JsonResult, JsonTextReader,
    JsonWrite, JsonWriter, Reflect, TypeInfo,
};
use serde_json::{Value, json};

#[derive(Debug, Clone, Copy, PartialEq, JsonEnum)]
enum Level {
    Junior,
    Senior,
}

#[derive(Debug, Default, PartialEq, JsonComponent)]
struct Address {
    pub city: String,
    pub zip: Option<String>,
}

#[derive(Debug, Default, PartialEq, JsonComponent)]
struct Employee {
    #[json(rename = "Name")]
    pub name: String,
    #[json(rename = "Salary")]
    pub salary: i64,
    pub level: Option<Level>,
    pub address: Address,
    pub tags: Vec<String>,
    pub scores: BTreeMap<String, f64>,
}

fn employee() -> Employee {
    Employee {
        name: "John Doe".into(),
        salary: 123456789,
        level: Some(Level::Senior),
        address: Address {
            city: "Oslo".into(),
            zip: None,
        },
        tags: vec!["ops".into(), "rust".into()],
        scores: BTreeMap::from([("q1".to_string(), 1.5), ("q2".to_string(), -3.0)]),
    }
}

#[test]
fn test_scenario_a_relaxed_parse() {
    let value = rockrpc_json::parse(r#"{"a":1,"b":['x','y']}"#).unwrap();
    assert_eq!(value["a"], json!(1));
    assert_eq!(value["b"], json!(["x", "y"]));
}

#[test]
fn test_scenario_b_exact_write() {
    let mut writer = JsonWriter::text(String::new());
    writer.write_start_object().unwrap();
    writer.write_member("Name").unwrap();
    writer.write_string("John Doe").unwrap();
    writer.write_member("Salary").unwrap();
    writer.write_i64(123456789).unwrap();
    writer.write_end_object().unwrap();
    assert!(writer.is_closed());
    assert_eq!(writer.into_string(), r#"{"Name":"John Doe","Salary":123456789}"#);
}

#[test]
fn test_value_round_trip_through_text() {
    let documents = [
        json!(null),
        json!(true),
        json!("tab\there \"quoted\" \u{1F600}"),
        json!(-12.5),
        json!(18446744073709551615u64),
        json!([]),
        json!({}),
        json!({"a": [1, {"b": null}, [false, "x"]], "c": {"d": {"e": 0}}}),
    ];
    for document in documents {
        let text = rockrpc_json::to_string(&document).unwrap();
        assert_eq!(rockrpc_json::parse(&text).unwrap(), document, "{text}");

        let imported: Value = ImportContext::global().import_str(&text).unwrap();
        let exported = ExportContext::global().export_to_string(&imported).unwrap();
        assert_eq!(rockrpc_json::parse(&exported).unwrap(), document);
    }
}

#[test]
fn test_component_round_trip() {
    let original = employee();
    let text = ExportContext::global().export_to_string(&original).unwrap();
    assert_eq!(
        rockrpc_json::parse(&text).unwrap(),
        json!({
            "Name": "John Doe",
            "Salary": 123456789,
            "level": "Senior",
            "address": {"city": "Oslo"},
            "tags": ["ops", "rust"],
            "scores": {"q1": 1.5, "q2": -3},
        })
    );
    let imported: Employee = ImportContext::global().import_str(&text).unwrap();
    assert_eq!(imported, original);
}

#[test]
fn test_component_import_through_buffer() {
    let buffer = ExportContext::global().export_to_buffer(&employee()).unwrap();
    assert!(buffer.is_object());
    let imported: Employee = ImportContext::global().import_buffer(&buffer).unwrap();
    assert_eq!(imported.address.city, "Oslo");
    assert_eq!(imported.level, Some(Level::Senior));
}

#[test]
fn test_relaxed_component_text() {
    let text = "{ Name: 'Ada', salary = 10, level => 'junior', /* ignored */ tags: ['x'] }";
    let imported: Employee = ImportContext::global().import_str(text).unwrap();
    assert_eq!(imported.name, "Ada");
    assert_eq!(imported.salary, 10);
    assert_eq!(imported.level, Some(Level::Junior));
    assert_eq!(imported.tags, vec!["x"]);
}

#[test]
fn test_reader_leaves_cursor_after_value() {
    let mut reader = JsonTextReader::new("[1, 2] 'next'");
    let numbers: Vec<u8> = ImportContext::global().import(&mut reader).unwrap();
    assert_eq!(numbers, vec![1, 2]);
    assert_eq!(reader.read_string().unwrap(), "next");
    assert!(reader.eof());
}

struct Fixed(i64);

impl Importer for Fixed {
    fn import(&self, _: &ImportContext, reader: &mut dyn JsonReader) -> JsonResult<AnyBox> {
        reader.skip()?;
        Ok(Box::new(self.0))
    }
}

struct Shout;

impl Exporter for Shout {
    fn export(&self, _: &ExportContext, value: &dyn Any, writer: &mut dyn JsonWrite) -> JsonResult<()> {
        let text = downcast_ref::<String>(value)?;
        writer.write_string(&text.to_uppercase())
    }
}

#[test]
fn test_new_exact_importer_is_used_immediately() {
    let context = ImportContext::stock();
    assert_eq!(context.import_str::<i64>("7").unwrap(), 7);
    assert_eq!(context.import_str::<i64>("7").unwrap(), 7);

    context.register::<i64>(Fixed(1));
    assert_eq!(context.import_str::<i64>("7").unwrap(), 1);
    context.register::<i64>(Fixed(2));
    assert_eq!(context.import_str::<i64>("7").unwrap(), 2);

    // Sequences resolve their element converter through the same registry
    assert_eq!(context.import_str::<Vec<i64>>("[7, 8]").unwrap(), vec![2, 2]);
    assert_eq!(ImportContext::global().import_str::<i64>("7").unwrap(), 7);
}

#[test]
fn test_new_exact_exporter_is_used_immediately() {
    let context = ExportContext::stock();
    let name = String::from("ada");
    assert_eq!(context.export_to_string(&name).unwrap(), r#""ada""#);
    context.register::<String>(Shout);
    assert_eq!(context.export_to_string(&name).unwrap(), r#""ADA""#);
    assert_eq!(
        context.export_to_string(&vec![name.clone()]).unwrap(),
        r#"["ADA"]"#
    );
}

fn counting_family(
    value: i64,
    accepts: fn(&TypeInfo) -> bool,
    hits: Arc<AtomicUsize>,
) -> impl ConverterFamily<dyn Importer> {
    FnFamily(move |info: &TypeInfo| {
        if !accepts(info) {
            return None;
        }
        hits.fetch_add(1, Ordering::SeqCst);
        Some(Arc::new(Fixed(value)) as Arc<dyn Importer>)
    })
}

#[test]
fn test_first_accepting_family_wins() {
    let context = ImportContext::empty();
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    context.register_family(counting_family(
        1,
        |info| info.id() == i64::type_info().id(),
        Arc::clone(&first),
    ));
    context.register_family(counting_family(2, |_| true, Arc::clone(&second)));

    assert_eq!(context.import_str::<i64>("0").unwrap(), 1);
    assert_eq!(second.load(Ordering::SeqCst), 0);
    assert!(context.registry().find(&i32::type_info()).is_some());
    assert_eq!(second.load(Ordering::SeqCst), 1);

    // Decisions are memoized per type
    assert_eq!(context.import_str::<i64>("0").unwrap(), 1);
    assert_eq!(first.load(Ordering::SeqCst), 1);
}

#[test]
fn test_exact_registration_beats_family() {
    let context = ImportContext::empty();
    context.register_family(counting_family(1, |_| true, Arc::new(AtomicUsize::new(0))));
    context.register::<i64>(Fixed(9));
    assert_eq!(context.import_str::<i64>("0").unwrap(), 9);
}

#[test]
fn test_missing_converter_names_type() {
    let err = ImportContext::empty().import_str::<u16>("1").unwrap_err();
    assert!(err.to_string().contains("u16"), "{err}");
}

#[test]
fn test_concurrent_resolution_and_registration() {
    let context = ImportContext::stock();
    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..200 {
                    let employee: Employee = context
                        .import_str(r#"{"Name":"x","Salary":1,"tags":["a"]}"#)
                        .unwrap();
                    assert_eq!(employee.tags, vec!["a"]);
                    let value: i32 = context.import_str("5").unwrap();
                    assert_eq!(value, 5);
                }
            });
        }
        scope.spawn(|| {
            for _ in 0..50 {
                context.register::<u16>(NumberConverter::<u16>::new());
            }
        });
    });
    assert_eq!(context.import_str::<i64>("6").unwrap(), 6);
    assert!(context.registry().generation() > 50);
}
