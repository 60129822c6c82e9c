use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::{Rc, Weak};

use tabletest::{reflect_record, ConversionError, FromValue, Record, Reflect, Scalar, Value};

mod common;
use common::dag;

#[derive(Debug, Clone, PartialEq)]
struct Sample {
    id: u32,
    weight: f64,
    tags: Vec<String>,
    parent: Option<Box<u32>>,
}
reflect_record!(Sample {
    id,
    weight,
    tags,
    parent,
});

fn sample() -> Sample {
    Sample {
        id: 7,
        weight: 0.25,
        tags: vec!["a".to_owned(), "b".to_owned()],
        parent: Some(Box::new(3)),
    }
}

/// A struct reflects to an aggregate with fields in declaration order and
/// converts back unchanged.
#[test]
fn test_record_round_trip() {
    let value = sample().to_value();
    let record = value.as_record().expect("aggregate");
    let names: Vec<&str> = record.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["id", "weight", "tags", "parent"]);
    assert_eq!(record.name, "Sample");
    assert!(matches!(record.get("weight"), Some(Value::Float(w)) if *w == 0.25));
    assert!(record.get("colour").is_none());

    assert_eq!(Sample::from_value(value).unwrap(), sample());
}

#[test]
fn test_record_missing_field() {
    let partial: Value = Record::new("Sample").field("id", Value::uint(1u8)).into();
    let err = Sample::from_value(partial).unwrap_err();
    assert!(matches!(err, ConversionError::Missing(ref name) if name == "weight"), "{err}");
}

#[test]
fn test_record_wrong_field_type() {
    let bad: Value = Record::new("Sample")
        .field("id", Value::str("seven"))
        .field("weight", Value::Float(0.0))
        .field("tags", Value::Sequence(vec![]))
        .field("parent", Value::NULL)
        .into();
    let err = Sample::from_value(bad).unwrap_err();
    assert!(err.to_string().starts_with("field `id`"), "{err}");
}

/// Integer conversions are range-checked across signedness.
#[test]
fn test_integer_conversion() {
    assert_eq!(u8::from_value(Value::int(200)).unwrap(), 200);
    assert_eq!(i64::from_value(Value::uint(5u8)).unwrap(), 5);
    assert!(matches!(
        u8::from_value(Value::int(300)),
        Err(ConversionError::OutOfRange { .. })
    ));
    assert!(matches!(
        u32::from_value(Value::int(-1)),
        Err(ConversionError::OutOfRange { .. })
    ));
    assert!(f64::from_value(Value::int(1)).is_err());
}

/// Two `Rc`s to one allocation share a single slot.
#[test]
fn test_shared_pointers_are_memoised() {
    let shared = Rc::new(1.5);
    let pair = (Rc::clone(&shared), Rc::clone(&shared)).to_value();
    let record = pair.as_record().expect("tuple");
    match (&record.fields[0].value, &record.fields[1].value) {
        (Value::Pointer(Some(a)), Value::Pointer(Some(b))) => assert!(Rc::ptr_eq(a, b)),
        other => panic!("expected two pointers, got {other:?}"),
    }
}

/// Structs linked through `Rc` reflect with the `@reflect` form, and a
/// child reached twice becomes one shared slot.
#[test]
fn test_reflect_only_records() {
    let value = dag(2, 0.5).to_value();
    let Value::Pointer(Some(root)) = &value else {
        panic!("expected a pointer, got {value:?}");
    };
    let root = root.borrow();
    let record = root.as_record().expect("Dag");
    assert_eq!(record.name, "Dag");
    match (record.get("left"), record.get("right")) {
        (Some(Value::Pointer(Some(left))), Some(Value::Pointer(Some(right)))) => {
            match (&*left.borrow(), &*right.borrow()) {
                (Value::Pointer(Some(a)), Value::Pointer(Some(b))) => assert!(Rc::ptr_eq(a, b)),
                other => panic!("expected shared children, got {other:?}"),
            }
        }
        other => panic!("expected two links, got {other:?}"),
    }
}

#[test]
fn test_dangling_weak_is_null() {
    let weak: Weak<RefCell<u8>> = {
        let strong = Rc::new(RefCell::new(1));
        Rc::downgrade(&strong)
    };
    assert!(matches!(weak.to_value(), Value::Pointer(None)));
}

/// Map entries are ordered by key, whatever the map type.
#[test]
fn test_maps() {
    let hashed: HashMap<String, i32> =
        HashMap::from([("b".to_owned(), 2), ("a".to_owned(), 1), ("c".to_owned(), 3)]);
    let ordered: BTreeMap<String, i32> = hashed.clone().into_iter().collect();

    assert_eq!(hashed.to_value().to_string(), r#"{"a": 1, "b": 2, "c": 3}"#);
    assert_eq!(hashed.to_value().to_string(), ordered.to_value().to_string());

    let back = BTreeMap::<String, i32>::from_value(ordered.to_value()).unwrap();
    assert_eq!(back, ordered);
}

#[test]
fn test_tuples_and_arrays() {
    let value = (1u8, 'x', [1.0, 2.0]).to_value();
    let (n, c, xs) = <(u8, char, [f64; 2])>::from_value(value).unwrap();
    assert_eq!((n, c, xs), (1, 'x', [1.0, 2.0]));

    let err = <[f64; 3]>::from_value(vec![1.0].to_value()).unwrap_err();
    assert!(matches!(err, ConversionError::Type { .. }));
}

#[test]
fn test_unit_and_errors() {
    assert!(matches!(().to_value(), Value::Scalar(Scalar::Unit)));

    let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
    assert_eq!(Value::error(&io).to_string(), "error(disk on fire)");
    assert_eq!(Value::opaque(&std::time::Duration::from_millis(5)).to_string(), "5ms");
}
