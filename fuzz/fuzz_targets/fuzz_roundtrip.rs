//! Fuzz testing for the writer round-trip.
//!
//! Builds structured values from arbitrary input, writes them with both
//! writer modes, and checks that prediction, encoding, and decoding agree.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use zmem::{
    encoded_size, read, write_preallocated, write_to_vec, FieldDef, FieldType, KeyType, MapKey,
    Scalar, Schema, Value,
};

#[derive(Debug, Arbitrary)]
struct Input {
    id: u64,
    weights: Vec<f32>,
    name: String,
    tags: Vec<String>,
    entries: Vec<(u32, u32)>,
    opt: Option<u32>,
}

fn schema() -> Schema {
    Schema::new(vec![
        FieldDef::new("id", FieldType::Scalar(Scalar::U64)),
        FieldDef::new(
            "weights",
            FieldType::Vector {
                elem: Box::new(FieldType::Scalar(Scalar::F32)),
            },
        ),
        FieldDef::new("name", FieldType::Str),
        FieldDef::new(
            "tags",
            FieldType::Vector {
                elem: Box::new(FieldType::Str),
            },
        ),
        FieldDef::new(
            "entries",
            FieldType::Map {
                key: KeyType::Int(Scalar::U32),
                value: Box::new(FieldType::Scalar(Scalar::U32)),
            },
        ),
        FieldDef::new(
            "opt",
            FieldType::Optional {
                inner: Box::new(FieldType::Scalar(Scalar::U32)),
            },
        ),
    ])
    .unwrap()
}

fuzz_target!(|input: Input| {
    // NaN breaks value equality, duplicate keys are rejected by design.
    if input.weights.iter().any(|w| w.is_nan()) {
        return;
    }
    let mut entries = input.entries.clone();
    entries.sort_by_key(|(k, _)| *k);
    entries.dedup_by_key(|(k, _)| *k);

    let value = Value::Struct(vec![
        Value::U64(input.id),
        Value::Vector(input.weights.iter().map(|&w| Value::F32(w)).collect()),
        Value::Str(input.name.clone()),
        Value::Vector(input.tags.iter().map(|t| Value::Str(t.clone())).collect()),
        Value::Map(
            entries
                .iter()
                .map(|&(k, v)| (MapKey::Int(k as i128), Value::U32(v)))
                .collect(),
        ),
        Value::Optional(input.opt.map(|v| Box::new(Value::U32(v)))),
    ]);

    let schema = schema();
    let bytes = write_to_vec(&schema, &value).unwrap();
    assert_eq!(bytes.len(), encoded_size(&schema, &value).unwrap());

    let mut buf = vec![0xAAu8; bytes.len()];
    write_preallocated(&schema, &value, &mut buf).unwrap();
    assert_eq!(buf, bytes);

    assert_eq!(read(&schema, &bytes).unwrap(), value);
});
