//! Fuzz testing for the decoder.
//!
//! Feeds arbitrary byte sequences to `read` and `View` under a set of
//! schemas covering every field kind, to ensure malformed input is
//! rejected with errors rather than panics or out-of-bounds access.

#![no_main]

use libfuzzer_sys::fuzz_target;

use zmem::{read, read_strict, FieldDef, FieldType, KeyType, Scalar, Schema, View};

fn schemas() -> Vec<Schema> {
    let point = Schema::new(vec![
        FieldDef::new("x", FieldType::Scalar(Scalar::F32)),
        FieldDef::new("y", FieldType::Scalar(Scalar::F32)),
    ])
    .unwrap();
    let entity = Schema::new(vec![
        FieldDef::new("id", FieldType::Scalar(Scalar::U64)),
        FieldDef::new(
            "weights",
            FieldType::Vector {
                elem: Box::new(FieldType::Scalar(Scalar::F32)),
            },
        ),
    ])
    .unwrap();
    let nested = Schema::new(vec![
        FieldDef::new("inner", FieldType::Struct(Box::new(entity.clone()))),
        FieldDef::new(
            "entities",
            FieldType::Vector {
                elem: Box::new(FieldType::Struct(Box::new(entity.clone()))),
            },
        ),
        FieldDef::new("name", FieldType::Str),
        FieldDef::new(
            "tags",
            FieldType::Vector {
                elem: Box::new(FieldType::Str),
            },
        ),
    ])
    .unwrap();
    let exotic = Schema::new(vec![
        FieldDef::new("s", FieldType::FixedStr { len: 8 }),
        FieldDef::new(
            "opt",
            FieldType::Optional {
                inner: Box::new(FieldType::Scalar(Scalar::U32)),
            },
        ),
        FieldDef::new("e", FieldType::Enum { repr: Scalar::I16 }),
        FieldDef::new(
            "u",
            FieldType::Union {
                tag: Scalar::U8,
                variants: vec![FieldType::Str, FieldType::Scalar(Scalar::U32)],
            },
        ),
        FieldDef::new(
            "m",
            FieldType::Map {
                key: KeyType::Int(Scalar::U32),
                value: Box::new(FieldType::Scalar(Scalar::U32)),
            },
        ),
        FieldDef::new(
            "vm",
            FieldType::Map {
                key: KeyType::FixedStr { len: 8 },
                value: Box::new(FieldType::Str),
            },
        ),
    ])
    .unwrap();
    vec![point, entity, nested, exotic]
}

fuzz_target!(|data: &[u8]| {
    for schema in schemas() {
        let _ = read(&schema, data);
        let _ = read_strict(&schema, data);
        if let Ok(view) = View::new(data, &schema) {
            for idx in 0..schema.field_count() {
                let _ = view.get_value(idx);
            }
        }
    }
});
