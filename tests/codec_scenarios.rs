//! End-to-end codec scenarios over a composite object exercising every
//! layout shape at once: fixed scalar vectors, fixed-name strings, nested
//! variable aggregates, a vector of fixed aggregates, and a string array.

use zmem::{
    encoded_size, read, write_preallocated, write_to_vec, FieldDef, FieldType, Scalar, Schema,
    Value, View,
};

fn scalar(s: Scalar) -> FieldType {
    FieldType::Scalar(s)
}

fn vector(elem: FieldType) -> FieldType {
    FieldType::Vector {
        elem: Box::new(elem),
    }
}

fn fixed_str(len: usize) -> FieldType {
    FieldType::FixedStr { len }
}

/// { int_array: vec<i32>, float_array: vec<f32>, double_array: vec<f64> }
fn fixed_object_schema() -> Schema {
    Schema::new(vec![
        FieldDef::new("int_array", vector(scalar(Scalar::I32))),
        FieldDef::new("float_array", vector(scalar(Scalar::F32))),
        FieldDef::new("double_array", vector(scalar(Scalar::F64))),
    ])
    .unwrap()
}

/// Five fixed-length name strings; a fully fixed aggregate.
fn fixed_name_object_schema() -> Schema {
    Schema::new(vec![
        FieldDef::new("name0", fixed_str(16)),
        FieldDef::new("name1", fixed_str(16)),
        FieldDef::new("name2", fixed_str(16)),
        FieldDef::new("name3", fixed_str(16)),
        FieldDef::new("name4", fixed_str(16)),
    ])
    .unwrap()
}

fn vec3_schema() -> Schema {
    Schema::new(vec![
        FieldDef::new("x", scalar(Scalar::F64)),
        FieldDef::new("y", scalar(Scalar::F64)),
        FieldDef::new("z", scalar(Scalar::F64)),
    ])
    .unwrap()
}

/// { v3s: vec<Vec3>, id: string }
fn nested_object_schema() -> Schema {
    Schema::new(vec![
        FieldDef::new("v3s", vector(FieldType::Struct(Box::new(vec3_schema())))),
        FieldDef::new("id", FieldType::Str),
    ])
    .unwrap()
}

/// { string, another_string, escaped_text, boolean, nested_object }
fn another_object_schema() -> Schema {
    Schema::new(vec![
        FieldDef::new("string", FieldType::Str),
        FieldDef::new("another_string", FieldType::Str),
        FieldDef::new("escaped_text", FieldType::Str),
        FieldDef::new("boolean", scalar(Scalar::Bool)),
        FieldDef::new(
            "nested_object",
            FieldType::Struct(Box::new(nested_object_schema())),
        ),
    ])
    .unwrap()
}

fn test_obj_schema() -> Schema {
    Schema::new(vec![
        FieldDef::new(
            "fixed_object",
            FieldType::Struct(Box::new(fixed_object_schema())),
        ),
        FieldDef::new(
            "fixed_name_object",
            FieldType::Struct(Box::new(fixed_name_object_schema())),
        ),
        FieldDef::new(
            "another_object",
            FieldType::Struct(Box::new(another_object_schema())),
        ),
        FieldDef::new("string_array", vector(FieldType::Str)),
        FieldDef::new("string", FieldType::Str),
        FieldDef::new("number", scalar(Scalar::F64)),
        FieldDef::new("boolean", scalar(Scalar::Bool)),
        FieldDef::new("another_bool", scalar(Scalar::Bool)),
    ])
    .unwrap()
}

fn vec3(x: f64, y: f64, z: f64) -> Value {
    Value::Struct(vec![Value::F64(x), Value::F64(y), Value::F64(z)])
}

fn test_obj() -> Value {
    let fixed_object = Value::Struct(vec![
        Value::Vector((0..7).map(Value::I32).collect()),
        Value::Vector(
            [0.1f32, 0.2, 0.3, 0.4, 0.5, 0.6]
                .iter()
                .map(|&f| Value::F32(f))
                .collect(),
        ),
        Value::Vector(
            [3288398.238f64, 233e22, 289e-1, 0.928759872, 0.22222848, 0.1, 0.2, 0.3, 0.4]
                .iter()
                .map(|&f| Value::F64(f))
                .collect(),
        ),
    ]);
    let fixed_name_object = Value::Struct(vec![
        Value::FixedStr("James".into()),
        Value::FixedStr("Abraham".into()),
        Value::FixedStr("Susan".into()),
        Value::FixedStr("Frank".into()),
        Value::FixedStr("Alicia".into()),
    ]);
    let nested_object = Value::Struct(vec![
        Value::Vector(vec![
            vec3(0.12345, 0.23456, 0.001345),
            vec3(0.3894675, 97.39827, 297.92387),
            vec3(18.18, 87.289, 2988.298),
        ]),
        Value::Str("298728949872".into()),
    ]);
    let another_object = Value::Struct(vec![
        Value::Str("here is some text".into()),
        Value::Str("Hello World".into()),
        Value::Str(r#"{"some key":"some string value"}"#.into()),
        Value::Bool(false),
        nested_object,
    ]);
    Value::Struct(vec![
        fixed_object,
        fixed_name_object,
        another_object,
        Value::Vector(vec![
            Value::Str("Cat".into()),
            Value::Str("Dog".into()),
            Value::Str("Elephant".into()),
            Value::Str("Tiger".into()),
        ]),
        Value::Str("Hello world".into()),
        Value::F64(3.14),
        Value::Bool(true),
        Value::Bool(false),
    ])
}

#[test]
fn composite_roundtrips_with_field_equality() {
    let schema = test_obj_schema();
    let value = test_obj();

    let bytes = write_to_vec(&schema, &value).unwrap();
    assert_eq!(bytes.len(), encoded_size(&schema, &value).unwrap());
    assert_eq!(bytes.len() % 8, 0);
    assert_eq!(read(&schema, &bytes).unwrap(), value);
}

#[test]
fn composite_preallocated_matches_growing() {
    let schema = test_obj_schema();
    let value = test_obj();

    let grown = write_to_vec(&schema, &value).unwrap();
    let mut buf = vec![0u8; grown.len()];
    let written = write_preallocated(&schema, &value, &mut buf).unwrap();
    assert_eq!(written, grown.len());
    assert_eq!(buf, grown);
}

#[test]
fn composite_encoding_is_deterministic() {
    let schema = test_obj_schema();
    assert_eq!(
        write_to_vec(&schema, &test_obj()).unwrap(),
        write_to_vec(&schema, &test_obj()).unwrap()
    );
}

/// Walks every field through the lazy view, computing the same checksum a
/// full decode would, without materializing any container.
fn view_checksum(view: &View) -> f64 {
    let mut sum = 0.0f64;

    let fixed = view.get_struct(0).unwrap();
    for v in fixed.get_slice::<i32>(0).unwrap() {
        sum += *v as f64;
    }
    for v in fixed.get_slice::<f32>(1).unwrap() {
        sum += *v as f64;
    }
    for v in fixed.get_slice::<f64>(2).unwrap() {
        sum += *v;
    }

    let names = view.get_struct(1).unwrap();
    for i in 0..5 {
        sum += names.get_fixed_str(i).unwrap().len() as f64;
    }

    let another = view.get_struct(2).unwrap();
    sum += another.get_str(0).unwrap().len() as f64;
    sum += another.get_str(1).unwrap().len() as f64;
    sum += another.get_str(2).unwrap().len() as f64;
    sum += if another.get_bool(3).unwrap() { 1.0 } else { 0.0 };

    let nested = another.get_struct(4).unwrap();
    let v3s = nested.get_seq(0).unwrap();
    for i in 0..v3s.len() {
        let v3 = v3s.element(i).unwrap();
        sum += v3.get_f64(0).unwrap() + v3.get_f64(1).unwrap() + v3.get_f64(2).unwrap();
    }
    sum += nested.get_str(1).unwrap().len() as f64;

    let strings = view.get_seq(3).unwrap();
    for i in 0..strings.len() {
        sum += strings.element_str(i).unwrap().len() as f64;
    }

    sum += view.get_str(4).unwrap().len() as f64;
    sum += view.get_f64(5).unwrap();
    sum += if view.get_bool(6).unwrap() { 1.0 } else { 0.0 };
    sum += if view.get_bool(7).unwrap() { 1.0 } else { 0.0 };
    sum
}

fn decoded_checksum(value: &Value) -> f64 {
    let Value::Struct(fields) = value else {
        panic!("expected struct");
    };
    let mut sum = 0.0f64;

    let Value::Struct(fixed) = &fields[0] else {
        panic!("expected struct");
    };
    for arr in fixed {
        let Value::Vector(items) = arr else {
            panic!("expected vector");
        };
        for item in items {
            sum += match item {
                Value::I32(v) => *v as f64,
                Value::F32(v) => *v as f64,
                Value::F64(v) => *v,
                other => panic!("unexpected element {other:?}"),
            };
        }
    }

    let Value::Struct(names) = &fields[1] else {
        panic!("expected struct");
    };
    for n in names {
        let Value::FixedStr(s) = n else {
            panic!("expected fixed string");
        };
        sum += s.len() as f64;
    }

    let Value::Struct(another) = &fields[2] else {
        panic!("expected struct");
    };
    for s in &another[..3] {
        let Value::Str(s) = s else {
            panic!("expected string");
        };
        sum += s.len() as f64;
    }
    let Value::Bool(b) = &another[3] else {
        panic!("expected bool");
    };
    sum += if *b { 1.0 } else { 0.0 };

    let Value::Struct(nested) = &another[4] else {
        panic!("expected struct");
    };
    let Value::Vector(v3s) = &nested[0] else {
        panic!("expected vector");
    };
    for v3 in v3s {
        let Value::Struct(coords) = v3 else {
            panic!("expected struct");
        };
        for c in coords {
            let Value::F64(v) = c else {
                panic!("expected f64");
            };
            sum += v;
        }
    }
    let Value::Str(id) = &nested[1] else {
        panic!("expected string");
    };
    sum += id.len() as f64;

    let Value::Vector(strings) = &fields[3] else {
        panic!("expected vector");
    };
    for s in strings {
        let Value::Str(s) = s else {
            panic!("expected string");
        };
        sum += s.len() as f64;
    }

    let Value::Str(s) = &fields[4] else {
        panic!("expected string");
    };
    sum += s.len() as f64;
    let Value::F64(n) = &fields[5] else {
        panic!("expected f64");
    };
    sum += n;
    for b in &fields[6..8] {
        let Value::Bool(b) = b else {
            panic!("expected bool");
        };
        sum += if *b { 1.0 } else { 0.0 };
    }
    sum
}

#[test]
fn view_checksum_matches_decoded_checksum() {
    let schema = test_obj_schema();
    let value = test_obj();
    let bytes = write_to_vec(&schema, &value).unwrap();

    let view = View::new(&bytes, &schema).unwrap();
    let from_view = view_checksum(&view);
    let from_decode = decoded_checksum(&read(&schema, &bytes).unwrap());
    assert!((from_view - from_decode).abs() < 1e-6);
}

#[test]
fn concurrent_views_share_one_buffer() {
    let schema = test_obj_schema();
    let bytes = write_to_vec(&schema, &test_obj()).unwrap();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let view = View::new(&bytes, &schema).unwrap();
                let sum = view_checksum(&view);
                assert!(sum.is_finite());
            });
        }
    });
}

#[test]
fn view_reads_from_memory_mapped_file() {
    let schema = test_obj_schema();
    let value = test_obj();
    let bytes = write_to_vec(&schema, &value).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("composite.zm");
    std::fs::write(&path, &bytes).unwrap();

    let file = std::fs::File::open(&path).unwrap();
    // SAFETY: the file is private to this test and not modified while
    // mapped.
    let map = unsafe { memmap2::Mmap::map(&file).unwrap() };

    let view = View::new(&map, &schema).unwrap();
    assert_eq!(view.get_f64(5).unwrap(), 3.14);
    assert_eq!(read(&schema, &map).unwrap(), value);
}
