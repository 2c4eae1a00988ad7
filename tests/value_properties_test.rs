use proptest::prelude::*;
use relstore::{AttrType, Value};
use std::cmp::Ordering;

const ALL_TYPES: [AttrType; 9] = [
    AttrType::Undefined,
    AttrType::Chars,
    AttrType::Ints,
    AttrType::Floats,
    AttrType::Dates,
    AttrType::Vectors,
    AttrType::Texts,
    AttrType::Booleans,
    AttrType::Nulls,
];

fn parse(attr_type: AttrType, text: &str) -> Value {
    let mut value = Value::null();
    value.set_value_from_str(attr_type, text).unwrap();
    value
}

fn sample(attr_type: AttrType) -> Value {
    match attr_type {
        AttrType::Chars => Value::from("12"),
        AttrType::Ints => Value::from(12),
        AttrType::Floats => Value::from(1.5f32),
        AttrType::Dates => Value::date(20240229),
        AttrType::Vectors => Value::from(vec![1.0f32, 2.0]),
        AttrType::Texts => Value::text("long"),
        AttrType::Booleans => Value::from(true),
        AttrType::Undefined | AttrType::Nulls => Value::null(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn int_text_round_trip(n in any::<i32>()) {
        prop_assert_eq!(parse(AttrType::Ints, &Value::from(n).to_string()), Value::from(n));
    }

    #[test]
    fn float_text_round_trip(f in -1.0e6f32..1.0e6) {
        prop_assert_eq!(parse(AttrType::Floats, &Value::from(f).to_string()).get_float(), f);
    }

    #[test]
    fn chars_text_round_trip(s in "[a-zA-Z0-9 ]{0,16}") {
        prop_assert_eq!(parse(AttrType::Chars, &s).get_string(), s);
    }

    #[test]
    fn date_text_round_trip(year in 1i32..=9999, month in 1u32..=12, day in 1u32..=28) {
        let text = format!("{year:04}-{month:02}-{day:02}");
        let value = parse(AttrType::Dates, &text);
        prop_assert!(value.is_date_valid());
        prop_assert_eq!(value.to_string(), text);
    }

    #[test]
    fn negative_years_are_rejected(year in 1i32..=9999) {
        let mut value = Value::null();
        let date = format!("-{year:04}-03-04");
        prop_assert!(value.set_value_from_str(AttrType::Dates, &date).is_err());
        prop_assert!(Value::from_date(&date).is_err());
    }

    #[test]
    fn int_float_compare_agrees(a in -1000i32..1000, b in -1000i32..1000) {
        let left = Value::from(a);
        let right = Value::from(b as f32);
        prop_assert_eq!(left.compare(&right), Some(a.cmp(&b)));
        prop_assert_eq!(right.compare(&left), Some(b.cmp(&a)));
    }

    #[test]
    fn null_absorbs_arithmetic(n in any::<i32>()) {
        let value = Value::from(n);
        let null = Value::null();
        prop_assert!(Value::add(&value, &null).unwrap().is_null());
        prop_assert!(Value::subtract(&null, &value).unwrap().is_null());
        prop_assert!(Value::multiply(&value, &null).unwrap().is_null());
        prop_assert!(Value::divide(&null, &value).unwrap().is_null());
        prop_assert!(value.compare(&null).is_none());
    }

    #[test]
    fn int_addition_wraps_into_int(a in -10_000i32..10_000, b in -10_000i32..10_000) {
        let sum = Value::add(&Value::from(a), &Value::from(b)).unwrap();
        prop_assert!(sum.is_int());
        prop_assert_eq!(sum.get_int(), a + b);
    }
}

#[test]
fn test_boolean_text_round_trip() {
    for b in [true, false] {
        assert_eq!(parse(AttrType::Booleans, &Value::from(b).to_string()), Value::from(b));
    }
}

#[test]
fn test_result_type_is_total_and_symmetric() {
    for left in ALL_TYPES {
        for right in ALL_TYPES {
            let (l, r) = (sample(left), sample(right));
            let forward = Value::result_type(&l, &r);
            let backward = Value::result_type(&r, &l);
            match (forward, backward) {
                (Ok(a), Ok(b)) => assert_eq!(a, b, "{left:?} vs {right:?}"),
                (Err(a), Err(b)) => assert_eq!(a.code(), b.code()),
                (f, b) => panic!("asymmetric result type for {left:?}/{right:?}: {f:?} {b:?}"),
            }
        }
    }
}

#[test]
fn test_chars_tie_break_on_length() {
    let short = Value::chars(b"ab");
    let long = Value::chars(b"ab\0c");
    assert_eq!(short.compare(&long), Some(Ordering::Less));
    assert_eq!(long.compare(&short), Some(Ordering::Greater));
    assert_eq!(short.compare(&Value::from("ab")), Some(Ordering::Equal));
}

#[test]
fn test_float_equality_uses_epsilon() {
    let a = Value::from(0.1f32 + 0.2);
    let b = Value::from(0.3f32);
    assert_eq!(a.compare(&b), Some(Ordering::Equal));
    assert_eq!(Value::from(1.0f32).compare(&Value::from(1.001f32)), Some(Ordering::Less));
}

#[test]
fn test_sort_order_puts_null_first() {
    let mut values = vec![Value::from(3), Value::null(), Value::from(1.5f32), Value::from(-2)];
    values.sort_by(Value::compare_for_sort);
    let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
    assert_eq!(rendered, vec!["NULL", "-2", "1.5", "3"]);
}
