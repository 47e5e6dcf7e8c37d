use super::*;

#[test]
fn any_key_is_zero() {
    assert_eq!(Key::ANY.raw(), 0);
    assert!(Key::ANY.is_any_key());
    assert!(!Key::ANY.is_int_key());
    assert!(!Key::ANY.is_string_key());
    assert_eq!(Key::ANY.kind(), Some(KeyKind::Any));
    assert_eq!(Key::default(), Key::ANY);
}

#[test]
fn int_keys_are_odd_and_decode() {
    for value in [0, 1, 5, -1, -7, i32::MAX, i32::MIN] {
        let key = Key::for_int(value);
        assert_eq!(key.raw() % 2, 1, "int key for {value} must be odd");
        assert!(key.is_int_key());
        assert!(!key.is_string_key());
        assert_eq!(key.int_value(), Some(value));
        assert_eq!(key.kind(), Some(KeyKind::Int(value)));
    }
}

#[test]
fn int_key_encoding_matches_layout() {
    assert_eq!(Key::for_int(0).raw(), 1);
    assert_eq!(Key::for_int(5).raw(), 11);
    assert_eq!(Key::for_int(-1).raw(), Key::MAX_INT_ID);
}

#[test]
fn string_keys_are_even() {
    let first = Key::for_string_index(0);
    let second = Key::for_string_index(1);
    assert_eq!(first.raw(), 2);
    assert_eq!(second.raw(), 4);
    assert!(first.is_string_key());
    assert_eq!(first.int_value(), None);
    assert_eq!(first.kind(), Some(KeyKind::String));
    assert_eq!(Key::for_string_index(u32::MAX).raw(), Key::MAX_STRING_ID);
}

#[test]
fn ids_outside_ranges_are_unclassified() {
    let past_ints = Key::from_raw(Key::MAX_INT_ID + 2);
    let past_strings = Key::from_raw(Key::MAX_STRING_ID + 2);
    assert_eq!(past_ints.kind(), None);
    assert_eq!(past_strings.kind(), None);
    assert_eq!(format!("{past_ints:?}"), format!("Key(invalid {})", past_ints.raw()));
}

#[test]
fn keys_order_by_id() {
    let mut keys = vec![Key::for_string_index(0), Key::for_int(3), Key::ANY];
    keys.sort();
    assert_eq!(keys, vec![Key::ANY, Key::for_string_index(0), Key::for_int(3)]);
}

#[test]
fn debug_shows_classification() {
    assert_eq!(format!("{:?}", Key::ANY), "Key::ANY");
    assert_eq!(format!("{:?}", Key::for_int(-4)), "Key(int -4)");
    assert_eq!(format!("{:?}", Key::for_string_index(2)), "Key(str #6)");
}
