//! Conversion function tests

use bytes::Bytes;
use respline::convert::{
    to_bool, to_bool_vec, to_bytes, to_f64, to_field_map, to_field_map_vec, to_geo_coordinates,
    to_i64, to_optional_bytes, to_optional_bytes_vec, to_optional_f64, to_optional_i64,
    to_optional_string_vec, to_scan_result,
    to_status, to_string, to_string_vec, to_tuples, GeoCoordinate, Tuple,
};
use respline::{RawReply, ResplineError};

fn bulks(items: &[&str]) -> RawReply {
    RawReply::array(items.iter().map(|s| RawReply::bulk(s.to_string())).collect())
}

fn is_conversion_error<T: std::fmt::Debug>(result: respline::Result<T>) -> bool {
    matches!(result, Err(ResplineError::Conversion { .. }))
}

// =============================================================================
// Scalars
// =============================================================================

#[test]
fn test_text_from_status_and_bulk() {
    assert_eq!(to_string(Ok(RawReply::status("OK"))).unwrap(), "OK");
    assert_eq!(to_string(Ok(RawReply::bulk("hello"))).unwrap(), "hello");
    assert!(is_conversion_error(to_string(Ok(RawReply::Integer(1)))));
}

#[test]
fn test_null_bulk_becomes_empty() {
    assert_eq!(to_string(Ok(RawReply::null_bulk())).unwrap(), "");
    assert_eq!(to_bytes(Ok(RawReply::null_bulk())).unwrap(), Bytes::new());
    assert_eq!(to_optional_bytes(Ok(RawReply::null_bulk())).unwrap(), None);
}

#[test]
fn test_status_only_accepts_status() {
    assert_eq!(to_status(Ok(RawReply::status("QUEUED"))).unwrap(), "QUEUED");
    assert!(is_conversion_error(to_status(Ok(RawReply::bulk("OK")))));
}

#[test]
fn test_integers_and_booleans() {
    assert_eq!(to_i64(Ok(RawReply::Integer(-3))).unwrap(), -3);
    assert!(to_bool(Ok(RawReply::Integer(1))).unwrap());
    assert!(!to_bool(Ok(RawReply::Integer(0))).unwrap());
    assert!(is_conversion_error(to_i64(Ok(RawReply::bulk("3")))));
    assert!(is_conversion_error(to_bool(Ok(RawReply::status("OK")))));
}

#[test]
fn test_floats_from_decimal_text() {
    assert_eq!(to_f64(Ok(RawReply::bulk("3.25"))).unwrap(), 3.25);
    assert_eq!(to_f64(Ok(RawReply::bulk("inf"))).unwrap(), f64::INFINITY);
    assert_eq!(to_f64(Ok(RawReply::bulk("-inf"))).unwrap(), f64::NEG_INFINITY);
    assert_eq!(to_optional_f64(Ok(RawReply::null_bulk())).unwrap(), None);
    assert!(is_conversion_error(to_f64(Ok(RawReply::bulk("fast")))));
}

#[test]
fn test_upstream_errors_pass_through() {
    let err = ResplineError::Server("ERR boom".to_string());
    assert_eq!(to_i64(Err(err.clone())).unwrap_err(), err);
    assert_eq!(to_field_map(Err(err.clone())).unwrap_err(), err);
}

// =============================================================================
// Collections
// =============================================================================

#[test]
fn test_string_vec_with_null_element() {
    let reply = RawReply::array(vec![RawReply::bulk("a"), RawReply::null_bulk()]);
    assert_eq!(to_string_vec(Ok(reply)).unwrap(), vec!["a".to_string(), String::new()]);
}

#[test]
fn test_optional_bytes_vec_keeps_nulls() {
    let reply = RawReply::array(vec![RawReply::null_bulk(), RawReply::bulk("x")]);
    assert_eq!(
        to_optional_bytes_vec(Ok(reply)).unwrap(),
        vec![None, Some(Bytes::from_static(b"x"))]
    );
}

#[test]
fn test_bool_vec() {
    let reply = RawReply::array(vec![RawReply::Integer(1), RawReply::Integer(0)]);
    assert_eq!(to_bool_vec(Ok(reply)).unwrap(), vec![true, false]);
}

#[test]
fn test_field_map_keeps_order() {
    let map = to_field_map(Ok(bulks(&["z", "1", "a", "2", "m", "3"]))).unwrap();
    assert_eq!(map.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
    assert_eq!(map.get("a"), Some("2"));
    assert_eq!(map.len(), 3);
}

#[test]
fn test_field_map_odd_length() {
    assert!(is_conversion_error(to_field_map(Ok(bulks(&["a", "1", "b"])))));
}

#[test]
fn test_tuples_count_is_half_the_array() {
    let tuples = to_tuples(Ok(bulks(&["a", "1", "b", "2.5"]))).unwrap();
    assert_eq!(tuples, vec![Tuple::new("a", 1.0), Tuple::new("b", 2.5)]);
    assert_eq!(tuples[1].member_lossy(), "b");
}

#[test]
fn test_tuples_bad_score() {
    let result = to_tuples(Ok(bulks(&["member", "not-a-number"])));
    assert!(is_conversion_error(result));
}

#[test]
fn test_tuples_odd_length() {
    assert!(is_conversion_error(to_tuples(Ok(bulks(&["a", "1", "b"])))));
}

#[test]
fn test_scan_page() {
    let reply = RawReply::array(vec![RawReply::bulk("17"), bulks(&["k1", "k2"])]);
    let page = to_scan_result(Ok(reply)).unwrap();
    assert_eq!(page.cursor, "17");
    assert_eq!(page.keys, vec!["k1".to_string(), "k2".to_string()]);
    assert!(!page.is_finished());

    let last = to_scan_result(Ok(RawReply::array(vec![RawReply::bulk("0"), bulks(&[])]))).unwrap();
    assert!(last.is_finished());
    assert!(last.keys.is_empty());
}

#[test]
fn test_scan_page_wrong_shape() {
    assert!(is_conversion_error(to_scan_result(Ok(bulks(&["0"])))));
    assert!(is_conversion_error(to_scan_result(Ok(RawReply::Integer(0)))));
}

#[test]
fn test_geo_coordinates_with_missing_member() {
    let reply = RawReply::array(vec![
        bulks(&["13.361389", "38.115556"]),
        RawReply::null_array(),
        bulks(&["15.087269", "37.502669"]),
    ]);
    let positions = to_geo_coordinates(Ok(reply)).unwrap();
    assert_eq!(positions.len(), 3);
    assert_eq!(
        positions[0],
        Some(GeoCoordinate {
            longitude: 13.361389,
            latitude: 38.115556
        })
    );
    assert_eq!(positions[1], None);
    assert!(positions[2].is_some());
}

#[test]
fn test_field_map_list() {
    let reply = RawReply::array(vec![
        bulks(&["name", "mymaster", "ip", "10.0.0.1"]),
        bulks(&["name", "other"]),
    ]);
    let maps = to_field_map_vec(Ok(reply)).unwrap();
    assert_eq!(maps.len(), 2);
    assert_eq!(maps[0].get("ip"), Some("10.0.0.1"));
    assert_eq!(maps[1].get("name"), Some("other"));
}

#[test]
fn test_optional_integer() {
    assert_eq!(to_optional_i64(Ok(RawReply::Integer(4))).unwrap(), Some(4));
    assert_eq!(to_optional_i64(Ok(RawReply::null_bulk())).unwrap(), None);
    assert!(is_conversion_error(to_optional_i64(Ok(RawReply::bulk("4")))));
}

#[test]
fn test_optional_string_vec() {
    assert_eq!(to_optional_string_vec(Ok(RawReply::null_array())).unwrap(), None);
    assert_eq!(
        to_optional_string_vec(Ok(bulks(&["a"]))).unwrap(),
        Some(vec!["a".to_string()])
    );
    assert!(is_conversion_error(to_optional_string_vec(Ok(RawReply::null_bulk()))));
}
