//! Reply Conversion Module
//!
//! Pure functions from a decoded reply to domain values.
//!
//! Every conversion takes `Result<RawReply>`: an upstream error passes
//! through untouched, otherwise the reply's shape is checked and anything
//! unexpected becomes `ResplineError::Conversion`. The only silent
//! substitution is null bulk → empty string/bytes.
//!
//! ## Shapes
//! | conversion            | reply shape                                    |
//! |-----------------------|------------------------------------------------|
//! | `to_string`           | status or bulk                                 |
//! | `to_i64` / `to_bool`  | integer                                        |
//! | `to_field_map`        | array `[f1, v1, f2, v2, ..]`                   |
//! | `to_tuples`           | array `[m1, s1, m2, s2, ..]`                   |
//! | `to_scan_result`      | array `[cursor, [k1, k2, ..]]`                 |
//! | `to_geo_coordinates`  | array of `[lon, lat]` or null                  |
//! | `to_field_map_vec`    | array of `[f1, v1, ..]` arrays                 |

mod types;
mod strategy;

pub use types::{FieldMap, GeoCoordinate, ScanResult, Tuple};
pub use strategy::{ReplyShape, TypedReply};

use std::str::FromStr;

use bytes::Bytes;

use crate::error::{ResplineError, Result};
use crate::protocol::RawReply;

/// Signature shared by every conversion
pub type Conversion<T> = fn(Result<RawReply>) -> Result<T>;

// =============================================================================
// Combinators
// =============================================================================

/// Convert each element of an array reply
pub fn array_of<T>(reply: RawReply, mut each: impl FnMut(RawReply) -> Result<T>) -> Result<Vec<T>> {
    reply.into_array()?.into_iter().map(&mut each).collect()
}

/// Convert an array reply of alternating elements two at a time
pub fn pairs_of<T>(
    reply: RawReply,
    mut each: impl FnMut(RawReply, RawReply) -> Result<T>,
) -> Result<Vec<T>> {
    let items = reply.into_array()?;
    if items.len() % 2 != 0 {
        return Err(ResplineError::conversion(
            "even-length array",
            format!("array of {}", items.len()),
        ));
    }

    let mut out = Vec::with_capacity(items.len() / 2);
    let mut items = items.into_iter();
    while let (Some(first), Some(second)) = (items.next(), items.next()) {
        out.push(each(first, second)?);
    }
    Ok(out)
}

/// Status or bulk bytes; null bulk is empty
fn bytes_of(reply: RawReply) -> Result<Bytes> {
    match reply {
        RawReply::Bulk(Some(data)) => Ok(data),
        RawReply::Bulk(None) => Ok(Bytes::new()),
        RawReply::Status(s) => Ok(Bytes::from(s)),
        other => Err(ResplineError::conversion("status or bulk", other.kind())),
    }
}

fn text_of(reply: RawReply) -> Result<String> {
    let kind = reply.kind();
    let bytes = bytes_of(reply)?;
    String::from_utf8(bytes.to_vec())
        .map_err(|_| ResplineError::conversion("UTF-8 text", format!("non-UTF-8 {}", kind)))
}

/// Parse a status or bulk as a number
fn number_of<T: FromStr>(reply: RawReply, what: &str) -> Result<T> {
    let text = match &reply {
        RawReply::Status(_) | RawReply::Bulk(Some(_)) => reply.as_text()?,
        other => return Err(ResplineError::conversion(what, other.kind())),
    };
    std::str::from_utf8(text)
        .ok()
        .and_then(|s| s.trim().parse::<T>().ok())
        .ok_or_else(|| {
            ResplineError::conversion(what, format!("{:?}", String::from_utf8_lossy(text)))
        })
}

// =============================================================================
// Scalars
// =============================================================================

/// The reply itself
pub fn to_raw(reply: Result<RawReply>) -> Result<RawReply> {
    reply
}

/// Status or bulk as text; a null bulk is `""`
pub fn to_string(reply: Result<RawReply>) -> Result<String> {
    text_of(reply?)
}

/// Status or bulk as bytes; a null bulk is empty
pub fn to_bytes(reply: Result<RawReply>) -> Result<Bytes> {
    bytes_of(reply?)
}

/// Bulk as bytes, keeping null as `None`
pub fn to_optional_bytes(reply: Result<RawReply>) -> Result<Option<Bytes>> {
    match reply? {
        RawReply::Bulk(None) => Ok(None),
        other => bytes_of(other).map(Some),
    }
}

/// A status reply's text (`OK`, `QUEUED`, ...)
pub fn to_status(reply: Result<RawReply>) -> Result<String> {
    match reply? {
        RawReply::Status(s) => Ok(s),
        other => Err(ResplineError::conversion("status", other.kind())),
    }
}

pub fn to_i64(reply: Result<RawReply>) -> Result<i64> {
    reply?.as_integer()
}

/// Integer, keeping null bulk as `None` (ZRANK on a missing member)
pub fn to_optional_i64(reply: Result<RawReply>) -> Result<Option<i64>> {
    match reply? {
        RawReply::Bulk(None) => Ok(None),
        other => other.as_integer().map(Some),
    }
}

/// Integer `1` is true, any other integer false
pub fn to_bool(reply: Result<RawReply>) -> Result<bool> {
    Ok(reply?.as_integer()? == 1)
}

/// Decimal text as a float (`inf` / `-inf` accepted)
pub fn to_f64(reply: Result<RawReply>) -> Result<f64> {
    number_of(reply?, "decimal float")
}

/// Like `to_f64`, keeping null bulk as `None`
pub fn to_optional_f64(reply: Result<RawReply>) -> Result<Option<f64>> {
    match reply? {
        RawReply::Bulk(None) => Ok(None),
        other => number_of(other, "decimal float").map(Some),
    }
}

// =============================================================================
// Collections
// =============================================================================

/// Array of status/bulk; null elements become `""`
pub fn to_string_vec(reply: Result<RawReply>) -> Result<Vec<String>> {
    array_of(reply?, text_of)
}

/// Like `to_string_vec`, keeping a null array as `None` (blocking pop timeout)
pub fn to_optional_string_vec(reply: Result<RawReply>) -> Result<Option<Vec<String>>> {
    match reply? {
        RawReply::Array(None) => Ok(None),
        other => array_of(other, text_of).map(Some),
    }
}

/// Array of bulk, keeping null elements (MGET shape)
pub fn to_optional_bytes_vec(reply: Result<RawReply>) -> Result<Vec<Option<Bytes>>> {
    array_of(reply?, |item| to_optional_bytes(Ok(item)))
}

/// Array of integers, `1` as true
pub fn to_bool_vec(reply: Result<RawReply>) -> Result<Vec<bool>> {
    array_of(reply?, |item| Ok(item.as_integer()? == 1))
}

/// Alternating field / value array as an ordered map
pub fn to_field_map(reply: Result<RawReply>) -> Result<FieldMap> {
    Ok(pairs_of(reply?, |k, v| Ok((text_of(k)?, text_of(v)?)))?
        .into_iter()
        .collect())
}

/// Alternating member / score array as exactly `len / 2` tuples
pub fn to_tuples(reply: Result<RawReply>) -> Result<Vec<Tuple>> {
    pairs_of(reply?, |member, score| {
        Ok(Tuple {
            member: bytes_of(member)?,
            score: number_of(score, "numeric score")?,
        })
    })
}

/// `[cursor, [key, ..]]` as a scan page
pub fn to_scan_result(reply: Result<RawReply>) -> Result<ScanResult> {
    let items = reply?.into_array()?;
    let [cursor, keys]: [RawReply; 2] = items.try_into().map_err(|items: Vec<RawReply>| {
        ResplineError::conversion("array of 2 (cursor, keys)", format!("array of {}", items.len()))
    })?;
    Ok(ScanResult {
        cursor: text_of(cursor)?,
        keys: array_of(keys, text_of)?,
    })
}

/// Array of `[longitude, latitude]` pairs with positional nulls
pub fn to_geo_coordinates(reply: Result<RawReply>) -> Result<Vec<Option<GeoCoordinate>>> {
    array_of(reply?, |item| {
        if item.is_null() {
            return Ok(None);
        }
        let pair = item.into_array()?;
        let [longitude, latitude]: [RawReply; 2] = pair.try_into().map_err(|pair: Vec<RawReply>| {
            ResplineError::conversion("array of 2 (longitude, latitude)", format!("array of {}", pair.len()))
        })?;
        Ok(Some(GeoCoordinate {
            longitude: number_of(longitude, "decimal longitude")?,
            latitude: number_of(latitude, "decimal latitude")?,
        }))
    })
}

/// Array of flattened field / value arrays, one map each
pub fn to_field_map_vec(reply: Result<RawReply>) -> Result<Vec<FieldMap>> {
    array_of(reply?, |item| to_field_map(Ok(item)))
}
