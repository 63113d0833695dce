//! Command-kind → conversion lookup
//!
//! Declarative table of which reply shape each command produces, so the
//! command layer never writes its own decode closure.

use bytes::Bytes;

use crate::error::Result;
use crate::protocol::{Command, RawReply};

use super::{FieldMap, GeoCoordinate, ScanResult, Tuple};

/// The conversion strategy for one kind of command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyShape {
    /// Passed through unchanged (EVAL, unknown commands)
    Raw,
    Text,
    Integer,
    /// Integer, null bulk kept as `None`
    OptionalInteger,
    Boolean,
    /// Decimal text, null kept as `None`
    Float,
    TextList,
    /// Text array, null array kept as `None`
    OptionalTextList,
    /// Bulk array with nulls kept
    OptionalBytesList,
    BoolList,
    FieldMap,
    Tuples,
    ScanPage,
    GeoCoordinates,
    FieldMapList,
}

/// A reply converted by its `ReplyShape`
#[derive(Debug, Clone, PartialEq)]
pub enum TypedReply {
    Raw(RawReply),
    Text(String),
    Integer(i64),
    OptionalInteger(Option<i64>),
    Boolean(bool),
    Float(Option<f64>),
    TextList(Vec<String>),
    OptionalTextList(Option<Vec<String>>),
    OptionalBytesList(Vec<Option<Bytes>>),
    BoolList(Vec<bool>),
    FieldMap(FieldMap),
    Tuples(Vec<Tuple>),
    ScanPage(ScanResult),
    GeoCoordinates(Vec<Option<GeoCoordinate>>),
    FieldMapList(Vec<FieldMap>),
}

/// Two-word commands, matched before single names
const SUBCOMMAND_SHAPES: &[(&str, &str, ReplyShape)] = &[
    ("CONFIG", "GET", ReplyShape::FieldMap),
    ("SCRIPT", "EXISTS", ReplyShape::BoolList),
    ("SCRIPT", "LOAD", ReplyShape::Text),
    ("SENTINEL", "MASTERS", ReplyShape::FieldMapList),
    ("SENTINEL", "SLAVES", ReplyShape::FieldMapList),
    ("SENTINEL", "REPLICAS", ReplyShape::FieldMapList),
    ("SENTINEL", "SENTINELS", ReplyShape::FieldMapList),
    ("SENTINEL", "MASTER", ReplyShape::FieldMap),
    ("CLUSTER", "INFO", ReplyShape::Text),
    ("CLUSTER", "NODES", ReplyShape::Text),
    ("CLUSTER", "GETKEYSINSLOT", ReplyShape::TextList),
    ("CLUSTER", "KEYSLOT", ReplyShape::Integer),
];

const COMMAND_SHAPES: &[(&str, ReplyShape)] = &[
    // strings
    ("GET", ReplyShape::Text),
    ("SET", ReplyShape::Text),
    ("GETSET", ReplyShape::Text),
    ("GETDEL", ReplyShape::Text),
    ("GETRANGE", ReplyShape::Text),
    ("MSET", ReplyShape::Text),
    ("MGET", ReplyShape::OptionalBytesList),
    ("APPEND", ReplyShape::Integer),
    ("STRLEN", ReplyShape::Integer),
    ("INCR", ReplyShape::Integer),
    ("INCRBY", ReplyShape::Integer),
    ("DECR", ReplyShape::Integer),
    ("DECRBY", ReplyShape::Integer),
    ("INCRBYFLOAT", ReplyShape::Float),
    ("SETNX", ReplyShape::Boolean),
    ("MSETNX", ReplyShape::Boolean),
    ("GETBIT", ReplyShape::Boolean),
    ("SETBIT", ReplyShape::Boolean),
    ("BITCOUNT", ReplyShape::Integer),
    ("BITOP", ReplyShape::Integer),
    // keys
    ("DEL", ReplyShape::Integer),
    ("UNLINK", ReplyShape::Integer),
    ("EXISTS", ReplyShape::Integer),
    ("EXPIRE", ReplyShape::Boolean),
    ("PEXPIRE", ReplyShape::Boolean),
    ("EXPIREAT", ReplyShape::Boolean),
    ("PERSIST", ReplyShape::Boolean),
    ("MOVE", ReplyShape::Boolean),
    ("RENAMENX", ReplyShape::Boolean),
    ("RENAME", ReplyShape::Text),
    ("TTL", ReplyShape::Integer),
    ("PTTL", ReplyShape::Integer),
    ("TYPE", ReplyShape::Text),
    ("KEYS", ReplyShape::TextList),
    ("RANDOMKEY", ReplyShape::Text),
    ("SCAN", ReplyShape::ScanPage),
    ("SORT", ReplyShape::TextList),
    // hashes
    ("HGET", ReplyShape::Text),
    ("HSET", ReplyShape::Integer),
    ("HSETNX", ReplyShape::Boolean),
    ("HEXISTS", ReplyShape::Boolean),
    ("HDEL", ReplyShape::Integer),
    ("HLEN", ReplyShape::Integer),
    ("HINCRBY", ReplyShape::Integer),
    ("HINCRBYFLOAT", ReplyShape::Float),
    ("HMSET", ReplyShape::Text),
    ("HMGET", ReplyShape::OptionalBytesList),
    ("HKEYS", ReplyShape::TextList),
    ("HVALS", ReplyShape::TextList),
    ("HGETALL", ReplyShape::FieldMap),
    ("HSCAN", ReplyShape::ScanPage),
    // lists
    ("LPUSH", ReplyShape::Integer),
    ("RPUSH", ReplyShape::Integer),
    ("LPUSHX", ReplyShape::Integer),
    ("RPUSHX", ReplyShape::Integer),
    ("LLEN", ReplyShape::Integer),
    ("LREM", ReplyShape::Integer),
    ("LINSERT", ReplyShape::Integer),
    ("LPOP", ReplyShape::Text),
    ("RPOP", ReplyShape::Text),
    ("LINDEX", ReplyShape::Text),
    ("LSET", ReplyShape::Text),
    ("LTRIM", ReplyShape::Text),
    ("LRANGE", ReplyShape::TextList),
    ("BLPOP", ReplyShape::OptionalTextList),
    ("BRPOP", ReplyShape::OptionalTextList),
    ("RPOPLPUSH", ReplyShape::Text),
    ("BRPOPLPUSH", ReplyShape::Text),
    // sets
    ("SADD", ReplyShape::Integer),
    ("SREM", ReplyShape::Integer),
    ("SCARD", ReplyShape::Integer),
    ("SISMEMBER", ReplyShape::Boolean),
    ("SMOVE", ReplyShape::Boolean),
    ("SMEMBERS", ReplyShape::TextList),
    ("SPOP", ReplyShape::Text),
    ("SRANDMEMBER", ReplyShape::Text),
    ("SDIFF", ReplyShape::TextList),
    ("SINTER", ReplyShape::TextList),
    ("SUNION", ReplyShape::TextList),
    ("SDIFFSTORE", ReplyShape::Integer),
    ("SINTERSTORE", ReplyShape::Integer),
    ("SUNIONSTORE", ReplyShape::Integer),
    ("SSCAN", ReplyShape::ScanPage),
    // sorted sets
    ("ZADD", ReplyShape::Integer),
    ("ZREM", ReplyShape::Integer),
    ("ZCARD", ReplyShape::Integer),
    ("ZCOUNT", ReplyShape::Integer),
    ("ZRANK", ReplyShape::OptionalInteger),
    ("ZREVRANK", ReplyShape::OptionalInteger),
    ("ZSCORE", ReplyShape::Float),
    ("ZINCRBY", ReplyShape::Float),
    ("ZRANGE", ReplyShape::TextList),
    ("ZREVRANGE", ReplyShape::TextList),
    ("ZRANGEBYSCORE", ReplyShape::TextList),
    ("ZREVRANGEBYSCORE", ReplyShape::TextList),
    ("ZRANGEBYLEX", ReplyShape::TextList),
    ("ZREVRANGEBYLEX", ReplyShape::TextList),
    ("ZREMRANGEBYRANK", ReplyShape::Integer),
    ("ZREMRANGEBYSCORE", ReplyShape::Integer),
    ("ZINTERSTORE", ReplyShape::Integer),
    ("ZUNIONSTORE", ReplyShape::Integer),
    ("ZSCAN", ReplyShape::ScanPage),
    // geo
    ("GEOADD", ReplyShape::Integer),
    ("GEODIST", ReplyShape::Float),
    ("GEOPOS", ReplyShape::GeoCoordinates),
    ("GEOHASH", ReplyShape::TextList),
    // hyperloglog
    ("PFADD", ReplyShape::Boolean),
    ("PFCOUNT", ReplyShape::Integer),
    ("PFMERGE", ReplyShape::Text),
    // scripting, pub/sub, transactions
    ("EVAL", ReplyShape::Raw),
    ("EVALSHA", ReplyShape::Raw),
    ("PUBLISH", ReplyShape::Integer),
    ("WATCH", ReplyShape::Text),
    ("UNWATCH", ReplyShape::Text),
    // server
    ("PING", ReplyShape::Text),
    ("ECHO", ReplyShape::Text),
    ("SELECT", ReplyShape::Text),
    ("DBSIZE", ReplyShape::Integer),
    ("FLUSHDB", ReplyShape::Text),
    ("FLUSHALL", ReplyShape::Text),
    ("INFO", ReplyShape::Text),
    ("LASTSAVE", ReplyShape::Integer),
    ("SAVE", ReplyShape::Text),
    ("BGSAVE", ReplyShape::Text),
    ("BGREWRITEAOF", ReplyShape::Text),
    ("TIME", ReplyShape::TextList),
];

/// Pops that answer with an array once a count argument follows the key
const COUNTED_POPS: &[(&str, ReplyShape)] = &[
    ("SPOP", ReplyShape::TextList),
    ("SRANDMEMBER", ReplyShape::TextList),
    ("LPOP", ReplyShape::OptionalTextList),
    ("RPOP", ReplyShape::OptionalTextList),
];

/// Range commands whose reply becomes member/score pairs with WITHSCORES
const SCORED_RANGES: &[&str] = &["ZRANGE", "ZREVRANGE", "ZRANGEBYSCORE", "ZREVRANGEBYSCORE"];

impl ReplyShape {
    /// Look up the shape registered for a command name (case-insensitive)
    pub fn for_name(name: &str) -> ReplyShape {
        COMMAND_SHAPES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, shape)| *shape)
            .unwrap_or(ReplyShape::Raw)
    }

    /// Shape for a full command, taking subcommands, pop counts and
    /// WITHSCORES into account
    pub fn for_command(command: &Command) -> ReplyShape {
        let parts = command.parts();
        let name = String::from_utf8_lossy(command.name());

        if let Some(sub) = parts.get(1) {
            let sub = String::from_utf8_lossy(sub);
            if let Some((_, _, shape)) = SUBCOMMAND_SHAPES
                .iter()
                .find(|(n, s, _)| n.eq_ignore_ascii_case(&name) && s.eq_ignore_ascii_case(&sub))
            {
                return *shape;
            }
        }

        let scored = SCORED_RANGES.iter().any(|n| n.eq_ignore_ascii_case(&name))
            && parts
                .iter()
                .skip(1)
                .any(|arg| arg.eq_ignore_ascii_case(b"WITHSCORES"));
        if scored {
            return ReplyShape::Tuples;
        }

        // name key count
        if parts.len() > 2 {
            if let Some((_, shape)) = COUNTED_POPS
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(&name))
            {
                return *shape;
            }
        }

        ReplyShape::for_name(&name)
    }

    /// Run the conversion this shape stands for
    pub fn convert(self, reply: Result<RawReply>) -> Result<TypedReply> {
        use super::{
            to_bool, to_bool_vec, to_field_map, to_field_map_vec, to_geo_coordinates, to_i64,
            to_optional_bytes_vec, to_optional_f64, to_optional_i64, to_optional_string_vec,
            to_raw, to_scan_result, to_string, to_string_vec, to_tuples,
        };

        Ok(match self {
            ReplyShape::Raw => TypedReply::Raw(to_raw(reply)?),
            ReplyShape::Text => TypedReply::Text(to_string(reply)?),
            ReplyShape::Integer => TypedReply::Integer(to_i64(reply)?),
            ReplyShape::OptionalInteger => TypedReply::OptionalInteger(to_optional_i64(reply)?),
            ReplyShape::Boolean => TypedReply::Boolean(to_bool(reply)?),
            ReplyShape::Float => TypedReply::Float(to_optional_f64(reply)?),
            ReplyShape::TextList => TypedReply::TextList(to_string_vec(reply)?),
            ReplyShape::OptionalTextList => {
                TypedReply::OptionalTextList(to_optional_string_vec(reply)?)
            }
            ReplyShape::OptionalBytesList => {
                TypedReply::OptionalBytesList(to_optional_bytes_vec(reply)?)
            }
            ReplyShape::BoolList => TypedReply::BoolList(to_bool_vec(reply)?),
            ReplyShape::FieldMap => TypedReply::FieldMap(to_field_map(reply)?),
            ReplyShape::Tuples => TypedReply::Tuples(to_tuples(reply)?),
            ReplyShape::ScanPage => TypedReply::ScanPage(to_scan_result(reply)?),
            ReplyShape::GeoCoordinates => TypedReply::GeoCoordinates(to_geo_coordinates(reply)?),
            ReplyShape::FieldMapList => TypedReply::FieldMapList(to_field_map_vec(reply)?),
        })
    }
}
