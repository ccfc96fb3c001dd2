//! GraphQL connections: `{count, nodes[], pageInfo?}`.
//!
//! Node types are decoded through a decoder closure supplied by the call
//! site, so one `Connection<T>` serves every node type without runtime type
//! lookup. Decoding is all-or-nothing: one bad node fails the connection.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::DecodeError;
use crate::json::{self, JsonObject};

/// Paging metadata of a connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub limit: i64,
    pub offset: i64,
}

impl PageInfo {
    fn decode(obj: &JsonObject) -> Self {
        Self {
            limit: json::int_or_zero(obj, "limit"),
            offset: json::int_or_zero(obj, "offset"),
        }
    }
}

/// An ordered list of nodes with a count and optional paging metadata.
///
/// `nodes` is `None` when the source object had no `nodes` key, which is
/// different from an empty list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub count: i64,
    pub nodes: Option<Vec<T>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_info: Option<PageInfo>,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self {
            count: 0,
            nodes: None,
            page_info: None,
        }
    }
}

impl<T> Connection<T> {
    /// Decode a connection object, running every element of `nodes` through
    /// `decoder` in order.
    pub fn decode_with<F>(obj: &JsonObject, decoder: F) -> Result<Self, DecodeError>
    where
        F: Fn(&JsonObject) -> Result<T, DecodeError>,
    {
        let nodes = match json::optional_array(obj, "nodes")? {
            None => None,
            Some(items) => Some(
                json::objects(items, "nodes")?
                    .into_iter()
                    .map(&decoder)
                    .collect::<Result<Vec<T>, DecodeError>>()?,
            ),
        };
        let page_info = json::optional_object(obj, "pageInfo")?.map(PageInfo::decode);
        let count = json::int_or_zero(obj, "count");
        tracing::trace!(count, nodes = nodes.as_ref().map_or(0, Vec::len), "decoded connection");
        Ok(Self {
            count,
            nodes,
            page_info,
        })
    }

    /// Decode an optional child connection; absent or null yields an empty
    /// connection with no nodes.
    pub(crate) fn decode_child<F>(parent: &JsonObject, key: &str, decoder: F) -> Result<Self, DecodeError>
    where
        F: Fn(&JsonObject) -> Result<T, DecodeError>,
    {
        match json::optional_object(parent, key)? {
            Some(obj) => Self::decode_with(obj, decoder),
            None => Ok(Self::default()),
        }
    }

    /// The nodes, or an empty slice when `nodes` was absent.
    pub fn nodes(&self) -> &[T] {
        self.nodes.as_deref().unwrap_or(&[])
    }

    pub fn first(&self) -> Option<&T> {
        self.nodes().first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.nodes().iter()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes().is_empty()
    }
}

impl<T: DeserializeOwned> Connection<T> {
    /// Decode a connection whose nodes are plain serde entities.
    pub fn decode(obj: &JsonObject) -> Result<Self, DecodeError> {
        Self::decode_with(obj, |node| json::from_object(node, "connection node"))
    }
}

/// A node with a natural string key (country code, currency code, ...).
pub trait Keyed {
    fn key(&self) -> &str;
}

/// A connection that also indexes its nodes by [`Keyed::key`].
///
/// The index exists only when `nodes` was present and non-empty. Duplicate
/// keys fail the decode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappedConnection<T> {
    #[serde(flatten)]
    connection: Connection<T>,
    #[serde(skip)]
    index: Option<HashMap<String, usize>>,
}

impl<T> Default for MappedConnection<T> {
    fn default() -> Self {
        Self {
            connection: Connection::default(),
            index: None,
        }
    }
}

impl<T: Keyed> MappedConnection<T> {
    pub fn decode_with<F>(obj: &JsonObject, decoder: F) -> Result<Self, DecodeError>
    where
        F: Fn(&JsonObject) -> Result<T, DecodeError>,
    {
        Self::from_connection(Connection::decode_with(obj, decoder)?)
    }

    pub(crate) fn decode_child<F>(parent: &JsonObject, key: &str, decoder: F) -> Result<Self, DecodeError>
    where
        F: Fn(&JsonObject) -> Result<T, DecodeError>,
    {
        Self::from_connection(Connection::decode_child(parent, key, decoder)?)
    }

    /// Index an already decoded connection.
    pub fn from_connection(connection: Connection<T>) -> Result<Self, DecodeError> {
        let index = match connection.nodes.as_deref() {
            None | Some([]) => None,
            Some(nodes) => {
                let mut index = HashMap::with_capacity(nodes.len());
                for (i, node) in nodes.iter().enumerate() {
                    if index.insert(node.key().to_string(), i).is_some() {
                        return Err(DecodeError::DuplicateKey {
                            key: node.key().to_string(),
                        });
                    }
                }
                Some(index)
            }
        };
        Ok(Self { connection, index })
    }

    /// Node with the given key, or `None`.
    pub fn get(&self, key: &str) -> Option<&T> {
        let i = *self.index.as_ref()?.get(key)?;
        self.connection.nodes().get(i)
    }

    /// Keys in node order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.connection.iter().map(Keyed::key)
    }
}

impl<T> MappedConnection<T> {
    pub fn connection(&self) -> &Connection<T> {
        &self.connection
    }

    pub fn count(&self) -> i64 {
        self.connection.count
    }

    pub fn nodes(&self) -> &[T] {
        self.connection.nodes()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.connection.iter()
    }

    pub fn first(&self) -> Option<&T> {
        self.connection.first()
    }

    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }
}
