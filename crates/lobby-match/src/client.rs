//! Waiting clients and their attribute vectors.
//!
//! A [`Client`] carries two ordered attribute maps:
//!
//! - **self-data**: where the client sits in compatibility space
//! - **searching-data**: how far from its own position, per attribute, it will
//!   accept a partner
//!
//! A [`Schema`] fixes the attribute names and their order for one cycle. Both
//! maps of every client must follow it exactly; the order is what turns a
//! name/value map into index coordinates.

use lobby_index::Point;

use crate::error::{MatchError, Result};

/// Stable identity of a client while it waits in the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(transparent))]
pub struct ClientId(pub u64);

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Ordered attribute name → value map.
///
/// Insertion order is preserved and significant.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(transparent))]
pub struct Attributes(Vec<(String, f64)>);

impl Attributes {
    /// Create an empty map.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Set `name` to `value`. An existing name keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.0.push((name, value)),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    /// Value of `name`, if present.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    /// Attribute names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    /// Values in order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().map(|(_, v)| *v)
    }

    /// Mutable values in order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut f64> {
        self.0.iter_mut().map(|(_, v)| v)
    }

    /// `(name, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(n, v)| (n.as_str(), *v))
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut attributes = Self::new();
        for (name, value) in iter {
            attributes.insert(name, value);
        }
        attributes
    }
}

/// A client waiting to be matched.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Client {
    id: ClientId,
    self_data: Attributes,
    searching_data: Attributes,
}

impl Client {
    /// Create a client.
    pub fn new(id: ClientId, self_data: Attributes, searching_data: Attributes) -> Self {
        Self {
            id,
            self_data,
            searching_data,
        }
    }

    /// The client's identity.
    #[inline]
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Position in compatibility space.
    pub fn self_data(&self) -> &Attributes {
        &self.self_data
    }

    /// Prioritized per-attribute tolerances.
    pub fn searching_data(&self) -> &Attributes {
        &self.searching_data
    }

    /// Tolerances, for the pool's expansion step.
    pub fn searching_data_mut(&mut self) -> &mut Attributes {
        &mut self.searching_data
    }
}

/// Attribute names and order fixed for one matching cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(transparent))]
pub struct Schema(Vec<String>);

impl Schema {
    /// Create a schema from attribute names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// The schema a client's self-data implies.
    pub fn of(attributes: &Attributes) -> Self {
        Self::new(attributes.names())
    }

    /// Attribute names in order.
    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// Number of dimensions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the schema has no dimensions.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `attributes` has exactly these names in this order.
    pub fn matches(&self, attributes: &Attributes) -> bool {
        attributes.len() == self.0.len()
            && attributes.names().zip(&self.0).all(|(a, b)| a == b.as_str())
    }

    /// The client's index coordinate.
    pub fn position(&self, client: &Client) -> Result<Point> {
        if !self.matches(client.self_data()) {
            return Err(MatchError::SchemaMismatch {
                client: client.id(),
                expected: self.0.clone(),
                found: owned_names(client.self_data()),
            });
        }
        Ok(client.self_data().values().collect())
    }

    /// The client's search radius per dimension.
    pub fn tolerances(&self, client: &Client) -> Result<Point> {
        if !self.matches(client.searching_data()) {
            return Err(MatchError::SearchMismatch {
                client: client.id(),
                expected: self.0.clone(),
                found: owned_names(client.searching_data()),
            });
        }
        if let Some((attribute, value)) = client
            .searching_data()
            .iter()
            .find(|(_, v)| !v.is_finite() || *v < 0.0)
        {
            return Err(MatchError::InvalidTolerance {
                client: client.id(),
                attribute: attribute.to_string(),
                value,
            });
        }
        Ok(client.searching_data().values().collect())
    }
}

fn owned_names(attributes: &Attributes) -> Vec<String> {
    attributes.names().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(id: u64) -> Client {
        Client::new(
            ClientId(id),
            Attributes::new().with("skill", 1500.0).with("region", 3.0),
            Attributes::new().with("skill", 100.0).with("region", 0.0),
        )
    }

    #[test]
    fn insert_keeps_position() {
        let mut attributes = Attributes::new().with("a", 1.0).with("b", 2.0);
        attributes.insert("a", 5.0);

        assert_eq!(attributes.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(attributes.get("a"), Some(5.0));
    }

    #[test]
    fn from_iter_preserves_order() {
        let attributes: Attributes = [("z", 1.0), ("a", 2.0)].into_iter().collect();
        assert_eq!(attributes.names().collect::<Vec<_>>(), vec!["z", "a"]);
    }

    #[test]
    fn position_follows_schema_order() {
        let schema = Schema::new(["skill", "region"]);
        assert_eq!(schema.position(&client(1)).unwrap(), Point::from([1500.0, 3.0]));
        assert_eq!(schema.tolerances(&client(1)).unwrap(), Point::from([100.0, 0.0]));
    }

    #[test]
    fn reordered_self_data_rejected() {
        let schema = Schema::new(["region", "skill"]);
        let err = schema.position(&client(4)).unwrap_err();

        assert_eq!(
            err,
            MatchError::SchemaMismatch {
                client: ClientId(4),
                expected: vec!["region".into(), "skill".into()],
                found: vec!["skill".into(), "region".into()],
            }
        );
    }

    #[test]
    fn missing_attribute_rejected() {
        let schema = Schema::new(["skill", "region", "latency"]);
        assert!(matches!(
            schema.position(&client(1)),
            Err(MatchError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn misordered_searching_data_rejected() {
        let mut c = client(2);
        *c.searching_data_mut() = Attributes::new().with("region", 0.0).with("skill", 1.0);

        let schema = Schema::of(c.self_data());
        assert!(matches!(
            schema.tolerances(&c),
            Err(MatchError::SearchMismatch { .. })
        ));
    }

    #[test]
    fn negative_tolerance_rejected() {
        let mut c = client(3);
        c.searching_data_mut().insert("region", -0.5);

        let schema = Schema::of(c.self_data());
        assert!(matches!(
            schema.tolerances(&c),
            Err(MatchError::InvalidTolerance { value, .. }) if value == -0.5
        ));
    }

    #[test]
    fn empty_schema_matches_empty_client() {
        let c = Client::new(ClientId(9), Attributes::new(), Attributes::new());
        let schema = Schema::default();

        assert_eq!(schema.position(&c).unwrap(), Point::default());
        assert_eq!(schema.tolerances(&c).unwrap(), Point::default());
    }
}
