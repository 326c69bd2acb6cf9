//! Join graph of a model descriptor
//!
//! A model joins lookup tables onto a root fact table. Each lookup names
//! its parent implicitly through the table alias of its foreign-key columns,
//! so the lookups form a tree rooted at the fact table. [`JoinTree`] is the
//! resolved form of that tree and supports structural matching against
//! another tree.

use crate::column::ColumnRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Join type between a parent table and a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    /// Inner join
    #[default]
    Inner,
    /// Left outer join
    Left,
}

/// Join condition of one lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinDesc {
    /// Join type
    #[serde(rename = "type", default)]
    pub join_type: JoinType,

    /// Key columns on the lookup side
    pub primary_key: Vec<ColumnRef>,

    /// Key columns on the parent side
    pub foreign_key: Vec<ColumnRef>,
}

impl JoinDesc {
    /// Create join from paired key columns
    #[must_use]
    pub fn new(join_type: JoinType, pairs: &[(ColumnRef, ColumnRef)]) -> Self {
        let (foreign_key, primary_key) = pairs.iter().cloned().unzip();
        Self {
            join_type,
            primary_key,
            foreign_key,
        }
    }

    /// Inner join on a single key pair (`foreign = primary`)
    #[must_use]
    pub fn inner(foreign: ColumnRef, primary: ColumnRef) -> Self {
        Self::new(JoinType::Inner, &[(foreign, primary)])
    }

    /// Alias of the parent table, taken from the first foreign-key column
    #[must_use]
    pub fn parent_alias(&self) -> Option<&str> {
        self.foreign_key.first().map(ColumnRef::table)
    }

    /// Alias-independent signature used for structural comparison
    fn signature(&self) -> JoinSignature {
        let mut pairs: Vec<(String, String)> = self
            .foreign_key
            .iter()
            .zip(&self.primary_key)
            .map(|(fk, pk)| (fk.column().to_string(), pk.column().to_string()))
            .collect();
        pairs.sort();
        JoinSignature {
            join_type: self.join_type,
            pairs,
        }
    }
}

/// A lookup table joined into the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupDesc {
    /// Physical table identity
    pub table: String,

    /// Alias used by column references (defaults to the table name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Join condition
    pub join: JoinDesc,
}

impl LookupDesc {
    /// Create lookup with default alias
    #[must_use]
    pub fn new(table: impl Into<String>, join: JoinDesc) -> Self {
        Self {
            table: table.into(),
            alias: None,
            join,
        }
    }

    /// Set explicit alias
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Effective alias, upper-cased
    #[must_use]
    pub fn alias(&self) -> String {
        self.alias
            .as_deref()
            .map_or_else(|| default_alias(&self.table), str::to_ascii_uppercase)
    }
}

/// Default alias for a table identity: its last dotted segment, upper-cased
#[must_use]
pub fn default_alias(table: &str) -> String {
    table
        .rsplit('.')
        .next()
        .unwrap_or(table)
        .to_ascii_uppercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct JoinSignature {
    join_type: JoinType,
    pairs: Vec<(String, String)>,
}

/// One node of a [`JoinTree`]
#[derive(Debug, Clone)]
struct Chain {
    table: String,
    parent: Option<String>,
    join: Option<JoinSignature>,
}

impl Chain {
    fn is_root(&self) -> bool {
        self.join.is_none()
    }
}

/// Resolved join tree, keyed by table alias
#[derive(Debug, Clone, Default)]
pub struct JoinTree {
    root: String,
    chains: BTreeMap<String, Chain>,
}

impl JoinTree {
    /// Build tree from a fact table and its lookups
    ///
    /// A lookup whose foreign key names an unknown alias is kept as an
    /// orphan; it can never match a node of another tree.
    #[must_use]
    pub fn build(fact_table: &str, lookups: &[LookupDesc]) -> Self {
        let root = default_alias(fact_table);
        let mut chains = BTreeMap::new();
        chains.insert(
            root.clone(),
            Chain {
                table: fact_table.to_ascii_uppercase(),
                parent: None,
                join: None,
            },
        );

        for lookup in lookups {
            chains.insert(
                lookup.alias(),
                Chain {
                    table: lookup.table.to_ascii_uppercase(),
                    parent: lookup.join.parent_alias().map(str::to_string),
                    join: Some(lookup.join.signature()),
                },
            );
        }

        Self { root, chains }
    }

    /// Alias of the root fact table
    #[inline]
    #[must_use]
    pub fn root_alias(&self) -> &str {
        &self.root
    }

    /// Number of nodes, root included
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Check if tree has no nodes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Check if an alias is part of the tree
    #[inline]
    #[must_use]
    pub fn contains_alias(&self, alias: &str) -> bool {
        self.chains.contains_key(&alias.to_ascii_uppercase())
    }

    /// Count nodes of `self` that have a structural match in `other`
    ///
    /// The root matches the other root when both anchor the same table.
    /// A lookup matches when its parent matches, and the other tree has a
    /// child of that matched parent on the same table with the same join
    /// type and key columns. Matching is one-to-one: a node of `other`
    /// claimed by one node of `self` cannot match a second one, so a
    /// duplicated join never stands in for a removed one.
    #[must_use]
    pub fn match_count(&self, other: &JoinTree) -> usize {
        let mut matching = Matching::default();
        // Aliases present in both trees claim their namesakes first.
        let (shared, rest): (Vec<&String>, Vec<&String>) = self
            .chains
            .keys()
            .partition(|alias| other.chains.contains_key(alias.as_str()));
        for alias in shared.into_iter().chain(rest) {
            self.match_chain(alias, other, &mut matching, 0);
        }
        matching.by_alias.values().filter(|m| m.is_some()).count()
    }

    fn match_chain(
        &self,
        alias: &str,
        other: &JoinTree,
        matching: &mut Matching,
        depth: usize,
    ) -> Option<String> {
        if let Some(known) = matching.by_alias.get(alias) {
            return known.clone();
        }
        // Cyclic foreign keys cannot match anything.
        if depth > self.chains.len() {
            return None;
        }
        let chain = self.chains.get(alias)?;

        let found = if chain.is_root() {
            other
                .chains
                .get(&other.root)
                .filter(|root| root.table == chain.table)
                .filter(|_| !matching.claimed.contains(&other.root))
                .map(|_| other.root.clone())
        } else {
            let parent_match = chain
                .parent
                .as_deref()
                .and_then(|p| self.match_chain(p, other, matching, depth + 1));
            parent_match.and_then(|parent| {
                let fits = |other_alias: &str, candidate: &Chain| {
                    !matching.claimed.contains(other_alias)
                        && candidate.parent.as_deref() == Some(parent.as_str())
                        && candidate.table == chain.table
                        && candidate.join == chain.join
                };
                other
                    .chains
                    .get_key_value(alias)
                    .filter(|(other_alias, candidate)| fits(other_alias, candidate))
                    .or_else(|| {
                        other
                            .chains
                            .iter()
                            .find(|(other_alias, candidate)| fits(other_alias, candidate))
                    })
                    .map(|(other_alias, _)| other_alias.clone())
            })
        };

        if let Some(other_alias) = &found {
            matching.claimed.insert(other_alias.clone());
        }
        matching.by_alias.insert(alias.to_string(), found.clone());
        found
    }
}

/// Matching state: node of `self` to node of `other`, plus the claimed
/// nodes of `other`
#[derive(Debug, Default)]
struct Matching {
    by_alias: HashMap<String, Option<String>>,
    claimed: HashSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(s: &str) -> ColumnRef {
        s.parse().unwrap()
    }

    fn lookups() -> Vec<LookupDesc> {
        vec![
            LookupDesc::new(
                "sales.customer",
                JoinDesc::inner(col("orders.customer_id"), col("customer.id")),
            ),
            LookupDesc::new(
                "sales.region",
                JoinDesc::inner(col("customer.region_id"), col("region.id")),
            ),
        ]
    }

    #[test]
    fn default_alias_is_last_segment() {
        assert_eq!(default_alias("sales.orders"), "ORDERS");
        assert_eq!(default_alias("orders"), "ORDERS");
    }

    #[test]
    fn lookup_alias_override() {
        let lookup = LookupDesc::new(
            "sales.customer",
            JoinDesc::inner(col("orders.buyer_id"), col("buyer.id")),
        )
        .with_alias("buyer");
        assert_eq!(lookup.alias(), "BUYER");
    }

    #[test]
    fn tree_build_counts_root() {
        let tree = JoinTree::build("sales.orders", &lookups());
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.root_alias(), "ORDERS");
        assert!(tree.contains_alias("region"));
    }

    #[test]
    fn identical_trees_match_fully() {
        let a = JoinTree::build("sales.orders", &lookups());
        let b = JoinTree::build("sales.orders", &lookups());
        assert_eq!(a.match_count(&b), 3);
    }

    #[test]
    fn superset_matches_every_original_node() {
        let original = JoinTree::build("sales.orders", &lookups());
        let mut extended = lookups();
        extended.push(LookupDesc::new(
            "sales.product",
            JoinDesc::inner(col("orders.product_id"), col("product.id")),
        ));
        let candidate = JoinTree::build("sales.orders", &extended);

        assert_eq!(candidate.match_count(&original), original.len());
    }

    #[test]
    fn removed_lookup_reduces_match() {
        let original = JoinTree::build("sales.orders", &lookups());
        let candidate = JoinTree::build("sales.orders", &lookups()[..1]);
        assert_eq!(candidate.match_count(&original), 2);
    }

    #[test]
    fn changed_join_key_breaks_descendants() {
        let original = JoinTree::build("sales.orders", &lookups());
        let mut altered = lookups();
        altered[0].join = JoinDesc::inner(col("orders.seller_id"), col("customer.id"));
        let candidate = JoinTree::build("sales.orders", &altered);

        // customer no longer matches, so region (child of customer) cannot either
        assert_eq!(candidate.match_count(&original), 1);
    }

    #[test]
    fn changed_join_type_breaks_match() {
        let original = JoinTree::build("sales.orders", &lookups());
        let mut altered = lookups();
        altered[1].join.join_type = JoinType::Left;
        let candidate = JoinTree::build("sales.orders", &altered);
        assert_eq!(candidate.match_count(&original), 2);
    }

    #[test]
    fn different_root_matches_nothing() {
        let original = JoinTree::build("sales.orders", &lookups());
        let candidate = JoinTree::build("sales.orders_v2", &[]);
        assert_eq!(candidate.match_count(&original), 0);
    }

    #[test]
    fn aliases_do_not_affect_matching() {
        let original = JoinTree::build("sales.orders", &lookups()[..1]);
        let renamed = vec![LookupDesc::new(
            "sales.customer",
            JoinDesc::inner(col("orders.customer_id"), col("cust.id")),
        )
        .with_alias("cust")];
        let candidate = JoinTree::build("sales.orders", &renamed);
        assert_eq!(candidate.match_count(&original), 2);
    }

    fn duplicate_customer() -> LookupDesc {
        LookupDesc::new(
            "sales.customer",
            JoinDesc::inner(col("orders.customer_id"), col("customer2.id")),
        )
        .with_alias("customer2")
    }

    #[test]
    fn duplicated_join_cannot_replace_removed_one() {
        let original = JoinTree::build("sales.orders", &lookups());
        let candidate =
            JoinTree::build("sales.orders", &[lookups()[0].clone(), duplicate_customer()]);

        // customer2 has the same shape as customer but the original has
        // only one such node, already claimed.
        assert_eq!(candidate.match_count(&original), 2);
    }

    #[test]
    fn duplicated_join_never_exceeds_original_size() {
        let original = JoinTree::build("sales.orders", &lookups());
        let mut extended = lookups();
        extended.push(duplicate_customer());
        let candidate = JoinTree::build("sales.orders", &extended);

        assert_eq!(candidate.match_count(&original), original.len());
    }

    #[test]
    fn namesake_claimed_before_lookalike() {
        // BUYER sorts before CUSTOMER and has the same shape; the namesake
        // must still keep its match so REGION can follow it.
        let original = JoinTree::build("sales.orders", &lookups());
        let mut extended = lookups();
        extended.push(
            LookupDesc::new(
                "sales.customer",
                JoinDesc::inner(col("orders.customer_id"), col("buyer.id")),
            )
            .with_alias("buyer"),
        );
        let candidate = JoinTree::build("sales.orders", &extended);

        assert_eq!(candidate.match_count(&original), 3);
    }

    #[test]
    fn orphan_lookup_never_matches() {
        let orphan = vec![LookupDesc::new(
            "sales.customer",
            JoinDesc::inner(col("nowhere.customer_id"), col("customer.id")),
        )];
        let a = JoinTree::build("sales.orders", &orphan);
        let b = JoinTree::build("sales.orders", &orphan);
        assert_eq!(a.match_count(&b), 1);
    }

    #[test]
    fn join_desc_serde_shape() {
        let join = JoinDesc::inner(col("orders.customer_id"), col("customer.id"));
        let json = serde_json::to_value(&join).unwrap();
        assert_eq!(json["type"], "inner");
        assert_eq!(json["foreign_key"][0], "ORDERS.CUSTOMER_ID");
        assert_eq!(json["primary_key"][0], "CUSTOMER.ID");
    }
}
