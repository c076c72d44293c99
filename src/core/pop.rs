//! Purpose: Wire model for Pop records and the collection envelopes that carry them.
//! Exports: `Pop`, `PopCollection`.
//! Role: Transient view-model decoded fresh from each response.
//! Invariants: `popid` is server-assigned and never serialized when absent.
//! Invariants: Collections decode from a bare array or an ORDS `{"items": [...]}` envelope.
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pop {
    #[serde(rename = "popid", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(rename = "popName", alias = "popname", default)]
    pub name: String,
    #[serde(
        rename = "popNumber",
        alias = "popnumber",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub number: Option<i64>,
    #[serde(
        rename = "popPrice",
        alias = "popprice",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<f64>,
    #[serde(
        rename = "popShipping",
        alias = "popshipping",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub shipping: Option<f64>,
    #[serde(rename = "popSold", alias = "popsold", default)]
    pub sold: bool,
    #[serde(rename = "popDelivered", alias = "popdelivered", default)]
    pub delivered: bool,
    #[serde(
        rename = "popCollection",
        alias = "popcollection",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub collection: Option<u64>,
    #[serde(
        rename = "popStore",
        alias = "popstore",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub store: Option<u64>,
    #[serde(
        rename = "popImage",
        alias = "popimage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<String>,
    #[serde(
        rename = "popOrderDate",
        alias = "poporderdate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub order_date: Option<String>,
}

impl Pop {
    /// A keyless record carrying only a name, ready for create.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn has_blank_name(&self) -> bool {
        self.name.trim().is_empty()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PopCollection {
    Bare(Vec<Pop>),
    Items { items: Vec<Pop> },
}

impl PopCollection {
    pub fn into_pops(self) -> Vec<Pop> {
        match self {
            PopCollection::Bare(pops) => pops,
            PopCollection::Items { items } => items,
        }
    }
}
