use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Affinity class between a creator and a potential presenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationType {
    Private,
    Friend,
    Family,
}

impl RelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Friend => "friend",
            Self::Family => "family",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown relation type: {0}")]
pub struct UnknownRelationType(pub String);

impl FromStr for RelationType {
    type Err = UnknownRelationType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(Self::Private),
            "friend" => Ok(Self::Friend),
            "family" => Ok(Self::Family),
            other => Err(UnknownRelationType(other.to_string())),
        }
    }
}

/// Where a wish sits in its booking lifecycle.
///
/// Only `Unbooked -> Booked` is reachable today. `Presented` is read back
/// from storage so a presenting step can be added without a schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WishState {
    Unbooked,
    Booked,
    Presented,
}

impl WishState {
    pub fn from_flags(booked: bool, presented: bool) -> Self {
        match (booked, presented) {
            (_, true) => Self::Presented,
            (true, false) => Self::Booked,
            (false, false) => Self::Unbooked,
        }
    }

    pub fn is_bookable(&self) -> bool {
        matches!(self, Self::Unbooked)
    }
}

/// A registry item as stored, with its booking flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wish {
    pub wish_id: i64,
    pub creator_name: String,
    pub name: String,
    pub booked: bool,
    pub presented: bool,
    pub priority: Option<i64>,
    pub relation_type: Option<RelationType>,
    pub link: Option<String>,
    pub price: Option<f64>,
    pub photo_ref: Option<String>,
    pub desc: Option<String>,
    pub quantity: Option<i64>,
}

impl Wish {
    pub fn state(&self) -> WishState {
        WishState::from_flags(self.booked, self.presented)
    }
}

/// Input for a new wish. Unset optionals are stored as NULL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewWish {
    pub creator_name: String,
    pub name: String,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub relation_type: Option<RelationType>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub photo_ref: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

impl NewWish {
    pub fn new(creator_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            creator_name: creator_name.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }
}

/// The durable record that a presenter claimed a wish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub wish_id: i64,
    pub creator_name: String,
    pub presenter_name: String,
    pub timestamp_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub relation_id: i64,
    pub creator_name: String,
    pub presenter_name: String,
    pub relation_type: RelationType,
}

/// A wish under construction inside a front-end session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WishDraft {
    pub name: Option<String>,
    pub priority: Option<i64>,
    pub relation_type: Option<RelationType>,
    pub link: Option<String>,
    pub price: Option<f64>,
    pub photo_ref: Option<String>,
    pub desc: Option<String>,
    pub quantity: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("wish draft has no name")]
    MissingName,
}

impl WishDraft {
    /// Overlay every field set in `update`; fields left `None` keep their value.
    pub fn merge(&mut self, update: WishDraft) {
        if update.name.is_some() {
            self.name = update.name;
        }
        if update.priority.is_some() {
            self.priority = update.priority;
        }
        if update.relation_type.is_some() {
            self.relation_type = update.relation_type;
        }
        if update.link.is_some() {
            self.link = update.link;
        }
        if update.price.is_some() {
            self.price = update.price;
        }
        if update.photo_ref.is_some() {
            self.photo_ref = update.photo_ref;
        }
        if update.desc.is_some() {
            self.desc = update.desc;
        }
        if update.quantity.is_some() {
            self.quantity = update.quantity;
        }
    }

    pub fn into_new_wish(self, creator_name: &str) -> Result<NewWish, DraftError> {
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or(DraftError::MissingName)?;

        Ok(NewWish {
            creator_name: creator_name.to_string(),
            name,
            priority: self.priority,
            relation_type: self.relation_type,
            link: self.link,
            price: self.price,
            photo_ref: self.photo_ref,
            desc: self.desc,
            quantity: self.quantity,
        })
    }
}
