use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use data_encoding::BASE64URL_NOPAD;
use err_derive::Error;
use rand::distributions::{Distribution, Standard};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// An entity identifier; 128 random (or hashed) bits, rendered as
/// `prefix-base64`, where the prefix names the entity type.
#[derive(Hash)]
pub struct Id<T> {
    val: [u8; 16],
    phantom: PhantomData<T>,
}

/// Something storable under an `Id`, with a stable prefix for its kind.
pub trait Entity {
    const PREFIX: &'static str;
}

#[derive(Debug, Clone, Error)]
pub enum IdParseError {
    #[error(display = "invalid id prefix")]
    InvalidPrefix,
    #[error(display = "unparseable id")]
    Unparseable,
}

const DIVIDER: &str = "-";

/// Mints fresh random identifiers.
#[derive(Debug, Clone, Default)]
pub struct IdGen;

impl IdGen {
    pub fn new() -> Self {
        IdGen
    }

    pub fn generate<T>(&self) -> Id<T> {
        rand::random()
    }
}

impl<T> Id<T> {
    /// Derive a deterministic id from the hash of `entity`. Used for
    /// well-known documents (seed data) so repeated setup finds the
    /// same rows.
    pub fn hashed<H: Hash>(entity: &H) -> Self {
        let mut val = [0u8; 16];
        for (i, chunk) in val.chunks_mut(8).enumerate() {
            let mut h = siphasher::sip::SipHasher24::new_with_keys(0, i as u64);
            entity.hash(&mut h);
            chunk.copy_from_slice(&h.finish().to_be_bytes());
        }
        Id {
            val,
            phantom: PhantomData,
        }
    }
}

/// The string key every `Id<T>` of this entity starts with, divider
/// included. Storage backends use it to scan one kind of document.
pub fn key_prefix<T: Entity>() -> String {
    format!("{}{}", T::PREFIX, DIVIDER)
}

impl<T> Distribution<Id<T>> for Standard {
    fn sample<R: ?Sized + rand::Rng>(&self, rng: &mut R) -> Id<T> {
        Id {
            val: rng.gen(),
            phantom: PhantomData,
        }
    }
}

impl<T: Entity> fmt::Display for Id<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "{}{}{}",
            T::PREFIX,
            DIVIDER,
            BASE64URL_NOPAD.encode(&self.val)
        )
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "Id(")?;
        for b in &self.val {
            write!(fmt, "{:02x}", b)?;
        }
        write!(fmt, ")")
    }
}

impl<T: Entity> std::str::FromStr for Id<T> {
    type Err = IdParseError;
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        // strip_prefix rather than split_at: ids arrive from URLs, and
        // a multi-byte character straddling the prefix length must not
        // trip a char-boundary panic.
        let remainder = src
            .strip_prefix(T::PREFIX)
            .ok_or(IdParseError::InvalidPrefix)?;
        let b64 = remainder
            .strip_prefix(DIVIDER)
            .ok_or(IdParseError::Unparseable)?;

        let bytes = BASE64URL_NOPAD
            .decode(b64.as_bytes())
            .map_err(|_| IdParseError::Unparseable)?;
        let mut id = Id::default();
        if bytes.len() != id.val.len() {
            return Err(IdParseError::Unparseable);
        }
        id.val.copy_from_slice(&bytes);
        Ok(id)
    }
}

impl<T> Default for Id<T> {
    fn default() -> Self {
        Id {
            val: Default::default(),
            phantom: PhantomData,
        }
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.val == other.val
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.val.cmp(&other.val)
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T: Entity> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de, T: Entity> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdStrVisitor<T>(PhantomData<T>);
        impl<'vi, T: Entity> de::Visitor<'vi> for IdStrVisitor<T> {
            type Value = Id<T>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "an Id string")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Id<T>, E> {
                value.parse::<Id<T>>().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(IdStrVisitor(PhantomData))
    }
}
