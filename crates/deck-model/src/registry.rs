//! Explicit tag to codec registry for host page types.
//!
//! Pages are persisted as `{ "type": <tag>, "value": <json> }`. Hosts register
//! one codec per tag when they construct their repositories; nothing is looked
//! up by runtime type.

use std::fmt;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::page::Tagged;

/// Page value together with its tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedValue {
    #[serde(rename = "type")]
    pub tag: String,
    pub value: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Decoding met a tag nobody registered.
    #[error("unknown page type tag `{tag}`")]
    UnknownTag { tag: String },
    /// Encoding a value whose tag has no codec.
    #[error("no codec registered for page type tag `{tag}`")]
    Unregistered { tag: &'static str },
    /// The codec registered for `tag` does not accept the value.
    #[error("codec for `{tag}` does not accept this value")]
    Mismatch { tag: &'static str },
    #[error("malformed value for page type `{tag}`: {source}")]
    Json {
        tag: String,
        #[source]
        source: serde_json::Error,
    },
}

type EncodeFn<T> = Box<dyn Fn(&T) -> Option<Result<Value, serde_json::Error>> + Send + Sync>;
type DecodeFn<T> = Box<dyn Fn(Value) -> Result<T, serde_json::Error> + Send + Sync>;

struct Codec<T> {
    encode: EncodeFn<T>,
    decode: DecodeFn<T>,
}

/// Codecs for the variants of a host page type, keyed by tag.
pub struct TagRegistry<T> {
    codecs: IndexMap<&'static str, Codec<T>>,
}

impl<T: Tagged> TagRegistry<T> {
    pub fn new() -> Self {
        Self {
            codecs: IndexMap::new(),
        }
    }

    /// Registers the payload type `V` under `tag`.
    ///
    /// `wrap` builds the page from a decoded payload; `unwrap` extracts the
    /// payload from a page carrying `tag`. Registering a tag twice replaces the
    /// earlier codec.
    pub fn register<V>(&mut self, tag: &'static str, wrap: fn(V) -> T, unwrap: fn(&T) -> Option<&V>)
    where
        V: Serialize + DeserializeOwned + 'static,
        T: 'static,
    {
        let codec = Codec {
            encode: Box::new(move |page: &T| unwrap(page).map(serde_json::to_value)),
            decode: Box::new(move |value| serde_json::from_value::<V>(value).map(wrap)),
        };
        self.codecs.insert(tag, codec);
    }

    /// Builder form of [`register`](Self::register).
    pub fn with<V>(mut self, tag: &'static str, wrap: fn(V) -> T, unwrap: fn(&T) -> Option<&V>) -> Self
    where
        V: Serialize + DeserializeOwned + 'static,
        T: 'static,
    {
        self.register(tag, wrap, unwrap);
        self
    }

    /// Registers a unit variant that carries no payload.
    pub fn with_unit(self, tag: &'static str, make: fn() -> T) -> Self
    where
        T: 'static,
    {
        let mut registry = self;
        let codec = Codec {
            encode: Box::new(move |page: &T| (page.type_tag() == tag).then(|| Ok(Value::Null))),
            decode: Box::new(move |_| Ok(make())),
        };
        registry.codecs.insert(tag, codec);
        registry
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.codecs.contains_key(tag)
    }

    /// Registered tags in registration order.
    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.codecs.keys().copied()
    }

    pub fn encode(&self, page: &T) -> Result<TaggedValue, CodecError> {
        let tag = page.type_tag();
        let codec = self
            .codecs
            .get(tag)
            .ok_or(CodecError::Unregistered { tag })?;
        let value = (codec.encode)(page)
            .ok_or(CodecError::Mismatch { tag })?
            .map_err(|source| CodecError::Json {
                tag: tag.to_owned(),
                source,
            })?;
        Ok(TaggedValue {
            tag: tag.to_owned(),
            value,
        })
    }

    pub fn decode(&self, tagged: TaggedValue) -> Result<T, CodecError> {
        let TaggedValue { tag, value } = tagged;
        let Some(codec) = self.codecs.get(tag.as_str()) else {
            return Err(CodecError::UnknownTag { tag });
        };
        (codec.decode)(value).map_err(|source| CodecError::Json { tag, source })
    }
}

impl<T: Tagged> Default for TagRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TagRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagRegistry")
            .field("tags", &self.codecs.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Page {
        Home,
        Profile(String),
        Thread { uri: String },
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct ThreadArgs {
        uri: String,
    }

    impl Tagged for Page {
        fn type_tag(&self) -> &'static str {
            match self {
                Page::Home => "home",
                Page::Profile(_) => "profile",
                Page::Thread { .. } => "thread",
            }
        }
    }

    fn registry() -> TagRegistry<Page> {
        TagRegistry::new()
            .with_unit("home", || Page::Home)
            .with("profile", Page::Profile, |page| match page {
                Page::Profile(handle) => Some(handle),
                _ => None,
            })
    }

    #[test]
    fn encodes_with_tag_and_decodes_back() {
        let registry = registry();
        let tagged = registry.encode(&Page::Profile("alice".into())).unwrap();
        assert_eq!(tagged.tag, "profile");
        assert_eq!(tagged.value, Value::String("alice".into()));
        assert_eq!(
            serde_json::to_value(&tagged).unwrap(),
            serde_json::json!({ "type": "profile", "value": "alice" })
        );
        assert_eq!(registry.decode(tagged).unwrap(), Page::Profile("alice".into()));
        assert_eq!(
            registry.decode(registry.encode(&Page::Home).unwrap()).unwrap(),
            Page::Home
        );
    }

    #[test]
    fn unknown_tag_is_a_data_error() {
        let error = registry()
            .decode(TaggedValue {
                tag: "settings".into(),
                value: Value::Null,
            })
            .unwrap_err();
        assert!(matches!(error, CodecError::UnknownTag { tag } if tag == "settings"));
    }

    #[test]
    fn unregistered_variant_fails_to_encode() {
        let error = registry()
            .encode(&Page::Thread {
                uri: "at://post".into(),
            })
            .unwrap_err();
        assert!(matches!(error, CodecError::Unregistered { tag: "thread" }));
    }

    #[test]
    fn malformed_payload_reports_tag() {
        let error = registry()
            .decode(TaggedValue {
                tag: "profile".into(),
                value: serde_json::json!({ "nope": 1 }),
            })
            .unwrap_err();
        assert!(matches!(error, CodecError::Json { ref tag, .. } if tag == "profile"));
    }

    #[test]
    fn struct_payloads_register_through_conversion() {
        fn wrap(args: ThreadArgs) -> Page {
            Page::Thread { uri: args.uri }
        }
        let mut registry = registry();
        registry.register::<String>("thread", |uri| wrap(ThreadArgs { uri }), |page| match page {
            Page::Thread { uri } => Some(uri),
            _ => None,
        });
        let page = Page::Thread {
            uri: "at://post".into(),
        };
        assert_eq!(registry.decode(registry.encode(&page).unwrap()).unwrap(), page);
        assert_eq!(registry.tags().collect::<Vec<_>>(), ["home", "profile", "thread"]);
    }
}
