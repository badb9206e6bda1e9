//! Binding a [`Config`] onto `serde`-derived structs.
//!
//! Each field of the target struct is looked up by its serde name, so
//! `#[serde(rename = "...")]` picks a different key and `#[serde(skip)]`
//! leaves a field out. `#[serde(alias = "...")]` is rejected with
//! [`ConfigError::UnsupportedType`]. Integer, string and boolean fields are converted from
//! the raw text; a key that is missing from the store leaves the field at its
//! zero value. Any other conversion failure stops the bind.

use log::debug;
use serde::de::value::StrDeserializer;
use serde::de::{
    DeserializeOwned, DeserializeSeed, Deserializer, Expected, IntoDeserializer, MapAccess, Visitor,
};
use serde::forward_to_deserialize_any;

use super::{Config, ConfigError};

impl Config {
    /// Builds a `T` from the store.
    ///
    /// `T` must deserialize as a struct (or a newtype / `Box` around one);
    /// anything else fails with [`ConfigError::UnsupportedType`].
    ///
    /// ## Example
    ///
    /// ```
    /// use dragon_kv::Config;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct Person {
    ///     #[serde(rename = "user.name")]
    ///     name: String,
    ///     age: u8,
    ///     #[serde(skip)]
    ///     nickname: String,
    /// }
    ///
    /// let mut config = Config::new();
    /// config.load_str("user.name=piyo\nage=28\nnickname=ignored")?;
    ///
    /// let person: Person = config.bind()?;
    /// assert_eq!(person.name, "piyo");
    /// assert_eq!(person.age, 28);
    /// assert!(person.nickname.is_empty());
    /// # Ok::<(), dragon_kv::ConfigError>(())
    /// ```
    pub fn bind<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        T::deserialize(RecordDeserializer { config: self })
    }

    /// Binds onto an existing value. `target` is only replaced if every field binds.
    pub fn bind_into<T: DeserializeOwned>(&self, target: &mut T) -> Result<(), ConfigError> {
        *target = self.bind()?;
        Ok(())
    }
}

fn unsupported(what: impl std::fmt::Display, visitor: &dyn Expected) -> ConfigError {
    ConfigError::UnsupportedType(format!("{what}: cannot bind {visitor}"))
}

struct RecordDeserializer<'a> {
    config: &'a Config,
}

impl<'de, 'a> Deserializer<'de> for RecordDeserializer<'a> {
    type Error = ConfigError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ConfigError> {
        Err(unsupported("bind target", &visitor))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, ConfigError> {
        visitor.visit_map(FieldAccess {
            config: self.config,
            fields: fields.iter(),
            current: "",
        })
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, ConfigError> {
        visitor.visit_newtype_struct(self)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct seq tuple tuple_struct map enum
        identifier ignored_any
    }
}

/// Walks the struct's fields in declaration order.
struct FieldAccess<'a> {
    config: &'a Config,
    fields: std::slice::Iter<'static, &'static str>,
    current: &'static str,
}

impl<'de, 'a> MapAccess<'de> for FieldAccess<'a> {
    type Error = ConfigError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, ConfigError> {
        let Some(&field) = self.fields.next() else {
            return Ok(None);
        };
        self.current = field;
        let key: StrDeserializer<'static, ConfigError> = field.into_deserializer();
        seed.deserialize(key).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, ConfigError> {
        seed.deserialize(FieldDeserializer {
            config: self.config,
            name: self.current,
        })
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.fields.len())
    }
}

struct FieldDeserializer<'a> {
    config: &'a Config,
    name: &'static str,
}

impl<'a> FieldDeserializer<'a> {
    /// Runs `fetch`, turning a missing key into `None`.
    fn fetch<T>(
        &self,
        fetch: impl FnOnce(&'a Config, &str) -> Result<T, ConfigError>,
    ) -> Result<Option<T>, ConfigError> {
        match fetch(self.config, self.name) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => {
                debug!("no value for '{}', using zero value", self.name);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn out_of_range(&self, value: i64, target: &'static str) -> ConfigError {
        ConfigError::OutOfRange {
            name: self.name.to_string(),
            value,
            target,
        }
    }
}

macro_rules! bind_integer {
    ($($method:ident => $ty:ty, $visit:ident;)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ConfigError> {
                let value = self.fetch(Config::get_int)?.unwrap_or(0);
                let value = <$ty>::try_from(value)
                    .map_err(|_| self.out_of_range(value, stringify!($ty)))?;
                visitor.$visit(value)
            }
        )*
    };
}

impl<'de, 'a> Deserializer<'de> for FieldDeserializer<'a> {
    type Error = ConfigError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ConfigError> {
        Err(unsupported(format_args!("field '{}'", self.name), &visitor))
    }

    bind_integer! {
        deserialize_i8 => i8, visit_i8;
        deserialize_i16 => i16, visit_i16;
        deserialize_i32 => i32, visit_i32;
        deserialize_i64 => i64, visit_i64;
        deserialize_u8 => u8, visit_u8;
        deserialize_u16 => u16, visit_u16;
        deserialize_u32 => u32, visit_u32;
        deserialize_u64 => u64, visit_u64;
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ConfigError> {
        let value = self.fetch(Config::get_bool)?.unwrap_or(false);
        visitor.visit_bool(value)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ConfigError> {
        let value = self.fetch(Config::get_str)?.unwrap_or("");
        visitor.visit_str(value)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ConfigError> {
        self.deserialize_str(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ConfigError> {
        if self.config.contains(self.name) {
            visitor.visit_some(self)
        } else {
            visitor.visit_none()
        }
    }

    forward_to_deserialize_any! {
        i128 u128 f32 f64 char bytes byte_buf unit unit_struct newtype_struct
        seq tuple tuple_struct map struct enum identifier ignored_any
    }
}
