use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Provider-defined key/value metadata attached to a flavor.
pub type ExtraSpecs = BTreeMap<String, String>;

/// Identity of a flavor: `(name, id)`.
pub type FlavorKey<'a> = (&'a str, &'a str);

const MIB_PER_GIB: f64 = 1024.0;

/// One compute flavor as presented to the user.
///
/// Equality and hashing only look at `(name, id)`; every other field is
/// ignored so that duplicate provider records collapse in sets.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Flavor {
    pub id: String,
    pub name: String,
    pub vcpus: u32,
    /// Memory in GiB.
    pub memory: f64,
    pub disk: u64,
    pub swap: u64,
    pub ephemeral: u64,
    pub description: String,
    pub is_public: bool,
    pub rxtx_factor: f64,
    pub extra_specs: ExtraSpecs,
}

impl Flavor {
    pub fn key(&self) -> FlavorKey<'_> {
        (self.name.as_str(), self.id.as_str())
    }

    /// Render `extra_specs` as `key=value` pairs joined by `", "`.
    pub fn extra_specs_text(&self) -> String {
        self.extra_specs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl PartialEq for Flavor {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Flavor {}

impl Hash for Flavor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// Text form: `key=value` pairs in field order, values as JSON.
impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = serde_json::to_value(self).map_err(|_| fmt::Error)?;
        let fields = [
            "id",
            "name",
            "vcpus",
            "memory",
            "disk",
            "swap",
            "ephemeral",
            "description",
            "is_public",
            "rxtx_factor",
            "extra_specs",
        ];

        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}={}", field, value[*field])?;
        }
        Ok(())
    }
}

/// Raw flavor record as returned by the compute service.
///
/// Field names follow the provider, with aliases for the extension-prefixed
/// names used by the Nova API. `ram` is in MiB.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RawFlavor {
    pub id: String,
    pub name: String,
    pub vcpus: u32,
    pub ram: u64,
    #[serde(default)]
    pub disk: u64,
    // Older microversions report "no swap" as an empty string
    #[serde(default, deserialize_with = "deserialize_swap")]
    pub swap: u64,
    #[serde(default, alias = "OS-FLV-EXT-DATA:ephemeral")]
    pub ephemeral: u64,
    #[serde(default, deserialize_with = "deserialize_description")]
    pub description: String,
    #[serde(default = "default_is_public", alias = "os-flavor-access:is_public")]
    pub is_public: bool,
    #[serde(default = "default_rxtx_factor")]
    pub rxtx_factor: f64,
    #[serde(default)]
    pub extra_specs: ExtraSpecs,
}

fn default_is_public() -> bool {
    true
}

fn default_rxtx_factor() -> f64 {
    1.0
}

fn deserialize_swap<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(0),
        serde_json::Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| D::Error::custom(format!("invalid swap size: {}", n))),
        serde_json::Value::String(s) if s.trim().is_empty() => Ok(0),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| D::Error::custom(format!("invalid swap size: '{}'", s))),
        other => Err(D::Error::custom(format!("invalid swap size: {}", other))),
    }
}

fn deserialize_description<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl From<RawFlavor> for Flavor {
    fn from(raw: RawFlavor) -> Self {
        Flavor {
            id: raw.id,
            name: raw.name,
            vcpus: raw.vcpus,
            memory: raw.ram as f64 / MIB_PER_GIB,
            disk: raw.disk,
            swap: raw.swap,
            ephemeral: raw.ephemeral,
            description: raw.description,
            is_public: raw.is_public,
            rxtx_factor: raw.rxtx_factor,
            extra_specs: raw.extra_specs,
        }
    }
}
