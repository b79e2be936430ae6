use crate::errors::{FlavorError, Result};
use crate::models::{Flavor, FlavorKey};
use log::{debug, trace};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Active filter criteria.
///
/// A bound that is `None` or zero imposes no constraint, and an empty name
/// substring matches every flavor. This means "exactly zero" cannot be
/// expressed as a bound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlavorFilter {
    pub name: Option<String>,
    pub vcpus_min: Option<u32>,
    pub vcpus_max: Option<u32>,
    /// Lower memory bound in GiB.
    pub memory_min: Option<u64>,
    /// Upper memory bound in GiB.
    pub memory_max: Option<u64>,
}

fn set_bound<T: Default + PartialEq>(value: T) -> Option<T> {
    if value == T::default() {
        None
    } else {
        Some(value)
    }
}

fn active<T: Copy + Default + PartialEq>(bound: Option<T>) -> Option<T> {
    bound.and_then(set_bound)
}

impl FlavorFilter {
    /// The name substring, if one is in effect.
    pub fn name_substring(&self) -> Option<&str> {
        self.name.as_deref().filter(|s| !s.is_empty())
    }

    pub fn vcpu_bounds(&self) -> (Option<u32>, Option<u32>) {
        (active(self.vcpus_min), active(self.vcpus_max))
    }

    pub fn memory_bounds(&self) -> (Option<u64>, Option<u64>) {
        (active(self.memory_min), active(self.memory_max))
    }

    /// Replace the name substring. An empty string clears it.
    pub fn set_name(&mut self, name: &str) {
        self.name = set_bound(name.to_string());
    }

    /// Replace both vCPU bounds; `0` resets a bound.
    pub fn set_vcpu_range(&mut self, min: u32, max: u32) {
        self.vcpus_min = set_bound(min);
        self.vcpus_max = set_bound(max);
    }

    /// Replace both memory bounds (GiB); `0` resets a bound.
    pub fn set_memory_range(&mut self, min: u64, max: u64) {
        self.memory_min = set_bound(min);
        self.memory_max = set_bound(max);
    }

    /// Reject ranges whose active minimum exceeds the active maximum.
    pub fn validate(&self) -> Result<()> {
        if let (Some(min), Some(max)) = self.vcpu_bounds() {
            if min > max {
                return Err(FlavorError::InvalidArgument(format!(
                    "minimum vCPUs ({}) is greater than maximum vCPUs ({})",
                    min, max
                )));
            }
        }

        if let (Some(min), Some(max)) = self.memory_bounds() {
            if min > max {
                return Err(FlavorError::InvalidArgument(format!(
                    "minimum memory ({} GiB) is greater than maximum memory ({} GiB)",
                    min, max
                )));
            }
        }

        Ok(())
    }
}

/// Flavor attribute a collection can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Id,
    Name,
    Vcpus,
    Memory,
    Disk,
    Swap,
    Ephemeral,
    Description,
    IsPublic,
    RxtxFactor,
}

impl SortKey {
    pub const ALL: [SortKey; 10] = [
        SortKey::Id,
        SortKey::Name,
        SortKey::Vcpus,
        SortKey::Memory,
        SortKey::Disk,
        SortKey::Swap,
        SortKey::Ephemeral,
        SortKey::Description,
        SortKey::IsPublic,
        SortKey::RxtxFactor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Id => "id",
            SortKey::Name => "name",
            SortKey::Vcpus => "vcpus",
            SortKey::Memory => "memory",
            SortKey::Disk => "disk",
            SortKey::Swap => "swap",
            SortKey::Ephemeral => "ephemeral",
            SortKey::Description => "description",
            SortKey::IsPublic => "is_public",
            SortKey::RxtxFactor => "rxtx_factor",
        }
    }

    /// Compare two flavors on this attribute only.
    pub fn compare(&self, a: &Flavor, b: &Flavor) -> Ordering {
        match self {
            SortKey::Id => a.id.cmp(&b.id),
            SortKey::Name => a.name.cmp(&b.name),
            SortKey::Vcpus => a.vcpus.cmp(&b.vcpus),
            SortKey::Memory => a.memory.total_cmp(&b.memory),
            SortKey::Disk => a.disk.cmp(&b.disk),
            SortKey::Swap => a.swap.cmp(&b.swap),
            SortKey::Ephemeral => a.ephemeral.cmp(&b.ephemeral),
            SortKey::Description => a.description.cmp(&b.description),
            SortKey::IsPublic => a.is_public.cmp(&b.is_public),
            SortKey::RxtxFactor => a.rxtx_factor.total_cmp(&b.rxtx_factor),
        }
    }
}

impl FromStr for SortKey {
    type Err = FlavorError;

    fn from_str(s: &str) -> Result<Self> {
        SortKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| FlavorError::InvalidSortKey(s.to_string()))
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The full set of loaded flavors plus the filter applied to them.
///
/// `items` keeps provider order and is never reordered; every view is
/// computed on demand from the current filter.
#[derive(Debug, Clone, Default)]
pub struct FlavorCollection {
    items: Vec<Flavor>,
    filter: FlavorFilter,
}

impl FlavorCollection {
    pub fn new(filter: FlavorFilter) -> Self {
        Self {
            items: Vec::new(),
            filter,
        }
    }

    /// Append a flavor. Duplicates are kept here and collapsed by `list()`.
    pub fn add(&mut self, record: impl Into<Flavor>) {
        let flavor = record.into();
        debug!("adding flavor: {:?}", flavor);
        self.items.push(flavor);
    }

    pub fn items(&self) -> &[Flavor] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn filter(&self) -> &FlavorFilter {
        &self.filter
    }

    pub fn filter_mut(&mut self) -> &mut FlavorFilter {
        &mut self.filter
    }

    pub fn set_filter(&mut self, filter: FlavorFilter) {
        self.filter = filter;
    }

    pub fn filtered_by_vcpu(&self) -> Vec<&Flavor> {
        let (min, max) = self.filter.vcpu_bounds();
        self.items
            .iter()
            .filter(|f| min.map_or(true, |min| f.vcpus >= min))
            .filter(|f| max.map_or(true, |max| f.vcpus <= max))
            .collect()
    }

    pub fn filtered_by_memory(&self) -> Vec<&Flavor> {
        let (min, max) = self.filter.memory_bounds();
        self.items
            .iter()
            .filter(|f| min.map_or(true, |min| f.memory >= min as f64))
            .filter(|f| max.map_or(true, |max| f.memory <= max as f64))
            .collect()
    }

    pub fn filtered_by_name(&self) -> Vec<&Flavor> {
        match self.filter.name_substring() {
            Some(substring) => self
                .items
                .iter()
                .filter(|f| f.name.contains(substring))
                .collect(),
            None => self.items.iter().collect(),
        }
    }

    /// Flavors passing every facet, one per `(name, id)`.
    ///
    /// Order is not part of the contract; use [`FlavorCollection::sort`]
    /// for a defined order.
    pub fn list(&self) -> Vec<&Flavor> {
        let by_vcpu = identity_keys(self.filtered_by_vcpu());
        let by_memory = identity_keys(self.filtered_by_memory());
        let by_name = identity_keys(self.filtered_by_name());
        trace!(
            "facet sizes: vcpu={} memory={} name={}",
            by_vcpu.len(),
            by_memory.len(),
            by_name.len()
        );

        let matching: HashSet<FlavorKey<'_>> = by_vcpu
            .intersection(&by_memory)
            .filter(|key| by_name.contains(*key))
            .copied()
            .collect();

        let mut seen = HashSet::with_capacity(matching.len());
        self.items
            .iter()
            .filter(|f| matching.contains(&f.key()) && seen.insert(f.key()))
            .collect()
    }

    /// Sort `list()` by the named attribute.
    ///
    /// Ties are broken by ascending name (then id); `descending` only flips
    /// the primary key.
    pub fn sort(&self, key: &str, descending: bool) -> Result<Vec<&Flavor>> {
        let key = key.parse::<SortKey>()?;
        Ok(self.sorted(key, descending))
    }

    pub fn sorted(&self, key: SortKey, descending: bool) -> Vec<&Flavor> {
        let mut flavors = self.list();
        flavors.sort_by(|a, b| {
            let primary = key.compare(a, b);
            let primary = if descending { primary.reverse() } else { primary };
            primary
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.id.cmp(&b.id))
        });
        flavors
    }
}

fn identity_keys<'a>(flavors: Vec<&'a Flavor>) -> HashSet<FlavorKey<'a>> {
    flavors.into_iter().map(Flavor::key).collect()
}

impl<F: Into<Flavor>> FromIterator<F> for FlavorCollection {
    fn from_iter<I: IntoIterator<Item = F>>(iter: I) -> Self {
        let mut collection = FlavorCollection::default();
        for record in iter {
            collection.add(record);
        }
        collection
    }
}
