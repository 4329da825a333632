//! Process-wide taxonomy of fraud types.
//!
//! Names are stored in canonical form (diacritics folded, upper case,
//! non-alphanumeric runs collapsed to `_`), so "sim swap", "Sim-Swap" and
//! "SIM_SWAP" are the same entry. Registration is check-and-insert under a
//! single write guard.

use std::path::Path;
use std::sync::{PoisonError, RwLock};

use chrono::Utc;
use indexmap::IndexMap;
use tracing::{debug, info};

use curator_core::text::fold_char;
use curator_core::{CuratorError, FraudTypeEntry};

/// Default normalized similarity needed for a near match.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.85;

const DEFAULT_TYPES: &[(&str, &str)] = &[
    (
        "IMPERSONATION",
        "Fraudster poses as a trusted party (bank, company, authority, relative) to obtain money, data or authorizations.",
    ),
    (
        "PHISHING",
        "Deceptive messages or sites that lure the victim into revealing credentials or payment data.",
    ),
    (
        "ACCOUNT_TAKEOVER",
        "Unauthorized access to and control of a victim's existing account.",
    ),
    (
        "ADVANCE_FEE",
        "Victim pays an upfront fee for a promised prize, loan, job or benefit that never arrives.",
    ),
    (
        "FAKE_MERCHANT",
        "Non-existent or fraudulent seller collects payment without delivering goods or services.",
    ),
    (
        "INVESTMENT_SCAM",
        "Promises of unrealistic returns used to extract deposits from the victim.",
    ),
];

/// Outcome of [`FraudTypeRegistry::register`].
#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    Created(FraudTypeEntry),
    Existing(FraudTypeEntry),
}

impl Registration {
    pub fn entry(&self) -> &FraudTypeEntry {
        match self {
            Registration::Created(entry) | Registration::Existing(entry) => entry,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Registration::Created(_))
    }
}

/// Canonical form of a fraud type name. Empty when `name` has no
/// alphanumeric characters.
pub fn canonical_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.chars() {
        let folded = match fold_char(c) {
            Some(s) => s.to_string(),
            None => c.to_string(),
        };
        for c in folded.chars() {
            if c.is_alphanumeric() {
                if pending_sep && !out.is_empty() {
                    out.push('_');
                }
                pending_sep = false;
                out.extend(c.to_uppercase());
            } else {
                pending_sep = true;
            }
        }
    }
    out
}

/// Levenshtein distance over chars.
fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// `1 - distance / longer_length`, in `[0, 1]`.
fn name_similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - edit_distance(a, b) as f64 / longest as f64
}

pub struct FraudTypeRegistry {
    entries: RwLock<IndexMap<String, FraudTypeEntry>>,
    fuzzy_threshold: f64,
}

impl Default for FraudTypeRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_FUZZY_THRESHOLD)
    }
}

impl FraudTypeRegistry {
    /// Empty registry. A `fuzzy_threshold` above 1.0 disables near matching.
    pub fn new(fuzzy_threshold: f64) -> Self {
        Self {
            entries: RwLock::new(IndexMap::new()),
            fuzzy_threshold,
        }
    }

    /// Registry seeded with the built-in taxonomy.
    pub fn with_defaults(fuzzy_threshold: f64) -> Self {
        let registry = Self::new(fuzzy_threshold);
        {
            let mut entries = registry.entries.write().unwrap_or_else(PoisonError::into_inner);
            for (name, description) in DEFAULT_TYPES {
                entries.insert(
                    name.to_string(),
                    FraudTypeEntry {
                        name: name.to_string(),
                        description: description.to_string(),
                        registered_at: Utc::now(),
                    },
                );
            }
        }
        registry
    }

    /// Load entries from a JSON array written by [`save`](Self::save).
    /// Duplicate names collapse onto the first occurrence.
    pub fn load(path: &Path, fuzzy_threshold: f64) -> Result<Self, CuratorError> {
        let content = std::fs::read_to_string(path)?;
        let stored: Vec<FraudTypeEntry> =
            serde_json::from_str(&content).map_err(|e| CuratorError::Serialize(e.to_string()))?;

        let registry = Self::new(fuzzy_threshold);
        {
            let mut entries = registry.entries.write().unwrap_or_else(PoisonError::into_inner);
            for mut entry in stored {
                let key = canonical_name(&entry.name);
                if key.is_empty() || entries.contains_key(&key) {
                    continue;
                }
                entry.name = key.clone();
                entries.insert(key, entry);
            }
            info!(path = %path.display(), types = entries.len(), "loaded fraud type registry");
        }
        Ok(registry)
    }

    /// Load from `path` when it exists, otherwise start from the defaults.
    pub fn load_or_default(path: &Path, fuzzy_threshold: f64) -> Result<Self, CuratorError> {
        if path.exists() {
            Self::load(path, fuzzy_threshold)
        } else {
            Ok(Self::with_defaults(fuzzy_threshold))
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), CuratorError> {
        let entries = self.entries();
        let json = serde_json::to_string_pretty(&entries)
            .map_err(|e| CuratorError::Serialize(e.to_string()))?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), types = entries.len(), "saved fraud type registry");
        Ok(())
    }

    /// Canonical name of the known type matching `candidate`, exactly or
    /// within the fuzzy threshold.
    pub fn match_name(&self, candidate: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        self.lookup(&entries, &canonical_name(candidate))
            .map(|entry| entry.name.clone())
    }

    pub fn get(&self, candidate: &str) -> Option<FraudTypeEntry> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        self.lookup(&entries, &canonical_name(candidate)).cloned()
    }

    /// Add `name` unless it matches a known type, in which case the known
    /// entry is returned unchanged.
    pub fn register(&self, name: &str, description: &str) -> Result<Registration, CuratorError> {
        let key = canonical_name(name);
        if key.is_empty() {
            return Err(CuratorError::RegistryConflict(format!(
                "fraud type name '{name}' has no usable characters"
            )));
        }

        let mut entries = self
            .entries
            .write()
            .map_err(|_| CuratorError::RegistryConflict("registry lock poisoned".into()))?;

        if let Some(existing) = self.lookup(&entries, &key) {
            debug!(requested = %key, existing = %existing.name, "fraud type already registered");
            return Ok(Registration::Existing(existing.clone()));
        }

        let entry = FraudTypeEntry {
            name: key.clone(),
            description: description.trim().to_string(),
            registered_at: Utc::now(),
        };
        entries.insert(key, entry.clone());
        info!(fraud_type = %entry.name, total = entries.len(), "registered new fraud type");
        Ok(Registration::Created(entry))
    }

    /// Known names in registration order.
    pub fn known_names(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.keys().cloned().collect()
    }

    pub fn entries(&self) -> Vec<FraudTypeEntry> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup<'a>(
        &self,
        entries: &'a IndexMap<String, FraudTypeEntry>,
        key: &str,
    ) -> Option<&'a FraudTypeEntry> {
        if key.is_empty() {
            return None;
        }
        if let Some(entry) = entries.get(key) {
            return Some(entry);
        }

        // Best near match; ties go to the earlier registration.
        let mut best: Option<(f64, &FraudTypeEntry)> = None;
        for (name, entry) in entries {
            let score = name_similarity(key, name);
            if score >= self.fuzzy_threshold && best.map_or(true, |(s, _)| score > s) {
                best = Some((score, entry));
            }
        }
        best.map(|(_, entry)| entry)
    }
}
