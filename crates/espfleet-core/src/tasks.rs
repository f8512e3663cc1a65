// ── Supported task types ──
//
// Flattens the task types every installed driver declares into one
// sorted list of `"<plugin> - <name>"` labels. Drivers are fixed after
// startup, so the list is built on first access and kept.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use tracing::debug;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::model::{AppManifest, DriverDescriptor, SYSTEM_INFO_NAME, SYSTEM_INFO_PLUGIN, TaskType};

/// Source of installed drivers, keyed by driver id.
pub trait DriverSource: Send + Sync {
    fn drivers(&self) -> BTreeMap<String, DriverDescriptor>;
}

impl DriverSource for AppManifest {
    fn drivers(&self) -> BTreeMap<String, DriverDescriptor> {
        self.drivers_by_id()
    }
}

/// Label of the built-in system info task, always listed first.
pub fn system_info_label() -> String {
    TaskType {
        plugin: SYSTEM_INFO_PLUGIN,
        name: SYSTEM_INFO_NAME.into(),
    }
    .label()
}

/// Lazily built, process-lifetime list of supported task types.
pub struct TaskTypeCatalog {
    source: Arc<dyn DriverSource>,
    supported: OnceLock<Vec<String>>,
}

impl TaskTypeCatalog {
    pub fn new(source: Arc<dyn DriverSource>) -> Self {
        Self {
            source,
            supported: OnceLock::new(),
        }
    }

    /// Supported task labels; drivers are enumerated on the first call only.
    pub fn supported_tasks(&self) -> &[String] {
        self.supported.get_or_init(|| {
            let tasks = build_supported_tasks(&self.source.drivers());
            debug!(count = tasks.len(), "supported task types enumerated");
            tasks
        })
    }
}

/// Flatten, sort and deduplicate driver task types, then put the
/// system info entry in front.
pub fn build_supported_tasks(drivers: &BTreeMap<String, DriverDescriptor>) -> Vec<String> {
    let system_info = system_info_label();

    let mut labels: Vec<String> = drivers
        .values()
        .filter_map(|d| d.task_types.as_deref())
        .flatten()
        .map(TaskType::label)
        .filter(|label| *label != system_info)
        .collect();
    labels.sort_by(|a, b| natural_cmp(a, b));
    labels.dedup();

    labels.insert(0, system_info);
    labels
}

// ── Natural ordering ─────────────────────────────────────────────────

/// Non-alphanumeric characters in collation order; anything not listed
/// sorts after these by code point.
const PUNCTUATION: &str = "_-,;:!?.'\"()[]{}@*/\\&#%`^+<=>|~$";

/// Primary weight of one collation element. Variant order is the
/// script order: spaces, punctuation, symbols, numbers, letters.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Primary {
    Space,
    Punct(usize),
    Symbol(char),
    /// Digit run without leading zeros, keyed by length first so the
    /// comparison is by value.
    Number(usize, String),
    Letter(char),
}

#[derive(Debug)]
struct Element {
    primary: Primary,
    accents: Vec<char>,
    upper: bool,
}

/// Compare strings the way a person would: digit runs compare by numeric
/// value (`"9 - X"` < `"10 - Y"`), punctuation sorts before digits and
/// digits before letters. Accents and case only break ties, accents
/// first, unaccented and lowercase winning.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let left = collation_elements(a);
    let right = collation_elements(b);

    left.iter()
        .map(|e| &e.primary)
        .cmp(right.iter().map(|e| &e.primary))
        .then_with(|| {
            left.iter()
                .map(|e| &e.accents)
                .cmp(right.iter().map(|e| &e.accents))
        })
        .then_with(|| left.iter().map(|e| e.upper).cmp(right.iter().map(|e| e.upper)))
        .then_with(|| a.cmp(b))
}

fn collation_elements(s: &str) -> Vec<Element> {
    let mut chars = s.nfd().peekable();
    let mut elements: Vec<Element> = Vec::new();

    while let Some(c) = chars.next() {
        if is_combining_mark(c) {
            if let Some(last) = elements.last_mut() {
                last.accents.push(c);
            }
            continue;
        }
        let primary = if c.is_ascii_digit() {
            let mut digits = String::from(c);
            while let Some(d) = chars.next_if(char::is_ascii_digit) {
                digits.push(d);
            }
            let value = digits.trim_start_matches('0');
            Primary::Number(value.len(), value.to_owned())
        } else if c.is_whitespace() {
            Primary::Space
        } else if c.is_alphanumeric() {
            Primary::Letter(c.to_lowercase().next().unwrap_or(c))
        } else if let Some(rank) = PUNCTUATION.find(c) {
            Primary::Punct(rank)
        } else {
            Primary::Symbol(c)
        };
        elements.push(Element {
            primary,
            accents: Vec::new(),
            upper: c.is_uppercase(),
        });
    }
    elements
}
