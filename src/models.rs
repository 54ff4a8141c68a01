use serde::{Deserialize, Serialize};

/// A single contribution as it sits in a category's slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub amount: f64,
}

impl Entry {
    pub fn new(name: impl Into<String>, amount: f64) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }
}

/// Entries grouped by category label, in input order.
pub type Batch = Vec<(String, Vec<Entry>)>;

/// Count and subtotal for one category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub count: usize,
    pub total: f64,
}

impl CategoryTotal {
    pub fn add(&mut self, amount: f64) {
        self.count += 1;
        self.total += amount;
    }
}
