use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

// Sheet layout shared by every period document.
pub const FIRST_DATA_ROW: u32 = 4;
pub const DATE_COL: u32 = 1;
pub const ACCOUNT_COL: u32 = 2;
pub const SERVICE_COL: u32 = 3;
pub const LABEL_COL: u32 = 4;
pub const NAME_COL: u32 = 5;
pub const AMOUNT_COL: u32 = 7;
/// Last row an xlsx worksheet can hold.
pub const MAX_SHEET_ROW: u32 = 1_048_576;

/// One row of a category table as written by hand, before the self-check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDef {
    pub name: String,
    pub start: u32,
    pub end: u32,
    pub slots: u32,
    pub account_code: u64,
    pub service_code: u32,
}

impl CategoryDef {
    fn new(name: &str, start: u32, end: u32, slots: u32, account_code: u64, service_code: u32) -> Self {
        Self {
            name: name.to_string(),
            start,
            end,
            slots,
            account_code,
            service_code,
        }
    }
}

/// A validated category. Only obtainable through [`Registry::new`], so the
/// slot count always equals the row span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    name: String,
    start_row: u32,
    end_row: u32,
    slots: u32,
    account_code: u64,
    service_code: u32,
}

impl Category {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_row(&self) -> u32 {
        self.start_row
    }

    pub fn end_row(&self) -> u32 {
        self.end_row
    }

    pub fn slots(&self) -> u32 {
        self.slots
    }

    pub fn account_code(&self) -> u64 {
        self.account_code
    }

    pub fn service_code(&self) -> u32 {
        self.service_code
    }

    pub fn rows(&self) -> std::ops::RangeInclusive<u32> {
        self.start_row..=self.end_row
    }
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    categories: Vec<CategoryDef>,
    #[serde(default)]
    aliases: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct Registry {
    categories: Vec<Category>,
    index: HashMap<String, usize>,
    aliases: Vec<(String, String)>,
}

/// Check a category table: slot arithmetic, row order, header rows, unique
/// names, no shared rows and no dangling aliases. Stops at the first problem.
pub fn validate_registry(defs: &[CategoryDef], aliases: &[(String, String)]) -> std::result::Result<(), RegistryError> {
    let mut names: HashSet<&str> = HashSet::new();
    let mut claimed: HashMap<u32, &str> = HashMap::new();

    for def in defs {
        if def.end < def.start {
            return Err(RegistryError::InvertedRange {
                category: def.name.clone(),
                start: def.start,
                end: def.end,
            });
        }
        if def.start < FIRST_DATA_ROW {
            return Err(RegistryError::HeaderOverlap {
                category: def.name.clone(),
                row: def.start,
                first: FIRST_DATA_ROW,
            });
        }
        if def.end > MAX_SHEET_ROW {
            return Err(RegistryError::RowLimit {
                category: def.name.clone(),
                row: def.end,
                limit: MAX_SHEET_ROW,
            });
        }
        // Bounded by the row limit above.
        let expected = def.end - def.start + 1;
        if def.slots != expected {
            return Err(RegistryError::SlotMismatch {
                category: def.name.clone(),
                declared: def.slots,
                start: def.start,
                end: def.end,
                expected,
            });
        }
        if !names.insert(def.name.as_str()) {
            return Err(RegistryError::DuplicateName(def.name.clone()));
        }
        for row in def.start..=def.end {
            if let Some(owner) = claimed.insert(row, def.name.as_str()) {
                return Err(RegistryError::RowCollision {
                    row,
                    first: owner.to_string(),
                    second: def.name.clone(),
                });
            }
        }
    }

    for (alias, target) in aliases {
        if !names.contains(target.as_str()) {
            return Err(RegistryError::DanglingAlias {
                alias: alias.clone(),
                target: target.clone(),
            });
        }
    }
    Ok(())
}

impl Registry {
    pub fn new(defs: Vec<CategoryDef>, aliases: Vec<(String, String)>) -> std::result::Result<Self, RegistryError> {
        validate_registry(&defs, &aliases)?;
        let categories: Vec<Category> = defs
            .into_iter()
            .map(|d| Category {
                slots: d.end - d.start + 1,
                name: d.name,
                start_row: d.start,
                end_row: d.end,
                account_code: d.account_code,
                service_code: d.service_code,
            })
            .collect();
        let index = categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        Ok(Self {
            categories,
            index,
            aliases,
        })
    }

    /// The built-in offering layout (rows 4-95 of the upload sample).
    pub fn standard() -> std::result::Result<Self, RegistryError> {
        Self::new(standard_categories(), standard_aliases())
    }

    /// Load a custom layout: `{"categories": [...], "aliases": {"label": "category"}}`.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: RegistryFile = serde_json::from_str(&content)?;
        let mut aliases = Vec::with_capacity(file.aliases.len());
        for (alias, target) in file.aliases {
            match target {
                serde_json::Value::String(t) => aliases.push((alias, t)),
                _ => return Err(RegistryError::AliasNotText(alias).into()),
            }
        }
        Ok(Self::new(file.categories, aliases)?)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.index.get(name).map(|&i| &self.categories[i])
    }

    pub fn aliases(&self) -> &[(String, String)] {
        &self.aliases
    }

    pub fn alias(&self, label: &str) -> Option<&str> {
        self.aliases
            .iter()
            .find(|(a, _)| a == label)
            .map(|(_, t)| t.as_str())
    }

    /// Every row covered by some category, ascending.
    pub fn data_rows(&self) -> BTreeSet<u32> {
        self.categories.iter().flat_map(|c| c.rows()).collect()
    }
}

fn standard_categories() -> Vec<CategoryDef> {
    vec![
        CategoryDef::new("tithe", 4, 26, 23, 10501000000, 1),
        CategoryDef::new("sunday", 27, 27, 1, 10502000000, 1),
        CategoryDef::new("thanksgiving", 28, 44, 17, 10503000000, 1),
        CategoryDef::new("birthday", 45, 48, 4, 10504000000, 1),
        CategoryDef::new("thousandfold", 49, 52, 4, 10505000000, 1),
        CategoryDef::new("children", 53, 53, 1, 10301000000, 1),
        CategoryDef::new("youth", 54, 54, 1, 10302000000, 1),
        CategoryDef::new("young_adult", 55, 55, 1, 10303000000, 1),
        CategoryDef::new("scholarship", 56, 61, 6, 10401000000, 1),
        CategoryDef::new("relief", 62, 68, 7, 10402000000, 1),
        CategoryDef::new("mission", 69, 87, 19, 242003, 1),
        CategoryDef::new("caleb_fellowship", 88, 88, 1, 242004, 1),
        CategoryDef::new("mens_fellowship", 89, 89, 1, 242005, 1),
        CategoryDef::new("anna_fellowship", 90, 90, 1, 242006, 1),
        CategoryDef::new("womens_fellowship", 91, 91, 1, 242007, 1),
        CategoryDef::new("cell", 92, 92, 1, 242008, 1),
        CategoryDef::new("shalom_fellowship", 93, 93, 1, 242009, 1),
        CategoryDef::new("interest", 94, 94, 1, 242202, 1),
        CategoryDef::new("other_income", 95, 95, 1, 10202000000, 1),
    ]
}

// Labels that show up on paper slips under other names.
fn standard_aliases() -> Vec<(String, String)> {
    [
        ("sandol", "shalom_fellowship"),
        ("sunday offering", "sunday"),
        ("sunday school offering", "youth"),
        ("tithes", "tithe"),
        ("thanks offering", "thanksgiving"),
        ("birthday thanks", "birthday"),
        ("scholarship offering", "scholarship"),
        ("relief offering", "relief"),
        ("monthly offering", "mission"),
        ("missions offering", "mission"),
        ("bank interest", "interest"),
    ]
    .iter()
    .map(|(a, t)| (a.to_string(), t.to_string()))
    .collect()
}
