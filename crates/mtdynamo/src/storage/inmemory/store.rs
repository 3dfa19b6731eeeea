//! In-memory backing store.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use mtdynamo_core::attribute::{ComparisonOperator, Condition, Item};
use mtdynamo_core::request::{
    AttributeUpdate, ItemPage, QueryRequest, ScanRequest, TableNamePage, UpdateAction,
};
use mtdynamo_core::schema::{PrimaryKey, TableDescription};
use mtdynamo_core::store::{BackingStore, Result, StoreError, DEFAULT_LIST_TABLES_LIMIT};

#[derive(Debug, Clone)]
struct MemTable {
    description: TableDescription,
    items: Vec<Item>,
}

impl MemTable {
    fn position(&self, key: &Item) -> Option<usize> {
        self.items
            .iter()
            .position(|item| key_matches(&self.description.primary_key, item, key))
    }
}

/// In-memory backing store for testing.
///
/// Tables live in a `BTreeMap` behind `Arc<RwLock<_>>`, so listings come back
/// in name order and clones share data. Items are kept in insertion order;
/// queries sort by the range key of the table or index they read.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<BTreeMap<String, MemTable>>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items in a table, for tests and diagnostics.
    pub async fn item_count(&self, table_name: &str) -> Result<usize> {
        let tables = self.tables.read().await;
        Ok(table(&tables, table_name)?.items.len())
    }

    /// Raw copy of a table's items, in insertion order.
    pub async fn items(&self, table_name: &str) -> Result<Vec<Item>> {
        let tables = self.tables.read().await;
        Ok(table(&tables, table_name)?.items.clone())
    }
}

fn table<'a>(tables: &'a BTreeMap<String, MemTable>, name: &str) -> Result<&'a MemTable> {
    tables
        .get(name)
        .ok_or_else(|| StoreError::TableNotFound(name.to_string()))
}

fn table_mut<'a>(
    tables: &'a mut BTreeMap<String, MemTable>,
    name: &str,
) -> Result<&'a mut MemTable> {
    tables
        .get_mut(name)
        .ok_or_else(|| StoreError::TableNotFound(name.to_string()))
}

fn key_names(key: &PrimaryKey) -> impl Iterator<Item = &str> {
    std::iter::once(key.hash_key.as_str()).chain(key.range_key_name())
}

/// Checks that `item` carries every key attribute with its declared type.
fn validate_key(key: &PrimaryKey, item: &Item) -> Result<()> {
    let expected = std::iter::once((key.hash_key.as_str(), key.hash_key_type))
        .chain(key.range_key.iter().map(|rk| (rk.name.as_str(), rk.key_type)));
    for (name, key_type) in expected {
        match item.get(name) {
            None => {
                return Err(StoreError::InvalidRequest(format!(
                    "missing key attribute {name}"
                )))
            }
            Some(value) if value.type_code() != key_type.code() => {
                return Err(StoreError::InvalidRequest(format!(
                    "key attribute {name} must be of type {key_type}, found {}",
                    value.type_code()
                )))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn key_matches(key: &PrimaryKey, item: &Item, lookup: &Item) -> bool {
    key_names(key).all(|name| item.get(name).is_some() && item.get(name) == lookup.get(name))
}

fn extract_key<'a>(keys: impl Iterator<Item = &'a str>, item: &Item) -> Item {
    keys.filter_map(|name| item.get(name).map(|v| (name.to_string(), v.clone())))
        .collect()
}

fn compare_range(range_key: Option<&str>, a: &Item, b: &Item) -> Ordering {
    let Some(name) = range_key else {
        return Ordering::Equal;
    };
    match (a.get(name), b.get(name)) {
        (Some(x), Some(y)) => x.compare(y).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

fn all_match(conditions: &[Condition], item: &Item) -> bool {
    conditions.iter().all(|condition| condition.matches(item))
}

/// Applies exclusive start and limit to already ordered candidates.
fn paginate(
    candidates: Vec<&Item>,
    description: &TableDescription,
    index_key: Option<&PrimaryKey>,
    exclusive_start_key: Option<&Item>,
    limit: Option<usize>,
    filter: &[Condition],
) -> ItemPage {
    let table_key = &description.primary_key;
    let start = match exclusive_start_key {
        Some(start) => candidates
            .iter()
            .position(|item| key_matches(table_key, item, start))
            .map_or(0, |p| p + 1),
        None => 0,
    };

    let remaining = &candidates[start.min(candidates.len())..];
    let evaluated = limit.map_or(remaining.len(), |l| l.min(remaining.len()));
    let items = remaining[..evaluated]
        .iter()
        .filter(|item| all_match(filter, item))
        .map(|item| (*item).clone())
        .collect();

    let last_evaluated_key = if evaluated < remaining.len() && evaluated > 0 {
        let last = remaining[evaluated - 1];
        let keys = key_names(table_key).chain(index_key.into_iter().flat_map(key_names));
        Some(extract_key(keys, last))
    } else {
        None
    };

    ItemPage {
        items,
        last_evaluated_key,
    }
}

#[async_trait]
impl BackingStore for InMemoryStore {
    async fn create_table(&self, description: &TableDescription) -> Result<TableDescription> {
        let mut tables = self.tables.write().await;
        if tables.contains_key(&description.name) {
            return Err(StoreError::TableAlreadyExists(description.name.clone()));
        }
        tables.insert(
            description.name.clone(),
            MemTable {
                description: description.clone(),
                items: Vec::new(),
            },
        );
        Ok(description.clone())
    }

    async fn delete_table(&self, table_name: &str) -> Result<TableDescription> {
        self.tables
            .write()
            .await
            .remove(table_name)
            .map(|table| table.description)
            .ok_or_else(|| StoreError::TableNotFound(table_name.to_string()))
    }

    async fn describe_table(&self, table_name: &str) -> Result<TableDescription> {
        let tables = self.tables.read().await;
        Ok(table(&tables, table_name)?.description.clone())
    }

    async fn list_tables(
        &self,
        exclusive_start_table_name: Option<&str>,
        limit: usize,
    ) -> Result<TableNamePage> {
        let limit = if limit == 0 {
            DEFAULT_LIST_TABLES_LIMIT
        } else {
            limit
        };
        let tables = self.tables.read().await;
        let mut names = tables
            .keys()
            .filter(|name| exclusive_start_table_name.is_none_or(|start| name.as_str() > start));
        let table_names: Vec<String> = names.by_ref().take(limit).cloned().collect();
        let last_evaluated_table_name = if names.next().is_some() {
            table_names.last().cloned()
        } else {
            None
        };
        Ok(TableNamePage {
            table_names,
            last_evaluated_table_name,
        })
    }

    async fn get_item(&self, table_name: &str, key: &Item) -> Result<Option<Item>> {
        let tables = self.tables.read().await;
        let table = table(&tables, table_name)?;
        validate_key(&table.description.primary_key, key)?;
        Ok(table.position(key).map(|p| table.items[p].clone()))
    }

    async fn put_item(&self, table_name: &str, item: &Item) -> Result<()> {
        let mut tables = self.tables.write().await;
        let table = table_mut(&mut tables, table_name)?;
        validate_key(&table.description.primary_key, item)?;
        match table.position(item) {
            Some(p) => table.items[p] = item.clone(),
            None => table.items.push(item.clone()),
        }
        Ok(())
    }

    async fn update_item(
        &self,
        table_name: &str,
        key: &Item,
        updates: &[AttributeUpdate],
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        let table = table_mut(&mut tables, table_name)?;
        let primary_key = &table.description.primary_key;
        validate_key(primary_key, key)?;
        if let Some(update) = updates
            .iter()
            .find(|update| key_names(primary_key).any(|name| name == update.attribute))
        {
            return Err(StoreError::InvalidRequest(format!(
                "key attribute {} cannot be updated",
                update.attribute
            )));
        }

        let position = match table.position(key) {
            Some(p) => p,
            None => {
                table
                    .items
                    .push(extract_key(key_names(primary_key), key));
                table.items.len() - 1
            }
        };
        let item = &mut table.items[position];
        for update in updates {
            match &update.action {
                UpdateAction::Put(value) => {
                    item.insert(update.attribute.clone(), value.clone());
                }
                UpdateAction::Delete => {
                    item.remove(&update.attribute);
                }
            }
        }
        Ok(())
    }

    async fn delete_item(&self, table_name: &str, key: &Item) -> Result<()> {
        let mut tables = self.tables.write().await;
        let table = table_mut(&mut tables, table_name)?;
        validate_key(&table.description.primary_key, key)?;
        if let Some(p) = table.position(key) {
            table.items.remove(p);
        }
        Ok(())
    }

    async fn query(&self, request: &QueryRequest) -> Result<ItemPage> {
        let tables = self.tables.read().await;
        let table = table(&tables, &request.table_name)?;
        let description = &table.description;
        let index_key = match &request.index_name {
            Some(index_name) => Some(
                description
                    .secondary_index(index_name)
                    .ok_or_else(|| {
                        StoreError::InvalidRequest(format!(
                            "index {index_name} not found on table {}",
                            description.name
                        ))
                    })?
                    .declared_primary_key(),
            ),
            None => None,
        };
        let key = index_key.unwrap_or(&description.primary_key);

        if !request.key_conditions.iter().any(|condition| {
            condition.attribute == key.hash_key
                && condition.operator == ComparisonOperator::Eq
        }) {
            return Err(StoreError::InvalidRequest(format!(
                "query requires an EQ condition on hash key {}",
                key.hash_key
            )));
        }

        let mut candidates: Vec<&Item> = table
            .items
            .iter()
            .filter(|item| key_names(key).all(|name| item.contains_key(name)))
            .filter(|item| all_match(&request.key_conditions, item))
            .collect();
        candidates.sort_by(|a, b| compare_range(key.range_key_name(), a, b));

        Ok(paginate(
            candidates,
            description,
            index_key,
            request.exclusive_start_key.as_ref(),
            request.limit,
            &request.filter,
        ))
    }

    async fn scan(&self, request: &ScanRequest) -> Result<ItemPage> {
        let tables = self.tables.read().await;
        let table = table(&tables, &request.table_name)?;
        let description = &table.description;
        let index_key = match &request.index_name {
            Some(index_name) => Some(
                description
                    .secondary_index(index_name)
                    .ok_or_else(|| {
                        StoreError::InvalidRequest(format!(
                            "index {index_name} not found on table {}",
                            description.name
                        ))
                    })?
                    .declared_primary_key(),
            ),
            None => None,
        };

        let candidates: Vec<&Item> = table
            .items
            .iter()
            .filter(|item| {
                index_key.is_none_or(|key| key_names(key).all(|name| item.contains_key(name)))
            })
            .collect();

        Ok(paginate(
            candidates,
            description,
            index_key,
            request.exclusive_start_key.as_ref(),
            request.limit,
            &request.filter,
        ))
    }
}
