use crate::request::TableNamePage;

use super::{BackingStore, Result};

/// Page size used when a listing request does not give one.
pub const DEFAULT_LIST_TABLES_LIMIT: usize = 100;

/// Lists the backing store's tables, keeping only those accepted by `owned`.
///
/// Backing pages are read until `limit` owned names are collected or the
/// backing store runs out. When more names may remain, the result is cut to
/// `limit` and the last returned name becomes the continuation token.
pub async fn list_owned_tables<S, F>(
    store: &S,
    exclusive_start_table_name: Option<&str>,
    limit: usize,
    owned: F,
) -> Result<TableNamePage>
where
    S: BackingStore + ?Sized,
    F: Fn(&str) -> bool + Send + Sync,
{
    let limit = if limit == 0 {
        DEFAULT_LIST_TABLES_LIMIT
    } else {
        limit
    };

    let mut table_names = Vec::new();
    let mut token = exclusive_start_table_name.map(str::to_string);
    loop {
        let page = store.list_tables(token.as_deref(), limit).await?;
        table_names.extend(page.table_names.into_iter().filter(|name| owned(name)));
        token = page.last_evaluated_table_name;
        if table_names.len() >= limit || token.is_none() {
            break;
        }
    }

    if table_names.len() > limit || token.is_some() {
        table_names.truncate(limit);
        let last_evaluated_table_name = table_names.last().cloned();
        return Ok(TableNamePage {
            table_names,
            last_evaluated_table_name,
        });
    }

    Ok(TableNamePage {
        table_names,
        last_evaluated_table_name: None,
    })
}
