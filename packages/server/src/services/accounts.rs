use std::collections::HashMap;

use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use uuid::Uuid;

use crate::entity::{download_log, file, user};
use crate::models::shared::escape_like;
use crate::services::Page;

/// A user row with activity counters for the admin directory.
#[derive(Debug, Clone)]
pub struct AccountUsage {
    pub user: user::Model,
    pub file_count: u64,
    /// Downloads of files this user owns, by anyone.
    pub download_count: u64,
}

/// Case-insensitive substring match on the email, wildcards taken literally.
pub fn email_search_condition(search: &str) -> Option<Condition> {
    let term = escape_like(search.trim());
    if term.is_empty() {
        return None;
    }
    Some(
        Condition::all().add(
            Expr::expr(Func::lower(Expr::col((user::Entity, user::Column::Email))))
                .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
        ),
    )
}

fn into_count_map(rows: Vec<(Uuid, i64)>) -> HashMap<Uuid, u64> {
    rows.into_iter()
        .map(|(id, n)| (id, u64::try_from(n).unwrap_or(0)))
        .collect()
}

async fn file_counts<C: ConnectionTrait>(
    conn: &C,
    user_ids: &[Uuid],
) -> Result<HashMap<Uuid, u64>, DbErr> {
    let rows = file::Entity::find()
        .select_only()
        .column(file::Column::UserId)
        .column_as(Expr::cust("COUNT(*)::BIGINT"), "files")
        .filter(file::Column::UserId.is_in(user_ids.iter().copied()))
        .group_by(file::Column::UserId)
        .into_tuple::<(Uuid, i64)>()
        .all(conn)
        .await?;
    Ok(into_count_map(rows))
}

async fn download_counts<C: ConnectionTrait>(
    conn: &C,
    user_ids: &[Uuid],
) -> Result<HashMap<Uuid, u64>, DbErr> {
    let rows = download_log::Entity::find()
        .select_only()
        .column(file::Column::UserId)
        .column_as(Expr::cust("COUNT(*)::BIGINT"), "downloads")
        .inner_join(file::Entity)
        .filter(file::Column::UserId.is_in(user_ids.iter().copied()))
        .group_by(file::Column::UserId)
        .into_tuple::<(Uuid, i64)>()
        .all(conn)
        .await?;
    Ok(into_count_map(rows))
}

/// Users with their file and download counts, newest accounts first.
pub async fn list_accounts<C: ConnectionTrait>(
    conn: &C,
    search: Option<&str>,
    page: u64,
    page_size: u64,
) -> Result<Page<AccountUsage>, DbErr> {
    let mut select = user::Entity::find();
    if let Some(cond) = search.and_then(email_search_condition) {
        select = select.filter(cond);
    }

    let total = select.clone().count(conn).await?;

    let users = select
        .order_by_desc(user::Column::CreatedAt)
        .order_by_desc(user::Column::Id)
        .offset(Some((page - 1) * page_size))
        .limit(Some(page_size))
        .all(conn)
        .await?;

    if users.is_empty() {
        return Ok(Page {
            items: Vec::new(),
            total,
        });
    }

    let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
    let files = file_counts(conn, &ids).await?;
    let downloads = download_counts(conn, &ids).await?;

    let items = users
        .into_iter()
        .map(|user| AccountUsage {
            file_count: files.get(&user.id).copied().unwrap_or(0),
            download_count: downloads.get(&user.id).copied().unwrap_or(0),
            user,
        })
        .collect();

    Ok(Page { items, total })
}
