use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use uuid::Uuid;

use crate::entity::{file, user};
use crate::models::shared::escape_like;
use crate::services::Page;

/// Fields of a new file reference. `size` is copied from the content row.
#[derive(Debug, Clone)]
pub struct NewFileReference {
    pub user_id: Uuid,
    pub file_content_id: Uuid,
    pub name: String,
    pub mime_type: String,
    pub is_public: bool,
    pub size: i64,
}

/// Filters for listing a user's files. Empty strings are ignored.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    pub search: Option<String>,
    pub mime_type: Option<String>,
    pub is_public: Option<bool>,
}

/// Case-insensitive substring match on the file name, with LIKE wildcards
/// in `search` taken literally. `None` for a blank search term.
pub fn name_search_condition(search: &str) -> Option<Condition> {
    let term = escape_like(search.trim());
    if term.is_empty() {
        return None;
    }
    Some(
        Condition::all().add(
            Expr::expr(Func::lower(Expr::col((file::Entity, file::Column::Name))))
                .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
        ),
    )
}

/// Whether `viewer` may read `file`: its owner, or anyone for public files.
pub fn can_read(file: &file::Model, viewer: Uuid) -> bool {
    is_readable(file.user_id, file.is_public, viewer)
}

fn is_readable(owner: Uuid, is_public: bool, viewer: Uuid) -> bool {
    owner == viewer || is_public
}

/// Per-user file metadata over the `files` table.
pub struct FileCatalog<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> FileCatalog<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn create_reference(&self, new: NewFileReference) -> Result<file::Model, DbErr> {
        let now = Utc::now();
        file::ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(new.user_id),
            file_content_id: Set(new.file_content_id),
            name: Set(new.name),
            mime_type: Set(new.mime_type),
            is_public: Set(new.is_public),
            size: Set(new.size),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.conn)
        .await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<file::Model>, DbErr> {
        file::Entity::find_by_id(id).one(self.conn).await
    }

    /// Files owned by `user_id`, newest first.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        filter: &FileFilter,
        page: u64,
        page_size: u64,
    ) -> Result<Page<file::Model>, DbErr> {
        let mut select = file::Entity::find().filter(file::Column::UserId.eq(user_id));

        if let Some(search) = filter.search.as_deref()
            && let Some(cond) = name_search_condition(search)
        {
            select = select.filter(cond);
        }
        if let Some(mime) = filter.mime_type.as_deref().map(str::trim)
            && !mime.is_empty()
        {
            select = select.filter(file::Column::MimeType.eq(mime));
        }
        if let Some(is_public) = filter.is_public {
            select = select.filter(file::Column::IsPublic.eq(is_public));
        }

        let total = select.clone().paginate(self.conn, page_size).num_items().await?;

        let items = select
            .order_by_desc(file::Column::CreatedAt)
            .order_by_desc(file::Column::Id)
            .offset(Some((page - 1) * page_size))
            .limit(Some(page_size))
            .all(self.conn)
            .await?;

        Ok(Page { items, total })
    }

    /// Every user's files with their owners, newest first.
    pub async fn list_all(
        &self,
        search: Option<&str>,
        page: u64,
        page_size: u64,
    ) -> Result<Page<(file::Model, Option<user::Model>)>, DbErr> {
        let mut select = file::Entity::find();
        if let Some(cond) = search.and_then(name_search_condition) {
            select = select.filter(cond);
        }

        let total = select.clone().count(self.conn).await?;

        let items = select
            .find_also_related(user::Entity)
            .order_by_desc(file::Column::CreatedAt)
            .order_by_desc(file::Column::Id)
            .offset(Some((page - 1) * page_size))
            .limit(Some(page_size))
            .all(self.conn)
            .await?;

        Ok(Page { items, total })
    }

    /// Delete a reference owned by `user_id`. Returns `false` when no such
    /// row exists for that owner. The content row is left untouched.
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool, DbErr> {
        let result = file::Entity::delete_many()
            .filter(file::Column::Id.eq(id))
            .filter(file::Column::UserId.eq(user_id))
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
