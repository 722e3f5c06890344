#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use chrono::Utc;
use itertools::Itertools;
use sqlx::{Acquire, PgConnection};
use uuid::Uuid;

use super::mappers::{count_to_u64, group_links, parse_person};
use super::partner_ops::search_term;
use super::types::{PersonLinkRow, PersonRow, PERSON_COLUMNS};
use crate::db::CrmDb;
use crate::error::{CrmError, Result};
use crate::types::{NewPerson, Page, PeopleQuery, Person, PersonPatch};

const PEOPLE_FILTER: &str = "WHERE ($1::text IS NULL
            OR name ILIKE $1
            OR role ILIKE $1
            OR COALESCE(email, '') ILIKE $1)";

#[derive(Clone, Copy)]
enum LinkTable {
    Partners,
    Features,
}

impl LinkTable {
    const fn entity(self) -> &'static str {
        match self {
            Self::Partners => "Partner",
            Self::Features => "Feature",
        }
    }

    const fn target(self) -> &'static str {
        match self {
            Self::Partners => "partners",
            Self::Features => "features",
        }
    }

    const fn link_table(self) -> &'static str {
        match self {
            Self::Partners => "person_partners",
            Self::Features => "person_features",
        }
    }

    const fn link_column(self) -> &'static str {
        match self {
            Self::Partners => "partner_id",
            Self::Features => "feature_id",
        }
    }
}

async fn ensure_targets_exist(
    conn: &mut PgConnection,
    table: LinkTable,
    ids: &[Uuid],
) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let found = sqlx::query_scalar::<_, Uuid>(&format!(
        "SELECT id FROM {} WHERE id = ANY($1)",
        table.target()
    ))
    .bind(ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| CrmError::DatabaseError(format!("Failed to check {} links: {e}", table.target())))?;

    ids.iter()
        .find(|id| !found.contains(id))
        .map_or(Ok(()), |missing| Err(CrmError::not_found(table.entity(), missing)))
}

async fn replace_links(
    conn: &mut PgConnection,
    table: LinkTable,
    person_id: Uuid,
    ids: &[Uuid],
) -> Result<()> {
    ensure_targets_exist(&mut *conn, table, ids).await?;

    sqlx::query(&format!(
        "DELETE FROM {} WHERE person_id = $1",
        table.link_table()
    ))
    .bind(person_id)
    .execute(&mut *conn)
    .await
    .map_err(|e| CrmError::DatabaseError(format!("Failed to clear person links: {e}")))?;

    let unique = ids.iter().copied().unique().collect::<Vec<_>>();
    if unique.is_empty() {
        return Ok(());
    }
    sqlx::query(&format!(
        "INSERT INTO {} (person_id, {}) SELECT $1, UNNEST($2::uuid[])",
        table.link_table(),
        table.link_column()
    ))
    .bind(person_id)
    .bind(&unique)
    .execute(&mut *conn)
    .await
    .map(|_| ())
    .map_err(|e| CrmError::DatabaseError(format!("Failed to write person links: {e}")))
}

async fn load_links(
    conn: &mut PgConnection,
    table: LinkTable,
    person_ids: &[Uuid],
) -> Result<Vec<PersonLinkRow>> {
    sqlx::query_as::<_, PersonLinkRow>(&format!(
        "SELECT l.person_id, t.id, t.name
         FROM {} l
         JOIN {} t ON t.id = l.{}
         WHERE l.person_id = ANY($1)
         ORDER BY t.name",
        table.link_table(),
        table.target(),
        table.link_column()
    ))
    .bind(person_ids)
    .fetch_all(conn)
    .await
    .map_err(|e| CrmError::DatabaseError(format!("Failed to load person links: {e}")))
}

async fn hydrate(conn: &mut PgConnection, rows: Vec<PersonRow>) -> Result<Vec<Person>> {
    let ids = rows.iter().map(|row| row.id).collect::<Vec<_>>();
    let mut partners = group_links(load_links(&mut *conn, LinkTable::Partners, &ids).await?);
    let mut features = group_links(load_links(&mut *conn, LinkTable::Features, &ids).await?);
    Ok(rows
        .into_iter()
        .map(|row| parse_person(row, &mut partners, &mut features))
        .collect())
}

async fn fetch_person_on(conn: &mut PgConnection, id: Uuid) -> Result<Option<Person>> {
    let row = sqlx::query_as::<_, PersonRow>(&format!(
        "SELECT {PERSON_COLUMNS} FROM people WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| CrmError::DatabaseError(format!("Failed to load person {id}: {e}")))?;

    match row {
        Some(row) => Ok(hydrate(conn, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

impl CrmDb {
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn fetch_people_page(&self, query: &PeopleQuery) -> Result<Page<Person>> {
        let search = search_term(query.search.as_deref());
        let mut conn = self
            .pool()
            .acquire()
            .await
            .map_err(|e| CrmError::DatabaseError(format!("Failed to acquire conn: {e}")))?;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM people {PEOPLE_FILTER}"
        ))
        .bind(search.as_deref())
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| CrmError::DatabaseError(format!("Failed to count people: {e}")))?;

        let rows = sqlx::query_as::<_, PersonRow>(&format!(
            "SELECT {PERSON_COLUMNS} FROM people {PEOPLE_FILTER}
             ORDER BY updated_at DESC, id
             LIMIT $2 OFFSET $3"
        ))
        .bind(search.as_deref())
        .bind(i64::from(query.page.limit()))
        .bind(i64::try_from(query.page.offset()).unwrap_or(i64::MAX))
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| CrmError::DatabaseError(format!("Failed to list people: {e}")))?;

        let people = hydrate(&mut conn, rows).await?;
        Ok(Page::new(people, count_to_u64(total), query.page))
    }

    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn fetch_person(&self, id: Uuid) -> Result<Option<Person>> {
        let mut conn = self
            .pool()
            .acquire()
            .await
            .map_err(|e| CrmError::DatabaseError(format!("Failed to acquire conn: {e}")))?;
        fetch_person_on(&mut conn, id).await
    }

    /// # Errors
    /// `CrmError::NotFound` when a linked partner or feature does not exist.
    pub async fn insert_person(&self, person: NewPerson) -> Result<Person> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| CrmError::DatabaseError(format!("Failed to begin tx: {e}")))?;
        let conn = tx
            .acquire()
            .await
            .map_err(|e| CrmError::DatabaseError(format!("Failed to acquire tx conn: {e}")))?;

        let id = Uuid::new_v4();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO people (id, name, email, phone, role, notes, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7)",
        )
        .bind(id)
        .bind(&person.name)
        .bind(&person.email)
        .bind(&person.phone)
        .bind(&person.role)
        .bind(&person.notes)
        .bind(now)
        .execute(&mut *conn)
        .await
        .map_err(|e| CrmError::DatabaseError(format!("Failed to create person: {e}")))?;

        replace_links(&mut *conn, LinkTable::Partners, id, &person.partner_ids).await?;
        replace_links(&mut *conn, LinkTable::Features, id, &person.feature_ids).await?;

        let created = fetch_person_on(&mut *conn, id)
            .await?
            .ok_or_else(|| CrmError::Internal(format!("Person {id} vanished after insert")))?;

        tx.commit()
            .await
            .map_err(|e| CrmError::DatabaseError(format!("Failed to commit tx: {e}")))?;
        Ok(created)
    }

    /// # Errors
    /// `CrmError::NotFound` for an unknown person or linked record.
    pub async fn update_person_row(&self, id: Uuid, patch: PersonPatch) -> Result<Person> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| CrmError::DatabaseError(format!("Failed to begin tx: {e}")))?;
        let conn = tx
            .acquire()
            .await
            .map_err(|e| CrmError::DatabaseError(format!("Failed to acquire tx conn: {e}")))?;

        let updated = sqlx::query(
            "UPDATE people
             SET name = COALESCE($2, name),
                 email = COALESCE($3, email),
                 phone = COALESCE($4, phone),
                 role = COALESCE($5, role),
                 notes = COALESCE($6, notes),
                 updated_at = $7
             WHERE id = $1",
        )
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.email)
        .bind(&patch.phone)
        .bind(&patch.role)
        .bind(&patch.notes)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await
        .map_err(|e| CrmError::DatabaseError(format!("Failed to update person {id}: {e}")))?;

        if updated.rows_affected() == 0 {
            return Err(CrmError::not_found("Person", id));
        }

        if let Some(partner_ids) = &patch.partner_ids {
            replace_links(&mut *conn, LinkTable::Partners, id, partner_ids).await?;
        }
        if let Some(feature_ids) = &patch.feature_ids {
            replace_links(&mut *conn, LinkTable::Features, id, feature_ids).await?;
        }

        let person = fetch_person_on(&mut *conn, id)
            .await?
            .ok_or_else(|| CrmError::not_found("Person", id))?;

        tx.commit()
            .await
            .map_err(|e| CrmError::DatabaseError(format!("Failed to commit tx: {e}")))?;
        Ok(person)
    }

    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn delete_person_row(&self, id: Uuid) -> Result<bool> {
        sqlx::query("DELETE FROM people WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map(|result| result.rows_affected() > 0)
            .map_err(|e| CrmError::DatabaseError(format!("Failed to delete person {id}: {e}")))
    }
}
