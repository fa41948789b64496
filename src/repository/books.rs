//! Books repository for database operations
//!
//! Owns the copy-count invariant: reserve/release run as atomic
//! compare-and-updates so concurrent approvals serialize on the book row.

use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookAvailability, BookQuery, CreateBook, UpdateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Search books with filters and pagination
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let include_inactive = query.include_inactive.unwrap_or(false);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM books
            WHERE ($1::text IS NULL OR title ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR author ILIKE '%' || $2 || '%')
              AND ($3::text IS NULL OR category ILIKE '%' || $3 || '%')
              AND ($4::text IS NULL OR isbn = $4)
              AND ($5 OR is_active)
            "#,
        )
        .bind(&query.title)
        .bind(&query.author)
        .bind(&query.category)
        .bind(&query.isbn)
        .bind(include_inactive)
        .fetch_one(&self.pool)
        .await?;

        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books
            WHERE ($1::text IS NULL OR title ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR author ILIKE '%' || $2 || '%')
              AND ($3::text IS NULL OR category ILIKE '%' || $3 || '%')
              AND ($4::text IS NULL OR isbn = $4)
              AND ($5 OR is_active)
            ORDER BY title, id
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(&query.title)
        .bind(&query.author)
        .bind(&query.category)
        .bind(&query.isbn)
        .bind(include_inactive)
        .bind(per_page)
        .bind((page - 1) * per_page)
        .fetch_all(&self.pool)
        .await?;

        Ok((books, total))
    }

    /// Create a new book; all copies start available
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let duplicate: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1)")
            .bind(&book.isbn)
            .fetch_one(&self.pool)
            .await?;
        if duplicate {
            return Err(AppError::Conflict(format!(
                "A book with ISBN {} already exists",
                book.isbn
            )));
        }

        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, isbn, category, publisher, publish_year,
                               description, location, total_copies, available_copies, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9, TRUE)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.category)
        .bind(&book.publisher)
        .bind(book.publish_year)
        .bind(&book.description)
        .bind(&book.location)
        .bind(book.total_copies)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Update bibliographic fields; a total_copies change goes through
    /// [`BooksRepository::change_total_copies`] in the same call.
    pub async fn update(&self, id: i32, update: &UpdateBook) -> AppResult<Book> {
        if let Some(new_total) = update.total_copies {
            self.change_total_copies(id, new_total).await?;
        }

        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                title = COALESCE($2, title),
                author = COALESCE($3, author),
                isbn = COALESCE($4, isbn),
                category = COALESCE($5, category),
                publisher = COALESCE($6, publisher),
                publish_year = COALESCE($7, publish_year),
                description = COALESCE($8, description),
                location = COALESCE($9, location),
                is_active = COALESCE($10, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.author)
        .bind(&update.isbn)
        .bind(&update.category)
        .bind(&update.publisher)
        .bind(update.publish_year)
        .bind(&update.description)
        .bind(&update.location)
        .bind(update.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        Ok(updated)
    }

    /// Soft-delete: deactivate the book. Ledger history stays intact.
    pub async fn deactivate(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("UPDATE books SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    /// Availability snapshot for a book
    pub async fn availability(&self, id: i32) -> AppResult<BookAvailability> {
        let book = self.get_by_id(id).await?;
        Ok(BookAvailability {
            book_id: book.id,
            available_copies: book.available_copies,
            total_copies: book.total_copies,
        })
    }

    /// Adjust the total copy count, shifting availability by the same delta.
    /// A reduction below the currently-available count clamps at 0; the
    /// remainder is owed as issued copies come back.
    pub async fn change_total_copies(&self, id: i32, new_total: i32) -> AppResult<Book> {
        if new_total < 0 {
            return Err(AppError::Validation("Total copies must be non-negative".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let row: Option<(i32, i32)> = sqlx::query_as(
            "SELECT total_copies, available_copies FROM books WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let (old_total, available) = row
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        let (new_available, deficit) = Book::apply_total_change(available, old_total, new_total);
        if deficit > 0 {
            tracing::warn!(
                book_id = id,
                deficit,
                "total copies reduced below outstanding loans; availability clamped to 0"
            );
        }

        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET total_copies = $2, available_copies = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(new_total)
        .bind(new_available)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Reserve one copy inside an approval transaction. The single UPDATE
    /// with its availability guard is the linearization point: of two
    /// concurrent approvals against one remaining copy, exactly one matches.
    pub async fn reserve_copy(tx: &mut Transaction<'_, Postgres>, book_id: i32) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE books SET available_copies = available_copies - 1, updated_at = NOW()
            WHERE id = $1 AND available_copies > 0 AND is_active
            "#,
        )
        .bind(book_id)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        // Distinguish the failure: unknown, deactivated, or out of stock
        let row: Option<(bool,)> = sqlx::query_as("SELECT is_active FROM books WHERE id = $1")
            .bind(book_id)
            .fetch_optional(&mut **tx)
            .await?;

        match row {
            None => Err(AppError::NotFound(format!("Book with id {} not found", book_id))),
            Some((false,)) => Err(AppError::PolicyViolation(format!(
                "Book {} is not active",
                book_id
            ))),
            Some((true,)) => Err(AppError::OutOfStock(format!(
                "No available copies of book {}",
                book_id
            ))),
        }
    }

    /// Release one copy inside a return transaction, capped at total_copies.
    /// Hitting the cap means the ledger and catalog disagree; surface it
    /// instead of correcting it.
    pub async fn release_copy(tx: &mut Transaction<'_, Postgres>, book_id: i32) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE books SET available_copies = available_copies + 1, updated_at = NOW()
            WHERE id = $1 AND available_copies < total_copies
            "#,
        )
        .bind(book_id)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(book_id)
            .fetch_one(&mut **tx)
            .await?;

        if exists {
            Err(AppError::InvariantViolation(format!(
                "releasing a copy of book {} would exceed total_copies",
                book_id
            )))
        } else {
            Err(AppError::NotFound(format!("Book with id {} not found", book_id)))
        }
    }
}
