use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::models::{BlogRow, CommentRow, NewBlog};
use crate::{Database, time_col, to_db_time};

const BLOG_SELECT: &str = "SELECT b.id, b.title, b.content, b.author_username, b.channel, b.images,
                                  (SELECT COUNT(*) FROM likes l WHERE l.blog_id = b.id),
                                  b.created_at
                           FROM blogs b";

impl Database {
    // -- Blogs --

    pub fn insert_blog(&self, blog: &NewBlog<'_>) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO blogs (title, content, author_username, channel, images, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    blog.title,
                    blog.content,
                    blog.author_username,
                    blog.channel,
                    blog.images,
                    to_db_time(blog.created_at),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_blog(&self, id: i64) -> Result<Option<BlogRow>> {
        self.with_conn(|conn| {
            let sql = format!("{BLOG_SELECT} WHERE b.id = ?1");
            let row = conn.query_row(&sql, [id], map_blog).optional()?;
            Ok(row)
        })
    }

    /// Newest first.
    pub fn list_blogs(&self, limit: u32) -> Result<Vec<BlogRow>> {
        self.with_conn(|conn| {
            let sql = format!("{BLOG_SELECT} ORDER BY b.created_at DESC, b.id DESC LIMIT ?1");
            query_blogs(conn, &sql, params![limit])
        })
    }

    /// Case-insensitive (ASCII) substring match over title, content and author.
    pub fn search_blogs(&self, needle: &str, limit: u32) -> Result<Vec<BlogRow>> {
        let pattern = format!("%{}%", escape_like(needle));
        self.with_conn(|conn| {
            let sql = format!(
                "{BLOG_SELECT}
                 WHERE b.title LIKE ?1 ESCAPE '\\'
                    OR b.content LIKE ?1 ESCAPE '\\'
                    OR b.author_username LIKE ?1 ESCAPE '\\'
                 ORDER BY b.created_at DESC, b.id DESC
                 LIMIT ?2"
            );
            query_blogs(conn, &sql, params![pattern, limit])
        })
    }

    pub fn blogs_by_author(&self, username: &str) -> Result<Vec<BlogRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{BLOG_SELECT} WHERE b.author_username = ?1 ORDER BY b.created_at DESC, b.id DESC"
            );
            query_blogs(conn, &sql, params![username])
        })
    }

    pub fn count_posts(&self, username: &str) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM blogs WHERE author_username = ?1", username)
    }

    /// Only touches the row when `author` owns it. Returns whether it did.
    pub fn update_blog(&self, id: i64, author: &str, title: &str, content: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE blogs SET title = ?1, content = ?2 WHERE id = ?3 AND author_username = ?4",
                params![title, content, id, author],
            )?;
            Ok(changed == 1)
        })
    }

    /// Comments and likes go with the blog; notifications keep their text.
    pub fn delete_blog(&self, id: i64, author: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM blogs WHERE id = ?1 AND author_username = ?2",
                params![id, author],
            )?;
            Ok(removed == 1)
        })
    }

    // -- Comments --

    pub fn insert_comment(
        &self,
        blog_id: i64,
        username: &str,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (blog_id, username, comment_text, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![blog_id, username, text, to_db_time(now)],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Oldest first.
    pub fn list_comments(&self, blog_id: i64) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, blog_id, username, comment_text, created_at
                 FROM comments
                 WHERE blog_id = ?1
                 ORDER BY created_at ASC, id ASC",
            )?;

            let rows = stmt
                .query_map([blog_id], |row| {
                    Ok(CommentRow {
                        id: row.get(0)?,
                        blog_id: row.get(1)?,
                        username: row.get(2)?,
                        comment_text: row.get(3)?,
                        created_at: time_col(row, 4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn query_blogs(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<BlogRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, map_blog)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn map_blog(row: &Row<'_>) -> rusqlite::Result<BlogRow> {
    Ok(BlogRow {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        author_username: row.get(3)?,
        channel: row.get(4)?,
        images: row.get(5)?,
        likes_count: row.get::<_, i64>(6)? as u64,
        created_at: time_col(row, 7)?,
    })
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{db_with_users, t0};
    use chrono::Duration;

    fn blog(db: &Database, author: &str, title: &str, at: DateTime<Utc>) -> i64 {
        db.insert_blog(&NewBlog {
            title,
            content: "some content here",
            author_username: author,
            channel: "general",
            images: "[\"a.png\"]",
            created_at: at,
        })
        .unwrap()
    }

    #[test]
    fn listing_is_newest_first_with_like_counts() {
        let db = db_with_users(&["alice", "bob"]);
        let first = blog(&db, "alice", "First", t0());
        let second = blog(&db, "alice", "Second", t0() + Duration::seconds(5));
        db.insert_like(first, "bob", t0()).unwrap();

        let blogs = db.list_blogs(10).unwrap();
        let ids: Vec<i64> = blogs.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![second, first]);
        assert_eq!(blogs[1].likes_count, 1);
        assert_eq!(db.count_posts("alice").unwrap(), 2);
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let db = db_with_users(&["alice"]);
        blog(&db, "alice", "100% Rust", t0());
        blog(&db, "alice", "Plain", t0());

        assert_eq!(db.search_blogs("100%", 10).unwrap().len(), 1);
        assert_eq!(db.search_blogs("rust", 10).unwrap().len(), 1);
        assert_eq!(db.search_blogs("%", 10).unwrap().len(), 1);
        assert_eq!(db.search_blogs("ALICE", 10).unwrap().len(), 2);
    }

    #[test]
    fn delete_cascades_to_comments_and_likes() {
        let db = db_with_users(&["alice", "bob"]);
        let id = blog(&db, "alice", "Doomed", t0());
        db.insert_comment(id, "bob", "nice", t0()).unwrap();
        db.insert_like(id, "bob", t0()).unwrap();

        assert!(!db.delete_blog(id, "bob").unwrap());
        assert!(db.delete_blog(id, "alice").unwrap());
        assert!(db.list_comments(id).unwrap().is_empty());
        assert_eq!(db.count_likes(id).unwrap(), 0);
    }
}
