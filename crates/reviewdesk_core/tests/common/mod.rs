#![allow(dead_code)]

use reviewdesk_core::db::open_db_in_memory;
use reviewdesk_core::EmployeeId;
use rusqlite::{params, Connection};

/// In-memory database with employees 1..=3 and the `reviews` table absent.
pub fn seeded_conn() -> Connection {
    let conn = open_db_in_memory().unwrap();
    for (id, name, title) in [
        (1, "Ada Lovelace", "Engineer"),
        (2, "Grace Hopper", "Admiral"),
        (3, "Alan Turing", "Researcher"),
    ] {
        insert_employee(&conn, id, name, title);
    }
    conn
}

pub fn insert_employee(conn: &Connection, id: EmployeeId, name: &str, job_title: &str) {
    conn.execute(
        "INSERT INTO employees (id, name, job_title) VALUES (?1, ?2, ?3);",
        params![id, name, job_title],
    )
    .unwrap();
}

pub fn review_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM reviews;", [], |row| row.get(0))
        .unwrap()
}

pub fn table_exists(conn: &Connection, table_name: &str) -> bool {
    conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table_name],
        |row| row.get::<_, i64>(0),
    )
    .unwrap()
        == 1
}
