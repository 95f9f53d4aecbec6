//! Staff, teams, customers and price tiers.
//! The engine reads these; the CLI maintenance commands write them.

use crate::db::bool_to_db;
use crate::errors::AppResult;
use crate::models::reference::{Customer, PriceTier, Staff, Team};
use rusqlite::{Connection, OptionalExtension, Row, params};

fn map_staff(row: &Row) -> rusqlite::Result<Staff> {
    Ok(Staff {
        id: row.get("id")?,
        name: row.get("name")?,
        active: row.get::<_, i64>("active")? != 0,
    })
}

fn map_team(row: &Row) -> rusqlite::Result<Team> {
    Ok(Team {
        id: row.get("id")?,
        name: row.get("name")?,
        color_hex: row.get("color_hex")?,
        active: row.get::<_, i64>("active")? != 0,
    })
}

fn map_customer(row: &Row) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get("id")?,
        name: row.get("name")?,
        price: row.get("price")?,
        is_friends_family: row.get::<_, i64>("is_friends_family")? != 0,
        friends_family_minutes: row.get("friends_family_minutes")?,
        average_wage_ratio: row.get("average_wage_ratio")?,
        average_efficiency: row.get("average_efficiency")?,
        active: row.get::<_, i64>("active")? != 0,
    })
}

// ---------------------------
// Staff
// ---------------------------

pub fn insert_staff(conn: &Connection, name: &str) -> AppResult<i64> {
    conn.execute("INSERT INTO staff (name, active) VALUES (?1, 1)", [name])?;
    Ok(conn.last_insert_rowid())
}

pub fn get_staff(conn: &Connection, id: i64) -> AppResult<Option<Staff>> {
    let mut stmt = conn.prepare_cached("SELECT id, name, active FROM staff WHERE id = ?1")?;
    Ok(stmt.query_row([id], map_staff).optional()?)
}

pub fn list_staff(conn: &Connection) -> AppResult<Vec<Staff>> {
    let mut stmt = conn.prepare("SELECT id, name, active FROM staff ORDER BY id ASC")?;
    let rows = stmt.query_map([], map_staff)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

// ---------------------------
// Teams
// ---------------------------

pub fn insert_team(conn: &Connection, name: &str, color_hex: &str) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO teams (name, color_hex, active) VALUES (?1, ?2, 1)",
        params![name, color_hex],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_team(conn: &Connection, id: i64) -> AppResult<Option<Team>> {
    let mut stmt =
        conn.prepare_cached("SELECT id, name, color_hex, active FROM teams WHERE id = ?1")?;
    Ok(stmt.query_row([id], map_team).optional()?)
}

pub fn list_teams(conn: &Connection) -> AppResult<Vec<Team>> {
    let mut stmt = conn.prepare("SELECT id, name, color_hex, active FROM teams ORDER BY id ASC")?;
    let rows = stmt.query_map([], map_team)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

// ---------------------------
// Customers
// ---------------------------

const CUSTOMER_COLUMNS: &str = "id, name, price, is_friends_family, friends_family_minutes,
     average_wage_ratio, average_efficiency, active";

pub struct NewCustomer<'a> {
    pub name: &'a str,
    pub price: i64,
    pub is_friends_family: bool,
    pub friends_family_minutes: Option<i64>,
}

pub fn insert_customer(conn: &Connection, c: &NewCustomer) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO customers (name, price, is_friends_family, friends_family_minutes, active)
         VALUES (?1, ?2, ?3, ?4, 1)",
        params![
            c.name,
            c.price,
            bool_to_db(c.is_friends_family),
            c.friends_family_minutes
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_customer(conn: &Connection, id: i64) -> AppResult<Option<Customer>> {
    let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1");
    let mut stmt = conn.prepare_cached(&sql)?;
    Ok(stmt.query_row([id], map_customer).optional()?)
}

pub fn list_customers(conn: &Connection) -> AppResult<Vec<Customer>> {
    let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY id ASC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], map_customer)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn set_customer_active(conn: &Connection, id: i64, active: bool) -> AppResult<usize> {
    Ok(conn.execute(
        "UPDATE customers SET active = ?1 WHERE id = ?2",
        params![bool_to_db(active), id],
    )?)
}

/// Store the aggregates computed after a job completes.
pub fn update_customer_metrics(
    conn: &Connection,
    id: i64,
    average_efficiency: Option<i64>,
    average_wage_ratio: Option<i64>,
) -> AppResult<()> {
    conn.execute(
        "UPDATE customers SET average_efficiency = ?1, average_wage_ratio = ?2 WHERE id = ?3",
        params![average_efficiency, average_wage_ratio, id],
    )?;
    Ok(())
}

// ---------------------------
// Price tiers
// ---------------------------

pub fn insert_tier(conn: &Connection, tier: &PriceTier) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO price_tiers (price_min, price_max, allotted_minutes) VALUES (?1, ?2, ?3)",
        params![tier.price_min, tier.price_max, tier.allotted_minutes],
    )?;
    Ok(conn.last_insert_rowid())
}

/// All tiers ordered by lower bound.
pub fn load_tiers(conn: &Connection) -> AppResult<Vec<PriceTier>> {
    let mut stmt = conn.prepare_cached(
        "SELECT price_min, price_max, allotted_minutes FROM price_tiers ORDER BY price_min ASC, id ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(PriceTier {
            price_min: row.get(0)?,
            price_max: row.get(1)?,
            allotted_minutes: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
